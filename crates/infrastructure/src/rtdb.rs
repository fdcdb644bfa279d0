//! Firebase 实时数据库 REST 适配器
//!
//! 消息存储对应 `/messages` 节点，令牌注册表对应 `/fcmTokens` 节点。
//! 根地址可注入，测试时指向本地模拟服务。

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use application::errors::{RegistryError, StoreError};
use application::message_store::MessageStore;
use application::registry::TokenRegistry;
use domain::{ChatMessage, DeviceToken, MessageId};

/// 实时数据库的消息存储适配器
pub struct RtdbMessageStore {
    client: Client,
    base_url: String,
}

/// POST 追加后数据库返回的新节点键
#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

impl RtdbMessageStore {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MessageStore for RtdbMessageStore {
    async fn append(&self, message: ChatMessage) -> Result<MessageId, StoreError> {
        let url = format!("{}/messages.json", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&message)
            .send()
            .await
            .map_err(|err| StoreError::Request {
                message: err.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(StoreError::Request {
                message: format!("消息追加返回状态 {}", response.status()),
            });
        }

        let body: PushResponse =
            response
                .json()
                .await
                .map_err(|err| StoreError::InvalidResponse {
                    message: err.to_string(),
                })?;

        debug!(message_id = %body.name, "消息已追加到实时数据库");
        Ok(MessageId::new(body.name))
    }

    async fn set_moderated(&self, id: &MessageId) -> Result<(), StoreError> {
        let url = format!("{}/messages/{}.json", self.base_url, id);
        let response = self
            .client
            .patch(&url)
            .json(&json!({ "moderated": true }))
            .send()
            .await
            .map_err(|err| StoreError::Request {
                message: err.to_string(),
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound { id: id.to_string() });
        }

        if !response.status().is_success() {
            return Err(StoreError::Request {
                message: format!("审核标记返回状态 {}", response.status()),
            });
        }

        debug!(message_id = %id, "消息已标记为已审核");
        Ok(())
    }
}

/// 实时数据库的设备令牌注册表适配器
pub struct RtdbTokenRegistry {
    client: Client,
    base_url: String,
}

impl RtdbTokenRegistry {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TokenRegistry for RtdbTokenRegistry {
    async fn list(&self) -> Result<Vec<DeviceToken>, RegistryError> {
        let url = format!("{}/fcmTokens.json", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| RegistryError::Request {
                message: err.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(RegistryError::Request {
                message: format!("令牌读取返回状态 {}", response.status()),
            });
        }

        // 节点不存在时数据库返回 JSON null
        let entries: Option<BTreeMap<String, serde_json::Value>> =
            response
                .json()
                .await
                .map_err(|err| RegistryError::InvalidResponse {
                    message: err.to_string(),
                })?;

        let tokens = entries
            .unwrap_or_default()
            .into_keys()
            .map(DeviceToken::new)
            .collect();
        Ok(tokens)
    }

    async fn remove(&self, token: &DeviceToken) -> Result<(), RegistryError> {
        let url = format!("{}/fcmTokens/{}.json", self.base_url, token);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|err| RegistryError::Request {
                message: err.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(RegistryError::Request {
                message: format!("令牌删除返回状态 {}", response.status()),
            });
        }

        debug!(token = %token, "失效令牌已从注册表移除");
        Ok(())
    }
}
