//! FCM 推送网关适配器
//!
//! 走传统的 `fcm/send` 批量接口，一次请求携带全部令牌；
//! 响应中的 results 与请求令牌按下标一一对应。

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use application::errors::PushError;
use application::push::{DeliveryError, DeliveryErrorKind, DeliveryOutcome, PushSender};
use domain::{DeviceToken, NotificationPayload};

/// FCM 推送发送器
pub struct FcmPushSender {
    client: Client,
    endpoint: String,
    server_key: String,
}

/// 批量发送的响应体
#[derive(Debug, Deserialize)]
struct FcmResponse {
    results: Vec<FcmResult>,
}

/// 单个令牌的发送结果
#[derive(Debug, Deserialize)]
struct FcmResult {
    #[serde(default)]
    error: Option<String>,
}

impl FcmPushSender {
    pub fn new(client: Client, endpoint: impl Into<String>, server_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            server_key: server_key.into(),
        }
    }
}

#[async_trait]
impl PushSender for FcmPushSender {
    async fn send(
        &self,
        tokens: &[DeviceToken],
        payload: &NotificationPayload,
    ) -> Result<Vec<DeliveryOutcome>, PushError> {
        let url = format!("{}/fcm/send", self.endpoint);
        let body = json!({
            "registration_ids": tokens,
            "notification": payload,
        });

        let response = self
            .client
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("key={}", self.server_key),
            )
            .json(&body)
            .send()
            .await
            .map_err(|err| PushError::Request {
                message: err.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(PushError::Request {
                message: format!("推送请求返回状态 {}", response.status()),
            });
        }

        let body: FcmResponse =
            response
                .json()
                .await
                .map_err(|err| PushError::InvalidResponse {
                    message: err.to_string(),
                })?;

        debug!(
            tokens = tokens.len(),
            results = body.results.len(),
            "批量推送请求已完成"
        );

        let outcomes = body
            .results
            .into_iter()
            .map(|result| match result.error {
                None => DeliveryOutcome::Delivered,
                Some(code) => {
                    DeliveryOutcome::Failed(DeliveryError::new(classify_error(&code), code))
                }
            })
            .collect();
        Ok(outcomes)
    }
}

/// 把网关错误码映射到送达失败类别
fn classify_error(code: &str) -> DeliveryErrorKind {
    match code {
        "InvalidRegistration" | "MissingRegistration" => DeliveryErrorKind::InvalidToken,
        "NotRegistered" => DeliveryErrorKind::NotRegistered,
        "Unavailable" => DeliveryErrorKind::Unavailable,
        "InternalServerError" => DeliveryErrorKind::Internal,
        _ => DeliveryErrorKind::Other,
    }
}
