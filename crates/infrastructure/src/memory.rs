//! 内存存储实现
//!
//! 消息存储与令牌注册表的进程内实现，用于本地运行与集成测试。

use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use application::errors::{RegistryError, StoreError};
use application::message_store::MessageStore;
use application::registry::TokenRegistry;
use domain::{ChatMessage, DeviceToken, MessageId};

/// 内存消息存储，按插入顺序保存消息
#[derive(Default)]
pub struct InMemoryMessageStore {
    messages: Mutex<Vec<(MessageId, ChatMessage)>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前全部消息的快照
    pub fn messages(&self) -> Vec<(MessageId, ChatMessage)> {
        self.messages.lock().unwrap().clone()
    }

    /// 按键查找消息
    pub fn get(&self, id: &MessageId) -> Option<ChatMessage> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, message)| message.clone())
    }

    /// 以固定的键插入一条消息，供测试预置数据
    pub fn insert_with_id(&self, id: MessageId, message: ChatMessage) {
        self.messages.lock().unwrap().push((id, message));
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, message: ChatMessage) -> Result<MessageId, StoreError> {
        let id = MessageId::new(Uuid::new_v4().to_string());
        self.messages.lock().unwrap().push((id.clone(), message));
        Ok(id)
    }

    async fn set_moderated(&self, id: &MessageId) -> Result<(), StoreError> {
        let mut messages = self.messages.lock().unwrap();
        match messages.iter_mut().find(|(key, _)| key == id) {
            Some((_, message)) => {
                message.moderated = Some(true);
                Ok(())
            }
            None => Err(StoreError::NotFound { id: id.to_string() }),
        }
    }
}

/// 内存令牌注册表，记录每次移除
#[derive(Default)]
pub struct InMemoryTokenRegistry {
    tokens: Mutex<Vec<DeviceToken>>,
    removed: Mutex<Vec<DeviceToken>>,
}

impl InMemoryTokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以给定令牌初始化注册表
    pub fn with_tokens(tokens: impl IntoIterator<Item = DeviceToken>) -> Self {
        Self {
            tokens: Mutex::new(tokens.into_iter().collect()),
            removed: Mutex::new(Vec::new()),
        }
    }

    /// 注册一个令牌
    pub fn register(&self, token: DeviceToken) {
        let mut tokens = self.tokens.lock().unwrap();
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }

    /// 已移除令牌的历史记录
    pub fn removed(&self) -> Vec<DeviceToken> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenRegistry for InMemoryTokenRegistry {
    async fn list(&self) -> Result<Vec<DeviceToken>, RegistryError> {
        Ok(self.tokens.lock().unwrap().clone())
    }

    async fn remove(&self, token: &DeviceToken) -> Result<(), RegistryError> {
        self.tokens.lock().unwrap().retain(|entry| entry != token);
        self.removed.lock().unwrap().push(token.clone());
        Ok(())
    }
}
