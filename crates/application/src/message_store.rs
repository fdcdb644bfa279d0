//! 消息存储能力接口

use std::sync::Arc;

use async_trait::async_trait;
use domain::{ChatMessage, MessageId};

use crate::errors::StoreError;

/// 消息存储能力
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// 追加一条消息，返回存储分配的消息键
    async fn append(&self, message: ChatMessage) -> Result<MessageId, StoreError>;

    /// 在指定消息上写入审核标记
    async fn set_moderated(&self, id: &MessageId) -> Result<(), StoreError>;
}

/// 消息存储的共享引用
pub type MessageStoreRef = Arc<dyn MessageStore>;
