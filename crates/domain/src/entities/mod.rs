//! 领域实体定义
//!
//! 包含系统的核心实体：聊天消息、存储对象、设备令牌。

pub mod device_token;
pub mod message;
pub mod storage_object;

// 重新导出核心实体
pub use device_token::DeviceToken;
pub use message::{BotProfile, ChatMessage, MessageId};
pub use storage_object::StorageObjectMeta;
