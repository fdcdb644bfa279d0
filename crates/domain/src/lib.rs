//! 内容审核与通知推送管道的核心领域模型
//!
//! 包含聊天消息、存储对象、设备令牌等核心实体，以及触发事件和纯业务规则。

pub mod classification;
pub mod entities;
pub mod errors;
pub mod events;
pub mod notification;

// 重新导出常用类型
pub use classification::*;
pub use entities::*;
pub use errors::*;
pub use events::*;
pub use notification::*;
