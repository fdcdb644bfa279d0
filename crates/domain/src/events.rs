//! 触发事件定义
//!
//! 管道消费的三类外部触发事件，以及在事件流上承载它们的信封类型。

use crate::entities::{ChatMessage, MessageId, StorageObjectMeta};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 存储对象变更事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectChangeEvent {
    /// 所在桶
    pub bucket: String,
    /// 对象路径，部署等无对象变更时为空
    pub name: Option<String>,
    /// 对象创建时间
    pub time_created: DateTime<Utc>,
    /// 对象最后更新时间
    pub updated: DateTime<Utc>,
    /// 对象当前是否存在，删除事件为 false
    pub exists: bool,
    /// 事件发生时间
    pub timestamp: DateTime<Utc>,
}

impl ObjectChangeEvent {
    /// 提取对象元数据，无对象路径时返回 None
    pub fn object(&self) -> Option<StorageObjectMeta> {
        let name = self.name.clone()?;
        Some(StorageObjectMeta {
            bucket: self.bucket.clone(),
            name,
            time_created: self.time_created,
            updated: self.updated,
            exists: self.exists,
        })
    }
}

/// 消息写入事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageWriteEvent {
    /// 消息的数据库键
    pub message_id: MessageId,
    /// 写入前的内容，首次写入为 None
    pub previous: Option<ChatMessage>,
    /// 写入后的内容
    pub current: ChatMessage,
    /// 事件发生时间
    pub timestamp: DateTime<Utc>,
}

impl MessageWriteEvent {
    /// 是否为首次写入而非更新
    pub fn is_initial_write(&self) -> bool {
        self.previous.is_none()
    }
}

/// 新用户注册事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCreatedEvent {
    /// 用户ID
    pub user_id: String,
    /// 显示名称，匿名登录时为空
    pub display_name: Option<String>,
    /// 事件发生时间
    pub timestamp: DateTime<Utc>,
}

/// 管道消费的触发事件信封
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TriggerEvent {
    /// 存储对象发生变更
    ObjectChanged(ObjectChangeEvent),
    /// 聊天消息被写入
    MessageWritten(MessageWriteEvent),
    /// 新用户完成注册
    UserCreated(UserCreatedEvent),
}

impl TriggerEvent {
    /// 获取事件类型名称
    pub fn event_type(&self) -> &'static str {
        match self {
            TriggerEvent::ObjectChanged(_) => "ObjectChanged",
            TriggerEvent::MessageWritten(_) => "MessageWritten",
            TriggerEvent::UserCreated(_) => "UserCreated",
        }
    }

    /// 获取事件时间戳
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            TriggerEvent::ObjectChanged(event) => event.timestamp,
            TriggerEvent::MessageWritten(event) => event.timestamp,
            TriggerEvent::UserCreated(event) => event.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_object_event(name: Option<&str>) -> ObjectChangeEvent {
        let now = Utc::now();
        ObjectChangeEvent {
            bucket: "chat-images".to_string(),
            name: name.map(|n| n.to_string()),
            time_created: now,
            updated: now,
            exists: true,
            timestamp: now,
        }
    }

    #[test]
    fn test_object_event_extracts_metadata() {
        let event = create_test_object_event(Some("images/msg1/photo.png"));

        let meta = event.object().unwrap();
        assert_eq!(meta.bucket, "chat-images");
        assert_eq!(meta.name, "images/msg1/photo.png");
        assert_eq!(meta.time_created, event.time_created);
        assert_eq!(meta.updated, event.updated);
        assert!(meta.exists);
    }

    #[test]
    fn test_object_event_without_name() {
        let event = create_test_object_event(None);
        assert!(event.object().is_none());
    }

    #[test]
    fn test_initial_write_detection() {
        let current = ChatMessage::user("Ann", "", Some("hi".into()));
        let mut event = MessageWriteEvent {
            message_id: MessageId::new("msg1"),
            previous: None,
            current: current.clone(),
            timestamp: Utc::now(),
        };
        assert!(event.is_initial_write());

        event.previous = Some(current);
        assert!(!event.is_initial_write());
    }

    #[test]
    fn test_event_type_names() {
        let object_event = TriggerEvent::ObjectChanged(create_test_object_event(None));
        assert_eq!(object_event.event_type(), "ObjectChanged");

        let write_event = TriggerEvent::MessageWritten(MessageWriteEvent {
            message_id: MessageId::new("msg1"),
            previous: None,
            current: ChatMessage::user("Ann", "", Some("hi".into())),
            timestamp: Utc::now(),
        });
        assert_eq!(write_event.event_type(), "MessageWritten");

        let user_event = TriggerEvent::UserCreated(UserCreatedEvent {
            user_id: "uid-1".to_string(),
            display_name: Some("Ann".to_string()),
            timestamp: Utc::now(),
        });
        assert_eq!(user_event.event_type(), "UserCreated");
    }

    #[test]
    fn test_event_timestamp_accessor() {
        let event = create_test_object_event(Some("images/msg1/photo.png"));
        let expected = event.timestamp;

        let envelope = TriggerEvent::ObjectChanged(event);
        assert_eq!(envelope.timestamp(), expected);
    }

    #[test]
    fn test_trigger_event_serialization() {
        let envelope = TriggerEvent::MessageWritten(MessageWriteEvent {
            message_id: MessageId::new("msg1"),
            previous: None,
            current: ChatMessage::user("Ann", "https://example.com/ann.png", Some("hi".into())),
            timestamp: Utc::now(),
        });

        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("MessageWritten"));

        let deserialized: TriggerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, envelope);
    }
}
