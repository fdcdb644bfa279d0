//! 聊天消息实体定义
//!
//! 字段布局与实时数据库 `/messages` 节点的 JSON 结构一一对应。

use crate::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};

/// 消息在数据库中的节点键
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// 创建消息ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 获取字符串形式
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 聊天消息实体
///
/// `text` 只在文本消息上出现，图片消息没有文本；
/// `moderated` 只在图片被模糊处理后写入。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// 发送者显示名称
    pub name: String,
    /// 发送者头像URL，客户端未提供时为空字符串
    #[serde(rename = "photoUrl", default)]
    pub photo_url: String,
    /// 文本内容
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// 审核标记
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderated: Option<bool>,
}

impl ChatMessage {
    /// 创建一条用户消息
    pub fn user(
        name: impl Into<String>,
        photo_url: impl Into<String>,
        text: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            photo_url: photo_url.into(),
            text,
            moderated: None,
        }
    }

    /// 以机器人身份创建一条文本消息
    pub fn bot(profile: &BotProfile, text: impl Into<String>) -> Self {
        Self {
            name: profile.name.clone(),
            photo_url: profile.icon_url.clone(),
            text: Some(text.into()),
            moderated: None,
        }
    }
}

/// 机器人发言身份
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotProfile {
    /// 机器人显示名称
    pub name: String,
    /// 机器人头像URL
    pub icon_url: String,
}

impl BotProfile {
    /// 创建机器人身份
    pub fn new(name: impl Into<String>, icon_url: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        let icon_url = icon_url.into();

        if name.trim().is_empty() {
            return Err(DomainError::validation_error("name", "机器人名称不能为空"));
        }

        if icon_url.trim().is_empty() {
            return Err(DomainError::validation_error(
                "icon_url",
                "机器人头像不能为空",
            ));
        }

        Ok(Self { name, icon_url })
    }
}
