//! 推送通知内容模型

use crate::entities::ChatMessage;
use serde::{Deserialize, Serialize};

/// 通知正文的最大字符数
pub const MAX_BODY_CHARS: usize = 100;

/// 推送给客户端设备的通知内容
///
/// 字段名与推送网关的 notification 载荷保持一致。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// 通知标题
    pub title: String,
    /// 通知正文
    pub body: String,
    /// 通知图标URL
    pub icon: String,
    /// 点击通知后打开的链接
    pub click_action: String,
}

impl NotificationPayload {
    /// 根据一条新消息构造通知内容
    ///
    /// 文本消息的标题为 "... posted a message"，图片消息为
    /// "... posted an image"；发送者没有头像时使用占位图标。
    pub fn for_message(message: &ChatMessage, placeholder_icon: &str, click_action: &str) -> Self {
        let title = match &message.text {
            Some(_) => format!("{} posted a message", message.name),
            None => format!("{} posted an image", message.name),
        };

        let body = message
            .text
            .as_deref()
            .map(truncate_body)
            .unwrap_or_default();

        let icon = if message.photo_url.is_empty() {
            placeholder_icon.to_string()
        } else {
            message.photo_url.clone()
        };

        Self {
            title,
            body,
            icon,
            click_action: click_action.to_string(),
        }
    }
}

/// 截断通知正文
///
/// 超过 100 个字符时保留前 97 个字符并追加省略号。
/// 按字符而非字节截断，避免切断多字节文本。
pub fn truncate_body(text: &str) -> String {
    if text.chars().count() <= MAX_BODY_CHARS {
        return text.to_string();
    }

    let head: String = text.chars().take(MAX_BODY_CHARS - 3).collect();
    format!("{}...", head)
}
