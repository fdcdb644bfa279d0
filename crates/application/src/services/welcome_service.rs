//! 新用户欢迎服务
//!
//! 处理用户注册事件：以机器人身份写入一条欢迎消息。

use domain::{BotProfile, ChatMessage, MessageId, UserCreatedEvent};
use tracing::info;

use crate::errors::StoreError;
use crate::message_store::MessageStoreRef;

/// 匿名登录用户的默认称呼
const ANONYMOUS_NAME: &str = "Anonymous";

pub struct WelcomeServiceDependencies {
    pub message_store: MessageStoreRef,
}

pub struct WelcomeService {
    deps: WelcomeServiceDependencies,
    bot: BotProfile,
}

impl WelcomeService {
    pub fn new(deps: WelcomeServiceDependencies, bot: BotProfile) -> Self {
        Self { deps, bot }
    }

    /// 为新注册用户写入欢迎消息
    pub async fn handle_user_created(
        &self,
        event: &UserCreatedEvent,
    ) -> Result<MessageId, StoreError> {
        let display_name = event.display_name.as_deref().unwrap_or(ANONYMOUS_NAME);
        let text = format!("{} signed in for the first time! Welcome!", display_name);

        let id = self
            .deps
            .message_store
            .append(ChatMessage::bot(&self.bot, text))
            .await?;

        info!(user_id = %event.user_id, message_id = %id, "已写入新用户欢迎消息");
        Ok(id)
    }
}
