//! 新消息通知分发服务
//!
//! 处理消息写入事件：为首次写入的消息构造通知，整批发给注册表中的
//! 全部设备令牌，并把永久失效的令牌从注册表移除。

use domain::{DeviceToken, MessageWriteEvent, NotificationPayload};
use futures::future::join_all;
use tracing::{error, info, warn};

use crate::errors::FanoutError;
use crate::push::{DeliveryOutcome, PushSenderRef};
use crate::registry::TokenRegistryRef;

/// 分发流程的终态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanoutOutcome {
    /// 更新事件不触发通知
    SkippedUpdate,
    /// 注册表为空，没有分发目标
    EmptyRegistry,
    /// 已完成分发
    ///
    /// `delivered` 成功送达数，`pruned` 已移除的失效令牌数，
    /// `failed` 其余失败数；三者之和等于令牌总数。
    Dispatched {
        delivered: usize,
        pruned: usize,
        failed: usize,
    },
}

pub struct NotificationServiceDependencies {
    pub registry: TokenRegistryRef,
    pub push: PushSenderRef,
}

pub struct NotificationService {
    deps: NotificationServiceDependencies,
    placeholder_icon: String,
    click_action: String,
}

impl NotificationService {
    pub fn new(
        deps: NotificationServiceDependencies,
        placeholder_icon: impl Into<String>,
        click_action: impl Into<String>,
    ) -> Self {
        Self {
            deps,
            placeholder_icon: placeholder_icon.into(),
            click_action: click_action.into(),
        }
    }

    /// 处理一次消息写入
    ///
    /// 只有首次写入触发通知，审核标记等后续更新不重复打扰用户。
    /// 结果与令牌数量不一致时立即报错且不做任何移除。
    pub async fn handle_message_write(
        &self,
        event: &MessageWriteEvent,
    ) -> Result<FanoutOutcome, FanoutError> {
        if !event.is_initial_write() {
            info!(message_id = %event.message_id, "消息更新事件不触发通知");
            return Ok(FanoutOutcome::SkippedUpdate);
        }

        let payload = NotificationPayload::for_message(
            &event.current,
            &self.placeholder_icon,
            &self.click_action,
        );

        let tokens = self.deps.registry.list().await?;
        if tokens.is_empty() {
            info!(message_id = %event.message_id, "注册表中没有设备令牌");
            return Ok(FanoutOutcome::EmptyRegistry);
        }

        info!(
            message_id = %event.message_id,
            tokens = tokens.len(),
            title = %payload.title,
            "开始分发新消息通知"
        );

        let outcomes = self.deps.push.send(&tokens, &payload).await?;
        if outcomes.len() != tokens.len() {
            return Err(FanoutError::Alignment {
                expected: tokens.len(),
                actual: outcomes.len(),
            });
        }

        let mut delivered = 0;
        let mut transient_failures = 0;
        let mut stale: Vec<DeviceToken> = Vec::new();

        for (token, outcome) in tokens.iter().zip(outcomes.iter()) {
            match outcome {
                DeliveryOutcome::Delivered => delivered += 1,
                DeliveryOutcome::Failed(err) => {
                    warn!(
                        token = %token,
                        kind = ?err.kind,
                        error = %err.message,
                        "单个设备推送失败"
                    );
                    if err.is_permanent() {
                        stale.push(token.clone());
                    } else {
                        transient_failures += 1;
                    }
                }
            }
        }

        // 失效令牌并发移除，移除失败只记录不重试
        let removals: Vec<_> = stale
            .iter()
            .map(|token| {
                let registry = self.deps.registry.clone();
                let token = token.clone();
                async move {
                    match registry.remove(&token).await {
                        Ok(()) => true,
                        Err(err) => {
                            error!(token = %token, error = %err, "失效令牌移除失败");
                            false
                        }
                    }
                }
            })
            .collect();

        let pruned = join_all(removals)
            .await
            .into_iter()
            .filter(|removed| *removed)
            .count();
        let failed = transient_failures + (stale.len() - pruned);

        info!(
            message_id = %event.message_id,
            delivered,
            pruned,
            failed,
            "通知分发完成"
        );

        Ok(FanoutOutcome::Dispatched {
            delivered,
            pruned,
            failed,
        })
    }
}
