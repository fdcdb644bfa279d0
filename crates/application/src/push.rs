//! 推送发送能力接口

use std::sync::Arc;

use async_trait::async_trait;
use domain::{DeviceToken, NotificationPayload};

use crate::errors::PushError;

/// 单个令牌送达失败的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryErrorKind {
    /// 令牌格式无效
    InvalidToken,
    /// 令牌已注销
    NotRegistered,
    /// 网关暂时不可用
    Unavailable,
    /// 网关内部错误
    Internal,
    /// 其他错误
    Other,
}

/// 单个令牌的送达失败信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryError {
    /// 失败类别
    pub kind: DeliveryErrorKind,
    /// 网关返回的错误描述
    pub message: String,
}

impl DeliveryError {
    /// 创建送达失败信息
    pub fn new(kind: DeliveryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// 是否为永久性失败
    ///
    /// 永久失效的令牌应当从注册表移除。
    pub fn is_permanent(&self) -> bool {
        matches!(
            self.kind,
            DeliveryErrorKind::InvalidToken | DeliveryErrorKind::NotRegistered
        )
    }
}

/// 单个令牌的送达结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 送达成功
    Delivered,
    /// 送达失败
    Failed(DeliveryError),
}

/// 推送发送能力
///
/// 契约：返回的结果与输入令牌一一对应且顺序一致。
#[async_trait]
pub trait PushSender: Send + Sync {
    /// 向一批设备令牌发送同一条通知
    async fn send(
        &self,
        tokens: &[DeviceToken],
        payload: &NotificationPayload,
    ) -> Result<Vec<DeliveryOutcome>, PushError>;
}

/// 推送发送器的共享引用
pub type PushSenderRef = Arc<dyn PushSender>;
