//! 设备令牌注册表能力接口

use std::sync::Arc;

use async_trait::async_trait;
use domain::DeviceToken;

use crate::errors::RegistryError;

/// 设备令牌注册表能力
///
/// 注册表只记录令牌是否存在，读取是一次性的全量快照。
#[async_trait]
pub trait TokenRegistry: Send + Sync {
    /// 读取当前注册的全部令牌
    async fn list(&self) -> Result<Vec<DeviceToken>, RegistryError>;

    /// 移除一个令牌
    async fn remove(&self, token: &DeviceToken) -> Result<(), RegistryError>;
}

/// 令牌注册表的共享引用
pub type TokenRegistryRef = Arc<dyn TokenRegistry>;
