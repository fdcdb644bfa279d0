//! 设备推送令牌实体

use serde::{Deserialize, Serialize};

/// 客户端设备的推送令牌
///
/// 令牌是不透明字符串，注册表中仅以存在与否表示订阅状态。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceToken(String);

impl DeviceToken {
    /// 创建设备令牌
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// 获取字符串形式
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DeviceToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for DeviceToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl std::fmt::Display for DeviceToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
