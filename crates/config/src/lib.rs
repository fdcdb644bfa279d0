//! 统一配置中心
//!
//! 提供工作进程的全局配置管理，包括：
//! - Firebase 实时数据库
//! - Google Vision / Cloud Storage
//! - FCM 推送网关
//! - 机器人身份与审核参数
//! - 触发事件流消费

use serde::{Deserialize, Serialize};
use std::env;

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Firebase 实时数据库配置
    pub firebase: FirebaseConfig,
    /// Google Vision / Cloud Storage 配置
    pub google: GoogleConfig,
    /// FCM 推送网关配置
    pub fcm: FcmConfig,
    /// 机器人身份配置
    pub bot: BotConfig,
    /// 图像审核配置
    pub moderation: ModerationConfig,
    /// Redis 配置
    pub redis: RedisConfig,
    /// 触发事件流配置
    pub triggers: TriggerConfig,
}

/// Firebase 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseConfig {
    /// 实时数据库的 REST 根地址
    pub database_url: String,
    /// 应用的认证域名，通知点击后跳转到这里
    pub auth_domain: String,
}

impl FirebaseConfig {
    /// 通知点击后打开的链接
    pub fn click_link(&self) -> String {
        format!("https://{}", self.auth_domain)
    }
}

/// Google API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// Vision API 根地址
    pub vision_endpoint: String,
    /// Vision API 密钥
    pub vision_api_key: String,
    /// Cloud Storage JSON API 根地址
    pub storage_endpoint: String,
}

/// FCM 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FcmConfig {
    /// 推送网关根地址
    pub endpoint: String,
    /// 服务端密钥
    pub server_key: String,
}

/// 机器人身份配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// 机器人显示名称
    pub name: String,
    /// 机器人头像URL
    pub icon_url: String,
    /// 发送者没有头像时通知使用的占位图标
    pub placeholder_icon: String,
}

/// 图像审核配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// 临时文件目录
    pub scratch_dir: String,
    /// 变换器类型：imagemagick 或 builtin
    pub transformer: String,
    /// ImageMagick 的 convert 命令路径
    pub convert_command: String,
}

/// Redis 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

/// 触发事件流配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// 承载触发事件的流名称
    pub stream_name: String,
    /// 消费者组名称
    pub consumer_group: String,
    /// 本实例的消费者名称
    pub consumer_name: String,
    /// 单次读取的最大事件数
    pub batch_size: i64,
    /// 空闲轮询间隔（毫秒）
    pub poll_interval_ms: u64,
}

impl AppConfig {
    /// 从环境变量加载配置
    /// 对于关键配置（FIREBASE_DATABASE_URL, FIREBASE_AUTH_DOMAIN, GOOGLE_VISION_API_KEY,
    /// FCM_SERVER_KEY, REDIS_URL），如果环境变量不存在将会 panic
    /// 这确保了生产环境中不会使用无效的默认值
    pub fn from_env() -> Self {
        Self {
            firebase: FirebaseConfig {
                database_url: env::var("FIREBASE_DATABASE_URL")
                    .expect("FIREBASE_DATABASE_URL environment variable is required"),
                auth_domain: env::var("FIREBASE_AUTH_DOMAIN")
                    .expect("FIREBASE_AUTH_DOMAIN environment variable is required"),
            },
            google: GoogleConfig {
                vision_endpoint: env::var("GOOGLE_VISION_ENDPOINT")
                    .unwrap_or_else(|_| "https://vision.googleapis.com".to_string()),
                vision_api_key: env::var("GOOGLE_VISION_API_KEY")
                    .expect("GOOGLE_VISION_API_KEY environment variable is required"),
                storage_endpoint: env::var("GOOGLE_STORAGE_ENDPOINT")
                    .unwrap_or_else(|_| "https://storage.googleapis.com".to_string()),
            },
            fcm: FcmConfig {
                endpoint: env::var("FCM_ENDPOINT")
                    .unwrap_or_else(|_| "https://fcm.googleapis.com".to_string()),
                server_key: env::var("FCM_SERVER_KEY")
                    .expect("FCM_SERVER_KEY environment variable is required"),
            },
            bot: Self::bot_from_env(),
            moderation: Self::moderation_from_env(),
            redis: RedisConfig {
                url: env::var("REDIS_URL").expect("REDIS_URL environment variable is required"),
            },
            triggers: Self::triggers_from_env(),
        }
    }

    /// 从环境变量加载配置，开发环境版本
    /// 提供本地默认值，仅用于测试和开发
    pub fn from_env_with_defaults() -> Self {
        Self {
            firebase: FirebaseConfig {
                database_url: env::var("FIREBASE_DATABASE_URL")
                    .unwrap_or_else(|_| "https://friendlychat.firebaseio.com".to_string()),
                auth_domain: env::var("FIREBASE_AUTH_DOMAIN")
                    .unwrap_or_else(|_| "friendlychat.firebaseapp.com".to_string()),
            },
            google: GoogleConfig {
                vision_endpoint: env::var("GOOGLE_VISION_ENDPOINT")
                    .unwrap_or_else(|_| "https://vision.googleapis.com".to_string()),
                vision_api_key: env::var("GOOGLE_VISION_API_KEY")
                    .unwrap_or_else(|_| "dev-vision-key".to_string()),
                storage_endpoint: env::var("GOOGLE_STORAGE_ENDPOINT")
                    .unwrap_or_else(|_| "https://storage.googleapis.com".to_string()),
            },
            fcm: FcmConfig {
                endpoint: env::var("FCM_ENDPOINT")
                    .unwrap_or_else(|_| "https://fcm.googleapis.com".to_string()),
                server_key: env::var("FCM_SERVER_KEY")
                    .unwrap_or_else(|_| "dev-fcm-key".to_string()),
            },
            bot: Self::bot_from_env(),
            moderation: Self::moderation_from_env(),
            redis: RedisConfig {
                url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            },
            triggers: Self::triggers_from_env(),
        }
    }

    fn bot_from_env() -> BotConfig {
        BotConfig {
            name: env::var("BOT_NAME").unwrap_or_else(|_| "Chat Bot".to_string()),
            icon_url: env::var("BOT_ICON_URL")
                .unwrap_or_else(|_| "/images/bot-icon.png".to_string()),
            placeholder_icon: env::var("NOTIFICATION_PLACEHOLDER_ICON")
                .unwrap_or_else(|_| "/images/profile_placeholder.png".to_string()),
        }
    }

    fn moderation_from_env() -> ModerationConfig {
        ModerationConfig {
            scratch_dir: env::var("MODERATION_SCRATCH_DIR").unwrap_or_else(|_| "/tmp".to_string()),
            transformer: env::var("MODERATION_TRANSFORMER")
                .unwrap_or_else(|_| "imagemagick".to_string()),
            convert_command: env::var("IMAGEMAGICK_COMMAND")
                .unwrap_or_else(|_| "convert".to_string()),
        }
    }

    fn triggers_from_env() -> TriggerConfig {
        TriggerConfig {
            stream_name: env::var("TRIGGER_STREAM")
                .unwrap_or_else(|_| "trigger_events".to_string()),
            consumer_group: env::var("TRIGGER_GROUP")
                .unwrap_or_else(|_| "chatkeeper_workers".to_string()),
            consumer_name: env::var("TRIGGER_CONSUMER_NAME")
                .unwrap_or_else(|_| "worker_1".to_string()),
            batch_size: env::var("TRIGGER_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            poll_interval_ms: env::var("TRIGGER_POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
        }
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 验证数据库地址
        if !self.firebase.database_url.starts_with("http") {
            return Err(ConfigError::InvalidFirebaseConfig(
                "Database URL must be an http(s) address".to_string(),
            ));
        }

        if self.firebase.auth_domain.trim().is_empty() {
            return Err(ConfigError::InvalidFirebaseConfig(
                "Auth domain cannot be empty".to_string(),
            ));
        }

        // 验证变换器类型
        if !matches!(
            self.moderation.transformer.as_str(),
            "imagemagick" | "builtin"
        ) {
            return Err(ConfigError::InvalidModerationConfig(format!(
                "Unknown transformer kind: {}",
                self.moderation.transformer
            )));
        }

        if self.moderation.scratch_dir.trim().is_empty() {
            return Err(ConfigError::InvalidModerationConfig(
                "Scratch directory cannot be empty".to_string(),
            ));
        }

        // 验证消费参数
        if self.triggers.batch_size <= 0 {
            return Err(ConfigError::InvalidTriggerConfig(
                "Batch size must be greater than 0".to_string(),
            ));
        }

        if self.triggers.stream_name.trim().is_empty()
            || self.triggers.consumer_group.trim().is_empty()
            || self.triggers.consumer_name.trim().is_empty()
        {
            return Err(ConfigError::InvalidTriggerConfig(
                "Stream, group and consumer names cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid Firebase configuration: {0}")]
    InvalidFirebaseConfig(String),
    #[error("Invalid moderation configuration: {0}")]
    InvalidModerationConfig(String),
    #[error("Invalid trigger configuration: {0}")]
    InvalidTriggerConfig(String),
    #[error("Environment variable error: {0}")]
    EnvVarError(#[from] std::env::VarError),
}

impl Default for AppConfig {
    /// 默认配置使用开发环境版本
    /// 注意：生产环境应该明确调用 from_env() 而不是依赖默认值
    fn default() -> Self {
        Self::from_env_with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_with_defaults() {
        let config = AppConfig::from_env_with_defaults();
        assert!(!config.firebase.database_url.is_empty());
        assert!(!config.fcm.server_key.is_empty());
        assert!(config.triggers.batch_size > 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_click_link_uses_auth_domain() {
        let firebase = FirebaseConfig {
            database_url: "https://friendlychat.firebaseio.com".to_string(),
            auth_domain: "friendlychat.firebaseapp.com".to_string(),
        };
        assert_eq!(firebase.click_link(), "https://friendlychat.firebaseapp.com");
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::from_env_with_defaults();
        assert!(config.validate().is_ok());

        // 非 http 的数据库地址被拒绝
        config.firebase.database_url = "friendlychat.firebaseio.com".to_string();
        assert!(config.validate().is_err());
        config.firebase.database_url = "https://friendlychat.firebaseio.com".to_string();

        // 未知的变换器类型被拒绝
        config.moderation.transformer = "pixelate".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("transformer kind"));
        config.moderation.transformer = "builtin".to_string();

        // 批大小必须为正
        config.triggers.batch_size = 0;
        assert!(config.validate().is_err());
    }
}
