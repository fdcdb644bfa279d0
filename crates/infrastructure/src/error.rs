//! 触发事件消费错误类型定义

use thiserror::Error;

/// 触发事件消费错误
#[derive(Error, Debug)]
pub enum ConsumerError {
    /// 连接错误
    #[error("Redis 连接错误: {message}")]
    ConnectionError { message: String },

    /// 消费者组错误
    #[error("消费者组错误: {message}")]
    GroupError { message: String },

    /// 反序列化错误
    #[error("事件反序列化失败: {message}")]
    DeserializationError { message: String },
}

/// 消费结果类型
pub type ConsumerResult<T> = Result<T, ConsumerError>;

impl From<redis::RedisError> for ConsumerError {
    fn from(err: redis::RedisError) -> Self {
        ConsumerError::ConnectionError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ConsumerError {
    fn from(err: serde_json::Error) -> Self {
        ConsumerError::DeserializationError {
            message: err.to_string(),
        }
    }
}
