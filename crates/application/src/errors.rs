//! 应用层错误定义
//!
//! 按能力接口划分的错误类型，以及审核与分发两条管道的聚合错误。

use thiserror::Error;

/// 对象存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// 下载失败
    #[error("对象下载失败: {message}")]
    Download { message: String },

    /// 上传失败
    #[error("对象上传失败: {message}")]
    Upload { message: String },
}

/// 图像分类错误
#[derive(Debug, Error)]
pub enum ClassificationError {
    /// 请求失败
    #[error("分类请求失败: {message}")]
    Request { message: String },

    /// 响应格式错误
    #[error("分类响应格式错误: {message}")]
    InvalidResponse { message: String },
}

/// 图像变换错误
#[derive(Debug, Error)]
pub enum TransformError {
    /// 变换执行失败
    #[error("图像变换失败: {message}")]
    Process { message: String },

    /// 图像文件读写失败
    #[error("图像文件读写失败: {message}")]
    Io { message: String },
}

/// 消息存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 请求失败
    #[error("消息存储请求失败: {message}")]
    Request { message: String },

    /// 响应格式错误
    #[error("消息存储响应格式错误: {message}")]
    InvalidResponse { message: String },

    /// 消息不存在
    #[error("消息不存在: {id}")]
    NotFound { id: String },
}

/// 令牌注册表错误
#[derive(Debug, Error)]
pub enum RegistryError {
    /// 请求失败
    #[error("令牌注册表请求失败: {message}")]
    Request { message: String },

    /// 响应格式错误
    #[error("令牌注册表响应格式错误: {message}")]
    InvalidResponse { message: String },
}

/// 推送发送错误（整批请求层面）
#[derive(Debug, Error)]
pub enum PushError {
    /// 请求失败
    #[error("推送请求失败: {message}")]
    Request { message: String },

    /// 响应格式错误
    #[error("推送响应格式错误: {message}")]
    InvalidResponse { message: String },
}

/// 审核管道错误
#[derive(Debug, Error)]
pub enum ModerationError {
    /// 对象存储错误
    #[error("对象存储错误: {0}")]
    Storage(#[from] StorageError),

    /// 图像变换错误
    #[error("图像变换错误: {0}")]
    Transform(#[from] TransformError),

    /// 消息存储错误
    #[error("消息存储错误: {0}")]
    Store(#[from] StoreError),

    /// 配置性错误
    #[error("配置错误: {message}")]
    Configuration { message: String },
}

impl ModerationError {
    /// 重试是否可能成功
    ///
    /// 对象路径缺少消息段属于配置问题，重投递不会改变结果。
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ModerationError::Configuration { .. })
    }
}

/// 通知分发管道错误
#[derive(Debug, Error)]
pub enum FanoutError {
    /// 令牌注册表错误
    #[error("令牌注册表错误: {0}")]
    Registry(#[from] RegistryError),

    /// 推送发送错误
    #[error("推送发送错误: {0}")]
    Push(#[from] PushError),

    /// 发送结果与令牌数量不一致
    #[error("发送结果数量不一致: 预期 {expected} 实际 {actual}")]
    Alignment { expected: usize, actual: usize },
}

/// 应用层错误类型
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 审核管道错误
    #[error("审核错误: {0}")]
    Moderation(#[from] ModerationError),

    /// 通知分发错误
    #[error("通知分发错误: {0}")]
    Fanout(#[from] FanoutError),

    /// 消息存储错误
    #[error("消息存储错误: {0}")]
    Store(#[from] StoreError),
}

impl ApplicationError {
    /// 该错误是否应当通过重投递恢复
    ///
    /// 审核失败重投递后可以继续；通知与欢迎消息的失败不重放。
    pub fn requires_redelivery(&self) -> bool {
        match self {
            ApplicationError::Moderation(err) => err.is_retryable(),
            ApplicationError::Fanout(_) => false,
            ApplicationError::Store(_) => false,
        }
    }
}

/// 应用层结果类型
pub type ApplicationResult<T> = Result<T, ApplicationError>;
