//! 图像变换能力接口

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::TransformError;

/// 图像变换能力
#[async_trait]
pub trait ImageTransformer: Send + Sync {
    /// 就地模糊本地图像文件，使其内容不可辨认
    async fn obscure(&self, path: &Path) -> Result<(), TransformError>;
}

/// 图像变换器的共享引用
pub type ImageTransformerRef = Arc<dyn ImageTransformer>;
