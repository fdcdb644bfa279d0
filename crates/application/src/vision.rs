//! 图像分类能力接口

use std::sync::Arc;

use async_trait::async_trait;
use domain::{SafeSearchVerdict, WebEntity};

use crate::errors::ClassificationError;

/// 图像分类能力
///
/// 图像以对象存储中的 `(bucket, path)` 定位，分类在远端进行，
/// 不需要把图像下载到本地。
#[async_trait]
pub trait VisionClassifier: Send + Sync {
    /// 识别图像中的网页实体
    async fn detect_entities(
        &self,
        bucket: &str,
        path: &str,
    ) -> Result<Vec<WebEntity>, ClassificationError>;

    /// 检测图像是否包含违规内容
    async fn detect_safe_search(
        &self,
        bucket: &str,
        path: &str,
    ) -> Result<SafeSearchVerdict, ClassificationError>;
}

/// 图像分类器的共享引用
pub type VisionClassifierRef = Arc<dyn VisionClassifier>;
