//! 内置高斯模糊变换器
//!
//! 纯 Rust 实现，工作进程不依赖本机安装 ImageMagick 时使用。
//! 解码与模糊是 CPU 密集操作，放在阻塞线程池里执行。

use std::path::Path;

use async_trait::async_trait;
use image::ImageError;
use tracing::debug;

use application::errors::TransformError;
use application::transformer::ImageTransformer;

/// 默认模糊强度，与 ImageMagick 的 `-blur 0x24` 对应
const DEFAULT_SIGMA: f32 = 24.0;

/// 基于 image 库的高斯模糊变换器
pub struct GaussianBlurTransformer {
    sigma: f32,
}

impl GaussianBlurTransformer {
    pub fn new(sigma: f32) -> Self {
        Self { sigma }
    }
}

impl Default for GaussianBlurTransformer {
    fn default() -> Self {
        Self::new(DEFAULT_SIGMA)
    }
}

#[async_trait]
impl ImageTransformer for GaussianBlurTransformer {
    async fn obscure(&self, path: &Path) -> Result<(), TransformError> {
        let sigma = self.sigma;
        let owned = path.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let image = image::open(&owned).map_err(map_image_error)?;
            image.blur(sigma).save(&owned).map_err(map_image_error)
        })
        .await
        .map_err(|err| TransformError::Process {
            message: format!("模糊任务异常终止: {}", err),
        })??;

        debug!(path = %path.display(), sigma, "图像已就地模糊");
        Ok(())
    }
}

fn map_image_error(err: ImageError) -> TransformError {
    match err {
        ImageError::IoError(io) => TransformError::Io {
            message: io.to_string(),
        },
        other => TransformError::Process {
            message: other.to_string(),
        },
    }
}
