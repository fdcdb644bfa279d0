//! Google Vision API 适配器
//!
//! 通过 `images:annotate` 接口做网页实体识别与安全检测，
//! 图像以 `gs://<bucket>/<path>` 引用，不经过本地。

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use application::errors::ClassificationError;
use application::vision::VisionClassifier;
use domain::{SafeSearchVerdict, WebEntity};

const WEB_DETECTION: &str = "WEB_DETECTION";
const SAFE_SEARCH_DETECTION: &str = "SAFE_SEARCH_DETECTION";

/// Vision API 分类器
pub struct GoogleVisionClassifier {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GoogleVisionClassifier {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// 发起一次单特征的标注请求，返回首个响应
    async fn annotate(
        &self,
        bucket: &str,
        path: &str,
        feature: &str,
    ) -> Result<Value, ClassificationError> {
        let url = format!("{}/v1/images:annotate?key={}", self.endpoint, self.api_key);
        let body = json!({
            "requests": [{
                "image": { "source": { "gcsImageUri": format!("gs://{}/{}", bucket, path) } },
                "features": [{ "type": feature }],
            }]
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|err| ClassificationError::Request {
                message: err.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ClassificationError::Request {
                message: format!("标注请求返回状态 {}", response.status()),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| ClassificationError::InvalidResponse {
                message: err.to_string(),
            })?;

        let first = body
            .get("responses")
            .and_then(|responses| responses.get(0))
            .cloned()
            .ok_or_else(|| ClassificationError::InvalidResponse {
                message: "响应缺少 responses 数组".to_string(),
            })?;

        if let Some(error) = first.get("error") {
            return Err(ClassificationError::Request {
                message: format!("标注失败: {}", error),
            });
        }

        Ok(first)
    }
}

#[async_trait]
impl VisionClassifier for GoogleVisionClassifier {
    async fn detect_entities(
        &self,
        bucket: &str,
        path: &str,
    ) -> Result<Vec<WebEntity>, ClassificationError> {
        let response = self.annotate(bucket, path, WEB_DETECTION).await?;

        // 没有识别结果时接口直接省略 webDetection 字段
        let entities: Vec<WebEntity> = response
            .get("webDetection")
            .and_then(|detection| detection.get("webEntities"))
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        let description = entry.get("description")?.as_str()?;
                        Some(WebEntity {
                            description: description.to_string(),
                            score: entry
                                .get("score")
                                .and_then(Value::as_f64)
                                .unwrap_or_default() as f32,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        debug!(bucket, object = path, entities = entities.len(), "实体识别完成");
        Ok(entities)
    }

    async fn detect_safe_search(
        &self,
        bucket: &str,
        path: &str,
    ) -> Result<SafeSearchVerdict, ClassificationError> {
        let response = self.annotate(bucket, path, SAFE_SEARCH_DETECTION).await?;

        let annotation = response.get("safeSearchAnnotation").ok_or_else(|| {
            ClassificationError::InvalidResponse {
                message: "响应缺少 safeSearchAnnotation".to_string(),
            }
        })?;

        let verdict = SafeSearchVerdict {
            adult: likelihood_flag(annotation.get("adult")),
            violence: likelihood_flag(annotation.get("violence")),
        };

        debug!(
            bucket,
            object = path,
            adult = verdict.adult,
            violence = verdict.violence,
            "安全检测完成"
        );
        Ok(verdict)
    }
}

/// 可能性字符串转布尔判定，LIKELY 及以上视为命中
fn likelihood_flag(value: Option<&Value>) -> bool {
    matches!(
        value.and_then(Value::as_str),
        Some("LIKELY") | Some("VERY_LIKELY")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_likelihood_flag_thresholds() {
        assert!(likelihood_flag(Some(&json!("LIKELY"))));
        assert!(likelihood_flag(Some(&json!("VERY_LIKELY"))));

        assert!(!likelihood_flag(Some(&json!("POSSIBLE"))));
        assert!(!likelihood_flag(Some(&json!("UNLIKELY"))));
        assert!(!likelihood_flag(Some(&json!("VERY_UNLIKELY"))));
        assert!(!likelihood_flag(Some(&json!("UNKNOWN"))));
        assert!(!likelihood_flag(None));
    }
}
