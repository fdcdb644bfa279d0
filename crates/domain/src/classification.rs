//! 图像分类结果模型
//!
//! 网页实体识别与安全检测的纯数据模型及选择规则，
//! 具体的识别算法由基础设施层的分类服务提供。

use serde::{Deserialize, Serialize};

/// 网页实体识别结果中的一个实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebEntity {
    /// 实体描述
    pub description: String,
    /// 置信度得分
    pub score: f32,
}

/// 从实体列表中选出得分最高的实体
///
/// 得分相同时保留先出现的实体，结果只取决于输入顺序。
pub fn best_entity(entities: &[WebEntity]) -> Option<&WebEntity> {
    entities.iter().reduce(|best, entity| {
        if entity.score > best.score {
            entity
        } else {
            best
        }
    })
}

/// 安全检测判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeSearchVerdict {
    /// 成人内容
    pub adult: bool,
    /// 暴力内容
    pub violence: bool,
}

impl SafeSearchVerdict {
    /// 任一维度命中即视为违规
    pub fn is_flagged(&self) -> bool {
        self.adult || self.violence
    }
}
