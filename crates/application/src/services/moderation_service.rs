//! 图片审核服务
//!
//! 处理存储对象变更事件：对新上传的图片并发执行实体识别与安全检测，
//! 违规图片下载到本地模糊处理后回传覆盖原对象，并在所属消息上写入审核标记。

use std::path::PathBuf;

use domain::{best_entity, BotProfile, ChatMessage, MessageId, ObjectChangeEvent, SafeSearchVerdict, StorageObjectMeta};
use tracing::{error, info, warn};

use crate::errors::ModerationError;
use crate::message_store::MessageStoreRef;
use crate::object_store::ObjectStoreRef;
use crate::scratch::ScratchFile;
use crate::transformer::ImageTransformerRef;
use crate::vision::VisionClassifierRef;

/// 违规图片的警告文案，双空格是有意保留的
const MODERATION_WARNING: &str = "I don't like that image.  BAD!";

/// 审核流程的终态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationOutcome {
    /// 事件不涉及可审核的对象
    Ignored(IgnoreReason),
    /// 对象此前已被处理过
    AlreadyProcessed,
    /// 图片内容安全
    Clean,
    /// 图片违规并已模糊处理
    Flagged,
}

/// 忽略事件的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// 对象删除事件
    Deleted,
    /// 事件未携带对象路径
    NoObjectName,
}

pub struct ModerationServiceDependencies {
    pub object_store: ObjectStoreRef,
    pub vision: VisionClassifierRef,
    pub transformer: ImageTransformerRef,
    pub message_store: MessageStoreRef,
}

pub struct ModerationService {
    deps: ModerationServiceDependencies,
    bot: BotProfile,
    scratch_dir: PathBuf,
}

impl ModerationService {
    pub fn new(
        deps: ModerationServiceDependencies,
        bot: BotProfile,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            deps,
            bot,
            scratch_dir: scratch_dir.into(),
        }
    }

    /// 处理一次存储对象变更
    ///
    /// 创建时间与更新时间不一致说明对象被覆盖过，直接跳过；
    /// 分类的两个分支并发执行，任一分支失败不影响另一分支，
    /// 也不使整个触发失败。
    pub async fn handle_object_change(
        &self,
        event: &ObjectChangeEvent,
    ) -> Result<ModerationOutcome, ModerationError> {
        if !event.exists {
            info!(bucket = %event.bucket, "对象已删除，跳过审核");
            return Ok(ModerationOutcome::Ignored(IgnoreReason::Deleted));
        }

        let meta = match event.object() {
            Some(meta) => meta,
            None => {
                info!(bucket = %event.bucket, "事件未携带对象路径，跳过审核");
                return Ok(ModerationOutcome::Ignored(IgnoreReason::NoObjectName));
            }
        };

        if !meta.is_newly_created() {
            info!(object = %meta.name, "对象已被处理过，跳过审核");
            return Ok(ModerationOutcome::AlreadyProcessed);
        }

        let (_, verdict) = tokio::join!(self.guess_entity(&meta), self.check_safety(&meta));

        match verdict {
            Some(verdict) if verdict.is_flagged() => {
                warn!(
                    object = %meta.name,
                    adult = verdict.adult,
                    violence = verdict.violence,
                    "图片命中违规内容"
                );

                let warning = ChatMessage::bot(&self.bot, MODERATION_WARNING);
                self.deps.message_store.append(warning).await?;

                self.moderate(&meta).await?;
                Ok(ModerationOutcome::Flagged)
            }
            _ => {
                info!(object = %meta.name, "图片内容安全");
                Ok(ModerationOutcome::Clean)
            }
        }
    }

    /// 实体识别分支：猜测图片内容并以机器人身份发消息
    async fn guess_entity(&self, meta: &StorageObjectMeta) {
        let entities = match self
            .deps
            .vision
            .detect_entities(&meta.bucket, &meta.name)
            .await
        {
            Ok(entities) => entities,
            Err(err) => {
                error!(object = %meta.name, error = %err, "实体识别失败");
                return;
            }
        };

        let entity = match best_entity(&entities) {
            Some(entity) => entity,
            None => {
                info!(object = %meta.name, "未识别出任何实体");
                return;
            }
        };

        info!(
            object = %meta.name,
            entity = %entity.description,
            score = entity.score,
            "识别出最可能的实体"
        );

        let guess = ChatMessage::bot(
            &self.bot,
            format!("That looks like a {} to me!", entity.description),
        );
        if let Err(err) = self.deps.message_store.append(guess).await {
            error!(object = %meta.name, error = %err, "实体猜测消息写入失败");
        }
    }

    /// 安全检测分支：失败时返回 None，按内容安全处理
    async fn check_safety(&self, meta: &StorageObjectMeta) -> Option<SafeSearchVerdict> {
        match self
            .deps
            .vision
            .detect_safe_search(&meta.bucket, &meta.name)
            .await
        {
            Ok(verdict) => Some(verdict),
            Err(err) => {
                error!(object = %meta.name, error = %err, "安全检测失败");
                None
            }
        }
    }

    /// 模糊处理链：下载、变换、回传、标记，任一步失败即中止
    async fn moderate(&self, meta: &StorageObjectMeta) -> Result<(), ModerationError> {
        let scratch = ScratchFile::for_object(&self.scratch_dir, &meta.name, meta.file_name());

        self.deps
            .object_store
            .download(&meta.bucket, &meta.name, scratch.path())
            .await?;

        self.deps.transformer.obscure(scratch.path()).await?;

        self.deps
            .object_store
            .upload(&meta.bucket, scratch.path(), &meta.name)
            .await?;

        let message_id = meta
            .message_id()
            .ok_or_else(|| ModerationError::Configuration {
                message: format!("对象路径缺少消息段: {}", meta.name),
            })?;

        self.deps
            .message_store
            .set_moderated(&MessageId::new(message_id))
            .await?;

        info!(object = %meta.name, message_id, "违规图片已模糊并标记");
        Ok(())
    }
}
