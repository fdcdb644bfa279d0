//! 管道端到端测试
//!
//! 用内存适配器和内置模糊变换器串起真实的服务实现，
//! 覆盖审核、重复触发短路与通知分发三个完整场景。

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use image::{Rgba, RgbaImage};

use application::errors::{ClassificationError, PushError, StorageError};
use application::object_store::ObjectStore;
use application::push::{DeliveryError, DeliveryErrorKind, DeliveryOutcome, PushSender};
use application::services::{
    FanoutOutcome, ModerationOutcome, ModerationService, ModerationServiceDependencies,
    NotificationService, NotificationServiceDependencies, WelcomeService,
    WelcomeServiceDependencies,
};
use application::vision::VisionClassifier;
use application::TokenRegistry;
use domain::{
    BotProfile, ChatMessage, DeviceToken, MessageId, MessageWriteEvent, NotificationPayload,
    ObjectChangeEvent, SafeSearchVerdict, TriggerEvent, UserCreatedEvent, WebEntity,
};
use infrastructure::{
    GaussianBlurTransformer, InMemoryMessageStore, InMemoryTokenRegistry, TriggerDispatcher,
};

/// 以本地文件模拟对象存储，记录每次下载与上传
struct LocalObjectStore {
    source: PathBuf,
    uploads: Mutex<Vec<(String, Vec<u8>)>>,
}

impl LocalObjectStore {
    fn new(source: PathBuf) -> Self {
        Self {
            source,
            uploads: Mutex::new(Vec::new()),
        }
    }

    fn uploads(&self) -> Vec<(String, Vec<u8>)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn download(&self, _bucket: &str, _path: &str, dest: &Path) -> Result<(), StorageError> {
        tokio::fs::copy(&self.source, dest)
            .await
            .map_err(|err| StorageError::Download {
                message: err.to_string(),
            })?;
        Ok(())
    }

    async fn upload(&self, _bucket: &str, src: &Path, path: &str) -> Result<(), StorageError> {
        let bytes = tokio::fs::read(src).await.map_err(|err| StorageError::Upload {
            message: err.to_string(),
        })?;
        self.uploads
            .lock()
            .unwrap()
            .push((path.to_string(), bytes));
        Ok(())
    }
}

/// 返回固定结果的分类器，记录每次调用
struct FakeVision {
    entities: Vec<WebEntity>,
    verdict: SafeSearchVerdict,
    calls: Mutex<Vec<String>>,
}

impl FakeVision {
    fn new(entities: Vec<WebEntity>, verdict: SafeSearchVerdict) -> Self {
        Self {
            entities,
            verdict,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionClassifier for FakeVision {
    async fn detect_entities(
        &self,
        _bucket: &str,
        _path: &str,
    ) -> Result<Vec<WebEntity>, ClassificationError> {
        self.calls.lock().unwrap().push("entities".to_string());
        Ok(self.entities.clone())
    }

    async fn detect_safe_search(
        &self,
        _bucket: &str,
        _path: &str,
    ) -> Result<SafeSearchVerdict, ClassificationError> {
        self.calls.lock().unwrap().push("safe_search".to_string());
        Ok(self.verdict)
    }
}

/// 返回预设送达结果的推送发送器
struct FakePush {
    outcomes: Vec<DeliveryOutcome>,
    calls: Mutex<Vec<Vec<DeviceToken>>>,
}

impl FakePush {
    fn new(outcomes: Vec<DeliveryOutcome>) -> Self {
        Self {
            outcomes,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Vec<DeviceToken>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushSender for FakePush {
    async fn send(
        &self,
        tokens: &[DeviceToken],
        _payload: &NotificationPayload,
    ) -> Result<Vec<DeliveryOutcome>, PushError> {
        self.calls.lock().unwrap().push(tokens.to_vec());
        Ok(self.outcomes.clone())
    }
}

fn create_bot() -> BotProfile {
    BotProfile::new("Chat Bot", "/images/bot-icon.png").unwrap()
}

fn create_scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pipeline-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn create_source_image(dir: &Path) -> PathBuf {
    let path = dir.join("source.png");
    let mut image = RgbaImage::new(16, 16);
    for (x, _, pixel) in image.enumerate_pixels_mut() {
        *pixel = if x < 8 {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        };
    }
    image.save(&path).unwrap();
    path
}

fn create_object_event(created_offset_secs: i64) -> ObjectChangeEvent {
    let created = Utc::now();
    ObjectChangeEvent {
        bucket: "chat-images".to_string(),
        name: Some("images/msg1/photo.png".to_string()),
        time_created: created,
        updated: created + Duration::seconds(created_offset_secs),
        exists: true,
        timestamp: created,
    }
}

struct ModerationHarness {
    service: ModerationService,
    object_store: Arc<LocalObjectStore>,
    vision: Arc<FakeVision>,
    message_store: Arc<InMemoryMessageStore>,
    scratch_dir: PathBuf,
}

fn create_moderation_harness(
    entities: Vec<WebEntity>,
    verdict: SafeSearchVerdict,
) -> ModerationHarness {
    let scratch_dir = create_scratch_dir();
    let source = create_source_image(&scratch_dir);

    let object_store = Arc::new(LocalObjectStore::new(source));
    let vision = Arc::new(FakeVision::new(entities, verdict));
    let message_store = Arc::new(InMemoryMessageStore::new());
    message_store.insert_with_id(
        MessageId::new("msg1"),
        ChatMessage::user("Ann", "/ann.png", None),
    );

    let service = ModerationService::new(
        ModerationServiceDependencies {
            object_store: object_store.clone(),
            vision: vision.clone(),
            transformer: Arc::new(GaussianBlurTransformer::new(4.0)),
            message_store: message_store.clone(),
        },
        create_bot(),
        scratch_dir.clone(),
    );

    ModerationHarness {
        service,
        object_store,
        vision,
        message_store,
        scratch_dir,
    }
}

#[tokio::test]
async fn test_unsafe_image_is_blurred_and_flagged() {
    let harness = create_moderation_harness(
        vec![WebEntity {
            description: "tiger".to_string(),
            score: 0.91,
        }],
        SafeSearchVerdict {
            adult: true,
            violence: false,
        },
    );

    let outcome = harness
        .service
        .handle_object_change(&create_object_event(0))
        .await
        .unwrap();
    assert_eq!(outcome, ModerationOutcome::Flagged);

    // 机器人先猜实体，随后写入警告
    let messages = harness.message_store.messages();
    let texts: Vec<_> = messages
        .iter()
        .filter_map(|(_, message)| message.text.clone())
        .collect();
    assert!(texts.contains(&"That looks like a tiger to me!".to_string()));
    assert!(texts.contains(&"I don't like that image.  BAD!".to_string()));

    // 模糊后的文件覆盖了原对象路径
    let uploads = harness.object_store.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, "images/msg1/photo.png");
    let original = std::fs::read(harness.scratch_dir.join("source.png")).unwrap();
    assert_ne!(uploads[0].1, original);

    // 所属消息被打上审核标记
    let flagged = harness
        .message_store
        .get(&MessageId::new("msg1"))
        .unwrap();
    assert_eq!(flagged.moderated, Some(true));

    // 临时文件已清理
    let leftovers: Vec<_> = std::fs::read_dir(&harness.scratch_dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name() != "source.png")
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_retried_object_short_circuits_without_writes() {
    let harness = create_moderation_harness(
        vec![WebEntity {
            description: "tiger".to_string(),
            score: 0.91,
        }],
        SafeSearchVerdict {
            adult: true,
            violence: false,
        },
    );

    // 上一次处理回传文件后 updated 已偏离 time_created
    let outcome = harness
        .service
        .handle_object_change(&create_object_event(5))
        .await
        .unwrap();
    assert_eq!(outcome, ModerationOutcome::AlreadyProcessed);

    assert!(harness.vision.calls().is_empty());
    assert!(harness.object_store.uploads().is_empty());
    let message = harness
        .message_store
        .get(&MessageId::new("msg1"))
        .unwrap();
    assert!(message.moderated.is_none());
    assert_eq!(harness.message_store.messages().len(), 1);
}

#[tokio::test]
async fn test_clean_image_is_left_untouched() {
    let harness = create_moderation_harness(
        Vec::new(),
        SafeSearchVerdict {
            adult: false,
            violence: false,
        },
    );

    let outcome = harness
        .service
        .handle_object_change(&create_object_event(0))
        .await
        .unwrap();
    assert_eq!(outcome, ModerationOutcome::Clean);

    assert!(harness.object_store.uploads().is_empty());
    assert_eq!(harness.message_store.messages().len(), 1);
}

#[tokio::test]
async fn test_invalid_token_is_pruned_after_fanout() {
    let registry = Arc::new(InMemoryTokenRegistry::with_tokens([
        DeviceToken::new("t1"),
        DeviceToken::new("t2"),
    ]));
    let push = Arc::new(FakePush::new(vec![
        DeliveryOutcome::Delivered,
        DeliveryOutcome::Failed(DeliveryError::new(
            DeliveryErrorKind::InvalidToken,
            "InvalidRegistration",
        )),
    ]));

    let service = NotificationService::new(
        NotificationServiceDependencies {
            registry: registry.clone(),
            push: push.clone(),
        },
        "/images/profile_placeholder.png",
        "https://friendlychat.firebaseapp.com",
    );

    let event = MessageWriteEvent {
        message_id: MessageId::new("msg2"),
        previous: None,
        current: ChatMessage::user("Ann", "", Some("hi".into())),
        timestamp: Utc::now(),
    };

    let outcome = service.handle_message_write(&event).await.unwrap();
    assert_eq!(
        outcome,
        FanoutOutcome::Dispatched {
            delivered: 1,
            pruned: 1,
            failed: 0,
        }
    );

    // 只有 t2 被移除，t1 保留
    assert_eq!(registry.list().await.unwrap(), vec![DeviceToken::new("t1")]);
    assert_eq!(registry.removed(), vec![DeviceToken::new("t2")]);
    assert_eq!(push.calls().len(), 1);
}

#[tokio::test]
async fn test_dispatcher_routes_trigger_events() {
    let harness = create_moderation_harness(
        Vec::new(),
        SafeSearchVerdict {
            adult: false,
            violence: false,
        },
    );
    let registry = Arc::new(InMemoryTokenRegistry::new());
    let push = Arc::new(FakePush::new(Vec::new()));

    let notification = NotificationService::new(
        NotificationServiceDependencies {
            registry,
            push: push.clone(),
        },
        "/images/profile_placeholder.png",
        "https://friendlychat.firebaseapp.com",
    );
    let welcome = WelcomeService::new(
        WelcomeServiceDependencies {
            message_store: harness.message_store.clone(),
        },
        create_bot(),
    );
    let dispatcher = TriggerDispatcher::new(
        Arc::new(harness.service),
        Arc::new(notification),
        Arc::new(welcome),
    );

    // 用户注册事件路由到欢迎服务
    dispatcher
        .dispatch(TriggerEvent::UserCreated(UserCreatedEvent {
            user_id: "uid-1".to_string(),
            display_name: Some("Ann".to_string()),
            timestamp: Utc::now(),
        }))
        .await
        .unwrap();

    let texts: Vec<_> = harness
        .message_store
        .messages()
        .iter()
        .filter_map(|(_, message)| message.text.clone())
        .collect();
    assert!(texts.contains(&"Ann signed in for the first time! Welcome!".to_string()));

    // 审核标记写入等更新事件不触发推送
    dispatcher
        .dispatch(TriggerEvent::MessageWritten(MessageWriteEvent {
            message_id: MessageId::new("msg1"),
            previous: Some(ChatMessage::user("Ann", "/ann.png", None)),
            current: ChatMessage::user("Ann", "/ann.png", None),
            timestamp: Utc::now(),
        }))
        .await
        .unwrap();
    assert!(push.calls().is_empty());
}
