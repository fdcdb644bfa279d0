//! chatkeeper 工作进程
//!
//! 消费触发事件流，驱动图片审核、通知分发与欢迎消息三条管道。

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use application::{
    ImageTransformerRef, MessageStoreRef, ModerationService, ModerationServiceDependencies,
    NotificationService, NotificationServiceDependencies, ObjectStoreRef, PushSenderRef,
    TokenRegistryRef, VisionClassifierRef, WelcomeService, WelcomeServiceDependencies,
};
use config::AppConfig;
use domain::BotProfile;
use infrastructure::{
    FcmPushSender, GaussianBlurTransformer, GcsObjectStore, GoogleVisionClassifier,
    ImageMagickTransformer, RtdbMessageStore, RtdbTokenRegistry, TriggerConsumer,
    TriggerConsumerConfig, TriggerDispatcher,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("chatkeeper 启动中...");

    // 加载配置
    let app_config = AppConfig::from_env_with_defaults();
    app_config
        .validate()
        .map_err(|e| anyhow::anyhow!("配置验证失败: {}", e))?;

    // 外部服务共用一个带超时的 HTTP 客户端
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let bot = BotProfile::new(&app_config.bot.name, &app_config.bot.icon_url)
        .map_err(|e| anyhow::anyhow!("机器人配置无效: {}", e))?;

    // 构造外部能力适配器
    let object_store: ObjectStoreRef = Arc::new(GcsObjectStore::new(
        http_client.clone(),
        &app_config.google.storage_endpoint,
    ));
    let vision: VisionClassifierRef = Arc::new(GoogleVisionClassifier::new(
        http_client.clone(),
        &app_config.google.vision_endpoint,
        &app_config.google.vision_api_key,
    ));
    let transformer: ImageTransformerRef = match app_config.moderation.transformer.as_str() {
        "builtin" => Arc::new(GaussianBlurTransformer::default()),
        _ => Arc::new(ImageMagickTransformer::new(
            &app_config.moderation.convert_command,
        )),
    };
    let message_store: MessageStoreRef = Arc::new(RtdbMessageStore::new(
        http_client.clone(),
        &app_config.firebase.database_url,
    ));
    let registry: TokenRegistryRef = Arc::new(RtdbTokenRegistry::new(
        http_client.clone(),
        &app_config.firebase.database_url,
    ));
    let push: PushSenderRef = Arc::new(FcmPushSender::new(
        http_client,
        &app_config.fcm.endpoint,
        &app_config.fcm.server_key,
    ));

    // 组装管道服务
    let moderation = Arc::new(ModerationService::new(
        ModerationServiceDependencies {
            object_store,
            vision,
            transformer,
            message_store: message_store.clone(),
        },
        bot.clone(),
        app_config.moderation.scratch_dir.as_str(),
    ));
    let notification = Arc::new(NotificationService::new(
        NotificationServiceDependencies { registry, push },
        app_config.bot.placeholder_icon.as_str(),
        app_config.firebase.click_link(),
    ));
    let welcome = Arc::new(WelcomeService::new(
        WelcomeServiceDependencies { message_store },
        bot,
    ));

    // 启动触发事件消费
    let dispatcher = Arc::new(TriggerDispatcher::new(moderation, notification, welcome));
    let redis_client = Arc::new(redis::Client::open(app_config.redis.url.clone())?);
    let consumer_config = TriggerConsumerConfig {
        stream_name: app_config.triggers.stream_name.clone(),
        consumer_group: app_config.triggers.consumer_group.clone(),
        consumer_name: app_config.triggers.consumer_name.clone(),
        batch_size: app_config.triggers.batch_size,
        poll_interval: Duration::from_millis(app_config.triggers.poll_interval_ms),
        ..TriggerConsumerConfig::default()
    };
    let consumer = TriggerConsumer::new(redis_client, dispatcher, consumer_config);

    info!("chatkeeper 启动完成，开始处理触发事件...");
    consumer.run().await?;

    Ok(())
}
