//! 触发事件流消费者
//!
//! 从 Redis Stream 以消费者组方式读取触发事件，按事件类型分发到
//! 对应的管道服务。每个事件在独立任务中处理，不同事件互不阻塞。
//!
//! 确认策略：审核失败且重试可能成功的事件不确认，留待重新投递；
//! 通知与欢迎消息的失败只记录日志后确认，不做重放。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::streams::StreamReadReply;
use tracing::{error, info, warn};

use application::errors::ApplicationError;
use application::services::{ModerationService, NotificationService, WelcomeService};
use domain::TriggerEvent;

use crate::error::{ConsumerError, ConsumerResult};

/// 消费者配置
#[derive(Debug, Clone)]
pub struct TriggerConsumerConfig {
    pub stream_name: String,
    pub consumer_group: String,
    pub consumer_name: String,
    pub batch_size: i64,
    pub poll_interval: Duration,
    pub error_backoff: Duration,
}

impl Default for TriggerConsumerConfig {
    fn default() -> Self {
        Self {
            stream_name: "trigger_events".to_string(),
            consumer_group: "chatkeeper_workers".to_string(),
            consumer_name: "worker_1".to_string(),
            batch_size: 10,
            poll_interval: Duration::from_secs(1),
            error_backoff: Duration::from_secs(5),
        }
    }
}

/// 把触发事件路由到管道服务
pub struct TriggerDispatcher {
    moderation: Arc<ModerationService>,
    notification: Arc<NotificationService>,
    welcome: Arc<WelcomeService>,
}

impl TriggerDispatcher {
    pub fn new(
        moderation: Arc<ModerationService>,
        notification: Arc<NotificationService>,
        welcome: Arc<WelcomeService>,
    ) -> Self {
        Self {
            moderation,
            notification,
            welcome,
        }
    }

    /// 处理一个触发事件
    pub async fn dispatch(&self, event: TriggerEvent) -> Result<(), ApplicationError> {
        match event {
            TriggerEvent::ObjectChanged(event) => {
                let outcome = self.moderation.handle_object_change(&event).await?;
                info!(bucket = %event.bucket, outcome = ?outcome, "对象变更事件处理完成");
            }
            TriggerEvent::MessageWritten(event) => {
                let outcome = self.notification.handle_message_write(&event).await?;
                info!(message_id = %event.message_id, outcome = ?outcome, "消息写入事件处理完成");
            }
            TriggerEvent::UserCreated(event) => {
                let message_id = self.welcome.handle_user_created(&event).await?;
                info!(user_id = %event.user_id, message_id = %message_id, "用户注册事件处理完成");
            }
        }
        Ok(())
    }
}

/// 触发事件消费者主循环
pub struct TriggerConsumer {
    redis_client: Arc<redis::Client>,
    dispatcher: Arc<TriggerDispatcher>,
    config: TriggerConsumerConfig,
}

impl TriggerConsumer {
    pub fn new(
        redis_client: Arc<redis::Client>,
        dispatcher: Arc<TriggerDispatcher>,
        config: TriggerConsumerConfig,
    ) -> Self {
        Self {
            redis_client,
            dispatcher,
            config,
        }
    }

    /// 启动消费者主循环
    pub async fn run(&self) -> ConsumerResult<()> {
        info!(
            stream_name = %self.config.stream_name,
            consumer_group = %self.config.consumer_group,
            consumer_name = %self.config.consumer_name,
            "触发事件消费者开始运行"
        );

        self.ensure_consumer_group().await?;

        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;

        loop {
            match self.process_batch(&mut conn).await {
                Ok(dispatched) => {
                    if dispatched > 0 {
                        info!(count = dispatched, "已分发触发事件批次");
                    }
                }
                Err(e) => {
                    error!(error = %e, "读取触发事件批次失败");
                    tokio::time::sleep(self.config.error_backoff).await;
                }
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// 确保消费者组存在
    async fn ensure_consumer_group(&self) -> ConsumerResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;

        // 尝试创建消费者组，忽略 BUSYGROUP 错误（组已存在）
        let result: Result<String, redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("0")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => {
                info!(
                    stream_name = %self.config.stream_name,
                    group = %self.config.consumer_group,
                    "消费者组已创建"
                );
                Ok(())
            }
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                info!(
                    stream_name = %self.config.stream_name,
                    group = %self.config.consumer_group,
                    "消费者组已存在"
                );
                Ok(())
            }
            Err(e) => Err(ConsumerError::GroupError {
                message: e.to_string(),
            }),
        }
    }

    /// 读取并分发一个批次的事件，返回已分发的事件数
    async fn process_batch(&self, conn: &mut MultiplexedConnection) -> ConsumerResult<usize> {
        let stream_reply: StreamReadReply = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(&self.config.consumer_name)
            .arg("COUNT")
            .arg(self.config.batch_size)
            .arg("BLOCK")
            .arg(1000)
            .arg("STREAMS")
            .arg(&self.config.stream_name)
            .arg(">")
            .query_async(conn)
            .await?;

        if stream_reply.keys.is_empty() {
            return Ok(0);
        }

        let mut dispatched = 0;

        for stream_key in &stream_reply.keys {
            for stream_id in &stream_key.ids {
                let entry_id = stream_id.id.clone();

                let event = match parse_event(&stream_id.map) {
                    Some(event) => event,
                    None => {
                        warn!(entry_id = %entry_id, "无法解析触发事件，直接确认跳过");
                        ack_entry(
                            conn,
                            &self.config.stream_name,
                            &self.config.consumer_group,
                            &entry_id,
                        )
                        .await;
                        continue;
                    }
                };

                // 各触发独立处理，失败且值得重试的事件不确认，等待重新投递
                let dispatcher = self.dispatcher.clone();
                let mut task_conn = conn.clone();
                let stream_name = self.config.stream_name.clone();
                let consumer_group = self.config.consumer_group.clone();

                tokio::spawn(async move {
                    let event_type = event.event_type();
                    match dispatcher.dispatch(event).await {
                        Ok(()) => {
                            ack_entry(&mut task_conn, &stream_name, &consumer_group, &entry_id)
                                .await;
                        }
                        Err(err) if err.requires_redelivery() => {
                            error!(
                                entry_id = %entry_id,
                                event_type,
                                error = %err,
                                "事件处理失败，保留待重新投递"
                            );
                        }
                        Err(err) => {
                            error!(
                                entry_id = %entry_id,
                                event_type,
                                error = %err,
                                "事件处理失败，确认后不再重试"
                            );
                            ack_entry(&mut task_conn, &stream_name, &consumer_group, &entry_id)
                                .await;
                        }
                    }
                });

                dispatched += 1;
            }
        }

        Ok(dispatched)
    }
}

/// 确认一个流条目，失败只记录日志
async fn ack_entry(conn: &mut MultiplexedConnection, stream: &str, group: &str, entry_id: &str) {
    let result: Result<i64, redis::RedisError> = redis::cmd("XACK")
        .arg(stream)
        .arg(group)
        .arg(entry_id)
        .query_async(conn)
        .await;

    if let Err(err) = result {
        warn!(entry_id = %entry_id, error = %err, "事件确认失败");
    }
}

/// 解析流条目的 payload 字段为触发事件
fn parse_event(fields: &HashMap<String, redis::Value>) -> Option<TriggerEvent> {
    let payload = match fields.get("payload") {
        Some(redis::Value::BulkString(bytes)) => String::from_utf8(bytes.clone()).ok()?,
        _ => return None,
    };
    serde_json::from_str(&payload).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::{ChatMessage, MessageId, MessageWriteEvent};

    fn fields_with_payload(payload: &str) -> HashMap<String, redis::Value> {
        let mut fields = HashMap::new();
        fields.insert(
            "payload".to_string(),
            redis::Value::BulkString(payload.as_bytes().to_vec()),
        );
        fields
    }

    #[test]
    fn test_parse_event_roundtrip() {
        let event = TriggerEvent::MessageWritten(MessageWriteEvent {
            message_id: MessageId::new("msg1"),
            previous: None,
            current: ChatMessage::user("Ann", "", Some("hi".into())),
            timestamp: Utc::now(),
        });
        let payload = serde_json::to_string(&event).unwrap();

        let parsed = parse_event(&fields_with_payload(&payload)).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_parse_event_missing_payload_field() {
        assert!(parse_event(&HashMap::new()).is_none());
    }

    #[test]
    fn test_parse_event_invalid_json() {
        assert!(parse_event(&fields_with_payload("not json")).is_none());
    }

    #[test]
    fn test_default_config() {
        let config = TriggerConsumerConfig::default();
        assert_eq!(config.stream_name, "trigger_events");
        assert_eq!(config.consumer_group, "chatkeeper_workers");
        assert_eq!(config.batch_size, 10);
    }
}
