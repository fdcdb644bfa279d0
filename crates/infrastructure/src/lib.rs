//! 基础设施层实现。
//!
//! 提供实时数据库、对象存储、图像分类、推送网关等外部服务的适配器，
//! 内置的图像模糊变换器与内存存储，以及触发事件流的消费入口。

pub mod blur;
pub mod consumer;
pub mod error;
pub mod fcm;
pub mod gcs;
pub mod magick;
pub mod memory;
pub mod rtdb;
pub mod vision_api;

pub use blur::GaussianBlurTransformer;
pub use consumer::{TriggerConsumer, TriggerConsumerConfig, TriggerDispatcher};
pub use error::{ConsumerError, ConsumerResult};
pub use fcm::FcmPushSender;
pub use gcs::GcsObjectStore;
pub use magick::ImageMagickTransformer;
pub use memory::{InMemoryMessageStore, InMemoryTokenRegistry};
pub use rtdb::{RtdbMessageStore, RtdbTokenRegistry};
pub use vision_api::GoogleVisionClassifier;
