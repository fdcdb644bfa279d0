//! 应用层实现。
//!
//! 这里提供围绕领域模型的管道服务，以及对外部适配器
//! （对象存储、图像分类、图像变换、消息存储、推送网关）的能力抽象。

pub mod errors;
pub mod message_store;
pub mod object_store;
pub mod push;
pub mod registry;
pub mod scratch;
pub mod services;
pub mod transformer;
pub mod vision;

pub use errors::{
    ApplicationError, ApplicationResult, ClassificationError, FanoutError, ModerationError,
    PushError, RegistryError, StorageError, StoreError, TransformError,
};
pub use message_store::{MessageStore, MessageStoreRef};
pub use object_store::{ObjectStore, ObjectStoreRef};
pub use push::{DeliveryError, DeliveryErrorKind, DeliveryOutcome, PushSender, PushSenderRef};
pub use registry::{TokenRegistry, TokenRegistryRef};
pub use scratch::ScratchFile;
pub use services::{
    FanoutOutcome, IgnoreReason, ModerationOutcome, ModerationService,
    ModerationServiceDependencies, NotificationService, NotificationServiceDependencies,
    WelcomeService, WelcomeServiceDependencies,
};
pub use transformer::{ImageTransformer, ImageTransformerRef};
pub use vision::{VisionClassifier, VisionClassifierRef};
