mod moderation_service;
mod notification_service;
mod welcome_service;


pub use moderation_service::{
    IgnoreReason, ModerationOutcome, ModerationService, ModerationServiceDependencies,
};
pub use notification_service::{FanoutOutcome, NotificationService, NotificationServiceDependencies};
pub use welcome_service::{WelcomeService, WelcomeServiceDependencies};
