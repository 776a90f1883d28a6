//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod complaint;
pub mod event_publisher;
pub mod notification;
pub mod role_policy;
pub mod stats;
pub mod team;
pub mod upload;
pub mod vote;

pub use account::AccountService;
pub use complaint::{ComplaintAction, ComplaintService};
pub use event_publisher::{EventPublisher, EventPublisherService, NoOpEventPublisher};
pub use notification::NotificationService;
pub use role_policy::RolePolicy;
pub use stats::StatsService;
pub use team::TeamService;
pub use upload::UploadService;
pub use vote::VoteService;
