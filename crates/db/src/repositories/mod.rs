//! Database repositories.

mod complaint;
mod notification;
mod upload;
mod user;
mod user_profile;
mod vote;

pub use complaint::{ComplaintFilter, ComplaintRepository};
pub use notification::NotificationRepository;
pub use upload::UploadRepository;
pub use user::UserRepository;
pub use user_profile::UserProfileRepository;
pub use vote::VoteRepository;
