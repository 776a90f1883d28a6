//! Database entities.

pub mod complaint;
pub mod notification;
pub mod upload;
pub mod user;
pub mod user_profile;
pub mod vote;

pub use complaint::Entity as Complaint;
pub use notification::Entity as Notification;
pub use upload::Entity as Upload;
pub use user::Entity as User;
pub use user_profile::Entity as UserProfile;
pub use vote::Entity as Vote;
