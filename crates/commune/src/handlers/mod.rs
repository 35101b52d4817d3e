pub mod announcements;
pub mod attendees;
pub mod error;
pub mod events;
pub mod health;
pub mod home;
pub mod memberships;
pub mod units;

pub use error::AppError;
