mod error;
mod http_mapping;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use http_mapping::{repository_error_code, repository_error_to_status_code};
pub use traits::{
    AnnouncementRepository, AttendeeRepository, EventRepository, MembershipRepository,
    UnitRepository, UserRepository,
};
pub use types::{AnnouncementFilter, AttendeeFilter, EventFilter, UnitFilter};
