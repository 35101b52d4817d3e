use thiserror::Error;

/// Errors that can occur when validating a user record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserError {
    #[error("Username cannot be empty")]
    EmptyUsername,
    #[error("Username too long (max 255 characters)")]
    UsernameTooLong,
    #[error("Avatar URL too long (max 512 characters)")]
    AvatarUrlTooLong,
}

/// Errors that can occur when validating or re-parenting units.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("Unit name cannot be empty")]
    EmptyName,
    #[error("Unit name too long (max 255 characters)")]
    NameTooLong,
    #[error("A unit cannot be nested under itself or one of its descendants")]
    CyclicParent,
}

/// Errors that can occur when validating events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("Event title cannot be empty")]
    EmptyTitle,
    #[error("Event title too long (max 255 characters)")]
    TitleTooLong,
    #[error("Event location too long (max 255 characters)")]
    LocationTooLong,
    #[error("End time must not be before start time")]
    InvalidTimeRange,
}

/// Errors that can occur when validating announcements.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnnouncementError {
    #[error("Announcement title cannot be empty")]
    EmptyTitle,
    #[error("Announcement title too long (max 255 characters)")]
    TitleTooLong,
    #[error("Announcement content cannot be empty")]
    EmptyContent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_error_display() {
        assert_eq!(UnitError::EmptyName.to_string(), "Unit name cannot be empty");
        assert_eq!(
            UnitError::CyclicParent.to_string(),
            "A unit cannot be nested under itself or one of its descendants"
        );
    }

    #[test]
    fn test_event_error_display() {
        assert_eq!(
            EventError::InvalidTimeRange.to_string(),
            "End time must not be before start time"
        );
    }
}
