use async_trait::async_trait;
use uuid::Uuid;

use crate::community::{Announcement, Event, EventAttendee, Membership, Unit, User};

use super::{AnnouncementFilter, AttendeeFilter, EventFilter, Result, UnitFilter};

/// Repository for user accounts.
///
/// Implementations enforce unique `username` and unique `external_id` on both
/// create and update, returning [`RepositoryError::AlreadyExists`].
///
/// [`RepositoryError::AlreadyExists`]: super::RepositoryError::AlreadyExists
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Gets a user by their ID.
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Gets a user by the identity provider's id.
    async fn get_user_by_external_id(&self, external_id: &str) -> Result<Option<User>>;

    /// Gets a user by their (case-sensitive) username.
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Creates a new user.
    async fn create_user(&self, user: &User) -> Result<()>;

    /// Updates an existing user.
    async fn update_user(&self, user: &User) -> Result<()>;
}

/// Repository for units.
#[async_trait]
pub trait UnitRepository: Send + Sync {
    async fn get_unit(&self, id: Uuid) -> Result<Option<Unit>>;

    /// Lists units matching the filter, ordered by name.
    async fn list_units(&self, filter: &UnitFilter) -> Result<Vec<Unit>>;

    async fn create_unit(&self, unit: &Unit) -> Result<()>;

    async fn update_unit(&self, unit: &Unit) -> Result<()>;

    /// Deletes a unit. Child units are detached, and the unit's memberships,
    /// events and announcements are deleted with it.
    async fn delete_unit(&self, id: Uuid) -> Result<()>;
}

/// Repository for unit memberships.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    async fn get_membership(&self, unit_id: Uuid, user_id: Uuid) -> Result<Option<Membership>>;

    /// Lists the members of a unit, oldest first.
    async fn list_members(&self, unit_id: Uuid) -> Result<Vec<Membership>>;

    /// Creates a membership. A second membership for the same pair fails.
    async fn create_membership(&self, membership: &Membership) -> Result<()>;

    async fn update_membership(&self, membership: &Membership) -> Result<()>;

    async fn delete_membership(&self, unit_id: Uuid, user_id: Uuid) -> Result<()>;
}

/// Repository for events.
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn get_event(&self, id: Uuid) -> Result<Option<Event>>;

    /// Lists events matching the filter, ordered by start time.
    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>>;

    async fn create_event(&self, event: &Event) -> Result<()>;

    async fn update_event(&self, event: &Event) -> Result<()>;

    /// Deletes an event together with its attendance records.
    async fn delete_event(&self, id: Uuid) -> Result<()>;
}

/// Repository for event attendance.
#[async_trait]
pub trait AttendeeRepository: Send + Sync {
    async fn list_attendees(
        &self,
        event_id: Uuid,
        filter: &AttendeeFilter,
    ) -> Result<Vec<EventAttendee>>;

    /// Inserts the RSVP or replaces the status of an existing one for the same
    /// (event, user) pair. Returns the stored record.
    async fn upsert_attendee(&self, attendee: &EventAttendee) -> Result<EventAttendee>;

    async fn delete_attendee(&self, event_id: Uuid, user_id: Uuid) -> Result<()>;
}

/// Repository for announcements.
#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    async fn get_announcement(&self, id: Uuid) -> Result<Option<Announcement>>;

    /// Lists announcements matching the filter, pinned first then newest.
    async fn list_announcements(&self, filter: &AnnouncementFilter) -> Result<Vec<Announcement>>;

    async fn create_announcement(&self, announcement: &Announcement) -> Result<()>;

    async fn update_announcement(&self, announcement: &Announcement) -> Result<()>;

    async fn delete_announcement(&self, id: Uuid) -> Result<()>;
}
