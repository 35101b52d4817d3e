//! Community records: users, units, memberships, events, attendance and
//! announcements.

mod error;
mod operations;
mod requests;
mod types;

pub use error::{AnnouncementError, EventError, UnitError, UserError};
pub use operations::{
    announcement_matches, attendee_matches, event_matches, sort_announcements, sort_events,
    sort_units, unit_matches, user_conflict, validate_announcement, validate_event, validate_unit,
    validate_user, would_create_cycle,
};
pub use requests::{
    AddMemberRequest, CreateAnnouncementRequest, CreateEventRequest, CreateUnitRequest,
    RsvpRequest, UpdateAnnouncementRequest, UpdateEventRequest, UpdateMemberRequest,
    UpdateUnitRequest,
};
pub use types::{
    Announcement, AttendanceStatus, Event, EventAttendee, Membership, PublicProfile, Unit,
    UnitRole, User,
};
