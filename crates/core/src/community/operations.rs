use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::error::{AnnouncementError, EventError, UnitError, UserError};
use super::types::{Announcement, Event, EventAttendee, Unit, User};
use crate::storage::{
    AnnouncementFilter, AttendeeFilter, EventFilter, RepositoryError, UnitFilter,
};

const MAX_NAME_LEN: usize = 255;
const MAX_AVATAR_URL_LEN: usize = 512;

/// Validates a user before creation or update.
pub fn validate_user(user: &User) -> Result<(), UserError> {
    if user.username.trim().is_empty() {
        return Err(UserError::EmptyUsername);
    }
    if user.username.chars().count() > MAX_NAME_LEN {
        return Err(UserError::UsernameTooLong);
    }
    if user
        .avatar_url
        .as_ref()
        .is_some_and(|url| url.chars().count() > MAX_AVATAR_URL_LEN)
    {
        return Err(UserError::AvatarUrlTooLong);
    }
    Ok(())
}

/// First uniqueness rule `user` breaks against `existing`.
///
/// Usernames are unique, and external ids are unique when present. The
/// record with `user`'s own id is skipped so updates do not clash with
/// themselves.
pub fn user_conflict<'a>(
    existing: impl IntoIterator<Item = &'a User>,
    user: &User,
) -> Option<RepositoryError> {
    existing
        .into_iter()
        .filter(|other| other.id != user.id)
        .find_map(|other| {
            if other.username == user.username {
                Some(RepositoryError::already_exists(
                    "User",
                    format!("username={}", user.username),
                ))
            } else {
                match (&other.external_id, &user.external_id) {
                    (Some(theirs), Some(ours)) if theirs == ours => Some(
                        RepositoryError::already_exists("User", format!("external_id={ours}")),
                    ),
                    _ => None,
                }
            }
        })
}

/// Validates a unit before creation or update.
pub fn validate_unit(unit: &Unit) -> Result<(), UnitError> {
    if unit.name.trim().is_empty() {
        return Err(UnitError::EmptyName);
    }
    if unit.name.chars().count() > MAX_NAME_LEN {
        return Err(UnitError::NameTooLong);
    }
    if unit.parent_unit_id == Some(unit.id) {
        return Err(UnitError::CyclicParent);
    }
    Ok(())
}

/// Returns true if attaching `unit_id` under `new_parent` would make the unit
/// its own ancestor.
///
/// `parents` maps every known unit to its current parent.
pub fn would_create_cycle(
    unit_id: Uuid,
    new_parent: Option<Uuid>,
    parents: &HashMap<Uuid, Option<Uuid>>,
) -> bool {
    let mut seen = HashSet::new();
    let mut current = new_parent;

    while let Some(id) = current {
        if id == unit_id || !seen.insert(id) {
            return true;
        }
        current = parents.get(&id).copied().flatten();
    }
    false
}

/// Validates an event before creation or update.
pub fn validate_event(event: &Event) -> Result<(), EventError> {
    if event.title.trim().is_empty() {
        return Err(EventError::EmptyTitle);
    }
    if event.title.chars().count() > MAX_NAME_LEN {
        return Err(EventError::TitleTooLong);
    }
    if event
        .location
        .as_ref()
        .is_some_and(|location| location.chars().count() > MAX_NAME_LEN)
    {
        return Err(EventError::LocationTooLong);
    }
    if event.end_time < event.start_time {
        return Err(EventError::InvalidTimeRange);
    }
    Ok(())
}

/// Validates an announcement before creation or update.
pub fn validate_announcement(announcement: &Announcement) -> Result<(), AnnouncementError> {
    if announcement.title.trim().is_empty() {
        return Err(AnnouncementError::EmptyTitle);
    }
    if announcement.title.chars().count() > MAX_NAME_LEN {
        return Err(AnnouncementError::TitleTooLong);
    }
    if announcement.content.trim().is_empty() {
        return Err(AnnouncementError::EmptyContent);
    }
    Ok(())
}

/// Case-insensitive substring match over any of the given fields.
fn matches_search<'a>(needle: &str, fields: impl IntoIterator<Item = Option<&'a str>>) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

pub fn unit_matches(unit: &Unit, filter: &UnitFilter) -> bool {
    filter
        .parent
        .is_none_or(|parent| unit.parent_unit_id == Some(parent))
        && filter.search.as_deref().is_none_or(|search| {
            matches_search(search, [Some(unit.name.as_str()), unit.description.as_deref()])
        })
}

/// Matches on owning unit, text search and a start-time window.
///
/// The window is inclusive on both ends.
pub fn event_matches(event: &Event, filter: &EventFilter) -> bool {
    filter.unit.is_none_or(|unit| event.unit_id == Some(unit))
        && filter.from.is_none_or(|from| event.start_time >= from)
        && filter.to.is_none_or(|to| event.start_time <= to)
        && filter.search.as_deref().is_none_or(|search| {
            matches_search(
                search,
                [
                    Some(event.title.as_str()),
                    event.description.as_deref(),
                    event.location.as_deref(),
                ],
            )
        })
}

pub fn attendee_matches(attendee: &EventAttendee, filter: &AttendeeFilter) -> bool {
    filter.status.is_none_or(|status| attendee.status == status)
}

pub fn announcement_matches(announcement: &Announcement, filter: &AnnouncementFilter) -> bool {
    filter.unit.is_none_or(|unit| announcement.unit_id == Some(unit))
        && filter
            .pinned
            .is_none_or(|pinned| announcement.is_pinned == pinned)
        && filter.search.as_deref().is_none_or(|search| {
            matches_search(
                search,
                [
                    Some(announcement.title.as_str()),
                    Some(announcement.content.as_str()),
                ],
            )
        })
}

/// Sorts units by name.
pub fn sort_units(units: &mut [Unit]) {
    units.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
}

/// Sorts events by start time, then end time.
pub fn sort_events(events: &mut [Event]) {
    events.sort_by_key(|event| (event.start_time, event.end_time, event.id));
}

/// Sorts announcements pinned-first, then newest-first.
pub fn sort_announcements(announcements: &mut [Announcement]) {
    announcements.sort_by_key(|a| (Reverse(a.is_pinned), Reverse(a.created_at), a.id));
}
