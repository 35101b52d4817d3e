//! PostgreSQL row conversion functions.
//!
//! Pure functions for converting between Postgres rows and domain types.

use commune_core::community::{
    Announcement, AttendanceStatus, Event, EventAttendee, Membership, Unit, UnitRole, User,
};
use sqlx::{postgres::PgRow, Row};

// ============================================================================
// Enum conversions
// ============================================================================

/// Parses a stored role. Unknown values are a decode error, not a default.
pub fn parse_role(value: &str) -> Result<UnitRole, sqlx::Error> {
    value.parse().map_err(|e: String| sqlx::Error::Decode(e.into()))
}

pub fn parse_status(value: &str) -> Result<AttendanceStatus, sqlx::Error> {
    value.parse().map_err(|e: String| sqlx::Error::Decode(e.into()))
}

/// Turns a free-text search into an `ILIKE` pattern, or `None` when blank.
pub fn search_pattern(search: Option<&str>) -> Option<String> {
    let needle = search?.trim();
    if needle.is_empty() {
        return None;
    }
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{escaped}%"))
}

// ============================================================================
// Row conversions
// ============================================================================

pub fn row_to_user(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        external_id: row.try_get("external_id")?,
        avatar_url: row.try_get("avatar_url")?,
        is_active: row.try_get("is_active")?,
        is_staff: row.try_get("is_staff")?,
        is_superuser: row.try_get("is_superuser")?,
        date_joined: row.try_get("date_joined")?,
        last_login: row.try_get("last_login")?,
        password: row.try_get("password")?,
    })
}

pub fn row_to_unit(row: &PgRow) -> Result<Unit, sqlx::Error> {
    Ok(Unit {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        parent_unit_id: row.try_get("parent_unit_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub fn row_to_membership(row: &PgRow) -> Result<Membership, sqlx::Error> {
    let role: String = row.try_get("role")?;
    Ok(Membership {
        user_id: row.try_get("user_id")?,
        unit_id: row.try_get("unit_id")?,
        role: parse_role(&role)?,
        joined_at: row.try_get("joined_at")?,
    })
}

pub fn row_to_event(row: &PgRow) -> Result<Event, sqlx::Error> {
    Ok(Event {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        location: row.try_get("location")?,
        creator_id: row.try_get("creator_id")?,
        unit_id: row.try_get("unit_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub fn row_to_attendee(row: &PgRow) -> Result<EventAttendee, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(EventAttendee {
        event_id: row.try_get("event_id")?,
        user_id: row.try_get("user_id")?,
        status: parse_status(&status)?,
        created_at: row.try_get("created_at")?,
    })
}

pub fn row_to_announcement(row: &PgRow) -> Result<Announcement, sqlx::Error> {
    Ok(Announcement {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        author_id: row.try_get("author_id")?,
        is_pinned: row.try_get("is_pinned")?,
        unit_id: row.try_get("unit_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("leader").unwrap(), UnitRole::Leader);
        assert!(matches!(parse_role("owner"), Err(sqlx::Error::Decode(_))));
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("declined").unwrap(), AttendanceStatus::Declined);
        assert!(matches!(parse_status("maybe"), Err(sqlx::Error::Decode(_))));
    }

    #[test]
    fn test_search_pattern_wraps_and_escapes() {
        assert_eq!(search_pattern(Some(" raid ")).as_deref(), Some("%raid%"));
        assert_eq!(search_pattern(Some("100%_done")).as_deref(), Some("%100\\%\\_done%"));
        assert_eq!(search_pattern(Some("   ")), None);
        assert_eq!(search_pattern(None), None);
    }
}
