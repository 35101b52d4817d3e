//! API request types for community records.
//!
//! Following the Functional Core pattern, these are pure data types with no
//! I/O. Create requests turn into records, update requests apply in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::{Announcement, AttendanceStatus, Event, Membership, Unit, UnitRole};
use crate::serde::{deserialize_nullable, deserialize_optional_string};

/// Request payload for creating a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUnitRequest {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_unit_id: Option<Uuid>,
}

impl CreateUnitRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parent_unit_id: None,
        }
    }

    pub fn with_parent(mut self, parent_unit_id: Uuid) -> Self {
        self.parent_unit_id = Some(parent_unit_id);
        self
    }

    pub fn into_unit(self) -> Unit {
        let mut unit = Unit::new(self.name);
        unit.description = self.description;
        unit.parent_unit_id = self.parent_unit_id;
        unit
    }
}

/// Request payload for updating a unit. `null` clears nullable fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUnitRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub parent_unit_id: Option<Option<Uuid>>,
}

impl UpdateUnitRequest {
    /// Apply updates to an existing unit and bump `updated_at`.
    pub fn apply_to(self, unit: &mut Unit) {
        if let Some(name) = self.name {
            unit.name = name;
        }
        if let Some(description) = self.description {
            unit.description = description;
        }
        if let Some(parent_unit_id) = self.parent_unit_id {
            unit.parent_unit_id = parent_unit_id;
        }
        unit.updated_at = Utc::now();
    }
}

/// Request payload for adding a member to a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub role: UnitRole,
}

impl AddMemberRequest {
    pub fn into_membership(self, unit_id: Uuid) -> Membership {
        Membership::new(self.user_id, unit_id, self.role)
    }
}

/// Request payload for changing a member's role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMemberRequest {
    pub role: UnitRole,
}

/// Request payload for creating an event. The creator is the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub location: Option<String>,
    #[serde(default)]
    pub unit_id: Option<Uuid>,
}

impl CreateEventRequest {
    pub fn into_event(self, creator_id: Uuid) -> Event {
        let mut event = Event::new(self.title, self.start_time, self.end_time, creator_id);
        event.description = self.description;
        event.location = self.location;
        event.unit_id = self.unit_id;
        event
    }
}

/// Request payload for updating an event. `null` clears nullable fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEventRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub unit_id: Option<Option<Uuid>>,
}

impl UpdateEventRequest {
    pub fn apply_to(self, event: &mut Event) {
        if let Some(title) = self.title {
            event.title = title;
        }
        if let Some(description) = self.description {
            event.description = description;
        }
        if let Some(start_time) = self.start_time {
            event.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            event.end_time = end_time;
        }
        if let Some(location) = self.location {
            event.location = location;
        }
        if let Some(unit_id) = self.unit_id {
            event.unit_id = unit_id;
        }
        event.updated_at = Utc::now();
    }
}

/// Request payload for the caller's RSVP.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RsvpRequest {
    #[serde(default)]
    pub status: AttendanceStatus,
}

/// Request payload for creating an announcement. The author is the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub unit_id: Option<Uuid>,
}

impl CreateAnnouncementRequest {
    pub fn into_announcement(self, author_id: Uuid) -> Announcement {
        let mut announcement = Announcement::new(self.title, self.content, author_id);
        announcement.is_pinned = self.is_pinned;
        announcement.unit_id = self.unit_id;
        announcement
    }
}

/// Request payload for updating an announcement.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAnnouncementRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub is_pinned: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub unit_id: Option<Option<Uuid>>,
}

impl UpdateAnnouncementRequest {
    pub fn apply_to(self, announcement: &mut Announcement) {
        if let Some(title) = self.title {
            announcement.title = title;
        }
        if let Some(content) = self.content {
            announcement.content = content;
        }
        if let Some(is_pinned) = self.is_pinned {
            announcement.is_pinned = is_pinned;
        }
        if let Some(unit_id) = self.unit_id {
            announcement.unit_id = unit_id;
        }
        announcement.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_create_unit_request_into_unit() {
        let parent = Uuid::new_v4();
        let unit = CreateUnitRequest::new("Scouts").with_parent(parent).into_unit();

        assert_eq!(unit.name, "Scouts");
        assert_eq!(unit.parent_unit_id, Some(parent));
        assert_eq!(unit.created_at, unit.updated_at);
    }

    #[test]
    fn test_update_unit_null_parent_detaches() {
        let mut unit = Unit::new("Troop 7").with_parent(Uuid::new_v4());
        let update: UpdateUnitRequest =
            serde_json::from_str(r#"{"parent_unit_id": null}"#).unwrap();

        update.apply_to(&mut unit);

        assert_eq!(unit.parent_unit_id, None);
        assert_eq!(unit.name, "Troop 7");
    }

    #[test]
    fn test_update_unit_missing_fields_keep_values() {
        let parent = Uuid::new_v4();
        let mut unit = Unit::new("Troop 7")
            .with_description("Weekly meetups")
            .with_parent(parent);
        let update: UpdateUnitRequest = serde_json::from_str(r#"{"name": "Troop 8"}"#).unwrap();

        update.apply_to(&mut unit);

        assert_eq!(unit.name, "Troop 8");
        assert_eq!(unit.description.as_deref(), Some("Weekly meetups"));
        assert_eq!(unit.parent_unit_id, Some(parent));
    }

    #[test]
    fn test_add_member_request_defaults_to_member_role() {
        let user_id = Uuid::new_v4();
        let request: AddMemberRequest =
            serde_json::from_str(&format!(r#"{{"user_id": "{user_id}"}}"#)).unwrap();

        assert_eq!(request.role, UnitRole::Member);
    }

    #[test]
    fn test_create_event_request_sets_creator() {
        let creator = Uuid::new_v4();
        let start = Utc::now();
        let request = CreateEventRequest {
            title: "Campfire".to_string(),
            description: None,
            start_time: start,
            end_time: start + Duration::hours(2),
            location: Some("Lakeside".to_string()),
            unit_id: None,
        };

        let event = request.into_event(creator);

        assert_eq!(event.creator_id, creator);
        assert_eq!(event.location.as_deref(), Some("Lakeside"));
    }

    #[test]
    fn test_rsvp_request_defaults_to_tentative() {
        let request: RsvpRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.status, AttendanceStatus::Tentative);
    }

    #[test]
    fn test_update_announcement_pin() {
        let mut announcement = Announcement::new("Hello", "World", Uuid::new_v4());
        let update: UpdateAnnouncementRequest =
            serde_json::from_str(r#"{"is_pinned": true}"#).unwrap();

        update.apply_to(&mut announcement);

        assert!(announcement.is_pinned);
        assert_eq!(announcement.title, "Hello");
    }
}
