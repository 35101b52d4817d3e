//! Query filters shared by the storage backends and the list endpoints.
//!
//! Each filter deserializes straight from a query string; every field is
//! optional and an absent field matches everything.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::community::AttendanceStatus;

/// `GET /units/?search=&parent=`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UnitFilter {
    pub search: Option<String>,
    pub parent: Option<Uuid>,
}

/// `GET /events/?unit=&search=&from=&to=`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventFilter {
    pub unit: Option<Uuid>,
    pub search: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// `GET /events/{id}/attendees/?status=`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct AttendeeFilter {
    pub status: Option<AttendanceStatus>,
}

/// `GET /announcements/?unit=&pinned=&search=`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AnnouncementFilter {
    pub unit: Option<Uuid>,
    pub pinned: Option<bool>,
    pub search: Option<String>,
}
