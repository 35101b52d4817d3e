use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A local account.
///
/// `password` holds either an Argon2 PHC string or an unusable marker (a `!`
/// prefix). It never leaves the server; handlers expose [`PublicProfile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    /// Provider-assigned identity used as the durable join key.
    pub external_id: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub password: String,
}

impl User {
    /// Creates an active, non-staff user joined at `now`.
    pub fn new(username: impl Into<String>, password: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: None,
            external_id: None,
            avatar_url: None,
            is_active: true,
            is_staff: false,
            is_superuser: false,
            date_joined: now,
            last_login: None,
            password: password.into(),
        }
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn with_avatar_url(mut self, avatar_url: Option<String>) -> Self {
        self.avatar_url = avatar_url;
        self
    }

    pub fn with_last_login(mut self, last_login: DateTime<Utc>) -> Self {
        self.last_login = Some(last_login);
        self
    }

    /// Marks the user as staff and superuser.
    pub fn as_superuser(mut self) -> Self {
        self.is_staff = true;
        self.is_superuser = true;
        self
    }

    /// Public representation without the password.
    pub fn public_profile(&self) -> PublicProfile {
        PublicProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            external_id: self.external_id.clone(),
            avatar_reference: self.avatar_url.clone(),
            date_joined: self.date_joined,
            last_login: self.last_login,
        }
    }
}

/// What API clients see of a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub external_id: Option<String>,
    /// The stored `avatar_url`.
    pub avatar_reference: Option<String>,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// An organizational group, optionally nested under a parent unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub parent_unit_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Unit {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            parent_unit_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_parent(mut self, parent_unit_id: Uuid) -> Self {
        self.parent_unit_id = Some(parent_unit_id);
        self
    }
}

/// Role of a user inside a unit. Stored, not enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitRole {
    #[default]
    Member,
    Leader,
    Admin,
}

impl UnitRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Leader => "leader",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UnitRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UnitRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Self::Member),
            "leader" => Ok(Self::Leader),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown unit role: {other}")),
        }
    }
}

/// Membership of a user in a unit. Unique per (user, unit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: Uuid,
    pub unit_id: Uuid,
    pub role: UnitRole,
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    pub fn new(user_id: Uuid, unit_id: Uuid, role: UnitRole) -> Self {
        Self {
            user_id,
            unit_id,
            role,
            joined_at: Utc::now(),
        }
    }
}

/// A scheduled occurrence created by a user, optionally owned by a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub creator_id: Uuid,
    pub unit_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn new(
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        creator_id: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            start_time,
            end_time,
            location: None,
            creator_id,
            unit_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_unit(mut self, unit_id: Uuid) -> Self {
        self.unit_id = Some(unit_id);
        self
    }
}

/// RSVP status of an attendee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Attending,
    Declined,
    #[default]
    Tentative,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attending => "attending",
            Self::Declined => "declined",
            Self::Tentative => "tentative",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "attending" => Ok(Self::Attending),
            "declined" => Ok(Self::Declined),
            "tentative" => Ok(Self::Tentative),
            other => Err(format!("unknown attendance status: {other}")),
        }
    }
}

/// A user's RSVP to an event. Unique per (event, user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttendee {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: AttendanceStatus,
    pub created_at: DateTime<Utc>,
}

impl EventAttendee {
    pub fn new(event_id: Uuid, user_id: Uuid, status: AttendanceStatus) -> Self {
        Self {
            event_id,
            user_id,
            status,
            created_at: Utc::now(),
        }
    }
}

/// A message with an author, optionally owned by a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    /// Pinned announcements are listed before everything else.
    pub is_pinned: bool,
    pub unit_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Announcement {
    pub fn new(title: impl Into<String>, content: impl Into<String>, author_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            author_id,
            is_pinned: false,
            unit_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn pinned(mut self) -> Self {
        self.is_pinned = true;
        self
    }

    pub fn with_unit(mut self, unit_id: Uuid) -> Self {
        self.unit_id = Some(unit_id);
        self
    }
}
