//! PostgreSQL schema definitions and SQL query constants.
//!
//! Pure data, no I/O. Foreign keys carry the delete semantics: deleting a
//! unit detaches its children and cascades to memberships, events and
//! announcements; deleting an event cascades to its attendance.

/// Statements creating all tables. Run with the simple query protocol.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    username VARCHAR(255) NOT NULL UNIQUE,
    email VARCHAR(254),
    external_id VARCHAR(255) UNIQUE,
    avatar_url VARCHAR(512),
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    is_staff BOOLEAN NOT NULL DEFAULT FALSE,
    is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
    date_joined TIMESTAMPTZ NOT NULL,
    last_login TIMESTAMPTZ,
    password VARCHAR(255) NOT NULL
);

CREATE TABLE IF NOT EXISTS units (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    description TEXT,
    parent_unit_id UUID REFERENCES units(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS memberships (
    unit_id UUID NOT NULL REFERENCES units(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    role VARCHAR(20) NOT NULL,
    joined_at TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (unit_id, user_id)
);

CREATE TABLE IF NOT EXISTS events (
    id UUID PRIMARY KEY,
    title VARCHAR(255) NOT NULL,
    description TEXT,
    start_time TIMESTAMPTZ NOT NULL,
    end_time TIMESTAMPTZ NOT NULL,
    location VARCHAR(255),
    creator_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    unit_id UUID REFERENCES units(id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS event_attendees (
    event_id UUID NOT NULL REFERENCES events(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    status VARCHAR(20) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (event_id, user_id)
);

CREATE TABLE IF NOT EXISTS announcements (
    id UUID PRIMARY KEY,
    title VARCHAR(255) NOT NULL,
    content TEXT NOT NULL,
    author_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    is_pinned BOOLEAN NOT NULL DEFAULT FALSE,
    unit_id UUID REFERENCES units(id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_units_parent ON units(parent_unit_id);
CREATE INDEX IF NOT EXISTS idx_memberships_user ON memberships(user_id);
CREATE INDEX IF NOT EXISTS idx_events_unit_start ON events(unit_id, start_time);
CREATE INDEX IF NOT EXISTS idx_events_start ON events(start_time);
CREATE INDEX IF NOT EXISTS idx_announcements_unit ON announcements(unit_id);
"#;

// ============================================================================
// User queries
// ============================================================================

pub const SELECT_USER_BY_ID: &str = r#"
SELECT id, username, email, external_id, avatar_url, is_active, is_staff, is_superuser,
       date_joined, last_login, password
FROM users WHERE id = $1
"#;

pub const SELECT_USER_BY_EXTERNAL_ID: &str = r#"
SELECT id, username, email, external_id, avatar_url, is_active, is_staff, is_superuser,
       date_joined, last_login, password
FROM users WHERE external_id = $1
"#;

pub const SELECT_USER_BY_USERNAME: &str = r#"
SELECT id, username, email, external_id, avatar_url, is_active, is_staff, is_superuser,
       date_joined, last_login, password
FROM users WHERE username = $1
"#;

pub const INSERT_USER: &str = r#"
INSERT INTO users (id, username, email, external_id, avatar_url, is_active, is_staff,
                   is_superuser, date_joined, last_login, password)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
"#;

pub const UPDATE_USER: &str = r#"
UPDATE users
SET username = $2, email = $3, external_id = $4, avatar_url = $5, is_active = $6,
    is_staff = $7, is_superuser = $8, last_login = $9, password = $10
WHERE id = $1
"#;

// ============================================================================
// Unit queries
// ============================================================================

pub const SELECT_UNIT_BY_ID: &str = r#"
SELECT id, name, description, parent_unit_id, created_at, updated_at
FROM units WHERE id = $1
"#;

pub const SELECT_UNITS: &str = r#"
SELECT id, name, description, parent_unit_id, created_at, updated_at
FROM units
WHERE ($1::uuid IS NULL OR parent_unit_id = $1)
  AND ($2::text IS NULL OR name ILIKE $2 OR description ILIKE $2)
ORDER BY name, id
"#;

pub const INSERT_UNIT: &str = r#"
INSERT INTO units (id, name, description, parent_unit_id, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $6)
"#;

pub const UPDATE_UNIT: &str = r#"
UPDATE units
SET name = $2, description = $3, parent_unit_id = $4, updated_at = $5
WHERE id = $1
"#;

/// True if `$2` is `$1` or one of its ancestors.
pub const UNIT_IS_ANCESTOR: &str = r#"
WITH RECURSIVE ancestors(id, parent_unit_id) AS (
    SELECT id, parent_unit_id FROM units WHERE id = $1
    UNION
    SELECT u.id, u.parent_unit_id FROM units u JOIN ancestors a ON u.id = a.parent_unit_id
)
SELECT EXISTS (SELECT 1 FROM ancestors WHERE id = $2)
"#;

/// Self-conflicting, so only one re-parenting transaction runs at a time,
/// while plain reads proceed.
pub const LOCK_UNITS: &str = "LOCK TABLE units IN SHARE ROW EXCLUSIVE MODE";

pub const DELETE_UNIT: &str = "DELETE FROM units WHERE id = $1";

// ============================================================================
// Membership queries
// ============================================================================

pub const SELECT_MEMBERSHIP: &str = r#"
SELECT user_id, unit_id, role, joined_at
FROM memberships WHERE unit_id = $1 AND user_id = $2
"#;

pub const SELECT_MEMBERS: &str = r#"
SELECT user_id, unit_id, role, joined_at
FROM memberships WHERE unit_id = $1
ORDER BY joined_at, user_id
"#;

pub const INSERT_MEMBERSHIP: &str = r#"
INSERT INTO memberships (user_id, unit_id, role, joined_at)
VALUES ($1, $2, $3, $4)
"#;

pub const UPDATE_MEMBERSHIP: &str = r#"
UPDATE memberships SET role = $3 WHERE unit_id = $1 AND user_id = $2
"#;

pub const DELETE_MEMBERSHIP: &str =
    "DELETE FROM memberships WHERE unit_id = $1 AND user_id = $2";

// ============================================================================
// Event queries
// ============================================================================

pub const SELECT_EVENT_BY_ID: &str = r#"
SELECT id, title, description, start_time, end_time, location, creator_id, unit_id,
       created_at, updated_at
FROM events WHERE id = $1
"#;

pub const SELECT_EVENTS: &str = r#"
SELECT id, title, description, start_time, end_time, location, creator_id, unit_id,
       created_at, updated_at
FROM events
WHERE ($1::uuid IS NULL OR unit_id = $1)
  AND ($2::timestamptz IS NULL OR start_time >= $2)
  AND ($3::timestamptz IS NULL OR start_time <= $3)
  AND ($4::text IS NULL OR title ILIKE $4 OR description ILIKE $4 OR location ILIKE $4)
ORDER BY start_time, end_time, id
"#;

pub const INSERT_EVENT: &str = r#"
INSERT INTO events (id, title, description, start_time, end_time, location, creator_id,
                    unit_id, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
"#;

pub const UPDATE_EVENT: &str = r#"
UPDATE events
SET title = $2, description = $3, start_time = $4, end_time = $5, location = $6,
    unit_id = $7, updated_at = $8
WHERE id = $1
"#;

pub const DELETE_EVENT: &str = "DELETE FROM events WHERE id = $1";

// ============================================================================
// Attendance queries
// ============================================================================

pub const SELECT_ATTENDEES: &str = r#"
SELECT event_id, user_id, status, created_at
FROM event_attendees
WHERE event_id = $1 AND ($2::text IS NULL OR status = $2)
ORDER BY created_at, user_id
"#;

pub const UPSERT_ATTENDEE: &str = r#"
INSERT INTO event_attendees (event_id, user_id, status, created_at)
VALUES ($1, $2, $3, $4)
ON CONFLICT (event_id, user_id) DO UPDATE SET status = EXCLUDED.status
RETURNING event_id, user_id, status, created_at
"#;

pub const DELETE_ATTENDEE: &str =
    "DELETE FROM event_attendees WHERE event_id = $1 AND user_id = $2";

// ============================================================================
// Announcement queries
// ============================================================================

pub const SELECT_ANNOUNCEMENT_BY_ID: &str = r#"
SELECT id, title, content, author_id, is_pinned, unit_id, created_at, updated_at
FROM announcements WHERE id = $1
"#;

pub const SELECT_ANNOUNCEMENTS: &str = r#"
SELECT id, title, content, author_id, is_pinned, unit_id, created_at, updated_at
FROM announcements
WHERE ($1::uuid IS NULL OR unit_id = $1)
  AND ($2::boolean IS NULL OR is_pinned = $2)
  AND ($3::text IS NULL OR title ILIKE $3 OR content ILIKE $3)
ORDER BY is_pinned DESC, created_at DESC, id
"#;

pub const INSERT_ANNOUNCEMENT: &str = r#"
INSERT INTO announcements (id, title, content, author_id, is_pinned, unit_id, created_at,
                           updated_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
"#;

pub const UPDATE_ANNOUNCEMENT: &str = r#"
UPDATE announcements
SET title = $2, content = $3, is_pinned = $4, unit_id = $5, updated_at = $6
WHERE id = $1
"#;

pub const DELETE_ANNOUNCEMENT: &str = "DELETE FROM announcements WHERE id = $1";
