//! PostgreSQL repository implementation.
//!
//! Implements the repository traits from `commune_core::storage` using sqlx.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use uuid::Uuid;

use commune_core::community::{Announcement, Event, EventAttendee, Membership, Unit, User};
use commune_core::storage::{
    AnnouncementFilter, AnnouncementRepository, AttendeeFilter, AttendeeRepository, EventFilter,
    EventRepository, MembershipRepository, RepositoryError, Result, UnitFilter, UnitRepository,
    UserRepository,
};

use super::conversions::{
    row_to_announcement, row_to_attendee, row_to_event, row_to_membership, row_to_unit,
    row_to_user, search_pattern,
};
use super::error::map_sqlx_error;
use super::schema;
use crate::config::{DatabaseConfig, DatabaseEndpoint};

/// PostgreSQL-based repository implementation.
#[derive(Debug, Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

/// Builds connection options.
///
/// `DATABASE_URL` is used when set; a tunneled endpoint always replaces its
/// host and port.
fn connect_options(config: &DatabaseConfig, endpoint: &DatabaseEndpoint) -> Result<PgConnectOptions> {
    let options = match &config.url {
        Some(url) => {
            let options: PgConnectOptions = url
                .parse()
                .map_err(|e: sqlx::Error| RepositoryError::ConnectionFailed(e.to_string()))?;
            if !endpoint.tunneled {
                return Ok(options);
            }
            options
        }
        None => {
            let options = PgConnectOptions::new()
                .username(&config.user)
                .database(&config.name);
            match &config.password {
                Some(password) => options.password(password),
                None => options,
            }
        }
    };
    Ok(options.host(&endpoint.host).port(endpoint.port))
}

impl PostgresRepository {
    /// Connects a pool and creates the schema if needed.
    pub async fn connect(config: &DatabaseConfig, endpoint: &DatabaseEndpoint) -> Result<Self> {
        let options = connect_options(config, endpoint)?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        let repo = Self { pool };
        repo.init_schema().await?;

        tracing::info!(
            host = %endpoint.host,
            port = endpoint.port,
            tunneled = endpoint.tunneled,
            "Connected to PostgreSQL"
        );
        Ok(repo)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::raw_sql(schema::CREATE_TABLES)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
        Ok(())
    }

    /// Runs an UPDATE or DELETE and reports `NotFound` when no row matched.
    async fn execute_one(
        &self,
        query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>,
        entity_type: &'static str,
        id: String,
    ) -> Result<()> {
        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, entity_type, &id))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(entity_type, id));
        }
        Ok(())
    }
}

// ============================================================================
// UserRepository implementation
// ============================================================================

impl PostgresRepository {
    async fn fetch_user(&self, query: &'static str, key: &str) -> Result<Option<User>> {
        let row = sqlx::query(query)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "User", key))?;
        row.as_ref()
            .map(row_to_user)
            .transpose()
            .map_err(|e| map_sqlx_error(e, "User", key))
    }
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(schema::SELECT_USER_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "User", id))?;
        row.as_ref()
            .map(row_to_user)
            .transpose()
            .map_err(|e| map_sqlx_error(e, "User", id))
    }

    async fn get_user_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        self.fetch_user(schema::SELECT_USER_BY_EXTERNAL_ID, external_id)
            .await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.fetch_user(schema::SELECT_USER_BY_USERNAME, username)
            .await
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        sqlx::query(schema::INSERT_USER)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.external_id)
            .bind(&user.avatar_url)
            .bind(user.is_active)
            .bind(user.is_staff)
            .bind(user.is_superuser)
            .bind(user.date_joined)
            .bind(user.last_login)
            .bind(&user.password)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "User", &user.username))?;
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let query = sqlx::query(schema::UPDATE_USER)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.external_id)
            .bind(&user.avatar_url)
            .bind(user.is_active)
            .bind(user.is_staff)
            .bind(user.is_superuser)
            .bind(user.last_login)
            .bind(&user.password);
        self.execute_one(query, "User", user.id.to_string()).await
    }
}

// ============================================================================
// UnitRepository implementation
// ============================================================================

#[async_trait]
impl UnitRepository for PostgresRepository {
    async fn get_unit(&self, id: Uuid) -> Result<Option<Unit>> {
        let row = sqlx::query(schema::SELECT_UNIT_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Unit", id))?;
        row.as_ref()
            .map(row_to_unit)
            .transpose()
            .map_err(|e| map_sqlx_error(e, "Unit", id))
    }

    async fn list_units(&self, filter: &UnitFilter) -> Result<Vec<Unit>> {
        let rows = sqlx::query(schema::SELECT_UNITS)
            .bind(filter.parent)
            .bind(search_pattern(filter.search.as_deref()))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Unit", "list"))?;
        rows.iter()
            .map(row_to_unit)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| map_sqlx_error(e, "Unit", "list"))
    }

    async fn create_unit(&self, unit: &Unit) -> Result<()> {
        sqlx::query(schema::INSERT_UNIT)
            .bind(unit.id)
            .bind(&unit.name)
            .bind(&unit.description)
            .bind(unit.parent_unit_id)
            .bind(unit.created_at)
            .bind(unit.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Unit", unit.id))?;
        Ok(())
    }

    async fn update_unit(&self, unit: &Unit) -> Result<()> {
        let key = unit.id.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(e, "Unit", &key))?;

        // Serializes re-parenting so two concurrent moves cannot each pass
        // the ancestor check and close a loop together.
        sqlx::query(schema::LOCK_UNITS)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(e, "Unit", &key))?;

        if let Some(parent) = unit.parent_unit_id {
            let (cyclic,): (bool,) = sqlx::query_as(schema::UNIT_IS_ANCESTOR)
                .bind(parent)
                .bind(unit.id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error(e, "Unit", &key))?;
            if cyclic {
                return Err(RepositoryError::InvalidData(format!(
                    "unit {} cannot be its own ancestor",
                    unit.id
                )));
            }
        }

        let result = sqlx::query(schema::UPDATE_UNIT)
            .bind(unit.id)
            .bind(&unit.name)
            .bind(&unit.description)
            .bind(unit.parent_unit_id)
            .bind(unit.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(e, "Unit", &key))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("Unit", key));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error(e, "Unit", &key))
    }

    async fn delete_unit(&self, id: Uuid) -> Result<()> {
        let query = sqlx::query(schema::DELETE_UNIT).bind(id);
        self.execute_one(query, "Unit", id.to_string()).await
    }
}

// ============================================================================
// MembershipRepository implementation
// ============================================================================

#[async_trait]
impl MembershipRepository for PostgresRepository {
    async fn get_membership(&self, unit_id: Uuid, user_id: Uuid) -> Result<Option<Membership>> {
        let key = format!("unit={unit_id} user={user_id}");
        let row = sqlx::query(schema::SELECT_MEMBERSHIP)
            .bind(unit_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Membership", &key))?;
        row.as_ref()
            .map(row_to_membership)
            .transpose()
            .map_err(|e| map_sqlx_error(e, "Membership", &key))
    }

    async fn list_members(&self, unit_id: Uuid) -> Result<Vec<Membership>> {
        let rows = sqlx::query(schema::SELECT_MEMBERS)
            .bind(unit_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Membership", unit_id))?;
        rows.iter()
            .map(row_to_membership)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| map_sqlx_error(e, "Membership", unit_id))
    }

    async fn create_membership(&self, membership: &Membership) -> Result<()> {
        sqlx::query(schema::INSERT_MEMBERSHIP)
            .bind(membership.user_id)
            .bind(membership.unit_id)
            .bind(membership.role.as_str())
            .bind(membership.joined_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_sqlx_error(
                    e,
                    "Membership",
                    format!("unit={} user={}", membership.unit_id, membership.user_id),
                )
            })?;
        Ok(())
    }

    async fn update_membership(&self, membership: &Membership) -> Result<()> {
        let query = sqlx::query(schema::UPDATE_MEMBERSHIP)
            .bind(membership.unit_id)
            .bind(membership.user_id)
            .bind(membership.role.as_str());
        self.execute_one(
            query,
            "Membership",
            format!("unit={} user={}", membership.unit_id, membership.user_id),
        )
        .await
    }

    async fn delete_membership(&self, unit_id: Uuid, user_id: Uuid) -> Result<()> {
        let query = sqlx::query(schema::DELETE_MEMBERSHIP)
            .bind(unit_id)
            .bind(user_id);
        self.execute_one(query, "Membership", format!("unit={unit_id} user={user_id}"))
            .await
    }
}

// ============================================================================
// EventRepository implementation
// ============================================================================

#[async_trait]
impl EventRepository for PostgresRepository {
    async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
        let row = sqlx::query(schema::SELECT_EVENT_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Event", id))?;
        row.as_ref()
            .map(row_to_event)
            .transpose()
            .map_err(|e| map_sqlx_error(e, "Event", id))
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let rows = sqlx::query(schema::SELECT_EVENTS)
            .bind(filter.unit)
            .bind(filter.from)
            .bind(filter.to)
            .bind(search_pattern(filter.search.as_deref()))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Event", "list"))?;
        rows.iter()
            .map(row_to_event)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| map_sqlx_error(e, "Event", "list"))
    }

    async fn create_event(&self, event: &Event) -> Result<()> {
        sqlx::query(schema::INSERT_EVENT)
            .bind(event.id)
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.start_time)
            .bind(event.end_time)
            .bind(&event.location)
            .bind(event.creator_id)
            .bind(event.unit_id)
            .bind(event.created_at)
            .bind(event.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Event", event.id))?;
        Ok(())
    }

    async fn update_event(&self, event: &Event) -> Result<()> {
        let query = sqlx::query(schema::UPDATE_EVENT)
            .bind(event.id)
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.start_time)
            .bind(event.end_time)
            .bind(&event.location)
            .bind(event.unit_id)
            .bind(event.updated_at);
        self.execute_one(query, "Event", event.id.to_string()).await
    }

    async fn delete_event(&self, id: Uuid) -> Result<()> {
        let query = sqlx::query(schema::DELETE_EVENT).bind(id);
        self.execute_one(query, "Event", id.to_string()).await
    }
}

// ============================================================================
// AttendeeRepository implementation
// ============================================================================

#[async_trait]
impl AttendeeRepository for PostgresRepository {
    async fn list_attendees(
        &self,
        event_id: Uuid,
        filter: &AttendeeFilter,
    ) -> Result<Vec<EventAttendee>> {
        let rows = sqlx::query(schema::SELECT_ATTENDEES)
            .bind(event_id)
            .bind(filter.status.map(|status| status.as_str()))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "EventAttendee", event_id))?;
        rows.iter()
            .map(row_to_attendee)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| map_sqlx_error(e, "EventAttendee", event_id))
    }

    async fn upsert_attendee(&self, attendee: &EventAttendee) -> Result<EventAttendee> {
        let key = format!("event={} user={}", attendee.event_id, attendee.user_id);
        let row = sqlx::query(schema::UPSERT_ATTENDEE)
            .bind(attendee.event_id)
            .bind(attendee.user_id)
            .bind(attendee.status.as_str())
            .bind(attendee.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "EventAttendee", &key))?;
        row_to_attendee(&row).map_err(|e| map_sqlx_error(e, "EventAttendee", &key))
    }

    async fn delete_attendee(&self, event_id: Uuid, user_id: Uuid) -> Result<()> {
        let query = sqlx::query(schema::DELETE_ATTENDEE)
            .bind(event_id)
            .bind(user_id);
        self.execute_one(
            query,
            "EventAttendee",
            format!("event={event_id} user={user_id}"),
        )
        .await
    }
}

// ============================================================================
// AnnouncementRepository implementation
// ============================================================================

#[async_trait]
impl AnnouncementRepository for PostgresRepository {
    async fn get_announcement(&self, id: Uuid) -> Result<Option<Announcement>> {
        let row = sqlx::query(schema::SELECT_ANNOUNCEMENT_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Announcement", id))?;
        row.as_ref()
            .map(row_to_announcement)
            .transpose()
            .map_err(|e| map_sqlx_error(e, "Announcement", id))
    }

    async fn list_announcements(&self, filter: &AnnouncementFilter) -> Result<Vec<Announcement>> {
        let rows = sqlx::query(schema::SELECT_ANNOUNCEMENTS)
            .bind(filter.unit)
            .bind(filter.pinned)
            .bind(search_pattern(filter.search.as_deref()))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Announcement", "list"))?;
        rows.iter()
            .map(row_to_announcement)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| map_sqlx_error(e, "Announcement", "list"))
    }

    async fn create_announcement(&self, announcement: &Announcement) -> Result<()> {
        sqlx::query(schema::INSERT_ANNOUNCEMENT)
            .bind(announcement.id)
            .bind(&announcement.title)
            .bind(&announcement.content)
            .bind(announcement.author_id)
            .bind(announcement.is_pinned)
            .bind(announcement.unit_id)
            .bind(announcement.created_at)
            .bind(announcement.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Announcement", announcement.id))?;
        Ok(())
    }

    async fn update_announcement(&self, announcement: &Announcement) -> Result<()> {
        let query = sqlx::query(schema::UPDATE_ANNOUNCEMENT)
            .bind(announcement.id)
            .bind(&announcement.title)
            .bind(&announcement.content)
            .bind(announcement.is_pinned)
            .bind(announcement.unit_id)
            .bind(announcement.updated_at);
        self.execute_one(query, "Announcement", announcement.id.to_string())
            .await
    }

    async fn delete_announcement(&self, id: Uuid) -> Result<()> {
        let query = sqlx::query(schema::DELETE_ANNOUNCEMENT).bind(id);
        self.execute_one(query, "Announcement", id.to_string()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database() -> DatabaseConfig {
        DatabaseConfig {
            url: None,
            host: "db.internal".to_string(),
            port: 5432,
            name: "community".to_string(),
            user: "app".to_string(),
            password: Some("s3cret".to_string()),
            max_connections: 5,
        }
    }

    fn endpoint(host: &str, port: u16, tunneled: bool) -> DatabaseEndpoint {
        DatabaseEndpoint {
            host: host.to_string(),
            port,
            tunneled,
        }
    }

    #[test]
    fn test_options_from_parts_use_endpoint() {
        let options = connect_options(&database(), &endpoint("127.0.0.1", 40123, true)).unwrap();

        assert_eq!(options.get_host(), "127.0.0.1");
        assert_eq!(options.get_port(), 40123);
        assert_eq!(options.get_username(), "app");
        assert_eq!(options.get_database(), Some("community"));
    }

    #[test]
    fn test_url_is_used_as_is_without_tunnel() {
        let mut config = database();
        config.url = Some("postgres://remote:pw@db.example.com:6543/prod".to_string());

        let options = connect_options(&config, &endpoint("db.internal", 5432, false)).unwrap();

        assert_eq!(options.get_host(), "db.example.com");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("prod"));
    }

    #[test]
    fn test_tunnel_overrides_url_endpoint() {
        let mut config = database();
        config.url = Some("postgres://remote:pw@db.example.com:6543/prod".to_string());

        let options = connect_options(&config, &endpoint("127.0.0.1", 40123, true)).unwrap();

        assert_eq!(options.get_host(), "127.0.0.1");
        assert_eq!(options.get_port(), 40123);
        assert_eq!(options.get_username(), "remote");
    }

    /// Connects to `TEST_DATABASE_URL`; run with `cargo test -- --ignored`.
    async fn live_repository() -> PostgresRepository {
        let mut config = database();
        config.url = std::env::var("TEST_DATABASE_URL").ok();
        assert!(config.url.is_some(), "TEST_DATABASE_URL must be set");
        PostgresRepository::connect(&config, &endpoint("localhost", 5432, false))
            .await
            .unwrap()
    }

    #[tokio::test]
    #[ignore = "needs a PostgreSQL server at TEST_DATABASE_URL"]
    async fn test_concurrent_reparenting_cannot_form_cycle() {
        let repo = live_repository().await;
        let a = Unit::new("race-a");
        let b = Unit::new("race-b");
        repo.create_unit(&a).await.unwrap();
        repo.create_unit(&b).await.unwrap();

        let a_under_b = a.clone().with_parent(b.id);
        let b_under_a = b.clone().with_parent(a.id);
        let (first, second) = tokio::join!(
            repo.update_unit(&a_under_b),
            repo.update_unit(&b_under_a)
        );

        let applied = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(applied, 1, "{first:?} {second:?}");
        assert!([first, second]
            .iter()
            .any(|r| matches!(r, Err(RepositoryError::InvalidData(_)))));

        let _ = repo.delete_unit(a.id).await;
        let _ = repo.delete_unit(b.id).await;
    }

    #[test]
    fn test_unit_lock_conflicts_with_itself() {
        assert!(schema::LOCK_UNITS.contains("units"));
        assert!(schema::LOCK_UNITS.contains("SHARE ROW EXCLUSIVE"));
    }

    #[test]
    fn test_malformed_url_is_connection_error() {
        let mut config = database();
        config.url = Some("not a url".to_string());

        let result = connect_options(&config, &endpoint("db.internal", 5432, false));

        assert!(matches!(result, Err(RepositoryError::ConnectionFailed(_))));
    }
}
