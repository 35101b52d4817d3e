//! In-memory repository implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use commune_core::community::{
    announcement_matches, attendee_matches, event_matches, sort_announcements, sort_events,
    sort_units, unit_matches, user_conflict, would_create_cycle, Announcement, Event,
    EventAttendee, Membership, Unit, User,
};
use commune_core::storage::{
    AnnouncementFilter, AnnouncementRepository, AttendeeFilter, AttendeeRepository, EventFilter,
    EventRepository, MembershipRepository, RepositoryError, Result, UnitFilter, UnitRepository,
    UserRepository,
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    units: HashMap<Uuid, Unit>,
    /// Keyed by (unit_id, user_id).
    memberships: HashMap<(Uuid, Uuid), Membership>,
    events: HashMap<Uuid, Event>,
    /// Keyed by (event_id, user_id).
    attendees: HashMap<(Uuid, Uuid), EventAttendee>,
    announcements: HashMap<Uuid, Announcement>,
}

impl Tables {
    fn require_user(&self, id: Uuid) -> Result<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(RepositoryError::InvalidData(format!("unknown user {id}")))
        }
    }

    fn require_unit(&self, id: Option<Uuid>) -> Result<()> {
        match id {
            Some(id) if !self.units.contains_key(&id) => {
                Err(RepositoryError::InvalidData(format!("unknown unit {id}")))
            }
            _ => Ok(()),
        }
    }

    fn unit_parents(&self) -> HashMap<Uuid, Option<Uuid>> {
        self.units
            .values()
            .map(|unit| (unit.id, unit.parent_unit_id))
            .collect()
    }

    fn remove_event(&mut self, id: Uuid) -> Option<Event> {
        let removed = self.events.remove(&id)?;
        self.attendees.retain(|(event_id, _), _| *event_id != id);
        Some(removed)
    }
}

/// In-memory storage backend.
///
/// All tables sit behind a single `RwLock`, so every uniqueness and reference
/// check happens atomically with the write it guards. Data is lost when the
/// repository is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.id) {
            return Err(RepositoryError::already_exists("User", user.id));
        }
        if let Some(error) = user_conflict(tables.users.values(), user) {
            return Err(error);
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user.id) {
            return Err(RepositoryError::not_found("User", user.id));
        }
        if let Some(error) = user_conflict(tables.users.values(), user) {
            return Err(error);
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }
}

#[async_trait]
impl UnitRepository for InMemoryRepository {
    async fn get_unit(&self, id: Uuid) -> Result<Option<Unit>> {
        Ok(self.tables.read().await.units.get(&id).cloned())
    }

    async fn list_units(&self, filter: &UnitFilter) -> Result<Vec<Unit>> {
        let tables = self.tables.read().await;
        let mut units: Vec<Unit> = tables
            .units
            .values()
            .filter(|unit| unit_matches(unit, filter))
            .cloned()
            .collect();
        sort_units(&mut units);
        Ok(units)
    }

    async fn create_unit(&self, unit: &Unit) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.units.contains_key(&unit.id) {
            return Err(RepositoryError::already_exists("Unit", unit.id));
        }
        tables.require_unit(unit.parent_unit_id)?;
        tables.units.insert(unit.id, unit.clone());
        Ok(())
    }

    async fn update_unit(&self, unit: &Unit) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.units.contains_key(&unit.id) {
            return Err(RepositoryError::not_found("Unit", unit.id));
        }
        tables.require_unit(unit.parent_unit_id)?;
        if would_create_cycle(unit.id, unit.parent_unit_id, &tables.unit_parents()) {
            return Err(RepositoryError::InvalidData(format!(
                "unit {} cannot be its own ancestor",
                unit.id
            )));
        }
        tables.units.insert(unit.id, unit.clone());
        Ok(())
    }

    async fn delete_unit(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.units.remove(&id).is_none() {
            return Err(RepositoryError::not_found("Unit", id));
        }

        for child in tables
            .units
            .values_mut()
            .filter(|unit| unit.parent_unit_id == Some(id))
        {
            child.parent_unit_id = None;
        }
        tables.memberships.retain(|(unit_id, _), _| *unit_id != id);
        let event_ids: Vec<Uuid> = tables
            .events
            .values()
            .filter(|event| event.unit_id == Some(id))
            .map(|event| event.id)
            .collect();
        for event_id in event_ids {
            tables.remove_event(event_id);
        }
        tables
            .announcements
            .retain(|_, announcement| announcement.unit_id != Some(id));
        Ok(())
    }
}

#[async_trait]
impl MembershipRepository for InMemoryRepository {
    async fn get_membership(&self, unit_id: Uuid, user_id: Uuid) -> Result<Option<Membership>> {
        let tables = self.tables.read().await;
        Ok(tables.memberships.get(&(unit_id, user_id)).cloned())
    }

    async fn list_members(&self, unit_id: Uuid) -> Result<Vec<Membership>> {
        let tables = self.tables.read().await;
        let mut members: Vec<Membership> = tables
            .memberships
            .values()
            .filter(|m| m.unit_id == unit_id)
            .cloned()
            .collect();
        members.sort_by_key(|m| (m.joined_at, m.user_id));
        Ok(members)
    }

    async fn create_membership(&self, membership: &Membership) -> Result<()> {
        let mut tables = self.tables.write().await;
        let key = (membership.unit_id, membership.user_id);
        if tables.memberships.contains_key(&key) {
            return Err(RepositoryError::already_exists(
                "Membership",
                format!("unit={} user={}", membership.unit_id, membership.user_id),
            ));
        }
        tables.require_unit(Some(membership.unit_id))?;
        tables.require_user(membership.user_id)?;
        tables.memberships.insert(key, membership.clone());
        Ok(())
    }

    async fn update_membership(&self, membership: &Membership) -> Result<()> {
        let mut tables = self.tables.write().await;
        let key = (membership.unit_id, membership.user_id);
        match tables.memberships.get_mut(&key) {
            Some(stored) => {
                *stored = membership.clone();
                Ok(())
            }
            None => Err(RepositoryError::not_found(
                "Membership",
                format!("unit={} user={}", membership.unit_id, membership.user_id),
            )),
        }
    }

    async fn delete_membership(&self, unit_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.memberships.remove(&(unit_id, user_id)).is_none() {
            return Err(RepositoryError::not_found(
                "Membership",
                format!("unit={unit_id} user={user_id}"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl EventRepository for InMemoryRepository {
    async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.tables.read().await.events.get(&id).cloned())
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let tables = self.tables.read().await;
        let mut events: Vec<Event> = tables
            .events
            .values()
            .filter(|event| event_matches(event, filter))
            .cloned()
            .collect();
        sort_events(&mut events);
        Ok(events)
    }

    async fn create_event(&self, event: &Event) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.events.contains_key(&event.id) {
            return Err(RepositoryError::already_exists("Event", event.id));
        }
        tables.require_user(event.creator_id)?;
        tables.require_unit(event.unit_id)?;
        tables.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn update_event(&self, event: &Event) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.events.contains_key(&event.id) {
            return Err(RepositoryError::not_found("Event", event.id));
        }
        tables.require_unit(event.unit_id)?;
        tables.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn delete_event(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .remove_event(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found("Event", id))
    }
}

#[async_trait]
impl AttendeeRepository for InMemoryRepository {
    async fn list_attendees(
        &self,
        event_id: Uuid,
        filter: &AttendeeFilter,
    ) -> Result<Vec<EventAttendee>> {
        let tables = self.tables.read().await;
        let mut attendees: Vec<EventAttendee> = tables
            .attendees
            .values()
            .filter(|a| a.event_id == event_id && attendee_matches(a, filter))
            .cloned()
            .collect();
        attendees.sort_by_key(|a| (a.created_at, a.user_id));
        Ok(attendees)
    }

    async fn upsert_attendee(&self, attendee: &EventAttendee) -> Result<EventAttendee> {
        let mut tables = self.tables.write().await;
        if !tables.events.contains_key(&attendee.event_id) {
            return Err(RepositoryError::InvalidData(format!(
                "unknown event {}",
                attendee.event_id
            )));
        }
        tables.require_user(attendee.user_id)?;

        let stored = tables
            .attendees
            .entry((attendee.event_id, attendee.user_id))
            .and_modify(|existing| existing.status = attendee.status)
            .or_insert_with(|| attendee.clone());
        Ok(stored.clone())
    }

    async fn delete_attendee(&self, event_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.attendees.remove(&(event_id, user_id)).is_none() {
            return Err(RepositoryError::not_found(
                "EventAttendee",
                format!("event={event_id} user={user_id}"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl AnnouncementRepository for InMemoryRepository {
    async fn get_announcement(&self, id: Uuid) -> Result<Option<Announcement>> {
        Ok(self.tables.read().await.announcements.get(&id).cloned())
    }

    async fn list_announcements(&self, filter: &AnnouncementFilter) -> Result<Vec<Announcement>> {
        let tables = self.tables.read().await;
        let mut announcements: Vec<Announcement> = tables
            .announcements
            .values()
            .filter(|a| announcement_matches(a, filter))
            .cloned()
            .collect();
        sort_announcements(&mut announcements);
        Ok(announcements)
    }

    async fn create_announcement(&self, announcement: &Announcement) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.announcements.contains_key(&announcement.id) {
            return Err(RepositoryError::already_exists("Announcement", announcement.id));
        }
        tables.require_user(announcement.author_id)?;
        tables.require_unit(announcement.unit_id)?;
        tables
            .announcements
            .insert(announcement.id, announcement.clone());
        Ok(())
    }

    async fn update_announcement(&self, announcement: &Announcement) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.announcements.contains_key(&announcement.id) {
            return Err(RepositoryError::not_found("Announcement", announcement.id));
        }
        tables.require_unit(announcement.unit_id)?;
        tables
            .announcements
            .insert(announcement.id, announcement.clone());
        Ok(())
    }

    async fn delete_announcement(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.announcements.remove(&id).is_none() {
            return Err(RepositoryError::not_found("Announcement", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use commune_core::community::{AttendanceStatus, UnitRole};

    async fn repo_with_user(username: &str) -> (InMemoryRepository, User) {
        let repo = InMemoryRepository::new();
        let user = User::new(username, "!unusable", Utc::now());
        repo.create_user(&user).await.unwrap();
        (repo, user)
    }

    // ========================================================================
    // Users
    // ========================================================================

    #[tokio::test]
    async fn test_duplicate_external_id_is_rejected() {
        let (repo, _) = repo_with_user("nova").await;
        let first = User::new("vega", "!x", Utc::now()).with_external_id("999");
        let second = User::new("lyra", "!x", Utc::now()).with_external_id("999");

        repo.create_user(&first).await.unwrap();
        let result = repo.create_user(&second).await;

        assert!(matches!(
            result,
            Err(RepositoryError::AlreadyExists { entity_type: "User", .. })
        ));
    }

    #[tokio::test]
    async fn test_username_uniqueness_applies_on_update() {
        let (repo, nova) = repo_with_user("nova").await;
        let mut vega = User::new("vega", "!x", Utc::now());
        repo.create_user(&vega).await.unwrap();

        vega.username = nova.username.clone();
        let result = repo.update_user(&vega).await;

        assert!(matches!(result, Err(RepositoryError::AlreadyExists { .. })));
        let stored = repo.get_user(vega.id).await.unwrap().unwrap();
        assert_eq!(stored.username, "vega");
    }

    #[tokio::test]
    async fn test_lookup_by_external_id_and_username() {
        let repo = InMemoryRepository::new();
        let user = User::new("nova", "!x", Utc::now()).with_external_id("999");
        repo.create_user(&user).await.unwrap();

        let by_external = repo.get_user_by_external_id("999").await.unwrap();
        let by_username = repo.get_user_by_username("nova").await.unwrap();

        assert_eq!(by_external.map(|u| u.id), Some(user.id));
        assert_eq!(by_username.map(|u| u.id), Some(user.id));
        assert!(repo.get_user_by_external_id("1000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let repo = InMemoryRepository::new();
        let ghost = User::new("ghost", "!x", Utc::now());

        let result = repo.update_user(&ghost).await;

        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    // ========================================================================
    // Units
    // ========================================================================

    #[tokio::test]
    async fn test_unit_with_unknown_parent_is_invalid() {
        let repo = InMemoryRepository::new();
        let unit = Unit::new("Orphans").with_parent(Uuid::new_v4());

        let result = repo.create_unit(&unit).await;

        assert!(matches!(result, Err(RepositoryError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_list_units_filters_by_parent_and_search() {
        let repo = InMemoryRepository::new();
        let root = Unit::new("Guild");
        let alpha = Unit::new("Alpha Squad").with_parent(root.id);
        let beta = Unit::new("Beta Squad")
            .with_parent(root.id)
            .with_description("night raids");
        repo.create_unit(&root).await.unwrap();
        repo.create_unit(&alpha).await.unwrap();
        repo.create_unit(&beta).await.unwrap();

        let children = repo
            .list_units(&UnitFilter {
                parent: Some(root.id),
                ..Default::default()
            })
            .await
            .unwrap();
        let raids = repo
            .list_units(&UnitFilter {
                search: Some("RAIDS".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(
            children.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(),
            ["Alpha Squad", "Beta Squad"]
        );
        assert_eq!(raids.len(), 1);
        assert_eq!(raids[0].id, beta.id);
    }

    #[tokio::test]
    async fn test_update_unit_rejects_cycle() {
        let repo = InMemoryRepository::new();
        let root = Unit::new("Root");
        let child = Unit::new("Child").with_parent(root.id);
        repo.create_unit(&root).await.unwrap();
        repo.create_unit(&child).await.unwrap();

        let mut looped = root.clone();
        looped.parent_unit_id = Some(child.id);
        let result = repo.update_unit(&looped).await;

        assert!(matches!(result, Err(RepositoryError::InvalidData(_))));
        let stored = repo.get_unit(root.id).await.unwrap().unwrap();
        assert_eq!(stored.parent_unit_id, None);
    }

    #[tokio::test]
    async fn test_delete_unit_detaches_children_and_cascades() {
        let (repo, user) = repo_with_user("nova").await;
        let unit = Unit::new("Guild");
        let child = Unit::new("Squad").with_parent(unit.id);
        repo.create_unit(&unit).await.unwrap();
        repo.create_unit(&child).await.unwrap();

        repo.create_membership(&Membership::new(user.id, unit.id, UnitRole::Leader))
            .await
            .unwrap();
        let now = Utc::now();
        let event = Event::new("Raid", now, now + Duration::hours(2), user.id).with_unit(unit.id);
        repo.create_event(&event).await.unwrap();
        repo.upsert_attendee(&EventAttendee::new(event.id, user.id, AttendanceStatus::Attending))
            .await
            .unwrap();
        let unit_news = Announcement::new("Update", "Body", user.id).with_unit(unit.id);
        let global_news = Announcement::new("Global", "Body", user.id);
        repo.create_announcement(&unit_news).await.unwrap();
        repo.create_announcement(&global_news).await.unwrap();

        repo.delete_unit(unit.id).await.unwrap();

        let child = repo.get_unit(child.id).await.unwrap().unwrap();
        assert_eq!(child.parent_unit_id, None);
        assert!(repo.list_members(unit.id).await.unwrap().is_empty());
        assert!(repo.get_event(event.id).await.unwrap().is_none());
        assert!(repo
            .list_attendees(event.id, &AttendeeFilter::default())
            .await
            .unwrap()
            .is_empty());
        assert!(repo.get_announcement(unit_news.id).await.unwrap().is_none());
        assert!(repo.get_announcement(global_news.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_unit_is_not_found() {
        let repo = InMemoryRepository::new();

        let result = repo.delete_unit(Uuid::new_v4()).await;

        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    // ========================================================================
    // Memberships
    // ========================================================================

    #[tokio::test]
    async fn test_duplicate_membership_is_rejected() {
        let (repo, user) = repo_with_user("nova").await;
        let unit = Unit::new("Guild");
        repo.create_unit(&unit).await.unwrap();
        let membership = Membership::new(user.id, unit.id, UnitRole::Member);

        repo.create_membership(&membership).await.unwrap();
        let result = repo.create_membership(&membership).await;

        assert!(matches!(
            result,
            Err(RepositoryError::AlreadyExists { entity_type: "Membership", .. })
        ));
    }

    #[tokio::test]
    async fn test_membership_requires_existing_user() {
        let repo = InMemoryRepository::new();
        let unit = Unit::new("Guild");
        repo.create_unit(&unit).await.unwrap();

        let result = repo
            .create_membership(&Membership::new(Uuid::new_v4(), unit.id, UnitRole::Member))
            .await;

        assert!(matches!(result, Err(RepositoryError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_update_and_delete_membership() {
        let (repo, user) = repo_with_user("nova").await;
        let unit = Unit::new("Guild");
        repo.create_unit(&unit).await.unwrap();
        let mut membership = Membership::new(user.id, unit.id, UnitRole::Member);
        repo.create_membership(&membership).await.unwrap();

        membership.role = UnitRole::Admin;
        repo.update_membership(&membership).await.unwrap();
        let stored = repo.get_membership(unit.id, user.id).await.unwrap().unwrap();
        assert_eq!(stored.role, UnitRole::Admin);

        repo.delete_membership(unit.id, user.id).await.unwrap();
        assert!(repo.get_membership(unit.id, user.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete_membership(unit.id, user.id).await,
            Err(RepositoryError::NotFound { .. })
        ));
    }

    // ========================================================================
    // Events and attendance
    // ========================================================================

    #[tokio::test]
    async fn test_list_events_ordered_by_start_within_window() {
        let (repo, user) = repo_with_user("nova").await;
        let base = Utc::now();
        let late = Event::new("Late", base + Duration::days(3), base + Duration::days(4), user.id);
        let early = Event::new("Early", base + Duration::days(1), base + Duration::days(2), user.id);
        let outside = Event::new("Outside", base + Duration::days(9), base + Duration::days(10), user.id);
        for event in [&late, &early, &outside] {
            repo.create_event(event).await.unwrap();
        }

        let events = repo
            .list_events(&EventFilter {
                from: Some(base),
                to: Some(base + Duration::days(5)),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(
            events.iter().map(|e| e.title.as_str()).collect::<Vec<_>>(),
            ["Early", "Late"]
        );
    }

    #[tokio::test]
    async fn test_event_requires_existing_creator() {
        let repo = InMemoryRepository::new();
        let now = Utc::now();
        let event = Event::new("Raid", now, now, Uuid::new_v4());

        let result = repo.create_event(&event).await;

        assert!(matches!(result, Err(RepositoryError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_upsert_attendee_replaces_status_and_keeps_created_at() {
        let (repo, user) = repo_with_user("nova").await;
        let now = Utc::now();
        let event = Event::new("Raid", now, now + Duration::hours(1), user.id);
        repo.create_event(&event).await.unwrap();

        let first = repo
            .upsert_attendee(&EventAttendee::new(event.id, user.id, AttendanceStatus::Tentative))
            .await
            .unwrap();
        let second = repo
            .upsert_attendee(&EventAttendee::new(event.id, user.id, AttendanceStatus::Declined))
            .await
            .unwrap();

        assert_eq!(second.status, AttendanceStatus::Declined);
        assert_eq!(second.created_at, first.created_at);
        let all = repo
            .list_attendees(event.id, &AttendeeFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_list_attendees_filters_by_status() {
        let (repo, nova) = repo_with_user("nova").await;
        let vega = User::new("vega", "!x", Utc::now());
        repo.create_user(&vega).await.unwrap();
        let now = Utc::now();
        let event = Event::new("Raid", now, now, nova.id);
        repo.create_event(&event).await.unwrap();
        repo.upsert_attendee(&EventAttendee::new(event.id, nova.id, AttendanceStatus::Attending))
            .await
            .unwrap();
        repo.upsert_attendee(&EventAttendee::new(event.id, vega.id, AttendanceStatus::Declined))
            .await
            .unwrap();

        let attending = repo
            .list_attendees(
                event.id,
                &AttendeeFilter {
                    status: Some(AttendanceStatus::Attending),
                },
            )
            .await
            .unwrap();

        assert_eq!(attending.len(), 1);
        assert_eq!(attending[0].user_id, nova.id);
    }

    #[tokio::test]
    async fn test_delete_event_removes_attendance() {
        let (repo, user) = repo_with_user("nova").await;
        let now = Utc::now();
        let event = Event::new("Raid", now, now, user.id);
        repo.create_event(&event).await.unwrap();
        repo.upsert_attendee(&EventAttendee::new(event.id, user.id, AttendanceStatus::Attending))
            .await
            .unwrap();

        repo.delete_event(event.id).await.unwrap();

        assert!(matches!(
            repo.delete_attendee(event.id, user.id).await,
            Err(RepositoryError::NotFound { .. })
        ));
    }

    // ========================================================================
    // Announcements
    // ========================================================================

    #[tokio::test]
    async fn test_announcements_pinned_first_then_newest() {
        let (repo, user) = repo_with_user("nova").await;
        let mut old = Announcement::new("Old", "a", user.id);
        old.created_at = Utc::now() - Duration::days(2);
        let mut new = Announcement::new("New", "b", user.id);
        new.created_at = Utc::now();
        let mut pinned = Announcement::new("Pinned", "c", user.id).pinned();
        pinned.created_at = Utc::now() - Duration::days(5);
        for announcement in [&old, &new, &pinned] {
            repo.create_announcement(announcement).await.unwrap();
        }

        let listed = repo
            .list_announcements(&AnnouncementFilter::default())
            .await
            .unwrap();

        assert_eq!(
            listed.iter().map(|a| a.title.as_str()).collect::<Vec<_>>(),
            ["Pinned", "New", "Old"]
        );
    }

    #[tokio::test]
    async fn test_announcement_with_unknown_unit_is_invalid() {
        let (repo, user) = repo_with_user("nova").await;
        let announcement = Announcement::new("Hi", "there", user.id).with_unit(Uuid::new_v4());

        let result = repo.create_announcement(&announcement).await;

        assert!(matches!(result, Err(RepositoryError::InvalidData(_))));
    }
}
