//! Application state with repository-based storage.
//!
//! This module defines the shared application state that is passed to all
//! request handlers. It holds repository trait objects for storage
//! abstraction; the concrete backend is chosen by feature flag in
//! [`crate::storage`].

use std::sync::Arc;

use commune_auth::AuthState;
use commune_core::storage::{
    AnnouncementRepository, AttendeeRepository, EventRepository, MembershipRepository,
    UnitRepository, UserRepository,
};

use crate::config::Config;
use crate::tunnel::TunnelStatus;

/// Shared application state.
///
/// This is cloned for each request handler and contains shared resources
/// including repository trait objects for database access.
#[derive(Clone)]
pub struct AppState {
    /// Auth state, extracted by `CurrentUser` and the auth routes.
    pub auth: AuthState,
    pub units: Arc<dyn UnitRepository>,
    pub memberships: Arc<dyn MembershipRepository>,
    pub events: Arc<dyn EventRepository>,
    pub attendees: Arc<dyn AttendeeRepository>,
    pub announcements: Arc<dyn AnnouncementRepository>,
    /// Route prefix for the API, already normalized.
    pub api_prefix: String,
    /// Name of the compiled-in storage backend.
    pub storage: &'static str,
    /// Tunnel state captured at startup.
    pub tunnel: TunnelStatus,
}

impl AppState {
    /// Creates the state from one repository implementing every trait.
    pub fn new<R>(repo: Arc<R>, auth: AuthState, config: &Config, tunnel: TunnelStatus) -> Self
    where
        R: UserRepository
            + UnitRepository
            + MembershipRepository
            + EventRepository
            + AttendeeRepository
            + AnnouncementRepository
            + 'static,
    {
        Self {
            auth,
            units: repo.clone(),
            memberships: repo.clone(),
            events: repo.clone(),
            attendees: repo.clone(),
            announcements: repo,
            api_prefix: config.api_prefix.clone(),
            storage: crate::storage::BACKEND,
            tunnel,
        }
    }
}

impl AsRef<AuthState> for AppState {
    fn as_ref(&self) -> &AuthState {
        &self.auth
    }
}
