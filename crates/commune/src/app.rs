use std::time::Duration;

use axum::{
    http::{header, Method, StatusCode},
    routing::{get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use commune_auth::auth_routes;

use crate::{
    handlers::{
        announcements::{
            create_announcement, delete_announcement, get_announcement, list_announcements,
            update_announcement,
        },
        attendees::{list_attendees, rsvp, withdraw_rsvp},
        events::{create_event, delete_event, get_event, list_events, update_event},
        health::{healthz, livez},
        home::home,
        memberships::{add_member, list_members, remove_member, update_member},
        units::{create_unit, delete_unit, get_unit, list_units, update_unit},
    },
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    // CORS configuration for API endpoints
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    // API routes with CORS
    let api_routes = Router::new()
        .route("/home/", get(home))
        // Unit routes
        .route("/units/", get(list_units).post(create_unit))
        .route(
            "/units/{id}/",
            get(get_unit)
                .put(update_unit)
                .patch(update_unit)
                .delete(delete_unit),
        )
        .route("/units/{id}/members/", get(list_members).post(add_member))
        .route(
            "/units/{id}/members/{user_id}/",
            put(update_member)
                .patch(update_member)
                .delete(remove_member),
        )
        // Event routes
        .route("/events/", get(list_events).post(create_event))
        .route(
            "/events/{id}/",
            get(get_event)
                .put(update_event)
                .patch(update_event)
                .delete(delete_event),
        )
        .route("/events/{id}/attendees/", get(list_attendees))
        .route("/events/{id}/rsvp/", put(rsvp).delete(withdraw_rsvp))
        // Announcement routes
        .route(
            "/announcements/",
            get(list_announcements).post(create_announcement),
        )
        .route(
            "/announcements/{id}/",
            get(get_announcement)
                .put(update_announcement)
                .patch(update_announcement)
                .delete(delete_announcement),
        )
        // Auth routes
        .merge(auth_routes().with_state(state.auth.clone()))
        .layer(cors);

    let router = Router::new()
        .route("/livez", get(livez))
        .route("/healthz", get(healthz));

    // axum refuses to nest at the root, so an empty prefix merges instead
    let router = if state.api_prefix.is_empty() {
        router.merge(api_routes)
    } else {
        router.nest(&state.api_prefix, api_routes)
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
        .with_state(state)
}
