#![allow(dead_code)]

use axum::{Router, routing::get};
use axum_test::TestServer;
use chrono::Utc;
use std::sync::Arc;

use profile_links::api::handlers::health_handler;
use profile_links::api::routes::link_routes;
use profile_links::application::services::LinkService;
use profile_links::domain::entities::{LinkRecord, Platform};
use profile_links::infrastructure::cache::NullCache;
use profile_links::infrastructure::persistence::MemoryLinkRepository;
use profile_links::state::AppState;

/// A link service over a fresh in-memory store, without retries.
pub fn memory_service() -> (Arc<LinkService>, Arc<MemoryLinkRepository>) {
    let repository = Arc::new(MemoryLinkRepository::new());
    let service = LinkService::new(repository.clone(), Arc::new(NullCache::new()))
        .with_retry_attempts(0);

    (Arc::new(service), repository)
}

pub fn create_test_state() -> (AppState, Arc<MemoryLinkRepository>) {
    let (service, repository) = memory_service();
    (AppState::new(service), repository)
}

/// The application routes without rate limiting (no peer address in tests).
pub fn test_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", link_routes())
        .with_state(state)
}

pub fn make_server() -> (TestServer, Arc<MemoryLinkRepository>) {
    let (state, repository) = create_test_state();
    let server = TestServer::new(test_router(state)).unwrap();
    (server, repository)
}

pub fn record(id: &str, owner_id: &str, platform: Platform, url: &str) -> LinkRecord {
    let now = Utc::now();
    LinkRecord::new(
        id.to_string(),
        owner_id.to_string(),
        platform,
        url.to_string(),
        now,
        now,
    )
}
