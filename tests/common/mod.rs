#![allow(dead_code)]

use axum_test::TestServer;
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sqlx::SqlitePool;
use std::sync::Arc;
use wip_server::core::{AppState, Claims};

pub const TEST_SECRET: &str = "test-secret-shared-with-the-identity-provider";

/// AppState for tests, every email domain allowed
pub fn create_test_state(pool: SqlitePool) -> Arc<AppState> {
    Arc::new(AppState::new(pool, TEST_SECRET.to_string()))
}

/// AppState that only admits the given email domains
pub fn create_test_state_with_domains(pool: SqlitePool, domains: &[&str]) -> Arc<AppState> {
    Arc::new(
        AppState::new(pool, TEST_SECRET.to_string())
            .with_allowed_domains(domains.iter().map(|d| d.to_string()).collect()),
    )
}

pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = wip_server::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Signs a session token the way the identity provider does
///
/// # Arguments
/// * `sub` - Provider id of the user
/// * `email` - Email of the user
/// * `name` - Display name, if the provider knows it
/// * `valid_for` - Offset of the expiry from now; negative for an expired token
pub fn create_test_jwt_with_expiry(
    sub: &str,
    email: &str,
    name: Option<&str>,
    valid_for: Duration,
) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: sub.to_string(),
        email: email.to_string(),
        name: name.map(str::to_string),
        picture: None,
        exp: (now + valid_for).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("Failed to create JWT token")
}

pub fn create_test_jwt(sub: &str, email: &str, name: Option<&str>) -> String {
    create_test_jwt_with_expiry(sub, email, name, Duration::hours(24))
}

/// Token for one of the users in `fixtures/users.sql`, e.g. `token_for("alice")`
pub fn token_for(first_name: &str) -> String {
    let lower = first_name.to_lowercase();
    let mut display = lower.clone();
    if let Some(first) = display.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    create_test_jwt(
        &format!("user-{lower}"),
        &format!("{lower}@example.com"),
        Some(&display),
    )
}
