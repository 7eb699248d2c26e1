//! Session tokens and the authentication middleware
//!
//! Every route except `/` runs behind [`authentication_middleware`]: it decodes the
//! bearer token, enforces the email-domain allowlist and resolves the caller to a
//! stored [`User`] (by email), creating it on first contact.

use crate::core::{AppError, AppState};
use crate::dtos::CreateUserDTO;
use crate::entities::User;
use crate::repositories::Create;
use axum::extract::State;
use axum::{Error, body::Body, extract::Request, http, http::Response, middleware::Next};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Lifetime of the tokens issued by the sign-in callback
pub const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Content of the session token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // identity-provider id of the user
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub exp: usize,
    pub iat: usize,
}

/// The caller as described by the identity provider.
/// `id` may differ from the stored user id, which is why lookups go through the email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

impl From<Claims> for SessionUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            image: claims.picture,
        }
    }
}

#[instrument(skip(secret, user), fields(email = %user.email, id = %user.id))]
pub fn encode_jwt(user: &SessionUser, secret: &str) -> Result<String, Error> {
    debug!("Encoding JWT token for user");
    let now = Utc::now();
    let exp = (now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp() as usize;
    let iat = now.timestamp() as usize;
    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        picture: user.image.clone(),
        exp,
        iat,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map(|token| {
        info!("JWT token encoded successfully");
        token
    })
    .map_err(|e| {
        error!("Failed to encode JWT token: {:?}", e);
        Error::new("Error in encoding jwt token")
    })
}

#[instrument(skip(jwt_token, secret))]
pub fn decode_jwt(jwt_token: &str, secret: &str) -> Result<TokenData<Claims>, Error> {
    debug!("Decoding JWT token");
    decode(
        jwt_token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data: TokenData<Claims>| {
        debug!("JWT token decoded for {}", data.claims.email);
        data
    })
    .map_err(|e| {
        warn!("Failed to decode JWT token: {:?}", e);
        Error::new("Error in decoding jwt token")
    })
}

/// An empty allowlist admits every domain; matching ignores case.
pub fn email_domain_allowed(email: &str, allowed_domains: &[String]) -> bool {
    if allowed_domains.is_empty() {
        return true;
    }
    match email.rsplit_once('@') {
        Some((_, domain)) => allowed_domains
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(domain)),
        None => false,
    }
}

/// Finds the stored user for a session by email, creating one on first contact.
/// A new user also takes over the email-only invitations addressed to it.
#[instrument(skip(state, session), fields(email = %session.email))]
pub async fn resolve_or_register_user(
    state: &AppState,
    session: &SessionUser,
) -> Result<User, AppError> {
    if let Some(user) = state.user.find_by_email(&session.email).await? {
        return Ok(user);
    }

    info!("First sign-in, registering user {}", session.id);
    let new_user = CreateUserDTO {
        user_id: session.id.clone(),
        name: Some(
            session
                .name
                .clone()
                .unwrap_or_else(|| "Unknown User".to_string()),
        ),
        email: session.email.clone(),
        image: session.image.clone(),
    };

    let user = match state.user.create(&new_user).await {
        Ok(user) => user,
        Err(e) => {
            // a concurrent request may have registered the same email first
            warn!("User creation failed, retrying lookup: {:?}", e);
            state
                .user
                .find_by_email(&session.email)
                .await?
                .ok_or_else(|| AppError::from(e))?
        }
    };

    let linked = state
        .attendance
        .link_email_to_user(&user.email, &user.user_id)
        .await?;
    if linked > 0 {
        info!("Linked {} pending invitations to {}", linked, user.user_id);
    }

    Ok(user)
}

#[instrument(skip(state, req, next))]
pub async fn authentication_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running authentication middleware");
    let auth_header = match req.headers().get(http::header::AUTHORIZATION) {
        Some(header) => header.to_str().map_err(|_| {
            warn!("Invalid authorization header format");
            AppError::unauthorized("Unauthorized")
        })?,
        None => {
            warn!("Missing authorization header");
            return Err(AppError::unauthorized("Unauthorized"));
        }
    };

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            warn!("Authorization header is not a bearer token");
            AppError::unauthorized("Unauthorized")
        })?;

    let token_data = decode_jwt(token, &state.auth_secret)
        .map_err(|_| AppError::unauthorized("Unauthorized"))?;
    let session = SessionUser::from(token_data.claims);

    if !email_domain_allowed(&session.email, &state.allowed_email_domains) {
        warn!("Email domain not allowed: {}", session.email);
        return Err(AppError::forbidden("Email domain not allowed"));
    }

    let current_user = resolve_or_register_user(&state, &session).await?;
    debug!("Request authenticated as {}", current_user.user_id);

    req.extensions_mut().insert(session);
    req.extensions_mut().insert(current_user);
    Ok(next.run(req).await)
}
