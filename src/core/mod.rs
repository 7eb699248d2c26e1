//! Core Module - infrastructure shared by the whole application
//!
//! - Session tokens and authentication
//! - Configuration
//! - Error handling and request extractors
//! - Application state

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod state;

pub use auth::{Claims, SessionUser, authentication_middleware, decode_jwt, encode_jwt};
pub use config::Config;
pub use error::AppError;
pub use extract::AppJson;
pub use state::AppState;
