mod auth;
mod client;

pub use auth::AuthTokens;
pub use client::{ApiClient, ApiError};
