pub mod oauth_sessions;
pub mod platform;
