pub mod analytics;
pub mod enums;
pub mod oauth;
pub mod platform_api;
pub mod publish;
