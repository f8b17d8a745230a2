pub mod accounts;
pub mod analytics;
pub mod oauth;
pub mod posts;
