pub mod analytics;
pub mod oauth_connector;
pub mod publish;
