pub mod analytics;
pub mod linked_accounts;
pub mod posts;
