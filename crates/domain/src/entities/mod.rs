pub mod account_analytics;
pub mod linked_accounts;
pub mod post_analytics;
pub mod post_shares;
pub mod posts;
