pub mod adapters;
pub mod postgres;
pub mod sessions;
