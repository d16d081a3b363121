// Student profiles: the persisted record, its store, and the profile API.

pub mod handlers;
pub mod models;
pub mod store;
