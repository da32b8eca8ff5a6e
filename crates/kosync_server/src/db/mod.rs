mod repo;
mod schema;

pub use repo::{CreateUserOutcome, PositionRecord, SyncRepo, UserInfo};
pub use schema::init_database;
