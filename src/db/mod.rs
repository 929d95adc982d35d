//! Database layer for sessiongate
//!
//! MongoDB storage for users and sessions, plus in-memory user storage.

pub mod mongo;
pub mod schemas;
pub mod users;

pub use mongo::{MongoClient, MongoCollection};
pub use users::{MemoryUserRepository, MongoUserRepository, NewUser, User, UserRepository, UserView};
