//! User and group storage.
//!
//! The core only needs `get` and `create`; the SQLite implementation in
//! [`sqlite`] is what the server wires up by default.

pub mod bootstrap;
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

pub use sqlite::{SqliteGroupDao, SqliteUserDao};

#[derive(Debug, Error)]
pub enum DaoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Stored operator account. `password` holds the digest, never plaintext.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub password: String,
    pub name: String,
    pub group_id: String,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("password", &"***")
            .field("name", &self.name)
            .field("group_id", &self.group_id)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub name: String,
}

#[async_trait]
pub trait UserDao: Send + Sync {
    async fn get(&self, username: &str) -> Result<Option<User>, DaoError>;

    /// Insert a user; `Ok(false)` when the username is already taken.
    async fn create(
        &self,
        username: &str,
        password: &str,
        name: &str,
        group_id: &str,
    ) -> Result<bool, DaoError>;
}

#[async_trait]
pub trait GroupDao: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Group>, DaoError>;

    /// Insert a group; `Ok(false)` when the id is already taken.
    async fn create(&self, id: &str, name: &str) -> Result<bool, DaoError>;
}
