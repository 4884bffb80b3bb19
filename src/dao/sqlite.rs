//! SQLite-backed DAOs.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    Row, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::str::FromStr;
use tracing::{debug, instrument};

use super::{DaoError, Group, GroupDao, User, UserDao};

const CREATE_GROUP_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS cpanel_group (
        gid TEXT NOT NULL PRIMARY KEY,
        gname TEXT NOT NULL
    )
";

const CREATE_USER_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS cpanel_user (
        uname TEXT NOT NULL PRIMARY KEY,
        upassword TEXT NOT NULL,
        display_name TEXT NOT NULL,
        gid TEXT NOT NULL
    )
";

const SELECT_GROUP: &str = "SELECT gid, gname FROM cpanel_group WHERE gid = ?";
const INSERT_GROUP: &str = "INSERT OR IGNORE INTO cpanel_group (gid, gname) VALUES (?, ?)";
const SELECT_USER: &str =
    "SELECT uname, upassword, display_name, gid FROM cpanel_user WHERE uname = ?";
const INSERT_USER: &str =
    "INSERT OR IGNORE INTO cpanel_user (uname, upassword, display_name, gid) VALUES (?, ?, ?, ?)";

/// Open (creating if needed) the database and ensure the tables exist.
///
/// # Errors
/// Returns an error if the DSN is invalid, the database cannot be opened, or
/// the schema cannot be created.
pub async fn connect(dsn: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(dsn)
        .with_context(|| format!("Invalid database DSN: {dsn}"))?
        .create_if_missing(true);

    if let Some(parent) = options.get_filename().parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("Failed to connect to SQLite database")?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Create the group and user tables if they are missing.
///
/// # Errors
/// Returns an error if a statement fails.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    for statement in [CREATE_GROUP_TABLE, CREATE_USER_TABLE] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to create table")?;
    }
    debug!("Database schema ready");
    Ok(())
}

#[derive(Clone, Debug)]
pub struct SqliteGroupDao {
    pool: SqlitePool,
}

impl SqliteGroupDao {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupDao for SqliteGroupDao {
    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> Result<Option<Group>, DaoError> {
        let row = sqlx::query(SELECT_GROUP)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Group {
            id: row.get("gid"),
            name: row.get("gname"),
        }))
    }

    #[instrument(skip(self))]
    async fn create(&self, id: &str, name: &str) -> Result<bool, DaoError> {
        let result = sqlx::query(INSERT_GROUP)
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone, Debug)]
pub struct SqliteUserDao {
    pool: SqlitePool,
}

impl SqliteUserDao {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDao for SqliteUserDao {
    #[instrument(skip(self))]
    async fn get(&self, username: &str) -> Result<Option<User>, DaoError> {
        let row = sqlx::query(SELECT_USER)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| User {
            username: row.get("uname"),
            password: row.get("upassword"),
            name: row.get("display_name"),
            group_id: row.get("gid"),
        }))
    }

    #[instrument(skip(self, password))]
    async fn create(
        &self,
        username: &str,
        password: &str,
        name: &str,
        group_id: &str,
    ) -> Result<bool, DaoError> {
        let result = sqlx::query(INSERT_USER)
            .bind(username)
            .bind(password)
            .bind(name)
            .bind(group_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) async fn memory_pool() -> Result<SqlitePool> {
        // a single connection keeps every query on the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        init_schema(&pool).await?;
        Ok(pool)
    }

    #[tokio::test]
    async fn group_create_then_get() -> Result<()> {
        let dao = SqliteGroupDao::new(memory_pool().await?);

        assert_eq!(dao.get("administrator").await?, None);
        assert!(dao.create("administrator", "System User Group").await?);
        assert!(!dao.create("administrator", "Duplicate").await?);

        let group = dao.get("administrator").await?;
        assert_eq!(
            group,
            Some(Group {
                id: "administrator".to_string(),
                name: "System User Group".to_string(),
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn user_create_then_get() -> Result<()> {
        let dao = SqliteUserDao::new(memory_pool().await?);

        assert_eq!(dao.get("admin").await?, None);
        assert!(dao.create("admin", "digest", "Admin", "administrator").await?);
        assert!(!dao.create("admin", "other", "Other", "administrator").await?);

        let user = dao.get("admin").await?;
        assert_eq!(
            user,
            Some(User {
                username: "admin".to_string(),
                password: "digest".to_string(),
                name: "Admin".to_string(),
                group_id: "administrator".to_string(),
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn connect_creates_database_file() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("data").join("cpanel.db");
        let dsn = format!("sqlite://{}", path.display());

        let pool = connect(&dsn).await?;
        let dao = SqliteUserDao::new(pool);
        assert_eq!(dao.get("nobody").await?, None);
        assert!(path.exists());
        Ok(())
    }

    #[test]
    fn user_debug_hides_password() {
        let user = User {
            username: "admin".to_string(),
            password: "digest".to_string(),
            name: "Admin".to_string(),
            group_id: "administrator".to_string(),
        };
        let debug = format!("{user:?}");
        assert!(!debug.contains("digest"));
        assert!(debug.contains("admin"));
    }
}
