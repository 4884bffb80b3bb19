//! First-run provisioning of the system group and the admin account.

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use super::{GroupDao, UserDao};
use crate::auth::credentials::hash_password;

pub const SYSTEM_GROUP_ID: &str = "administrator";
pub const SYSTEM_GROUP_NAME: &str = "System User Group";
pub const ADMIN_USERNAME: &str = "admin";

/// Make sure the system group and the admin user exist.
///
/// Existing records are left untouched; the admin password is only used when
/// the account has to be created.
///
/// # Errors
/// Returns an error if the store cannot be queried or written.
pub async fn provision(
    groups: &dyn GroupDao,
    users: &dyn UserDao,
    admin_password: &SecretString,
) -> Result<()> {
    let group = groups
        .get(SYSTEM_GROUP_ID)
        .await
        .with_context(|| format!("error while getting group [{SYSTEM_GROUP_ID}]"))?;
    if group.is_none() {
        info!("System group [{SYSTEM_GROUP_ID}] not found, creating one...");
        let created = groups
            .create(SYSTEM_GROUP_ID, SYSTEM_GROUP_NAME)
            .await
            .with_context(|| format!("error while creating group [{SYSTEM_GROUP_ID}]"))?;
        if !created {
            warn!("Cannot create group [{SYSTEM_GROUP_ID}]");
        }
    }

    let admin = users
        .get(ADMIN_USERNAME)
        .await
        .with_context(|| format!("error while getting user [{ADMIN_USERNAME}]"))?;
    if admin.is_none() {
        info!("Admin user [{ADMIN_USERNAME}] not found, creating one...");
        let digest = hash_password(ADMIN_USERNAME, admin_password.expose_secret());
        let created = users
            .create(ADMIN_USERNAME, &digest, ADMIN_USERNAME, SYSTEM_GROUP_ID)
            .await
            .with_context(|| format!("error while creating user [{ADMIN_USERNAME}]"))?;
        if !created {
            warn!("Cannot create user [{ADMIN_USERNAME}]");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{SqliteGroupDao, SqliteUserDao, sqlite::tests::memory_pool};

    #[tokio::test]
    async fn provision_creates_group_and_admin() -> Result<()> {
        let pool = memory_pool().await?;
        let groups = SqliteGroupDao::new(pool.clone());
        let users = SqliteUserDao::new(pool);

        provision(&groups, &users, &SecretString::from("s3cr3t".to_string())).await?;

        assert!(groups.get(SYSTEM_GROUP_ID).await?.is_some());
        let admin = users.get(ADMIN_USERNAME).await?;
        assert_eq!(
            admin.map(|user| (user.password, user.group_id)),
            Some((
                hash_password(ADMIN_USERNAME, "s3cr3t"),
                SYSTEM_GROUP_ID.to_string()
            ))
        );
        Ok(())
    }

    #[tokio::test]
    async fn provision_keeps_existing_admin_password() -> Result<()> {
        let pool = memory_pool().await?;
        let groups = SqliteGroupDao::new(pool.clone());
        let users = SqliteUserDao::new(pool);

        provision(&groups, &users, &SecretString::from("first".to_string())).await?;
        provision(&groups, &users, &SecretString::from("second".to_string())).await?;

        let admin = users.get(ADMIN_USERNAME).await?;
        assert_eq!(
            admin.map(|user| user.password),
            Some(hash_password(ADMIN_USERNAME, "first"))
        );
        Ok(())
    }
}
