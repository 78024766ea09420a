use super::queries::SortOrder;
use super::validation::validate_user;
use super::{DataProvider, SqlxResultExt};
use crate::core::error::{ProviderError, ProviderResult};
use crate::models::user::User;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, info, warn};

impl DataProvider {
    pub async fn get_user_by_username(&self, username: &str) -> ProviderResult<User> {
        let row = sqlx::query(&self.queries.user_by_username())
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .storage("get_user_by_username")
            .inspect_err(|e| warn!(username, error = %e, "Failed to look up user"))?;

        match row {
            Some(row) => user_from_row(&row),
            None => {
                debug!(username, "User not found");
                Err(ProviderError::NotFound(format!("user {username}")))
            }
        }
    }

    pub async fn get_user_by_id(&self, id: i64) -> ProviderResult<User> {
        let row = sqlx::query(&self.queries.user_by_id())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .storage("get_user_by_id")
            .inspect_err(|e| warn!(user_id = id, error = %e, "Failed to look up user"))?;

        match row {
            Some(row) => user_from_row(&row),
            None => {
                debug!(user_id = id, "User not found");
                Err(ProviderError::NotFound(format!("user with id {id}")))
            }
        }
    }

    /// Validate and insert `user`, returning the storage assigned id.
    ///
    /// Usage counters on `user` are ignored; new records start at zero.
    pub async fn add_user(&self, user: &User) -> ProviderResult<i64> {
        validate_user(user)?;
        let permissions = permissions_to_json(&user.permissions)?;

        let row = sqlx::query(self.queries.insert_user())
            .bind(&user.username)
            .bind(&user.password)
            .bind(&user.public_key)
            .bind(&user.home_dir)
            .bind(user.uid)
            .bind(user.gid)
            .bind(user.max_sessions)
            .bind(user.quota_size)
            .bind(user.quota_files)
            .bind(permissions)
            .bind(user.upload_bandwidth)
            .bind(user.download_bandwidth)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "add_user", &user.username))?;

        let id: i64 = row.try_get("id").storage("add_user")?;
        info!(username = %user.username, user_id = id, "User added");
        Ok(id)
    }

    /// Validate and replace the mutable fields of the user with `user.id`.
    ///
    /// The username and the usage counters are left as stored.
    pub async fn update_user(&self, user: &User) -> ProviderResult<()> {
        validate_user(user)?;
        let permissions = permissions_to_json(&user.permissions)?;

        let result = sqlx::query(self.queries.update_user())
            .bind(&user.password)
            .bind(&user.public_key)
            .bind(&user.home_dir)
            .bind(user.uid)
            .bind(user.gid)
            .bind(user.max_sessions)
            .bind(user.quota_size)
            .bind(user.quota_files)
            .bind(permissions)
            .bind(user.upload_bandwidth)
            .bind(user.download_bandwidth)
            .bind(user.id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "update_user", &user.username))?;

        if result.rows_affected() == 0 {
            debug!(user_id = user.id, "Update for unknown user");
            return Err(ProviderError::NotFound(format!("user with id {}", user.id)));
        }

        info!(username = %user.username, user_id = user.id, "User updated");
        Ok(())
    }

    pub async fn delete_user(&self, user: &User) -> ProviderResult<()> {
        let result = sqlx::query(self.queries.delete_user())
            .bind(user.id)
            .execute(&self.pool)
            .await
            .storage("delete_user")
            .inspect_err(|e| warn!(user_id = user.id, error = %e, "Failed to delete user"))?;

        if result.rows_affected() == 0 {
            return Err(ProviderError::NotFound(format!("user with id {}", user.id)));
        }

        info!(username = %user.username, user_id = user.id, "User deleted");
        Ok(())
    }

    /// Paginated listing. Returned records never carry a password or a
    /// public key.
    pub async fn list_users(
        &self,
        limit: i64,
        offset: i64,
        order: SortOrder,
        username: Option<&str>,
    ) -> ProviderResult<Vec<User>> {
        let username = username.filter(|u| !u.is_empty());
        let sql = self.queries.list_users(order, username.is_some());

        let mut query = sqlx::query(&sql);
        if let Some(username) = username {
            query = query.bind(username);
        }

        let rows = query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .storage("list_users")
            .inspect_err(|e| warn!(error = %e, "Failed to list users"))?;

        rows.iter()
            .map(|row| user_from_row(row).map(User::without_credentials))
            .collect()
    }
}

fn user_from_row(row: &AnyRow) -> ProviderResult<User> {
    let permissions: String = row.try_get("permissions").storage("decode_user")?;
    let permissions = serde_json::from_str(&permissions).map_err(|e| {
        ProviderError::Configuration(format!("stored permissions are not a valid list: {e}"))
    })?;

    Ok(User {
        id: row.try_get("id").storage("decode_user")?,
        username: row.try_get("username").storage("decode_user")?,
        password: row
            .try_get::<Option<String>, _>("password")
            .storage("decode_user")?
            .unwrap_or_default(),
        public_key: row
            .try_get::<Option<String>, _>("public_key")
            .storage("decode_user")?
            .unwrap_or_default(),
        home_dir: row.try_get("home_dir").storage("decode_user")?,
        uid: row.try_get("uid").storage("decode_user")?,
        gid: row.try_get("gid").storage("decode_user")?,
        max_sessions: row.try_get("max_sessions").storage("decode_user")?,
        quota_size: row.try_get("quota_size").storage("decode_user")?,
        quota_files: row.try_get("quota_files").storage("decode_user")?,
        permissions,
        used_quota_size: row.try_get("used_quota_size").storage("decode_user")?,
        used_quota_files: row.try_get("used_quota_files").storage("decode_user")?,
        last_quota_update: row.try_get("last_quota_update").storage("decode_user")?,
        upload_bandwidth: row.try_get("upload_bandwidth").storage("decode_user")?,
        download_bandwidth: row.try_get("download_bandwidth").storage("decode_user")?,
    })
}

fn permissions_to_json(permissions: &[String]) -> ProviderResult<String> {
    serde_json::to_string(permissions)
        .map_err(|e| ProviderError::Configuration(format!("cannot serialize permissions: {e}")))
}

fn map_write_error(err: sqlx::Error, operation: &'static str, username: &str) -> ProviderError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            debug!(username, "Username already taken");
            return ProviderError::DuplicateUsername(username.to_string());
        }
    }
    warn!(username, operation, error = %err, "User write failed");
    ProviderError::Storage {
        operation,
        source: err,
    }
}
