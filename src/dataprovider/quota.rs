use super::{DataProvider, SqlxResultExt};
use crate::core::error::{ProviderError, ProviderResult};
use crate::utils::time::current_timestamp_millis;
use sqlx::Row;
use tracing::{debug, warn};

impl DataProvider {
    /// Current usage as `(files, bytes)`.
    pub async fn get_used_quota(&self, username: &str) -> ProviderResult<(i64, i64)> {
        let row = sqlx::query(self.queries.used_quota())
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .storage("get_used_quota")
            .inspect_err(|e| warn!(username, error = %e, "Failed to read used quota"))?
            .ok_or_else(|| ProviderError::NotFound(format!("user {username}")))?;

        let size: i64 = row.try_get("used_quota_size").storage("get_used_quota")?;
        let files: i64 = row.try_get("used_quota_files").storage("get_used_quota")?;
        Ok((files, size))
    }

    /// Apply a usage change for `username`.
    ///
    /// With `reset` the deltas become the new absolute values (full rescan),
    /// otherwise they are added to the stored counters. Counters never go
    /// below zero: an underflow is clamped and logged, and still succeeds.
    ///
    /// Incremental updates run the arithmetic inside the database and clamp
    /// within the same transaction, so concurrent updates for one user never
    /// lose a delta.
    pub async fn update_quota(
        &self,
        username: &str,
        files_delta: i64,
        size_delta: i64,
        reset: bool,
    ) -> ProviderResult<()> {
        let now = current_timestamp_millis();

        if reset {
            let files = clamp_counter(username, "files", files_delta);
            let size = clamp_counter(username, "size", size_delta);

            let result = sqlx::query(self.queries.set_quota())
                .bind(size)
                .bind(files)
                .bind(now)
                .bind(username)
                .execute(&self.pool)
                .await
                .storage("update_quota")
                .inspect_err(|e| warn!(username, error = %e, "Failed to reset quota"))?;

            if result.rows_affected() == 0 {
                return Err(ProviderError::NotFound(format!("user {username}")));
            }

            debug!(username, files, size, "Quota reset");
            return Ok(());
        }

        let mut tx = self.pool.begin().await.storage("update_quota")?;

        let row = sqlx::query(self.queries.add_quota())
            .bind(size_delta)
            .bind(files_delta)
            .bind(now)
            .bind(username)
            .fetch_optional(&mut *tx)
            .await
            .storage("update_quota")
            .inspect_err(|e| warn!(username, error = %e, "Failed to update quota"))?;

        let Some(row) = row else {
            tx.rollback().await.storage("update_quota")?;
            return Err(ProviderError::NotFound(format!("user {username}")));
        };

        let mut size: i64 = row.try_get("used_quota_size").storage("update_quota")?;
        let mut files: i64 = row.try_get("used_quota_files").storage("update_quota")?;

        if size < 0 || files < 0 {
            files = clamp_counter(username, "files", files);
            size = clamp_counter(username, "size", size);

            sqlx::query(self.queries.clamp_quota())
                .bind(username)
                .execute(&mut *tx)
                .await
                .storage("update_quota")
                .inspect_err(|e| warn!(username, error = %e, "Failed to clamp quota"))?;
        }

        tx.commit().await.storage("update_quota")?;

        debug!(username, files_delta, size_delta, files, size, "Quota updated");
        Ok(())
    }
}

fn clamp_counter(username: &str, counter: &'static str, value: i64) -> i64 {
    if value < 0 {
        warn!(
            username,
            counter,
            value,
            "Used quota is negative, some files were probably changed without being tracked, please rescan quota"
        );
        0
    } else {
        value
    }
}
