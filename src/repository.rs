//! Repository for soil sample operations.

use sqlx::SqlitePool;
use tracing::debug;

use crate::types::soil_sample::{now_utc, NewSoilSample, SoilSample, SoilSamplePatch};

const SELECT_COLUMNS: &str = "id, potassium, nitrogen, phosphorus, ph, created_at";

/// Persistence failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("soil sample {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// CRUD access to the `soil_samples` table
#[derive(Debug, Clone)]
pub struct SoilSampleRepository {
    pool: SqlitePool,
}

impl SoilSampleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Lists all samples, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list(&self) -> Result<Vec<SoilSample>, StoreError> {
        let samples = sqlx::query_as::<_, SoilSample>(&format!(
            "SELECT {SELECT_COLUMNS} FROM soil_samples ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(samples)
    }

    /// Creates a new sample record with a server-assigned id and timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn create(&self, input: NewSoilSample) -> Result<SoilSample, StoreError> {
        let sample = sqlx::query_as::<_, SoilSample>(&format!(
            r#"
            INSERT INTO soil_samples (potassium, nitrogen, phosphorus, ph, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(input.potassium)
        .bind(input.nitrogen)
        .bind(input.phosphorus)
        .bind(input.ph)
        .bind(now_utc())
        .fetch_one(&self.pool)
        .await?;

        debug!(id = sample.id, "Created soil sample");
        Ok(sample)
    }

    /// Finds a sample by its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no row has this id.
    pub async fn get_by_id(&self, id: i64) -> Result<SoilSample, StoreError> {
        sqlx::query_as::<_, SoilSample>(&format!(
            "SELECT {SELECT_COLUMNS} FROM soil_samples WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))
    }

    /// Applies the non-null fields of `patch` to an existing sample.
    ///
    /// Read, merge, and write run in one transaction that holds the write lock
    /// from the start, so concurrent updates queue on the busy timeout.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no row has this id.
    pub async fn update(&self, id: i64, patch: SoilSamplePatch) -> Result<SoilSample, StoreError> {
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let existing = sqlx::query_as::<_, SoilSample>(&format!(
            "SELECT {SELECT_COLUMNS} FROM soil_samples WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound(id))?;

        let updated = patch.apply_to(&existing);

        sqlx::query(
            r#"
            UPDATE soil_samples
            SET potassium = ?, nitrogen = ?, phosphorus = ?, ph = ?
            WHERE id = ?
            "#,
        )
        .bind(updated.potassium)
        .bind(updated.nitrogen)
        .bind(updated.phosphorus)
        .bind(updated.ph)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(id, ?patch, "Updated soil sample");
        Ok(updated)
    }

    /// Permanently removes a sample.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no row has this id.
    pub async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM soil_samples WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        debug!(id, "Deleted soil sample");
        Ok(())
    }

    /// Counts stored samples.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn count(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM soil_samples")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
