use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::job::JobField;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Job record persistence. Every call updates exactly one column.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn update_field(&self, job_id: Uuid, field: JobField) -> Result<(), StoreError>;
}

pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn update_field(&self, job_id: Uuid, field: JobField) -> Result<(), StoreError> {
        // Column names come from a closed set, never from input.
        let sql = format!("UPDATE jobs SET {} = $1 WHERE id = $2", field.column());
        let query = sqlx::query(&sql);
        let query = match field {
            JobField::ArtifactUrl(value) | JobField::ArtifactFilename(value) => query.bind(value),
            JobField::KeySentences(values) | JobField::Keywords(values) => query.bind(values),
        };

        let result = query.bind(job_id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(job_id));
        }
        Ok(())
    }
}
