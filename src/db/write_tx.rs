//! `BEGIN IMMEDIATE` transactions.
//!
//! sqlx 0.7 opens SQLite transactions with a deferred `BEGIN`, which takes the
//! write lock only at the first write. Guarded roster writes read before they
//! write, so they need the lock before the read.

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};

use crate::error::{AppError, AppResult};

/// A pooled connection inside `BEGIN IMMEDIATE`.
///
/// Dropping it without `commit`/`rollback` closes the connection instead of
/// returning it to the pool, so SQLite rolls the transaction back.
pub struct WriteTx {
    conn: Option<PoolConnection<Sqlite>>,
}

fn finished() -> AppError {
    AppError::Internal(anyhow::anyhow!("write transaction already finished"))
}

impl WriteTx {
    pub async fn begin(pool: &SqlitePool) -> AppResult<Self> {
        let mut conn = pool.acquire().await.map_err(AppError::Database)?;
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(AppError::Database)?;
        Ok(WriteTx { conn: Some(conn) })
    }

    pub fn conn(&mut self) -> AppResult<&mut SqliteConnection> {
        self.conn.as_deref_mut().ok_or_else(finished)
    }

    pub async fn commit(mut self) -> AppResult<()> {
        self.finish("COMMIT").await
    }

    pub async fn rollback(mut self) -> AppResult<()> {
        self.finish("ROLLBACK").await
    }

    async fn finish(&mut self, statement: &'static str) -> AppResult<()> {
        let mut conn = self.conn.take().ok_or_else(finished)?;
        match sqlx::query(statement).execute(&mut *conn).await {
            Ok(_) => Ok(()),
            Err(e) => {
                // the transaction may still be open on this connection
                drop(conn.detach());
                Err(AppError::Database(e))
            }
        }
    }
}

impl Drop for WriteTx {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            tracing::warn!("Write transaction dropped while open, closing its connection");
            drop(conn.detach());
        }
    }
}
