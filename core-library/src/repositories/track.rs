//! Track repository trait and implementation

use crate::db::DEFAULT_STORAGE_QUOTA_BYTES;
use crate::error::{LibraryError, Result};
use crate::models::{AudioBlob, StorageEstimate, Track};
use async_trait::async_trait;
use bytes::Bytes;
use sqlx::{query_as, Row, SqlitePool};
use tracing::{debug, instrument};

/// Persisted store for track records and their audio blobs.
///
/// Records and blobs share the track `id` as key.
#[async_trait]
pub trait TrackRepository: Send + Sync {
    /// Find a track by its ID
    async fn get_by_id(&self, id: &str) -> Result<Option<Track>>;

    /// All tracks, newest first
    async fn get_all(&self) -> Result<Vec<Track>>;

    /// Insert or update a track record.
    ///
    /// With `blob = None` only the metadata is written and any stored blob is
    /// left untouched. With a blob, record and blob are written in one
    /// transaction.
    async fn put(&self, track: &Track, blob: Option<AudioBlob>) -> Result<()>;

    /// Audio content for a track, `None` when absent
    async fn get_blob(&self, id: &str) -> Result<Option<AudioBlob>>;

    /// Delete record and blob transactionally.
    ///
    /// Returns `false` when no record existed.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Delete every record and blob, returning the number of tracks removed
    async fn purge(&self) -> Result<u64>;

    /// Bytes used by records and blobs, and the configured quota
    async fn estimate_usage(&self) -> Result<StorageEstimate>;

    async fn count(&self) -> Result<u64>;
}

/// SQLite implementation of TrackRepository
pub struct SqliteTrackRepository {
    pool: SqlitePool,
    quota_bytes: u64,
}

impl SqliteTrackRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_quota(pool, DEFAULT_STORAGE_QUOTA_BYTES)
    }

    pub fn with_quota(pool: SqlitePool, quota_bytes: u64) -> Self {
        Self { pool, quota_bytes }
    }
}

#[async_trait]
impl TrackRepository for SqliteTrackRepository {
    async fn get_by_id(&self, id: &str) -> Result<Option<Track>> {
        let track = query_as::<_, Track>("SELECT * FROM tracks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(track)
    }

    async fn get_all(&self) -> Result<Vec<Track>> {
        let tracks = query_as::<_, Track>("SELECT * FROM tracks ORDER BY added_at DESC, id")
            .fetch_all(&self.pool)
            .await?;

        Ok(tracks)
    }

    #[instrument(skip(self, track, blob), fields(track_id = %track.id, with_blob = blob.is_some()))]
    async fn put(&self, track: &Track, blob: Option<AudioBlob>) -> Result<()> {
        track.validate().map_err(|msg| LibraryError::InvalidInput {
            field: "track".to_string(),
            message: msg,
        })?;

        let mut tx = self.pool.begin().await?;

        // Upsert rather than REPLACE: a REPLACE deletes the row and would
        // cascade to the blob.
        sqlx::query(
            r#"
            INSERT INTO tracks (
                id, title, artist, album, duration, cover_url,
                source, uri, genre, added_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                artist = excluded.artist,
                album = excluded.album,
                duration = excluded.duration,
                cover_url = excluded.cover_url,
                uri = excluded.uri,
                genre = excluded.genre
            "#,
        )
        .bind(&track.id)
        .bind(&track.title)
        .bind(&track.artist)
        .bind(&track.album)
        .bind(track.duration)
        .bind(&track.cover_url)
        .bind(track.source)
        .bind(&track.uri)
        .bind(&track.genre)
        .bind(track.added_at)
        .execute(&mut *tx)
        .await?;

        if let Some(blob) = blob {
            sqlx::query(
                r#"
                INSERT INTO blobs (id, data, mime_type, size) VALUES (?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    data = excluded.data,
                    mime_type = excluded.mime_type,
                    size = excluded.size
                "#,
            )
            .bind(&track.id)
            .bind(blob.data.as_ref())
            .bind(&blob.mime_type)
            .bind(blob.len() as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!("Track stored");
        Ok(())
    }

    async fn get_blob(&self, id: &str) -> Result<Option<AudioBlob>> {
        let row = sqlx::query("SELECT data, mime_type FROM blobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| {
            let data: Vec<u8> = row.get("data");
            AudioBlob::new(Bytes::from(data), row.get("mime_type"))
        }))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM blobs WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM tracks WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge(&self) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM blobs").execute(&mut *tx).await?;
        let result = sqlx::query("DELETE FROM tracks").execute(&mut *tx).await?;

        tx.commit().await?;
        debug!(removed = result.rows_affected(), "Track store purged");
        Ok(result.rows_affected())
    }

    async fn estimate_usage(&self) -> Result<StorageEstimate> {
        let (blob_bytes,): (i64,) = sqlx::query_as("SELECT COALESCE(SUM(size), 0) FROM blobs")
            .fetch_one(&self.pool)
            .await?;

        let (record_bytes,): (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(
                LENGTH(id) + LENGTH(title) + LENGTH(artist) + COALESCE(LENGTH(album), 0)
                + LENGTH(cover_url) + LENGTH(uri) + COALESCE(LENGTH(genre), 0) + 24
            ), 0) FROM tracks
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StorageEstimate {
            used: (blob_bytes.max(0) + record_bytes.max(0)) as u64,
            quota: self.quota_bytes,
        })
    }

    async fn count(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tracks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}
