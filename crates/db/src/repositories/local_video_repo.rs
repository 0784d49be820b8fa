//! Repository for the `video_media` index table.

use std::sync::Arc;

use gallery_core::identity_cache::IdentityCache;
use gallery_core::local_video::VideoRecord;
use gallery_core::types::LocalId;
use sqlx::postgres::PgRow;
use sqlx::PgPool;

use crate::row::PgRowCursor;

/// Select list in `VIDEO_PROJECTION` order; the loader reads by position.
const COLUMNS: &str =
    "_id, title, mime_type, latitude, longitude, datetaken, date_added, date_modified, _data, duration";

/// Newest first, ties broken by row id.
const ORDER_BY: &str = "ORDER BY datetaken DESC, _id DESC";

pub struct LocalVideoRepo;

impl LocalVideoRepo {
    /// Load a single video by its index row id.
    pub async fn find_by_id<C>(
        pool: &PgPool,
        cache: &C,
        id: LocalId,
    ) -> Result<Option<Arc<VideoRecord>>, sqlx::Error>
    where
        C: IdentityCache<VideoRecord> + ?Sized,
    {
        let query = format!("SELECT {COLUMNS} FROM video_media WHERE _id = $1");
        let row = sqlx::query(&query).bind(id).fetch_optional(pool).await?;
        tracing::debug!(id, found = row.is_some(), "Looked up local video");
        Ok(row.map(|row| load_row(&row, cache)))
    }

    /// Load every indexed video, newest first.
    pub async fn list<C>(pool: &PgPool, cache: &C) -> Result<Vec<Arc<VideoRecord>>, sqlx::Error>
    where
        C: IdentityCache<VideoRecord> + ?Sized,
    {
        let query = format!("SELECT {COLUMNS} FROM video_media {ORDER_BY}");
        let rows = sqlx::query(&query).fetch_all(pool).await?;
        tracing::debug!(count = rows.len(), "Listed local videos");
        Ok(rows.iter().map(|row| load_row(row, cache)).collect())
    }

    /// Load the videos of one bucket (album directory), newest first.
    pub async fn list_by_bucket<C>(
        pool: &PgPool,
        cache: &C,
        bucket_id: i32,
    ) -> Result<Vec<Arc<VideoRecord>>, sqlx::Error>
    where
        C: IdentityCache<VideoRecord> + ?Sized,
    {
        let query = format!("SELECT {COLUMNS} FROM video_media WHERE bucket_id = $1 {ORDER_BY}");
        let rows = sqlx::query(&query).bind(bucket_id).fetch_all(pool).await?;
        tracing::debug!(bucket_id, count = rows.len(), "Listed local videos in bucket");
        Ok(rows.iter().map(|row| load_row(row, cache)).collect())
    }
}

fn load_row<C>(row: &PgRow, cache: &C) -> Arc<VideoRecord>
where
    C: IdentityCache<VideoRecord> + ?Sized,
{
    VideoRecord::load(&PgRowCursor(row), cache)
}
