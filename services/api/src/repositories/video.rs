//! Video repository for database operations

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::models::video::{NewVideo, Video};

/// Create and list operations over video records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Insert a record and return it with its generated id and timestamp
    async fn create(&self, video: NewVideo) -> DatabaseResult<Video>;

    /// All records, newest first
    async fn list_newest_first(&self) -> DatabaseResult<Vec<Video>>;
}

/// PostgreSQL implementation of [`VideoStore`]
///
/// Each call holds one pooled connection for its duration; the connection
/// returns to the pool when the call's scope ends, on success and error alike.
#[derive(Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    /// Create a new video repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn video_from_row(row: &PgRow) -> Video {
    Video {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        public_id: row.get("public_id"),
        original_size: row.get("original_size"),
        compressed_size: row.get("compressed_size"),
        duration: row.get("duration"),
        cloudinary_id: row.get("cloudinary_id"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl VideoStore for VideoRepository {
    async fn create(&self, video: NewVideo) -> DatabaseResult<Video> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(DatabaseError::Connection)?;

        let row = sqlx::query(
            r#"
            INSERT INTO videos (title, description, public_id, original_size,
                                compressed_size, duration, cloudinary_id, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, title, description, public_id, original_size,
                      compressed_size, duration, cloudinary_id, user_id, created_at
            "#,
        )
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.public_id)
        .bind(&video.original_size)
        .bind(&video.compressed_size)
        .bind(video.duration)
        .bind(&video.cloudinary_id)
        .bind(&video.user_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(video_from_row(&row))
    }

    async fn list_newest_first(&self) -> DatabaseResult<Vec<Video>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(DatabaseError::Connection)?;

        let rows = sqlx::query(
            r#"
            SELECT id, title, description, public_id, original_size,
                   compressed_size, duration, cloudinary_id, user_id, created_at
            FROM videos
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(rows.iter().map(video_from_row).collect())
    }
}
