use crate::db::models::{AdjacentChapter, ChapterImage, ChapterSummary, ChapterWithManga, DbChapter};
use crate::db::sqlite::KomikStorage;
use crate::error::KomikError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::types::Json;
use uuid::Uuid;

const CHAPTER_WITH_MANGA: &str = "SELECT c.*, m.id AS manga_ref_id, m.slug AS manga_slug, \
     m.title_en AS manga_title_en, m.cover_url AS manga_cover_url \
     FROM chapters c JOIN manga m ON m.id = c.manga_id";

/// Chapter fields accepted on create and update. `manga_id` is only read on create.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterPayload {
    pub manga_id: Option<String>,
    pub number: Option<f64>,
    pub title: Option<String>,
    pub volume: Option<i64>,
    pub images: Option<Vec<ChapterImage>>,
    pub source_origin: Option<String>,
    pub source_external_id: Option<String>,
    pub is_locked: Option<bool>,
    pub release_date: Option<DateTime<Utc>>,
}

impl KomikStorage {
    /// Insert a chapter and bump the owning manga's `updated_at` in one transaction.
    pub async fn insert_chapter(
        &self,
        manga_id: &str,
        number: f64,
        payload: &ChapterPayload,
    ) -> Result<DbChapter, KomikError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE manga SET updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(manga_id)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(KomikError::NotFound("Manga"));
        }

        sqlx::query(
            r#"
            INSERT INTO chapters (
                id, manga_id, number, title, volume, images, source_origin,
                source_external_id, is_locked, views, release_date, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(manga_id)
        .bind(number)
        .bind(&payload.title)
        .bind(payload.volume)
        .bind(Json(payload.images.clone().unwrap_or_default()))
        .bind(&payload.source_origin)
        .bind(&payload.source_external_id)
        .bind(payload.is_locked.unwrap_or(false))
        .bind(payload.release_date.unwrap_or(now))
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| match KomikError::from(e) {
            KomikError::Conflict(_) => {
                KomikError::conflict(format!("Chapter {number} already exists for this manga"))
            }
            other => other,
        })?;

        tx.commit().await?;
        self.find_chapter(&id)
            .await?
            .ok_or(KomikError::NotFound("Chapter"))
    }

    pub async fn update_chapter(
        &self,
        id: &str,
        payload: &ChapterPayload,
    ) -> Result<DbChapter, KomikError> {
        let res = sqlx::query(
            r#"
            UPDATE chapters SET
                number = COALESCE(?, number),
                title = COALESCE(?, title),
                volume = COALESCE(?, volume),
                images = COALESCE(?, images),
                source_origin = COALESCE(?, source_origin),
                source_external_id = COALESCE(?, source_external_id),
                is_locked = COALESCE(?, is_locked),
                release_date = COALESCE(?, release_date),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(payload.number)
        .bind(&payload.title)
        .bind(payload.volume)
        .bind(payload.images.clone().map(Json))
        .bind(&payload.source_origin)
        .bind(&payload.source_external_id)
        .bind(payload.is_locked)
        .bind(payload.release_date)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(KomikError::NotFound("Chapter"));
        }
        self.find_chapter(id)
            .await?
            .ok_or(KomikError::NotFound("Chapter"))
    }

    pub async fn delete_chapter(&self, id: &str) -> Result<(), KomikError> {
        let res = sqlx::query("DELETE FROM chapters WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(KomikError::NotFound("Chapter"));
        }
        Ok(())
    }

    pub async fn find_chapter(&self, id: &str) -> Result<Option<DbChapter>, KomikError> {
        Ok(sqlx::query_as::<_, DbChapter>("SELECT * FROM chapters WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_chapter_with_manga(
        &self,
        id: &str,
    ) -> Result<Option<ChapterWithManga>, KomikError> {
        let sql = format!("{CHAPTER_WITH_MANGA} WHERE c.id = ?");
        Ok(sqlx::query_as::<_, ChapterWithManga>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Nearest lower and higher chapter numbers within the same manga.
    pub async fn adjacent_chapters(
        &self,
        manga_id: &str,
        number: f64,
    ) -> Result<(Option<AdjacentChapter>, Option<AdjacentChapter>), KomikError> {
        let prev = sqlx::query_as::<_, AdjacentChapter>(
            "SELECT id, number, title FROM chapters WHERE manga_id = ? AND number < ? \
             ORDER BY number DESC LIMIT 1",
        )
        .bind(manga_id)
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        let next = sqlx::query_as::<_, AdjacentChapter>(
            "SELECT id, number, title FROM chapters WHERE manga_id = ? AND number > ? \
             ORDER BY number ASC LIMIT 1",
        )
        .bind(manga_id)
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        Ok((prev, next))
    }

    /// One page of a manga's chapters, highest number first, with the total count.
    pub async fn list_chapters_for_manga(
        &self,
        manga_id: &str,
        limit: u32,
        offset: i64,
    ) -> Result<(Vec<ChapterSummary>, i64), KomikError> {
        let rows = sqlx::query_as::<_, ChapterSummary>(
            "SELECT id, number, title, volume, release_date, views, is_locked FROM chapters \
             WHERE manga_id = ? ORDER BY number DESC LIMIT ? OFFSET ?",
        )
        .bind(manga_id)
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chapters WHERE manga_id = ?")
            .bind(manga_id)
            .fetch_one(&self.pool)
            .await?;
        Ok((rows, total))
    }

    pub async fn latest_chapters(&self, limit: u32) -> Result<Vec<ChapterWithManga>, KomikError> {
        let sql = format!("{CHAPTER_WITH_MANGA} ORDER BY c.release_date DESC, c.id LIMIT ?");
        Ok(sqlx::query_as::<_, ChapterWithManga>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn increment_chapter_views(&self, id: &str) -> Result<(), KomikError> {
        sqlx::query("UPDATE chapters SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
