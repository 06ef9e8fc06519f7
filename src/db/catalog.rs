use crate::db::models::{
    AuthorCredit, ChapterSummary, DbManga, MangaDetail, MangaListItem, TaxonomyItem,
};
use crate::db::sqlite::KomikStorage;
use crate::error::KomikError;
use crate::types::{MangaKind, MangaSort, MangaStatus};
use chrono::Utc;
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use std::collections::HashMap;
use uuid::Uuid;

/// Chapters embedded in the manga detail view.
pub const DETAIL_CHAPTER_LIMIT: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxonomyKind {
    Genre,
    Tag,
    Author,
}

impl TaxonomyKind {
    fn table(&self) -> &'static str {
        match self {
            TaxonomyKind::Genre => "genres",
            TaxonomyKind::Tag => "tags",
            TaxonomyKind::Author => "authors",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaxonomyKind::Genre => "Genre",
            TaxonomyKind::Tag => "Tag",
            TaxonomyKind::Author => "Author",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorLink {
    pub author_id: String,
    pub role: Option<String>,
}

/// Manga fields accepted on create and update. On update, absent fields keep
/// their stored value and absent relation lists keep their links.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaPayload {
    pub slug: Option<String>,
    pub title_en: Option<String>,
    pub title_jp: Option<String>,
    pub title_id: Option<String>,
    pub status: Option<MangaStatus>,
    #[serde(rename = "type")]
    pub kind: Option<MangaKind>,
    pub is_adult: Option<bool>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub banner_url: Option<String>,
    pub genre_ids: Option<Vec<String>>,
    pub tag_ids: Option<Vec<String>>,
    pub author_ids: Option<Vec<AuthorLink>>,
}

#[derive(Debug, Clone, Default)]
pub struct MangaFilter {
    pub status: Option<MangaStatus>,
    pub kind: Option<MangaKind>,
    pub genre_slug: Option<String>,
    pub search: Option<String>,
    pub is_adult: Option<bool>,
    pub sort: MangaSort,
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &MangaFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(status) = filter.status {
        qb.push(" AND m.status = ").push_bind(status);
    }
    if let Some(kind) = filter.kind {
        qb.push(" AND m.type = ").push_bind(kind);
    }
    if let Some(adult) = filter.is_adult {
        qb.push(" AND m.is_adult = ").push_bind(adult);
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", escape_like(search.trim()));
        qb.push(" AND (m.title_en LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR m.title_jp LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR m.title_id LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
    if let Some(genre) = filter.genre_slug.as_deref() {
        qb.push(
            " AND EXISTS (SELECT 1 FROM manga_genres mg JOIN genres g ON g.id = mg.genre_id \
             WHERE mg.manga_id = m.id AND g.slug = ",
        )
        .push_bind(genre.to_string())
        .push(")");
    }
}

impl KomikStorage {
    /// One page of manga matching `filter`, plus the total match count.
    pub async fn list_manga(
        &self,
        filter: &MangaFilter,
        limit: u32,
        offset: i64,
    ) -> Result<(Vec<MangaListItem>, i64), KomikError> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM manga m");
        push_filter(&mut count_qb, filter);
        let (total,) = count_qb
            .build_query_as::<(i64,)>()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT m.*, (SELECT COUNT(*) FROM chapters c WHERE c.manga_id = m.id) AS chapter_count \
             FROM manga m",
        );
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY ")
            .push(filter.sort.order_by())
            .push(", m.id LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(offset);
        let mut items = qb
            .build_query_as::<MangaListItem>()
            .fetch_all(&self.pool)
            .await?;

        if !items.is_empty() {
            let mut genres = self
                .genres_for_many(items.iter().map(|i| i.manga.id.as_str()))
                .await?;
            for item in items.iter_mut() {
                item.genres = genres.remove(&item.manga.id).unwrap_or_default();
            }
        }
        Ok((items, total))
    }

    async fn genres_for_many<'a>(
        &self,
        manga_ids: impl Iterator<Item = &'a str>,
    ) -> Result<HashMap<String, Vec<TaxonomyItem>>, KomikError> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT mg.manga_id, g.id, g.name, g.slug FROM manga_genres mg \
             JOIN genres g ON g.id = mg.genre_id WHERE mg.manga_id IN (",
        );
        let mut sep = qb.separated(", ");
        for id in manga_ids {
            sep.push_bind(id.to_string());
        }
        qb.push(") ORDER BY g.name");

        let rows = qb
            .build_query_as::<(String, String, String, String)>()
            .fetch_all(&self.pool)
            .await?;
        let mut out: HashMap<String, Vec<TaxonomyItem>> = HashMap::new();
        for (manga_id, id, name, slug) in rows {
            out.entry(manga_id)
                .or_default()
                .push(TaxonomyItem { id, name, slug });
        }
        Ok(out)
    }

    pub async fn find_manga_by_slug(&self, slug: &str) -> Result<Option<DbManga>, KomikError> {
        Ok(sqlx::query_as::<_, DbManga>("SELECT * FROM manga WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_manga_by_id(&self, id: &str) -> Result<Option<DbManga>, KomikError> {
        Ok(sqlx::query_as::<_, DbManga>("SELECT * FROM manga WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Attach genres, tags, authors and the most recent chapters.
    pub async fn manga_detail(&self, manga: DbManga) -> Result<MangaDetail, KomikError> {
        let genres = sqlx::query_as::<_, TaxonomyItem>(
            "SELECT g.id, g.name, g.slug FROM manga_genres mg JOIN genres g ON g.id = mg.genre_id \
             WHERE mg.manga_id = ? ORDER BY g.name",
        )
        .bind(&manga.id)
        .fetch_all(&self.pool)
        .await?;

        let tags = sqlx::query_as::<_, TaxonomyItem>(
            "SELECT t.id, t.name, t.slug FROM manga_tags mt JOIN tags t ON t.id = mt.tag_id \
             WHERE mt.manga_id = ? ORDER BY t.name",
        )
        .bind(&manga.id)
        .fetch_all(&self.pool)
        .await?;

        let authors = sqlx::query_as::<_, AuthorCredit>(
            "SELECT a.id, a.name, a.slug, ma.role FROM manga_authors ma \
             JOIN authors a ON a.id = ma.author_id WHERE ma.manga_id = ? ORDER BY a.name",
        )
        .bind(&manga.id)
        .fetch_all(&self.pool)
        .await?;

        let chapters = sqlx::query_as::<_, ChapterSummary>(
            "SELECT id, number, title, volume, release_date, views, is_locked FROM chapters \
             WHERE manga_id = ? ORDER BY number DESC LIMIT ?",
        )
        .bind(&manga.id)
        .bind(DETAIL_CHAPTER_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(MangaDetail {
            manga,
            genres,
            tags,
            authors,
            chapters,
        })
    }

    /// Insert a manga and its links. `slug` and `title_en` must already be validated.
    pub async fn insert_manga(&self, payload: &MangaPayload) -> Result<DbManga, KomikError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO manga (
                id, slug, title_en, title_jp, title_id, status, type, is_adult,
                description, cover_url, banner_url, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&payload.slug)
        .bind(&payload.title_en)
        .bind(&payload.title_jp)
        .bind(&payload.title_id)
        .bind(payload.status.unwrap_or_default())
        .bind(payload.kind.unwrap_or_default())
        .bind(payload.is_adult.unwrap_or(false))
        .bind(&payload.description)
        .bind(&payload.cover_url)
        .bind(&payload.banner_url)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        replace_links(&mut *tx, &id, payload).await?;
        tx.commit().await?;

        self.find_manga_by_id(&id)
            .await?
            .ok_or(KomikError::NotFound("Manga"))
    }

    pub async fn update_manga(
        &self,
        id: &str,
        payload: &MangaPayload,
    ) -> Result<DbManga, KomikError> {
        let mut tx = self.pool.begin().await?;

        let res = sqlx::query(
            r#"
            UPDATE manga SET
                slug = COALESCE(?, slug),
                title_en = COALESCE(?, title_en),
                title_jp = COALESCE(?, title_jp),
                title_id = COALESCE(?, title_id),
                status = COALESCE(?, status),
                type = COALESCE(?, type),
                is_adult = COALESCE(?, is_adult),
                description = COALESCE(?, description),
                cover_url = COALESCE(?, cover_url),
                banner_url = COALESCE(?, banner_url),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&payload.slug)
        .bind(&payload.title_en)
        .bind(&payload.title_jp)
        .bind(&payload.title_id)
        .bind(payload.status)
        .bind(payload.kind)
        .bind(payload.is_adult)
        .bind(&payload.description)
        .bind(&payload.cover_url)
        .bind(&payload.banner_url)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if res.rows_affected() == 0 {
            return Err(KomikError::NotFound("Manga"));
        }

        replace_links(&mut *tx, id, payload).await?;
        tx.commit().await?;

        self.find_manga_by_id(id)
            .await?
            .ok_or(KomikError::NotFound("Manga"))
    }

    pub async fn delete_manga(&self, id: &str) -> Result<(), KomikError> {
        let res = sqlx::query("DELETE FROM manga WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(KomikError::NotFound("Manga"));
        }
        Ok(())
    }

    pub async fn increment_manga_views(&self, id: &str) -> Result<(), KomikError> {
        sqlx::query(
            "UPDATE manga SET views_total = views_total + 1, views_weekly = views_weekly + 1 \
             WHERE id = ?",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_taxonomy(&self, kind: TaxonomyKind) -> Result<Vec<TaxonomyItem>, KomikError> {
        let sql = format!("SELECT id, name, slug FROM {} ORDER BY name", kind.table());
        Ok(sqlx::query_as::<_, TaxonomyItem>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn insert_taxonomy(
        &self,
        kind: TaxonomyKind,
        name: &str,
        slug: &str,
    ) -> Result<TaxonomyItem, KomikError> {
        let item = TaxonomyItem {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            slug: slug.to_string(),
        };
        let sql = format!("INSERT INTO {} (id, name, slug) VALUES (?, ?, ?)", kind.table());
        sqlx::query(&sql)
            .bind(&item.id)
            .bind(&item.name)
            .bind(&item.slug)
            .execute(&self.pool)
            .await?;
        Ok(item)
    }
}

/// Replace whichever relation lists the payload carries.
async fn replace_links(
    conn: &mut SqliteConnection,
    manga_id: &str,
    payload: &MangaPayload,
) -> Result<(), KomikError> {
    if let Some(genre_ids) = &payload.genre_ids {
        sqlx::query("DELETE FROM manga_genres WHERE manga_id = ?")
            .bind(manga_id)
            .execute(&mut *conn)
            .await?;
        for genre_id in genre_ids {
            sqlx::query("INSERT OR IGNORE INTO manga_genres (manga_id, genre_id) VALUES (?, ?)")
                .bind(manga_id)
                .bind(genre_id)
                .execute(&mut *conn)
                .await?;
        }
    }

    if let Some(tag_ids) = &payload.tag_ids {
        sqlx::query("DELETE FROM manga_tags WHERE manga_id = ?")
            .bind(manga_id)
            .execute(&mut *conn)
            .await?;
        for tag_id in tag_ids {
            sqlx::query("INSERT OR IGNORE INTO manga_tags (manga_id, tag_id) VALUES (?, ?)")
                .bind(manga_id)
                .bind(tag_id)
                .execute(&mut *conn)
                .await?;
        }
    }

    if let Some(authors) = &payload.author_ids {
        sqlx::query("DELETE FROM manga_authors WHERE manga_id = ?")
            .bind(manga_id)
            .execute(&mut *conn)
            .await?;
        for link in authors {
            sqlx::query(
                "INSERT OR IGNORE INTO manga_authors (manga_id, author_id, role) VALUES (?, ?, ?)",
            )
            .bind(manga_id)
            .bind(&link.author_id)
            .bind(&link.role)
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}
