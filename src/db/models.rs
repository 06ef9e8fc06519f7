use crate::types::{MangaKind, MangaStatus, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// Full user row. Never serialized directly: it carries the password hash.
#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub security_stamp: String,
    pub avatar_url: Option<String>,
    pub is_email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User as exposed by the admin listing.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub is_email_verified: bool,
    pub avatar_url: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub registered_at: DateTime<Utc>,
}

impl From<DbUser> for UserSummary {
    fn from(u: DbUser) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            role: u.role,
            is_email_verified: u.is_email_verified,
            avatar_url: u.avatar_url,
            last_login_at: u.last_login_at,
            registered_at: u.registered_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbManga {
    pub id: String,
    pub slug: String,
    pub title_en: String,
    pub title_jp: Option<String>,
    pub title_id: Option<String>,
    pub status: MangaStatus,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: MangaKind,
    pub is_adult: bool,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub banner_url: Option<String>,
    pub rating: f64,
    pub views_total: i64,
    pub views_weekly: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Genre, tag or author.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct TaxonomyItem {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct AuthorCredit {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub role: Option<String>,
}

/// Row of the paginated manga listing.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MangaListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub manga: DbManga,
    pub chapter_count: i64,
    #[sqlx(skip)]
    pub genres: Vec<TaxonomyItem>,
}

/// Manga with every relation, as returned by the detail and mutation endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaDetail {
    #[serde(flatten)]
    pub manga: DbManga,
    pub genres: Vec<TaxonomyItem>,
    pub tags: Vec<TaxonomyItem>,
    pub authors: Vec<AuthorCredit>,
    pub chapters: Vec<ChapterSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChapterImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbChapter {
    pub id: String,
    pub manga_id: String,
    pub number: f64,
    pub title: Option<String>,
    pub volume: Option<i64>,
    pub images: Json<Vec<ChapterImage>>,
    pub source_origin: Option<String>,
    pub source_external_id: Option<String>,
    pub is_locked: bool,
    pub views: i64,
    pub release_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChapterSummary {
    pub id: String,
    pub number: f64,
    pub title: Option<String>,
    pub volume: Option<i64>,
    pub release_date: DateTime<Utc>,
    pub views: i64,
    pub is_locked: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct AdjacentChapter {
    pub id: String,
    pub number: f64,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MangaSummary {
    #[sqlx(rename = "manga_ref_id")]
    pub id: String,
    #[sqlx(rename = "manga_slug")]
    pub slug: String,
    #[sqlx(rename = "manga_title_en")]
    pub title_en: String,
    #[sqlx(rename = "manga_cover_url")]
    pub cover_url: Option<String>,
}

/// Chapter joined with the owning manga's summary.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ChapterWithManga {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub chapter: DbChapter,
    #[sqlx(flatten)]
    pub manga: MangaSummary,
}

/// Chapter page with its manga and neighbours by number.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterReader {
    #[serde(flatten)]
    pub chapter: ChapterWithManga,
    pub prev: Option<AdjacentChapter>,
    pub next: Option<AdjacentChapter>,
}
