use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::info;

use crate::db::models::{MangaDetail, MangaListItem};
use crate::db::{MangaFilter, MangaPayload};
use crate::error::KomikError;
use crate::extract::{Json, Query};
use crate::middleware::auth::Privileged;
use crate::router::KomikState;
use crate::service::validation::{require_non_empty, validate_slug};
use crate::service::views::record_manga_view;
use crate::types::{MangaKind, MangaSort, MangaStatus, PageMeta, PageQuery, Paginated};

const DEFAULT_PAGE_SIZE: u32 = 20;

/// Query string of `GET /manga`. Kept flat because urlencoded decoding
/// cannot fill numeric fields through `#[serde(flatten)]`.
#[derive(Debug, Default, Deserialize)]
pub struct MangaQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<MangaStatus>,
    #[serde(rename = "type")]
    pub kind: Option<MangaKind>,
    pub genre: Option<String>,
    pub search: Option<String>,
    pub sort: Option<MangaSort>,
    pub adult: Option<bool>,
}

impl MangaQuery {
    fn into_parts(self) -> (PageQuery, MangaFilter) {
        let paging = PageQuery {
            page: self.page,
            limit: self.limit,
        };
        let filter = MangaFilter {
            status: self.status,
            kind: self.kind,
            genre_slug: self.genre.filter(|g| !g.trim().is_empty()),
            search: self
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            is_adult: self.adult,
            sort: self.sort.unwrap_or_default(),
        };
        (paging, filter)
    }
}

/// GET /manga
pub async fn list_manga(
    State(state): State<KomikState>,
    Query(query): Query<MangaQuery>,
) -> Result<Json<Paginated<MangaListItem>>, KomikError> {
    let (paging, filter) = query.into_parts();
    let (page, limit) = paging.resolve(DEFAULT_PAGE_SIZE);

    let (data, total) = state
        .storage
        .list_manga(&filter, limit, PageQuery::offset(page, limit))
        .await?;
    Ok(Json(Paginated {
        data,
        meta: PageMeta::new(total, page, limit),
    }))
}

/// GET /manga/{slug}
pub async fn get_manga(
    State(state): State<KomikState>,
    Path(slug): Path<String>,
) -> Result<Json<MangaDetail>, KomikError> {
    let manga = state
        .storage
        .find_manga_by_slug(&slug)
        .await?
        .ok_or(KomikError::NotFound("Manga"))?;
    record_manga_view(&state.storage, manga.id.clone());
    Ok(Json(state.storage.manga_detail(manga).await?))
}

/// POST /manga
pub async fn create_manga(
    State(state): State<KomikState>,
    Privileged(caller): Privileged,
    Json(payload): Json<MangaPayload>,
) -> Result<(StatusCode, Json<MangaDetail>), KomikError> {
    require_non_empty("slug", payload.slug.as_deref())?;
    require_non_empty("titleEn", payload.title_en.as_deref())?;
    if let Some(slug) = &payload.slug {
        validate_slug(slug)?;
    }

    let manga = state.storage.insert_manga(&payload).await?;
    info!(by = %caller.id, manga_id = %manga.id, slug = %manga.slug, "manga created");
    let detail = state.storage.manga_detail(manga).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// PUT /manga/{id}
pub async fn update_manga(
    State(state): State<KomikState>,
    Privileged(caller): Privileged,
    Path(id): Path<String>,
    Json(payload): Json<MangaPayload>,
) -> Result<Json<MangaDetail>, KomikError> {
    if let Some(slug) = &payload.slug {
        validate_slug(slug)?;
    }
    if payload.title_en.is_some() {
        require_non_empty("titleEn", payload.title_en.as_deref())?;
    }

    let manga = state.storage.update_manga(&id, &payload).await?;
    info!(by = %caller.id, manga_id = %manga.id, "manga updated");
    Ok(Json(state.storage.manga_detail(manga).await?))
}

/// DELETE /manga/{id}
pub async fn delete_manga(
    State(state): State<KomikState>,
    Privileged(caller): Privileged,
    Path(id): Path<String>,
) -> Result<StatusCode, KomikError> {
    state.storage.delete_manga(&id).await?;
    info!(by = %caller.id, manga_id = %id, "manga deleted");
    Ok(StatusCode::NO_CONTENT)
}
