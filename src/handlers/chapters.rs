use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use crate::db::ChapterPayload;
use crate::db::models::{ChapterReader, ChapterSummary, ChapterWithManga, DbChapter};
use crate::error::KomikError;
use crate::extract::{Json, Query};
use crate::middleware::auth::Privileged;
use crate::router::KomikState;
use crate::service::validation::require_non_empty;
use crate::service::views::record_chapter_view;
use crate::types::{PageMeta, PageQuery, Paginated};

const LATEST_DEFAULT: u32 = 20;
const PER_MANGA_DEFAULT: u32 = 50;

/// GET /chapters/latest?limit
pub async fn latest(
    State(state): State<KomikState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<ChapterWithManga>>, KomikError> {
    let (_, limit) = query.resolve(LATEST_DEFAULT);
    Ok(Json(state.storage.latest_chapters(limit).await?))
}

/// GET /chapters/manga/{mangaId}
pub async fn by_manga(
    State(state): State<KomikState>,
    Path(manga_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<ChapterSummary>>, KomikError> {
    let (page, limit) = query.resolve(PER_MANGA_DEFAULT);
    let (data, total) = state
        .storage
        .list_chapters_for_manga(&manga_id, limit, PageQuery::offset(page, limit))
        .await?;
    Ok(Json(Paginated {
        data,
        meta: PageMeta::new(total, page, limit),
    }))
}

/// GET /chapters/{id}
pub async fn get_chapter(
    State(state): State<KomikState>,
    Path(id): Path<String>,
) -> Result<Json<ChapterReader>, KomikError> {
    let chapter = state
        .storage
        .find_chapter_with_manga(&id)
        .await?
        .ok_or(KomikError::NotFound("Chapter"))?;
    let (prev, next) = state
        .storage
        .adjacent_chapters(&chapter.chapter.manga_id, chapter.chapter.number)
        .await?;
    record_chapter_view(&state.storage, chapter.chapter.id.clone());
    Ok(Json(ChapterReader {
        chapter,
        prev,
        next,
    }))
}

/// POST /chapters
pub async fn create_chapter(
    State(state): State<KomikState>,
    Privileged(caller): Privileged,
    Json(payload): Json<ChapterPayload>,
) -> Result<(StatusCode, Json<DbChapter>), KomikError> {
    require_non_empty("mangaId", payload.manga_id.as_deref())?;
    let number = validate_number(payload.number)?;
    let manga_id = payload.manga_id.clone().unwrap_or_default();

    let chapter = state
        .storage
        .insert_chapter(&manga_id, number, &payload)
        .await?;
    info!(
        by = %caller.id,
        chapter_id = %chapter.id,
        manga_id = %chapter.manga_id,
        number = chapter.number,
        "chapter created"
    );
    Ok((StatusCode::CREATED, Json(chapter)))
}

/// PUT /chapters/{id}
pub async fn update_chapter(
    State(state): State<KomikState>,
    Privileged(caller): Privileged,
    Path(id): Path<String>,
    Json(payload): Json<ChapterPayload>,
) -> Result<Json<DbChapter>, KomikError> {
    if payload.number.is_some() {
        validate_number(payload.number)?;
    }
    let chapter = state.storage.update_chapter(&id, &payload).await?;
    info!(by = %caller.id, chapter_id = %chapter.id, "chapter updated");
    Ok(Json(chapter))
}

/// DELETE /chapters/{id}
pub async fn delete_chapter(
    State(state): State<KomikState>,
    Privileged(caller): Privileged,
    Path(id): Path<String>,
) -> Result<StatusCode, KomikError> {
    state.storage.delete_chapter(&id).await?;
    info!(by = %caller.id, chapter_id = %id, "chapter deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn validate_number(number: Option<f64>) -> Result<f64, KomikError> {
    match number {
        Some(n) if n.is_finite() && n >= 0.0 => Ok(n),
        Some(_) => Err(KomikError::validation(
            "number must be a non-negative number",
        )),
        None => Err(KomikError::validation("number is required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_numbers() {
        assert_eq!(validate_number(Some(12.5)).unwrap(), 12.5);
        assert_eq!(validate_number(Some(0.0)).unwrap(), 0.0);
        assert!(validate_number(Some(-1.0)).is_err());
        assert!(validate_number(Some(f64::NAN)).is_err());
        assert!(validate_number(None).is_err());
    }
}
