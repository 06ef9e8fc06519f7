//! Genres, tags and authors share one shape and one set of handlers.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::info;

use crate::db::TaxonomyKind;
use crate::db::models::TaxonomyItem;
use crate::error::KomikError;
use crate::extract::Json;
use crate::middleware::auth::Privileged;
use crate::router::KomikState;
use crate::service::validation::{require_non_empty, validate_slug};

#[derive(Debug, Deserialize)]
pub struct NewTaxonomyItem {
    pub name: String,
    pub slug: String,
}

async fn list(state: &KomikState, kind: TaxonomyKind) -> Result<Json<Vec<TaxonomyItem>>, KomikError> {
    Ok(Json(state.storage.list_taxonomy(kind).await?))
}

async fn create(
    state: &KomikState,
    caller: &str,
    kind: TaxonomyKind,
    item: NewTaxonomyItem,
) -> Result<(StatusCode, Json<TaxonomyItem>), KomikError> {
    require_non_empty("name", Some(&item.name))?;
    validate_slug(&item.slug)?;
    let created = state
        .storage
        .insert_taxonomy(kind, item.name.trim(), &item.slug)
        .await?;
    info!(by = %caller, kind = kind.label(), slug = %created.slug, "taxonomy entry created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_genres(State(state): State<KomikState>) -> Result<Json<Vec<TaxonomyItem>>, KomikError> {
    list(&state, TaxonomyKind::Genre).await
}

pub async fn list_tags(State(state): State<KomikState>) -> Result<Json<Vec<TaxonomyItem>>, KomikError> {
    list(&state, TaxonomyKind::Tag).await
}

pub async fn list_authors(State(state): State<KomikState>) -> Result<Json<Vec<TaxonomyItem>>, KomikError> {
    list(&state, TaxonomyKind::Author).await
}

pub async fn create_genre(
    State(state): State<KomikState>,
    Privileged(caller): Privileged,
    Json(item): Json<NewTaxonomyItem>,
) -> Result<(StatusCode, Json<TaxonomyItem>), KomikError> {
    create(&state, &caller.id, TaxonomyKind::Genre, item).await
}

pub async fn create_tag(
    State(state): State<KomikState>,
    Privileged(caller): Privileged,
    Json(item): Json<NewTaxonomyItem>,
) -> Result<(StatusCode, Json<TaxonomyItem>), KomikError> {
    create(&state, &caller.id, TaxonomyKind::Tag, item).await
}

pub async fn create_author(
    State(state): State<KomikState>,
    Privileged(caller): Privileged,
    Json(item): Json<NewTaxonomyItem>,
) -> Result<(StatusCode, Json<TaxonomyItem>), KomikError> {
    create(&state, &caller.id, TaxonomyKind::Author, item).await
}
