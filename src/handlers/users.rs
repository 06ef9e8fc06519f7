use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::models::UserSummary;
use crate::error::KomikError;
use crate::extract::{Json, Query};
use crate::middleware::auth::{OwnerOnly, Privileged};
use crate::router::KomikState;
use crate::types::{PageQuery, Role};

#[derive(Debug, Serialize)]
pub struct UserPage {
    pub users: Vec<UserSummary>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

/// GET /users (OWNER, ADMIN)
pub async fn list_users(
    State(state): State<KomikState>,
    _caller: Privileged,
    Query(query): Query<PageQuery>,
) -> Result<Json<UserPage>, KomikError> {
    let (page, limit) = query.resolve(20);
    let users = state
        .storage
        .list_users(limit, PageQuery::offset(page, limit))
        .await?;
    let total = state.storage.count_users().await?;
    Ok(Json(UserPage {
        users: users.into_iter().map(UserSummary::from).collect(),
        total,
        page,
        limit,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RoleChange {
    pub role: Role,
}

/// PUT /users/{id}/role (OWNER). OWNER can be neither granted nor revoked here.
pub async fn change_role(
    State(state): State<KomikState>,
    OwnerOnly(caller): OwnerOnly,
    Path(id): Path<String>,
    Json(change): Json<RoleChange>,
) -> Result<Json<UserSummary>, KomikError> {
    if change.role == Role::Owner {
        return Err(KomikError::validation("The OWNER role cannot be assigned"));
    }
    let target = state
        .storage
        .find_user_by_id(&id)
        .await?
        .ok_or(KomikError::NotFound("User"))?;
    if target.role == Role::Owner {
        return Err(KomikError::validation("The owner's role cannot be changed"));
    }

    let updated = state.storage.update_role(&id, change.role).await?;
    info!(
        by = %caller.id,
        user_id = %updated.id,
        role = %updated.role,
        "user role changed"
    );
    Ok(Json(updated.into()))
}
