use axum::extract::State;

use crate::error::KomikError;
use crate::extract::Json;
use crate::router::KomikState;
use crate::service::auth::RegisterRequest;
use crate::service::install::{DatabaseSettings, InstallationStatus, StepOutcome};

/// GET /install/status
pub async fn status(State(state): State<KomikState>) -> Json<InstallationStatus> {
    Json(state.install.status().await)
}

/// POST /install/test-database
pub async fn test_database(
    State(state): State<KomikState>,
    Json(settings): Json<DatabaseSettings>,
) -> Json<StepOutcome> {
    Json(state.install.test_database(&settings))
}

/// POST /install/create-owner
pub async fn create_owner(
    State(state): State<KomikState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<StepOutcome>, KomikError> {
    Ok(Json(state.install.create_owner(req).await?))
}

/// POST /install/complete
pub async fn complete(State(state): State<KomikState>) -> Result<Json<StepOutcome>, KomikError> {
    Ok(Json(state.install.complete().await?))
}
