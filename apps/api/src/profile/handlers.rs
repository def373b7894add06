use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::profile::enrich::{enrich_profile, EnrichedProfile};
use crate::profile::models::Profile;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct EnrichRequest {
    pub profile: Value,
}

#[derive(Serialize)]
pub struct SaveProfileResponse {
    pub ok: bool,
    pub message: String,
}

/// GET /api/profile
pub async fn handle_get_profile(State(state): State<AppState>) -> Result<Json<Profile>, AppError> {
    let profile = state.store.load().await?.ok_or_else(|| {
        AppError::NotFound(format!("{} not found", state.store.path().display()))
    })?;
    Ok(Json(profile))
}

/// PUT /api/profile
pub async fn handle_put_profile(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<SaveProfileResponse>, AppError> {
    let profile = Profile::from_value(body)?;
    state.store.save(&profile).await?;
    Ok(Json(SaveProfileResponse {
        ok: true,
        message: format!("Profile saved to {}", state.store.path().display()),
    }))
}

/// POST /api/cv/enrich
pub async fn handle_enrich(
    State(state): State<AppState>,
    Json(req): Json<EnrichRequest>,
) -> Result<Json<EnrichedProfile>, AppError> {
    let profile = Profile::from_value(req.profile)?;
    let enriched = enrich_profile(state.oracle(), profile, None).await?;
    Ok(Json(enriched))
}
