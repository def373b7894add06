use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::errors::AppError;
use crate::matching::analyzer::{score_match, MatchReport};
use crate::matching::jd::summarize_jd;
use crate::profile::models::Profile;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct JdSummaryRequest {
    pub job_url: Option<String>,
    /// Pasted description; preferred over the URL when both are given.
    pub jd_text: Option<String>,
}

#[derive(Serialize)]
pub struct JdSummaryResponse {
    pub jd_summary: String,
}

#[derive(Deserialize)]
pub struct MatchRequest {
    pub profile: Value,
    /// Falls back to the last job description seen by /api/jd/summary.
    pub jd: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// POST /api/jd/summary
pub async fn handle_jd_summary(
    State(state): State<AppState>,
    Json(req): Json<JdSummaryRequest>,
) -> Result<Json<JdSummaryResponse>, AppError> {
    let raw_text = if let Some(text) = non_blank(req.jd_text.as_deref()) {
        text.to_string()
    } else if let Some(url) = non_blank(req.job_url.as_deref()) {
        state.jd_fetcher.fetch(url).await.map_err(|e| {
            warn!(url, "Job description fetch failed: {e}");
            AppError::UnprocessableEntity(format!("Could not fetch the job posting from the URL: {e}"))
        })?
    } else {
        return Err(AppError::Validation(
            "Send job_url or jd_text (pasted description)".to_string(),
        ));
    };

    state.jd_cache.store(raw_text.clone()).await;
    let jd_summary = summarize_jd(
        state.oracle(),
        &raw_text,
        Some(state.config.openai_summary_model.as_str()),
    )
    .await
    .map_err(|e| AppError::from_oracle("summarizing job description", e))?;

    Ok(Json(JdSummaryResponse { jd_summary }))
}

/// POST /api/cv/match
pub async fn handle_match(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<MatchReport>, AppError> {
    let profile = Profile::from_value(req.profile)?;
    let jd_text = match non_blank(req.jd.as_deref()) {
        Some(jd) => jd.to_string(),
        None => state.jd_cache.fresh().await.ok_or_else(|| {
            AppError::Validation(
                "No job description available. Send 'jd' or run the job summary step first"
                    .to_string(),
            )
        })?,
    };

    let report = score_match(state.oracle(), &profile, &jd_text, None)
        .await
        .map_err(|e| AppError::from_oracle("match analysis", e))?;
    Ok(Json(report))
}
