use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::errors::AppError;
use crate::parsing::extract::{extract_cv_text, CvFormat};
use crate::parsing::parser::parse_cv;
use crate::profile::enrich::enrich_profile;
use crate::profile::models::Profile;
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";

/// Reads the `file` part of the upload and extracts its text.
async fn read_cv_upload(multipart: &mut Multipart) -> Result<String, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let format = CvFormat::from_filename(field.file_name().unwrap_or_default())?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid file: {e}")))?;
        let text = extract_cv_text(format, bytes.to_vec()).await?;
        if text.is_empty() {
            return Err(AppError::Validation(
                "Could not extract any text from the file".to_string(),
            ));
        }
        return Ok(text);
    }
    Err(AppError::Validation(format!(
        "Missing '{UPLOAD_FIELD}' upload field"
    )))
}

/// POST /api/cv/parse
pub async fn handle_parse(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Profile>, AppError> {
    let text = read_cv_upload(&mut multipart).await?;
    let profile = parse_cv(state.oracle(), &text, None).await?;
    Ok(Json(profile))
}

/// POST /api/cv/parse-and-enrich
pub async fn handle_parse_and_enrich(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Profile>, AppError> {
    let text = read_cv_upload(&mut multipart).await?;
    let profile = parse_cv(state.oracle(), &text, None).await?;
    let enriched = enrich_profile(state.oracle(), profile, None).await?;
    Ok(Json(enriched.profile))
}
