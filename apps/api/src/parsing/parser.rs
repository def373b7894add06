use chrono::{Local, NaiveDate};
use serde_json::{Map, Value};
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::prompts::clip;
use crate::llm_client::{call_json_object, CallOptions, Oracle};
use crate::parsing::prompts::{cv_parse_system, CV_PARSE_PROMPT};
use crate::profile::models::Profile;

const CV_INPUT_CHARS: usize = 40_000;
const PARSE_MAX_TOKENS: u32 = 16_000;
const PARSE_TEMPERATURE: f32 = 0.1;
pub const SCHEMA_VERSION: &str = "1.0";

/// Turns CV text into a profile document through the oracle, then stamps
/// `metadata.version` and `metadata.lastUpdated`.
pub async fn parse_cv(
    oracle: Option<&dyn Oracle>,
    cv_text: &str,
    model: Option<&str>,
) -> Result<Profile, AppError> {
    let oracle = oracle.ok_or_else(|| {
        AppError::MissingCredential("OPENAI_API_KEY is not configured; CV parsing needs it".into())
    })?;
    if cv_text.trim().is_empty() {
        return Err(AppError::Validation(
            "Could not extract any text from the file".to_string(),
        ));
    }

    let prompt = CV_PARSE_PROMPT.replace("{cv_text}", &clip_cv_text(cv_text));
    let mut document = call_json_object(
        oracle,
        &cv_parse_system(),
        &prompt,
        CallOptions {
            model,
            max_tokens: PARSE_MAX_TOKENS,
            temperature: Some(PARSE_TEMPERATURE),
        },
    )
    .await
    .map_err(|e| AppError::from_oracle("parsing CV", e))?;

    stamp_metadata(&mut document, Local::now().date_naive());
    let profile = Profile::from_value(Value::Object(document)).map_err(|e| {
        AppError::MalformedOracleResponse(format!("parsed CV is not a valid profile: {e}"))
    })?;
    info!(
        experiences = profile.experience_count(),
        "CV parsed into profile"
    );
    Ok(profile)
}

/// Long CVs are cut and marked with a trailing ellipsis.
fn clip_cv_text(cv_text: &str) -> String {
    let clipped = clip(cv_text, CV_INPUT_CHARS);
    if clipped.len() < cv_text.len() {
        format!("{clipped}...")
    } else {
        clipped.to_string()
    }
}

fn stamp_metadata(document: &mut Map<String, Value>, today: NaiveDate) {
    let metadata = document
        .entry("metadata")
        .or_insert_with(|| Value::Object(Map::new()));
    if !metadata.is_object() {
        *metadata = Value::Object(Map::new());
    }
    if let Some(metadata) = metadata.as_object_mut() {
        metadata.insert("version".into(), Value::from(SCHEMA_VERSION));
        metadata.insert(
            "lastUpdated".into(),
            Value::from(today.format("%Y-%m-%d").to_string()),
        );
    }
}
