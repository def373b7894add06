use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;

use crate::config::Config;
use crate::profile::enrich::enrich_profile;
use crate::profile::models::Profile;
use crate::profile::store::ProfileStore;
use crate::state::AppState;

const DEFAULT_ENRICHED_NAME: &str = "perfil_enriched.json";

#[derive(Parser, Debug)]
#[command(name = "cvago")]
#[command(about = "CV profile enrichment and job match service", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Enrich a profile JSON file and write the result next to it
    Enrich {
        /// Path to the profile JSON file
        input: PathBuf,

        /// Output path (default: perfil_enriched.json in the input's directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Chat model to use instead of OPENAI_MODEL
        #[arg(long)]
        model: Option<String>,
    },
}

/// Output path used when `-o` is not given.
pub fn default_output_path(input: &Path) -> PathBuf {
    input
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(DEFAULT_ENRICHED_NAME)
}

/// `cvago enrich`: reads, enriches and writes a profile file.
pub async fn run_enrich(
    config: Config,
    input: &Path,
    output: Option<PathBuf>,
    model: Option<String>,
) -> Result<PathBuf> {
    if !input.is_file() {
        bail!("input file does not exist: {}", input.display());
    }
    let text = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;
    let value: Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", input.display()))?;
    let profile = Profile::from_value(value)?;

    let state = AppState::from_config(config)?;
    let enriched = enrich_profile(state.oracle(), profile, model.as_deref()).await?;
    info!(
        run_id = %enriched.report.run_id,
        failed = enriched.report.failed_entries(),
        "Enrichment finished"
    );

    let output = output.unwrap_or_else(|| default_output_path(input));
    ProfileStore::new(&output).save(&enriched.profile).await?;
    Ok(output)
}
