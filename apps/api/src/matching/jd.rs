//! Job description intake: page fetching, HTML stripping, summarizing and the
//! last-JD cache shared between the summary and match endpoints.

use std::time::Duration;

use regex::Regex;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::llm_client::prompts::clip;
use crate::llm_client::{CallOptions, LlmError, Oracle};
use crate::matching::prompts::{JD_SUMMARY_PROMPT, JD_SUMMARY_SYSTEM};

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const FETCH_TIMEOUT_SECS: u64 = 30;
/// Cap on the stripped page text.
const MAX_PAGE_CHARS: usize = 50_000;

const SUMMARY_INPUT_CHARS: usize = 12_000;
const SUMMARY_MAX_TOKENS: u32 = 800;
const FALLBACK_SUMMARY_CHARS: usize = 2_000;
const EMPTY_SUMMARY: &str = "No se pudo obtener contenido de la URL.";

// ────────────────────────────────────────────────────────────────────────────
// Fetching
// ────────────────────────────────────────────────────────────────────────────

/// Fetches job pages and reduces them to plain text.
#[derive(Debug, Clone)]
pub struct JdFetcher {
    client: reqwest::Client,
    script_pattern: Regex,
    style_pattern: Regex,
    tag_pattern: Regex,
    whitespace_pattern: Regex,
}

impl JdFetcher {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent(BROWSER_USER_AGENT)
                .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
                .redirect(reqwest::redirect::Policy::limited(10))
                .build()?,
            script_pattern: Regex::new(r"(?i)<script[^>]*>[\s\S]*?</script>")?,
            style_pattern: Regex::new(r"(?i)<style[^>]*>[\s\S]*?</style>")?,
            tag_pattern: Regex::new(r"<[^>]+>")?,
            whitespace_pattern: Regex::new(r"\s+")?,
        })
    }

    /// Downloads `url` and returns its visible text. Non-2xx statuses are errors.
    pub async fn fetch(&self, url: &str) -> Result<String, reqwest::Error> {
        let html = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let text = self.strip_html(&html);
        info!(url, chars = text.chars().count(), "Fetched job description");
        Ok(text)
    }

    /// Drops script and style blocks and tags, then collapses whitespace.
    pub fn strip_html(&self, html: &str) -> String {
        let text = self.script_pattern.replace_all(html, "");
        let text = self.style_pattern.replace_all(&text, "");
        let text = self.tag_pattern.replace_all(&text, " ");
        let text = self.whitespace_pattern.replace_all(&text, " ");
        clip(text.trim(), MAX_PAGE_CHARS).to_string()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Summary
// ────────────────────────────────────────────────────────────────────────────

/// Summarizes a job description. Without an oracle, or for blank text, the
/// leading part of the text stands in for the summary.
pub async fn summarize_jd(
    oracle: Option<&dyn Oracle>,
    raw_text: &str,
    model: Option<&str>,
) -> Result<String, LlmError> {
    let Some(oracle) = oracle.filter(|_| !raw_text.trim().is_empty()) else {
        let head = clip(raw_text, FALLBACK_SUMMARY_CHARS).trim();
        return Ok(if head.is_empty() {
            EMPTY_SUMMARY.to_string()
        } else {
            head.to_string()
        });
    };

    let prompt = JD_SUMMARY_PROMPT.replace("{jd_text}", clip(raw_text, SUMMARY_INPUT_CHARS));
    let summary = oracle
        .complete(
            JD_SUMMARY_SYSTEM,
            &prompt,
            CallOptions {
                model,
                max_tokens: SUMMARY_MAX_TOKENS,
                temperature: None,
            },
        )
        .await?;
    Ok(summary.trim().to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Cache
// ────────────────────────────────────────────────────────────────────────────

struct CachedJd {
    text: String,
    stored_at: Instant,
}

/// Holds the most recent raw job description. Last write wins; an entry
/// older than the TTL is treated as absent. A zero TTL never expires.
pub struct JdCache {
    ttl: Duration,
    slot: RwLock<Option<CachedJd>>,
}

impl JdCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub async fn store(&self, text: String) {
        *self.slot.write().await = Some(CachedJd {
            text,
            stored_at: Instant::now(),
        });
    }

    /// The cached text, if any and not stale.
    pub async fn fresh(&self) -> Option<String> {
        let slot = self.slot.read().await;
        let cached = slot.as_ref()?;
        if !self.ttl.is_zero() && cached.stored_at.elapsed() > self.ttl {
            warn!("Cached job description is stale, ignoring it");
            return None;
        }
        Some(cached.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedOracle;

    #[test]
    fn test_strip_html_removes_scripts_styles_and_tags() {
        let fetcher = JdFetcher::new().unwrap();
        let html = r#"<html><head><STYLE>.a{color:red}</STYLE>
            <script type="text/javascript">var x = "<b>";</script></head>
            <body><h1>Data   Engineer</h1>
            <p>Spark &amp; Airflow</p></body></html>"#;
        assert_eq!(fetcher.strip_html(html), "Data Engineer Spark &amp; Airflow");
    }

    #[test]
    fn test_strip_html_caps_length() {
        let fetcher = JdFetcher::new().unwrap();
        let html = format!("<p>{}</p>", "a".repeat(MAX_PAGE_CHARS + 10));
        assert_eq!(fetcher.strip_html(&html).len(), MAX_PAGE_CHARS);
    }

    #[tokio::test]
    async fn test_summary_fallback_without_oracle() {
        let text = format!("  {}", "x".repeat(3000));
        let summary = summarize_jd(None, &text, None).await.unwrap();
        assert_eq!(summary.len(), FALLBACK_SUMMARY_CHARS - 2);

        let summary = summarize_jd(None, "   ", None).await.unwrap();
        assert_eq!(summary, EMPTY_SUMMARY);
    }

    #[tokio::test]
    async fn test_summary_uses_oracle_text() {
        let oracle = ScriptedOracle::new(|system, prompt| {
            assert_eq!(system, JD_SUMMARY_SYSTEM);
            assert!(prompt.starts_with("Resumí esta oferta:"));
            Ok("  Rol: Data Engineer\n".to_string())
        });
        let summary = summarize_jd(Some(&oracle), "Buscamos Data Engineer", None)
            .await
            .unwrap();
        assert_eq!(summary, "Rol: Data Engineer");
    }

    #[tokio::test]
    async fn test_cache_last_write_wins() {
        let cache = JdCache::new(Duration::from_secs(60));
        assert_eq!(cache.fresh().await, None);
        cache.store("primera".into()).await;
        cache.store("segunda".into()).await;
        assert_eq!(cache.fresh().await.as_deref(), Some("segunda"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_entry_expires() {
        let cache = JdCache::new(Duration::from_secs(60));
        cache.store("jd".into()).await;
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(cache.fresh().await.is_some());
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(cache.fresh().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ttl_never_expires() {
        let cache = JdCache::new(Duration::ZERO);
        cache.store("jd".into()).await;
        tokio::time::advance(Duration::from_secs(86_400)).await;
        assert!(cache.fresh().await.is_some());
    }
}
