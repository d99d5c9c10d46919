//! Google Play review source.
//!
//! Reviews come from the Play Store's internal `batchexecute` RPC (the same
//! endpoint the store frontend uses), newest first, paginated with a
//! continuation token. Everything behind the [`ReviewSource`] trait so tests
//! can substitute a stub source.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

static APP_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"id=([A-Za-z0-9._]+)").unwrap());

/// Extract the `id=` query parameter from a Play Store URL.
pub fn extract_app_id(url: &str) -> Option<String> {
    APP_ID_RE
        .captures(url)
        .map(|caps| caps[1].to_string())
}

/// One fetched review. `content` is what the pipeline consumes; the rest is
/// metadata carried through unmodified.
#[derive(Debug, Clone)]
pub struct Review {
    pub review_id: String,
    pub user_name: String,
    pub content: String,
    pub score: i64,
    pub at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Fetch up to `count` reviews for `app_id`, newest first.
    async fn fetch(&self, app_id: &str, lang: &str, country: &str, count: usize)
        -> Result<Vec<Review>>;
}

const BATCH_EXECUTE_URL: &str = "https://play.google.com/_/PlayStoreUi/data/batchexecute";
const REVIEWS_RPC_ID: &str = "UsvDTd";
const SORT_NEWEST: u8 = 2;
// The RPC caps a single page below this; larger requests get truncated anyway.
const PAGE_SIZE: usize = 199;

pub struct GooglePlaySource {
    client: reqwest::Client,
}

impl GooglePlaySource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Build the `f.req` payload for one reviews page.
    fn request_payload(app_id: &str, count: usize, token: Option<&str>) -> String {
        let page_params = match token {
            Some(t) => json!([count, null, t]),
            None => json!([count, null, null]),
        };
        let inner = json!([null, null, [2, SORT_NEWEST, page_params, null, []], [app_id, 7]]);
        json!([[[REVIEWS_RPC_ID, inner.to_string(), null, "generic"]]]).to_string()
    }
}

impl Default for GooglePlaySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReviewSource for GooglePlaySource {
    async fn fetch(
        &self,
        app_id: &str,
        lang: &str,
        country: &str,
        count: usize,
    ) -> Result<Vec<Review>> {
        let mut fetched: Vec<Review> = Vec::new();
        let mut token: Option<String> = None;

        while fetched.len() < count {
            let page = (count - fetched.len()).min(PAGE_SIZE);
            let payload = Self::request_payload(app_id, page, token.as_deref());

            let response = self
                .client
                .post(BATCH_EXECUTE_URL)
                .query(&[("hl", lang), ("gl", country)])
                .form(&[("f.req", payload)])
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(anyhow!("Play Store returned HTTP {}", response.status()));
            }

            let raw = response.text().await?;
            let (reviews, next_token) = parse_review_page(&raw)?;
            if reviews.is_empty() {
                break;
            }
            fetched.extend(reviews);

            token = next_token;
            if token.is_none() {
                break;
            }
        }

        fetched.truncate(count);
        Ok(fetched)
    }
}

/// Parse one raw `batchexecute` response into reviews plus the continuation
/// token for the next page.
///
/// The response is an anti-XSSI prefix followed by a JSON envelope whose
/// first element carries the actual payload as a nested JSON *string*.
fn parse_review_page(raw: &str) -> Result<(Vec<Review>, Option<String>)> {
    let body = raw.trim_start_matches(")]}'").trim_start();
    let envelope: Value = serde_json::from_str(body)?;

    let payload = envelope
        .get(0)
        .and_then(|chunk| chunk.get(2))
        .ok_or_else(|| anyhow!("unexpected batchexecute envelope shape"))?;

    // A null payload means the app has no (more) reviews.
    let payload = match payload.as_str() {
        Some(s) => s,
        None => return Ok((Vec::new(), None)),
    };

    let parsed: Value = serde_json::from_str(payload)?;

    let mut reviews = Vec::new();
    if let Some(items) = parsed.get(0).and_then(Value::as_array) {
        for item in items {
            if let Some(review) = parse_review_item(item) {
                reviews.push(review);
            }
        }
    }

    let next_token = parsed
        .as_array()
        .and_then(|arr| arr.last())
        .and_then(Value::as_array)
        .and_then(|arr| arr.last())
        .and_then(Value::as_str)
        .map(String::from);

    Ok((reviews, next_token))
}

/// Decode one review array. Positions follow the store frontend's wire
/// format: [0] id, [1][0] author, [2] star rating, [4] body, [5][0] unix
/// seconds. Items without a body are skipped.
fn parse_review_item(item: &Value) -> Option<Review> {
    let content = item.get(4)?.as_str()?.to_string();

    let review_id = item
        .get(0)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let user_name = item
        .get(1)
        .and_then(|v| v.get(0))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let score = item.get(2).and_then(Value::as_i64).unwrap_or(0);
    let at = item
        .get(5)
        .and_then(|v| v.get(0))
        .and_then(Value::as_i64)
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

    Some(Review {
        review_id,
        user_name,
        content,
        score,
        at,
    })
}
