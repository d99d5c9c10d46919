//! Analysis orchestration: one request, one pipeline run.
//!
//! extract app id -> over-fetch reviews -> normalize -> bulk classify ->
//! balanced sample -> summary. All per-request data is request-local; the
//! only shared state is the read-only classifier artifacts.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use utoipa::ToSchema;

use crate::classifier::{ClassifiedReview, ClassifierService, Sentiment};
use crate::playstore::{self, ReviewSource};
use crate::sampler;
use crate::text::clean_text;

pub const DEFAULT_TARGET_COUNT: usize = 60;
/// Fetch 3x the target so the sampler can find the rare Neutral/Negative
/// reviews in a Positive-heavy stream.
const OVER_FETCH_FACTOR: usize = 3;
const MAX_FETCH: usize = 500;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("classifier artifacts are not loaded")]
    Configuration,
    #[error("invalid Play Store URL")]
    InvalidUrl,
    #[error("no reviews found")]
    NoReviews,
    #[error("failed to process reviews: {0}")]
    Upstream(#[from] anyhow::Error),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewExample {
    pub content: String,
    pub sentiment: Sentiment,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalysisResult {
    pub app_id: String,
    pub total_scraped: usize,
    /// Class counts over the delivered sample, not the full fetch: the
    /// dashboard summary must describe what it displays.
    #[schema(value_type = Object)]
    pub summary: BTreeMap<Sentiment, usize>,
    pub examples: Vec<ReviewExample>,
}

/// How many reviews to request for a given target sample size.
pub fn fetch_count(target_count: usize) -> usize {
    (target_count.saturating_mul(OVER_FETCH_FACTOR)).min(MAX_FETCH)
}

pub async fn run_analysis(
    source: &dyn ReviewSource,
    classifier: &ClassifierService,
    url: &str,
    target_count: usize,
    lang: &str,
    country: &str,
) -> Result<AnalysisResult, AnalyzeError> {
    let app_id = playstore::extract_app_id(url).ok_or(AnalyzeError::InvalidUrl)?;

    let reviews = source
        .fetch(&app_id, lang, country, fetch_count(target_count))
        .await?;
    if reviews.is_empty() {
        return Err(AnalyzeError::NoReviews);
    }
    let total_scraped = reviews.len();
    tracing::info!(%app_id, total_scraped, "fetched reviews");

    let cleaned: Vec<String> = reviews.iter().map(|r| clean_text(&r.content)).collect();
    let sentiments = classifier.classify_batch(&cleaned).await?;

    // zip keeps the review/cleaned/label correspondence positional
    let classified: Vec<ClassifiedReview> = reviews
        .into_iter()
        .zip(cleaned)
        .zip(sentiments)
        .map(|((review, cleaned_text), sentiment)| ClassifiedReview {
            review,
            cleaned_text,
            sentiment,
        })
        .collect();

    let sample = sampler::balanced_sample(&classified, target_count);

    let mut summary: BTreeMap<Sentiment, usize> = BTreeMap::new();
    for item in &sample {
        *summary.entry(item.sentiment).or_insert(0) += 1;
    }

    let examples = sample
        .into_iter()
        .map(|item| ReviewExample {
            content: item.review.content,
            sentiment: item.sentiment,
        })
        .collect();

    Ok(AnalysisResult {
        app_id,
        total_scraped,
        summary,
        examples,
    })
}
