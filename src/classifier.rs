//! Sentiment classification against pretrained artifacts.
//!
//! The model itself lives behind [`SentimentModel`]; in production that is a
//! served Keras model reached over HTTP (TensorFlow Serving REST shape).
//! Token encoding and label decoding happen here, from the word-index and
//! label tables exported at training time. All three artifacts are loaded
//! once at startup and shared read-only across requests.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use utoipa::ToSchema;

use crate::playstore::Review;

/// Fixed input width the model was trained with.
pub const PAD_LEN: usize = 100;

/// The fixed sentiment label set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    pub fn parse(label: &str) -> Option<Sentiment> {
        match label.trim().to_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "neutral" => Some(Sentiment::Neutral),
            "negative" => Some(Sentiment::Negative),
            _ => None,
        }
    }

}

/// A review with its normalized text and predicted label.
#[derive(Debug, Clone)]
pub struct ClassifiedReview {
    pub review: Review,
    pub cleaned_text: String,
    pub sentiment: Sentiment,
}

/// The pretrained model boundary: a padded token matrix in, one probability
/// vector per row out. Row order must match input order.
#[async_trait]
pub trait SentimentModel: Send + Sync {
    async fn predict(&self, batch: &[Vec<u32>]) -> Result<Vec<Vec<f32>>>;
}

/// Remote model served over HTTP (TensorFlow Serving `:predict` REST shape).
pub struct ServedModel {
    url: String,
    client: reqwest::Client,
}

impl ServedModel {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f32>>,
}

#[async_trait]
impl SentimentModel for ServedModel {
    async fn predict(&self, batch: &[Vec<u32>]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "instances": batch }))
            .send()
            .await
            .context("model server unreachable")?;

        if !response.status().is_success() {
            bail!("model server returned HTTP {}", response.status());
        }

        let parsed: PredictResponse = response
            .json()
            .await
            .context("model server returned an unexpected body")?;
        Ok(parsed.predictions)
    }
}

/// Index of the highest-probability class. Pure, so the decode path is
/// testable without the real network.
pub fn argmax(row: &[f32]) -> Result<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &p) in row.iter().enumerate() {
        match best {
            Some((_, bp)) if p <= bp => {}
            _ => best = Some((i, p)),
        }
    }
    best.map(|(i, _)| i)
        .ok_or_else(|| anyhow!("model returned an empty probability row"))
}

/// Immutable classifier artifacts: vocabulary, label table, and the model.
/// Constructed once at startup; requests only read from it.
pub struct ClassifierService {
    vocab: HashMap<String, u32>,
    labels: Vec<Sentiment>,
    model: Box<dyn SentimentModel>,
}

impl ClassifierService {
    pub fn new(
        vocab: HashMap<String, u32>,
        label_names: Vec<String>,
        model: Box<dyn SentimentModel>,
    ) -> Result<Self> {
        if label_names.is_empty() {
            bail!("label table is empty");
        }
        let labels = label_names
            .iter()
            .map(|name| {
                Sentiment::parse(name).ok_or_else(|| anyhow!("unknown sentiment label {:?}", name))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            vocab,
            labels,
            model,
        })
    }

    /// Load artifacts from the paths/URL in the environment. Any missing
    /// artifact fails the whole load; the caller decides whether the process
    /// keeps running without a classification path.
    pub fn from_env() -> Result<Self> {
        let vocab_path =
            env::var("VOCAB_PATH").unwrap_or_else(|_| "artifacts/word_index.json".to_string());
        let labels_path =
            env::var("LABELS_PATH").unwrap_or_else(|_| "artifacts/labels.json".to_string());
        let model_url = env::var("MODEL_URL")
            .unwrap_or_else(|_| "http://localhost:8501/v1/models/sentiment:predict".to_string());

        let vocab = read_json_file(&vocab_path).context("loading word index")?;
        let label_names = read_json_file(&labels_path).context("loading label table")?;

        Self::new(vocab, label_names, Box::new(ServedModel::new(model_url)))
    }

    /// Map normalized text to token indices. Words outside the training
    /// vocabulary are dropped, as the Keras tokenizer did.
    pub fn encode(&self, cleaned_text: &str) -> Vec<u32> {
        cleaned_text
            .split_whitespace()
            .filter_map(|word| self.vocab.get(word).copied())
            .collect()
    }

    /// Pad/truncate to [`PAD_LEN`], Keras-style: zeros in front, and when
    /// too long keep the tail.
    pub fn pad(sequence: &[u32]) -> Vec<u32> {
        let mut padded = vec![0u32; PAD_LEN];
        if sequence.len() >= PAD_LEN {
            padded.copy_from_slice(&sequence[sequence.len() - PAD_LEN..]);
        } else {
            padded[PAD_LEN - sequence.len()..].copy_from_slice(sequence);
        }
        padded
    }

    pub fn decode_label(&self, class_index: usize) -> Result<Sentiment> {
        self.labels
            .get(class_index)
            .copied()
            .ok_or_else(|| anyhow!("class index {} outside the label table", class_index))
    }

    /// Classify a batch of normalized texts in one model call. The i-th
    /// output label corresponds to the i-th input text.
    pub async fn classify_batch(&self, cleaned_texts: &[String]) -> Result<Vec<Sentiment>> {
        if cleaned_texts.is_empty() {
            return Ok(Vec::new());
        }

        let padded: Vec<Vec<u32>> = cleaned_texts
            .iter()
            .map(|text| Self::pad(&self.encode(text)))
            .collect();

        let predictions = self.model.predict(&padded).await?;
        if predictions.len() != cleaned_texts.len() {
            bail!(
                "model returned {} rows for {} inputs",
                predictions.len(),
                cleaned_texts.len()
            );
        }

        predictions
            .iter()
            .map(|row| self.decode_label(argmax(row)?))
            .collect()
    }
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    if !Path::new(path).exists() {
        bail!("artifact file not found: {}", path);
    }
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path))
}
