use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::core::config::Settings;

/// Wire names the Python scorers expect per TOEIC part.
pub(crate) fn task_type_for_part(part_id: i32) -> Option<&'static str> {
    match part_id {
        8 => Some("write_sentence"),
        9 => Some("respond_request"),
        10 => Some("opinion_essay"),
        11 => Some("read_aloud"),
        12 => Some("describe_picture"),
        13 => Some("respond_questions"),
        14 => Some("respond_with_info"),
        15 => Some("express_opinion"),
        _ => None,
    }
}

/// One sub-question of a grouped speaking item, in delivery order.
#[derive(Debug, Clone)]
pub(crate) struct GroupQuestionRef {
    pub(crate) order: usize,
    pub(crate) content: String,
}

/// Everything a scorer needs about one answered part. The engine only ever
/// hands over URLs for audio and images, never bytes.
#[derive(Debug, Clone)]
pub(crate) struct ScoreRequest {
    pub(crate) test_question_id: String,
    pub(crate) task_type: &'static str,
    pub(crate) question_number: i32,
    pub(crate) answer_text: Option<String>,
    pub(crate) audio_file_url: Option<String>,
    pub(crate) reference_text: Option<String>,
    pub(crate) question_context: Option<String>,
    pub(crate) passage: Option<String>,
    pub(crate) questions: Vec<GroupQuestionRef>,
    pub(crate) image_url: Option<String>,
}

/// Parsed scorer verdict. `overall_score` is the raw 0-100 value; scaling
/// to the reported TOEIC band happens in the aggregator, one time only.
#[derive(Debug, Clone)]
pub(crate) struct ScoreResult {
    pub(crate) overall_score: f64,
    pub(crate) scores: Value,
    pub(crate) detailed_analysis: Value,
    pub(crate) recommendations: Vec<String>,
    pub(crate) transcription: Option<String>,
    pub(crate) corrected_text: Option<String>,
    pub(crate) audio_duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ScorerResponse {
    overall_score: f64,
    #[serde(default)]
    scores: Value,
    #[serde(default)]
    detailed_analysis: Value,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    transcription: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Clone)]
pub(crate) struct WritingClient {
    inner: ScoringClient,
}

#[derive(Debug, Clone)]
pub(crate) struct SpeakingClient {
    inner: ScoringClient,
}

#[derive(Debug, Clone)]
struct ScoringClient {
    client: Client,
    base_url: String,
    max_retries: u32,
    scorer: &'static str,
}

impl WritingClient {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self { inner: ScoringClient::new(settings, settings.ai().writing_api_url.clone(), "writing")? })
    }

    pub(crate) async fn assess(&self, request: &ScoreRequest) -> Result<ScoreResult> {
        let payload = json!({
            "text": request.answer_text.as_deref().unwrap_or_default(),
            "prompt": request.reference_text.as_deref().unwrap_or_default(),
            "part_type": request.task_type,
            "question_number": request.question_number,
            "image_url": request.image_url,
        });
        self.inner.post_assess(&request.test_question_id, payload).await
    }
}

impl SpeakingClient {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            inner: ScoringClient::new(settings, settings.ai().speaking_api_url.clone(), "speaking")?,
        })
    }

    pub(crate) async fn assess(&self, request: &ScoreRequest) -> Result<ScoreResult> {
        let questions: Vec<Value> = request
            .questions
            .iter()
            .map(|question| json!({"order": question.order, "content": question.content}))
            .collect();

        let payload = json!({
            "audio_url": request.audio_file_url,
            "question_type": request.task_type,
            "question_number": request.question_number,
            "reference_text": request.reference_text,
            "question_context": request.question_context,
            "passage": request.passage,
            "questions": questions,
            "image_url": request.image_url,
        });
        self.inner.post_assess(&request.test_question_id, payload).await
    }
}

impl ScoringClient {
    fn new(settings: &Settings, base_url: String, scorer: &'static str) -> Result<Self> {
        let timeout = Duration::from_secs(settings.ai().request_timeout_seconds);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: settings.ai().max_retries,
            scorer,
        })
    }

    async fn post_assess(&self, test_question_id: &str, payload: Value) -> Result<ScoreResult> {
        let url = format!("{}/assess", self.base_url);

        tracing::info!(
            scorer = self.scorer,
            test_question_id,
            "Sending assessment request"
        );

        let mut last_error = None;
        let mut body: Option<String> = None;

        for attempt in 0..=self.max_retries {
            match self.client.post(&url).json(&payload).send().await {
                Ok(response) => {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    if status.is_success() {
                        body = Some(text);
                        last_error = None;
                        break;
                    }
                    last_error = Some(anyhow::anyhow!(
                        "{} scorer returned {status}: {text}",
                        self.scorer
                    ));
                    if status.is_client_error() {
                        break;
                    }
                }
                Err(err) => {
                    last_error =
                        Some(anyhow::Error::new(err).context(format!(
                            "Failed to reach {} scorer",
                            self.scorer
                        )));
                }
            }

            if attempt < self.max_retries {
                tokio::time::sleep(Duration::from_secs(2_u64.pow(attempt))).await;
            }
        }

        if let Some(err) = last_error {
            metrics::counter!("ai_assessments_total", "scorer" => self.scorer, "status" => "failed")
                .increment(1);
            return Err(err);
        }

        let body = body.unwrap_or_default();
        let parsed: ScorerResponse = serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse {} scorer response", self.scorer))?;

        let overall_score = parsed.overall_score;
        if !(0.0..=100.0).contains(&overall_score) {
            anyhow::bail!(
                "{} scorer returned out-of-range overall_score {overall_score}",
                self.scorer
            );
        }

        let corrected_text = parsed
            .detailed_analysis
            .get("corrected_text")
            .and_then(|value| value.as_str())
            .map(|value| value.to_string());

        metrics::counter!("ai_assessments_total", "scorer" => self.scorer, "status" => "success")
            .increment(1);

        Ok(ScoreResult {
            overall_score,
            scores: parsed.scores,
            detailed_analysis: parsed.detailed_analysis,
            recommendations: parsed.recommendations,
            transcription: parsed.transcription,
            corrected_text,
            audio_duration: parsed.duration,
        })
    }
}

/// One-line summary stored as the feedback content, mirroring what the
/// scorer reports most prominently.
pub(crate) fn content_summary(result: &ScoreResult) -> String {
    let mut highlights: Vec<String> = Vec::new();
    if let Some(map) = result.scores.as_object() {
        for (key, value) in map.iter().take(3) {
            highlights.push(format!("{key}: {value}"));
        }
    }
    if highlights.is_empty() {
        format!("Score: {}/100", result.overall_score)
    } else {
        format!("Score: {}/100. {}", result.overall_score, highlights.join(", "))
    }
}
