
use std::fmt::Write as _;
use std::time::Duration;

use anyhow::{Context, Result as AnyResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::config::{GenerationConfig, OllamaConfig};
use crate::retriever::RetrievedChunk;
use crate::{RagError, Result};

/// Marker the prompt ends with; post-processing keeps only what the model
/// wrote after it, stripping any echoed prompt.
const ANALYSIS_MARKER: &str = "ANALYSIS:";

/// Generation can legitimately take much longer than embedding.
const GENERATION_TIMEOUT_SECONDS: u64 = 300;

/// Calls a text-generation model with a finished prompt.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> AnyResult<String>;
    fn model_id(&self) -> &str;
}

/// Blocking client for an Ollama-compatible `/api/generate` endpoint.
///
/// No retry: a generation call that timed out has usually already consumed
/// its budget, and the pipeline soft-fails the question instead.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    base_url: Url,
    model: String,
    options: GenerateOptions,
    agent: ureq::Agent,
}

#[derive(Debug, Clone, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
    repeat_penalty: f32,
    repeat_last_n: u32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: &'a GenerateOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl GenerationClient {
    #[inline]
    pub fn new(ollama: &OllamaConfig, generation: &GenerationConfig) -> AnyResult<Self> {
        let base_url = ollama
            .base_url()
            .context("Failed to build Ollama URL from config")?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(GENERATION_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url,
            model: generation.model.clone(),
            options: GenerateOptions {
                temperature: generation.temperature,
                num_predict: generation.max_length,
                repeat_penalty: generation.repeat_penalty,
                repeat_last_n: generation.repeat_window,
            },
            agent,
        })
    }
}

impl TextGenerator for GenerationClient {
    #[inline]
    fn generate(&self, prompt: &str) -> AnyResult<String> {
        let url = self
            .base_url
            .join("/api/generate")
            .context("Failed to build generation URL")?;

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: &self.options,
        };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize generation request")?;

        debug!(
            "Requesting generation from {} (prompt length: {})",
            self.model,
            prompt.len()
        );

        let response_text = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .context("Generation request failed")?;

        let response: GenerateResponse = serde_json::from_str(&response_text)
            .context("Failed to parse generation response")?;

        Ok(response.response)
    }

    #[inline]
    fn model_id(&self) -> &str {
        &self.model
    }
}

/// Builds the structured analysis prompt and post-formats model output.
pub struct AnswerGenerator<'a> {
    model: &'a dyn TextGenerator,
}

impl<'a> AnswerGenerator<'a> {
    #[inline]
    pub fn new(model: &'a dyn TextGenerator) -> Self {
        Self { model }
    }

    /// Generate a business-readable answer from retrieved chunks.
    #[inline]
    pub fn answer(&self, chunks: &[RetrievedChunk], question: &str) -> Result<String> {
        let prompt = build_prompt(chunks, question);

        let raw = self.model.generate(&prompt).map_err(|e| {
            error!("Generation failed: {:#}", e);
            RagError::Generation(format!("Model invocation failed: {}", e))
        })?;

        Ok(postprocess(&raw))
    }
}

/// Assemble the prompt: analyst persona, enumerated excerpts annotated with
/// their attributes, the verbatim question, and a fixed report framework.
#[inline]
pub fn build_prompt(chunks: &[RetrievedChunk], question: &str) -> String {
    let mut prompt = String::from(
        "You are a senior financial-services analyst reviewing customer complaints.\n\
         Use only the complaint excerpts below to answer the question.\n\
         If the excerpts do not contain the answer, state that the data is insufficient.\n\n\
         Complaint excerpts:\n",
    );

    for (i, chunk) in chunks.iter().enumerate() {
        let _ = writeln!(
            prompt,
            "{}. [{}]\n{}",
            i + 1,
            annotate(chunk),
            chunk.text.trim()
        );
    }

    let _ = write!(
        prompt,
        "\nQuestion: {}\n\n\
         Structure your answer as a business report with:\n\
         - Executive summary\n\
         - Key findings, quantified where the excerpts allow\n\
         - Breakdown by product and market\n\
         - Recommended actions\n\
         - Data limitations\n\n\
         {}\n",
        question, ANALYSIS_MARKER
    );

    prompt
}

fn annotate(chunk: &RetrievedChunk) -> String {
    let meta = &chunk.metadata;
    let mut parts = vec![format!("complaint {}", meta.complaint_id)];
    if let Some(product) = &meta.product {
        parts.push(format!("product: {}", product));
    }
    if let Some(market) = &meta.market {
        parts.push(format!("market: {}", market));
    }
    if let Some(date) = &meta.date {
        parts.push(format!("date: {}", date));
    }
    parts.join(" | ")
}

/// Strip the echoed prompt, collapse runs of blank lines, and normalize
/// bullet prefixes for consistent rendering.
#[inline]
pub fn postprocess(raw: &str) -> String {
    let body = raw
        .rfind(ANALYSIS_MARKER)
        .and_then(|at| raw.get(at + ANALYSIS_MARKER.len()..))
        .unwrap_or(raw);

    let mut lines = Vec::new();
    let mut previous_blank = false;

    for line in body.lines() {
        let trimmed = line.trim_end();
        let blank = trimmed.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        previous_blank = blank;
        lines.push(normalize_bullet(trimmed));
    }

    lines.join("\n").trim().to_string()
}

fn normalize_bullet(line: &str) -> String {
    let stripped = line.trim_start();
    let indent_len = line.len() - stripped.len();
    let indent = line.get(..indent_len).unwrap_or_default();

    for prefix in ["* ", "• ", "– ", "— "] {
        if let Some(rest) = stripped.strip_prefix(prefix) {
            return format!("{}- {}", indent, rest);
        }
    }

    line.to_string()
}
