use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::chunker::{self, CHUNK_SEPARATOR};
use crate::error::PipelineError;
use crate::extraction::{self, PdfTextExtractor};
use crate::fallback::{Fallback, translate_with_fallback};
use crate::history::{TranslationLog, TranslationRecord};
use crate::languages;
use crate::providers::ModelGateway;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Text,
    Pdf,
    Voice,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Text => "text",
            TaskKind::Pdf => "pdf",
            TaskKind::Voice => "voice",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" => Some(TaskKind::Text),
            "pdf" => Some(TaskKind::Pdf),
            "voice" => Some(TaskKind::Voice),
            _ => None,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Extracting,
    Detecting,
    Chunking,
    Translating,
    Reassembling,
    Persisting,
    Synthesizing,
    Done,
}

#[derive(Debug, Clone)]
pub enum TaskInput {
    Text(String),
    Pdf(Vec<u8>),
    Voice {
        audio: Vec<u8>,
        content_type: String,
        return_audio: bool,
    },
}

impl TaskInput {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskInput::Text(_) => TaskKind::Text,
            TaskInput::Pdf(_) => TaskKind::Pdf,
            TaskInput::Voice { .. } => TaskKind::Voice,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub input: TaskInput,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
    /// Caller-ranked models. For text and PDF these are translation models;
    /// for voice they rank the speech-to-text step.
    pub models: Vec<String>,
    /// Reject text over the per-request limit instead of chunking it.
    pub reject_over_limit: bool,
}

impl PipelineRequest {
    pub fn new(input: TaskInput) -> Self {
        Self {
            input,
            source_lang: None,
            target_lang: None,
            models: Vec::new(),
            reject_over_limit: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    pub model_used: String,
}

#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub kind: TaskKind,
    pub content: String,
    pub model_used: String,
    pub source_lang: String,
    pub target_lang: String,
    pub latency_ms: u64,
    pub transcription_model: Option<String>,
    pub audio: Option<SynthesizedAudio>,
}

struct Translation {
    text: String,
    model_used: String,
    latency_ms: u64,
}

/// Runs text, PDF and voice requests through extraction, language
/// resolution, chunked fallback translation and logging.
#[derive(Clone)]
pub struct Coordinator {
    gateway: Arc<dyn ModelGateway>,
    pdf: Arc<dyn PdfTextExtractor>,
    log: TranslationLog,
    settings: Arc<Settings>,
}

impl Coordinator {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        pdf: Arc<dyn PdfTextExtractor>,
        log: TranslationLog,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            gateway,
            pdf,
            log,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn run(
        &self,
        request: PipelineRequest,
        budget: Duration,
    ) -> Result<PipelineResult, PipelineError> {
        with_timeout(budget, self.execute(request)).await
    }

    pub async fn execute(&self, request: PipelineRequest) -> Result<PipelineResult, PipelineError> {
        let kind = request.input.kind();
        let PipelineRequest {
            input,
            source_lang,
            target_lang,
            models,
            reject_over_limit,
        } = request;

        enter(kind, Stage::Extracting);
        let (text, transcription_model, return_audio) = match input {
            TaskInput::Text(text) => {
                if text.trim().is_empty() {
                    return Err(PipelineError::Validation("Text is required".to_string()));
                }
                (text, None, false)
            }
            TaskInput::Pdf(bytes) => (self.extract_pdf(&bytes).await?, None, false),
            TaskInput::Voice {
                audio,
                content_type,
                return_audio,
            } => {
                let transcript = self
                    .transcribe_voice(&audio, &content_type, &models)
                    .await?;
                (transcript.result, Some(transcript.model_used), return_audio)
            }
        };

        let limit = self.settings.max_chars_per_request;
        if reject_over_limit && text.chars().count() > limit {
            return Err(PipelineError::TooLong { limit });
        }

        enter(kind, Stage::Detecting);
        let source = languages::resolve_source(
            source_lang.as_deref(),
            &text,
            &self.settings.default_source,
        );
        let target = languages::resolve_target(target_lang.as_deref(), &self.settings.default_target);

        let translation_models = match kind {
            TaskKind::Voice => self.settings.models.translation.clone(),
            TaskKind::Text | TaskKind::Pdf => {
                resolve_candidates(&models, &self.settings.models.translation)
            }
        };
        let translation = self
            .translate(kind, &text, &source, &target, &translation_models)
            .await?;

        enter(kind, Stage::Persisting);
        self.persist(TranslationRecord::summary(
            &source,
            &target,
            &text,
            &translation.text,
            &translation.model_used,
            translation.latency_ms,
            self.settings.log_excerpt_chars,
        ))
        .await;

        let audio = if return_audio {
            enter(kind, Stage::Synthesizing);
            self.synthesize_optional(&translation.text).await
        } else {
            None
        };

        enter(kind, Stage::Done);
        Ok(PipelineResult {
            kind,
            content: translation.text,
            model_used: translation.model_used,
            source_lang: source,
            target_lang: target,
            latency_ms: translation.latency_ms,
            transcription_model,
            audio,
        })
    }

    /// Standalone speech-to-text; returns the transcript as the model gave it.
    pub async fn speech_to_text(
        &self,
        audio: &[u8],
        content_type: &str,
        models: &[String],
    ) -> Result<Fallback<String>, PipelineError> {
        if audio.is_empty() {
            return Err(PipelineError::Validation("audio file missing".to_string()));
        }
        let candidates = resolve_candidates(models, &self.settings.models.speech_to_text);
        extraction::transcribe(self.gateway.as_ref(), &candidates, audio, content_type).await
    }

    pub async fn text_to_speech(
        &self,
        text: &str,
        models: &[String],
    ) -> Result<Fallback<Vec<u8>>, PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::Validation("Text is required".to_string()));
        }
        let candidates = resolve_candidates(models, &self.settings.models.text_to_speech);
        extraction::synthesize(self.gateway.as_ref(), &candidates, text).await
    }

    async fn extract_pdf(&self, bytes: &[u8]) -> Result<String, PipelineError> {
        if bytes.is_empty() {
            return Err(PipelineError::Validation("PDF file is required".to_string()));
        }
        let text = self.pdf.extract(bytes).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(PipelineError::ExtractionFailed(
                "No text found in PDF".to_string(),
            ));
        }
        Ok(text.to_string())
    }

    async fn transcribe_voice(
        &self,
        audio: &[u8],
        content_type: &str,
        models: &[String],
    ) -> Result<Fallback<String>, PipelineError> {
        if audio.is_empty() {
            return Err(PipelineError::Validation(
                "Audio file is required".to_string(),
            ));
        }
        let mut transcript = self.speech_to_text(audio, content_type, models).await?;
        let trimmed = transcript.result.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::NoSpeechDetected);
        }
        transcript.result = trimmed.to_string();
        Ok(transcript)
    }

    async fn translate(
        &self,
        kind: TaskKind,
        text: &str,
        source: &str,
        target: &str,
        candidates: &[String],
    ) -> Result<Translation, PipelineError> {
        let started = Instant::now();
        let limit = self.settings.max_chars_per_request;
        let gateway = self.gateway.as_ref();

        let (text, model_used) = if chunker::needs_chunking(text, limit) {
            enter(kind, Stage::Chunking);
            let chunks = chunker::split(text, limit)?;
            info!(
                "pipeline: {} split into {} chunks of <= {} chars",
                kind,
                chunks.len(),
                limit
            );
            enter(kind, Stage::Translating);
            let mut parts = Vec::with_capacity(chunks.len());
            let mut model_used = String::new();
            for chunk in chunks {
                let outcome =
                    translate_with_fallback(gateway, candidates, &chunk.payload, source, target)
                        .await?;
                parts.push((chunk.sequence_index, outcome.result));
                model_used = outcome.model_used;
            }
            enter(kind, Stage::Reassembling);
            (chunker::join(parts, CHUNK_SEPARATOR), model_used)
        } else {
            enter(kind, Stage::Translating);
            let outcome = translate_with_fallback(gateway, candidates, text, source, target).await?;
            (outcome.result, outcome.model_used)
        };

        Ok(Translation {
            text,
            model_used,
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }

    async fn persist(&self, record: TranslationRecord) {
        if let Err(err) = self.log.append(record).await {
            error!("pipeline: {} (continuing)", err);
        }
    }

    async fn synthesize_optional(&self, text: &str) -> Option<SynthesizedAudio> {
        let candidates = self.settings.models.text_to_speech.clone();
        match extraction::synthesize(self.gateway.as_ref(), &candidates, text).await {
            Ok(outcome) => Some(SynthesizedAudio {
                bytes: outcome.result,
                model_used: outcome.model_used,
            }),
            Err(err) => {
                warn!("pipeline: speech synthesis failed, returning text: {}", err);
                None
            }
        }
    }
}

fn enter(kind: TaskKind, stage: Stage) {
    info!("pipeline: {} -> {:?}", kind, stage);
}

/// Caller-supplied models when any are given, otherwise the defaults.
pub fn resolve_candidates(requested: &[String], defaults: &[String]) -> Vec<String> {
    let requested: Vec<String> = requested
        .iter()
        .map(|model| model.trim().to_string())
        .filter(|model| !model.is_empty())
        .collect();
    if requested.is_empty() {
        defaults.to_vec()
    } else {
        requested
    }
}

pub async fn with_timeout<T, Fut>(budget: Duration, work: Fut) -> Result<T, PipelineError>
where
    Fut: Future<Output = Result<T, PipelineError>>,
{
    match tokio::time::timeout(budget, work).await {
        Ok(result) => result,
        Err(_) => {
            warn!("pipeline: request exceeded {}s budget", budget.as_secs());
            Err(PipelineError::Timeout(budget.as_secs()))
        }
    }
}
