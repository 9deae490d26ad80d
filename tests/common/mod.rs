#![allow(dead_code)]

use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use translate_portal::extraction::{ExtractFuture, PdfTextExtractor};
use translate_portal::settings::{ModelDefaults, Settings};
use translate_portal::{
    Coordinator, ExtractError, GatewayFuture, ModelGateway, ProviderError, TranslationLog,
};

/// What a scripted model does when called.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Wraps the `inputs` field as `<inputs>`.
    Translate,
    Json(Value),
    Bytes(Vec<u8>),
    Fail(u16),
    Hang,
}

#[derive(Default)]
pub struct ScriptedGateway {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, model: &str, reply: Reply) -> Self {
        self.replies.insert(model.to_string(), reply);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn reply(&self, model: &str) -> Reply {
        self.calls.lock().expect("calls lock").push(model.to_string());
        self.replies.get(model).cloned().unwrap_or(Reply::Fail(404))
    }
}

fn failure(model: &str, status: u16) -> ProviderError {
    ProviderError::Status {
        model: model.to_string(),
        status,
        body: "model unavailable".to_string(),
    }
}

impl ModelGateway for ScriptedGateway {
    fn call_json<'a>(&'a self, model: &'a str, body: &'a Value) -> GatewayFuture<'a, Value> {
        Box::pin(async move {
            match self.reply(model) {
                Reply::Translate => {
                    let inputs = body["inputs"].as_str().unwrap_or_default();
                    Ok(json!([{ "translation_text": format!("<{}>", inputs) }]))
                }
                Reply::Json(value) => Ok(value),
                Reply::Bytes(bytes) => Ok(Value::String(String::from_utf8_lossy(&bytes).to_string())),
                Reply::Fail(status) => Err(failure(model, status)),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(failure(model, 504))
                }
            }
        })
    }

    fn call_binary<'a>(
        &'a self,
        model: &'a str,
        payload: &'a [u8],
        _content_type: Option<&'a str>,
    ) -> GatewayFuture<'a, Vec<u8>> {
        Box::pin(async move {
            match self.reply(model) {
                Reply::Translate => Ok(payload.to_vec()),
                Reply::Json(value) => Ok(value.to_string().into_bytes()),
                Reply::Bytes(bytes) => Ok(bytes),
                Reply::Fail(status) => Err(failure(model, status)),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(failure(model, 504))
                }
            }
        })
    }
}

/// PDF extractor that returns fixed text or a fixed error.
pub struct StaticPdf(pub Result<String, ExtractError>);

impl PdfTextExtractor for StaticPdf {
    fn extract<'a>(&'a self, _pdf: &'a [u8]) -> ExtractFuture<'a> {
        Box::pin(async move { self.0.clone() })
    }
}

pub fn settings(max_chars: usize) -> Settings {
    Settings {
        max_chars_per_request: max_chars,
        models: ModelDefaults {
            translation: vec!["t-a".into(), "t-b".into(), "t-c".into()],
            speech_to_text: vec!["s-a".into(), "s-b".into()],
            text_to_speech: vec!["v-a".into()],
        },
        ..Settings::default()
    }
}

pub fn coordinator(
    gateway: Arc<ScriptedGateway>,
    pdf: StaticPdf,
    log: TranslationLog,
    max_chars: usize,
) -> Coordinator {
    Coordinator::new(gateway, Arc::new(pdf), log, Arc::new(settings(max_chars)))
}

pub fn no_pdf() -> StaticPdf {
    StaticPdf(Err(ExtractError::Unreadable("no pdf expected".to_string())))
}

/// Minimal RIFF/WAVE header followed by a few silent samples.
pub fn wav_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&16000u32.to_le_bytes());
    bytes.extend_from_slice(&32000u32.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&4u32.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes
}
