use std::future::Future;
use tracing::{info, warn};

use crate::error::{PipelineError, ProviderError};
use crate::providers::{ModelGateway, extract_translation, translation_body};

/// Output of the first candidate that succeeded.
#[derive(Debug)]
pub struct Fallback<T> {
    pub result: T,
    pub model_used: String,
    /// Failures of the candidates tried before `model_used`, in order.
    pub failures: Vec<ProviderError>,
}

/// Try `candidates` strictly in order and return the first success. Failures
/// are logged and skipped; if every candidate fails the last error is kept.
pub async fn invoke_with_fallback<T, F, Fut>(
    candidates: &[String],
    mut attempt: F,
) -> Result<Fallback<T>, PipelineError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    if candidates.is_empty() {
        return Err(PipelineError::Validation(
            "no candidate models configured".to_string(),
        ));
    }

    let mut failures: Vec<ProviderError> = Vec::new();
    for model in candidates {
        match attempt(model.clone()).await {
            Ok(result) => {
                if !failures.is_empty() {
                    info!(
                        "fallback: {} succeeded after {} failed candidate(s)",
                        model,
                        failures.len()
                    );
                }
                return Ok(Fallback {
                    result,
                    model_used: model.clone(),
                    failures,
                });
            }
            Err(err) => {
                warn!("fallback: model {} failed: {}", model, err);
                failures.push(err);
            }
        }
    }

    let attempts = failures.len();
    match failures.pop() {
        Some(last) => Err(PipelineError::AllModelsExhausted { attempts, last }),
        None => Err(PipelineError::Validation(
            "no candidate models configured".to_string(),
        )),
    }
}

pub async fn translate_with_fallback(
    gateway: &dyn ModelGateway,
    candidates: &[String],
    text: &str,
    source: &str,
    target: &str,
) -> Result<Fallback<String>, PipelineError> {
    let body = translation_body(text, source, target);
    let body = &body;
    invoke_with_fallback(candidates, |model| async move {
        let value = gateway.call_json(&model, body).await?;
        extract_translation(&value).ok_or_else(|| ProviderError::Decode {
            model,
            message: "no translation_text or generated_text in response".to_string(),
        })
    })
    .await
}

pub async fn binary_with_fallback(
    gateway: &dyn ModelGateway,
    candidates: &[String],
    payload: &[u8],
    content_type: Option<&str>,
) -> Result<Fallback<Vec<u8>>, PipelineError> {
    invoke_with_fallback(candidates, |model| async move {
        gateway.call_binary(&model, payload, content_type).await
    })
    .await
}
