use serde_json::Value;
use tracing::info;

use crate::error::{PipelineError, ProviderError};
use crate::fallback::{Fallback, binary_with_fallback, invoke_with_fallback};
use crate::providers::ModelGateway;

/// Speech-to-text models answer with `{ "text": ... }` or a bare string body.
pub fn parse_transcription(model: &str, body: &[u8]) -> Result<String, ProviderError> {
    let raw = String::from_utf8_lossy(body).to_string();
    match serde_json::from_str::<Value>(&raw) {
        Ok(value) => transcription_text(&value).ok_or_else(|| ProviderError::Decode {
            model: model.to_string(),
            message: format!("no text in transcription response: {}", raw),
        }),
        Err(_) => Ok(raw),
    }
}

fn transcription_text(value: &Value) -> Option<String> {
    let item = match value {
        Value::Array(items) => items.first()?,
        other => other,
    };
    match item {
        Value::String(text) => Some(text.clone()),
        other => other.get("text").and_then(Value::as_str).map(str::to_string),
    }
}

pub async fn transcribe(
    gateway: &dyn ModelGateway,
    candidates: &[String],
    audio: &[u8],
    content_type: &str,
) -> Result<Fallback<String>, PipelineError> {
    let outcome = invoke_with_fallback(candidates, |model| async move {
        let body = gateway
            .call_binary(&model, audio, Some(content_type))
            .await?;
        parse_transcription(&model, &body)
    })
    .await?;
    info!(
        "speech: transcribed {} chars with {}",
        outcome.result.chars().count(),
        outcome.model_used
    );
    Ok(outcome)
}

pub async fn synthesize(
    gateway: &dyn ModelGateway,
    candidates: &[String],
    text: &str,
) -> Result<Fallback<Vec<u8>>, PipelineError> {
    binary_with_fallback(gateway, candidates, text.as_bytes(), None).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_text_field_is_used() {
        let text = parse_transcription("m", br#"{"text":" hello there "}"#).expect("text");
        assert_eq!(text, " hello there ");
    }

    #[test]
    fn array_and_string_shapes_are_accepted() {
        assert_eq!(
            parse_transcription("m", br#"[{"text":"hi"}]"#).expect("array"),
            "hi"
        );
        assert_eq!(parse_transcription("m", br#""hi""#).expect("string"), "hi");
    }

    #[test]
    fn raw_body_is_used_when_not_json() {
        let text = parse_transcription("m", b"just words").expect("raw");
        assert_eq!(text, "just words");
    }

    #[test]
    fn json_without_text_is_a_decode_failure() {
        let err = parse_transcription("m", br#"{"error":"loading"}"#).expect_err("decode");
        assert!(matches!(err, ProviderError::Decode { .. }));
    }
}
