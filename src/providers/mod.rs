use serde_json::{Value, json};
use std::future::Future;
use std::pin::Pin;

use crate::error::ProviderError;

mod huggingface;

pub use huggingface::HuggingFace;

pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ProviderError>> + Send + 'a>>;

/// One request/response exchange with a named inference model. Implementations
/// never retry.
pub trait ModelGateway: Send + Sync {
    fn call_json<'a>(&'a self, model: &'a str, body: &'a Value) -> GatewayFuture<'a, Value>;

    fn call_binary<'a>(
        &'a self,
        model: &'a str,
        payload: &'a [u8],
        content_type: Option<&'a str>,
    ) -> GatewayFuture<'a, Vec<u8>>;
}

pub fn translation_body(text: &str, source: &str, target: &str) -> Value {
    json!({
        "inputs": text,
        "parameters": { "src_lang": source, "tgt_lang": target },
        "options": { "wait_for_model": true }
    })
}

/// Pull the translated text out of a response that may be an object or a
/// one-element array, keyed `translation_text` or `generated_text`.
pub fn extract_translation(value: &Value) -> Option<String> {
    let item = match value {
        Value::Array(items) => items.first()?,
        other => other,
    };
    ["translation_text", "generated_text"]
        .iter()
        .filter_map(|key| item.get(*key).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_body_carries_language_pair() {
        let body = translation_body("Hello", "en", "hi");
        assert_eq!(body["inputs"], "Hello");
        assert_eq!(body["parameters"]["src_lang"], "en");
        assert_eq!(body["parameters"]["tgt_lang"], "hi");
        assert_eq!(body["options"]["wait_for_model"], true);
    }

    #[test]
    fn extracts_from_array_or_object() {
        let array = json!([{ "translation_text": "नमस्ते" }]);
        assert_eq!(extract_translation(&array).as_deref(), Some("नमस्ते"));

        let object = json!({ "generated_text": "bonjour" });
        assert_eq!(extract_translation(&object).as_deref(), Some("bonjour"));

        let both = json!({ "translation_text": "", "generated_text": "hola" });
        assert_eq!(extract_translation(&both).as_deref(), Some("hola"));
    }

    #[test]
    fn missing_text_is_none() {
        assert_eq!(extract_translation(&json!([])), None);
        assert_eq!(extract_translation(&json!({ "error": "loading" })), None);
        assert_eq!(extract_translation(&json!("plain")), None);
    }
}
