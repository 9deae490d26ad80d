use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct TranslateRequest {
    pub(crate) text: Option<String>,
    #[serde(alias = "srcLang", alias = "sourceLang", alias = "source_lang")]
    pub(crate) source: Option<String>,
    #[serde(alias = "tgtLang", alias = "targetLang", alias = "target_lang")]
    pub(crate) target: Option<String>,
    #[serde(alias = "modelID", alias = "model_id", alias = "model")]
    pub(crate) model_id: Option<String>,
    #[serde(alias = "model_ids", deserialize_with = "model_list")]
    pub(crate) model_ids: Vec<String>,
}

impl TranslateRequest {
    pub(crate) fn candidates(&self) -> Vec<String> {
        merge_candidates(self.model_id.as_deref(), &self.model_ids)
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct SpeechRequest {
    pub(crate) text: Option<String>,
    #[serde(alias = "modelID", alias = "model_id", alias = "model")]
    pub(crate) model_id: Option<String>,
    #[serde(alias = "model_ids", deserialize_with = "model_list")]
    pub(crate) model_ids: Vec<String>,
}

impl SpeechRequest {
    pub(crate) fn candidates(&self) -> Vec<String> {
        merge_candidates(self.model_id.as_deref(), &self.model_ids)
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct LangDetectRequest {
    pub(crate) text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TranslateResponse {
    pub(crate) translated_text: String,
    pub(crate) source_language: String,
    pub(crate) target_language: String,
    pub(crate) model_used: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) content_type: Option<String>,
    pub(crate) latency: u64,
    pub(crate) success: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TranscriptionResponse {
    pub(crate) text: String,
    pub(crate) model_used: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LangDetectResponse {
    pub(crate) iso1: String,
    pub(crate) raw: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
    pub(crate) success: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModelList {
    Many(Vec<String>),
    Csv(String),
}

fn model_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<ModelList>::deserialize(deserializer)? {
        Some(ModelList::Many(items)) => clean_models(items),
        Some(ModelList::Csv(raw)) => split_model_ids(&raw),
        None => Vec::new(),
    })
}

/// `a, b,,c` -> `["a", "b", "c"]`
pub(crate) fn split_model_ids(raw: &str) -> Vec<String> {
    clean_models(raw.split(',').map(str::to_string).collect())
}

fn clean_models(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// A single explicit model goes first, followed by the ranked list.
pub(crate) fn merge_candidates(single: Option<&str>, many: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let single = single.map(str::trim).filter(|model| !model.is_empty());
    for model in single.into_iter().chain(many.iter().map(String::as_str)) {
        if !out.iter().any(|existing| existing == model) {
            out.push(model.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternate_field_names_fold_into_one_schema() {
        let a: TranslateRequest = serde_json::from_str(
            r#"{"text":"hi","srcLang":"en","tgtLang":"fr","modelId":"m1"}"#,
        )
        .expect("a");
        let b: TranslateRequest = serde_json::from_str(
            r#"{"text":"hi","source":"en","target":"fr","modelID":"m1"}"#,
        )
        .expect("b");
        for request in [a, b] {
            assert_eq!(request.source.as_deref(), Some("en"));
            assert_eq!(request.target.as_deref(), Some("fr"));
            assert_eq!(request.candidates(), vec!["m1"]);
        }
    }

    #[test]
    fn model_ids_accept_array_or_csv() {
        let array: TranslateRequest =
            serde_json::from_str(r#"{"modelIds":["a"," b ",""]}"#).expect("array");
        assert_eq!(array.model_ids, vec!["a", "b"]);
        let csv: TranslateRequest =
            serde_json::from_str(r#"{"modelIds":"a, b,,c"}"#).expect("csv");
        assert_eq!(csv.model_ids, vec!["a", "b", "c"]);
        let null: TranslateRequest = serde_json::from_str(r#"{"modelIds":null}"#).expect("null");
        assert!(null.model_ids.is_empty());
    }

    #[test]
    fn single_model_is_ranked_first_without_duplicates() {
        let merged = merge_candidates(Some("b"), &["a".to_string(), "b".to_string()]);
        assert_eq!(merged, vec!["b", "a"]);
        assert!(merge_candidates(Some("  "), &[]).is_empty());
    }

    #[test]
    fn response_uses_camel_case_fields() {
        let response = TranslateResponse {
            translated_text: "नमस्ते".to_string(),
            source_language: "en".to_string(),
            target_language: "hi".to_string(),
            model_used: "facebook/m2m100_418M".to_string(),
            content_type: None,
            latency: 12,
            success: true,
        };
        insta::assert_json_snapshot!(response, @r###"
        {
          "translatedText": "नमस्ते",
          "sourceLanguage": "en",
          "targetLanguage": "hi",
          "modelUsed": "facebook/m2m100_418M",
          "latency": 12,
          "success": true
        }
        "###);
    }
}
