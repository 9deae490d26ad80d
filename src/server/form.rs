use axum::extract::Multipart;
use std::collections::HashMap;

use super::error::ServerError;
use super::models::split_model_ids;

#[derive(Debug, Clone)]
pub(crate) struct UploadedFile {
    pub(crate) bytes: Vec<u8>,
    pub(crate) content_type: Option<String>,
}

/// Canonical view of every multipart route's fields. Alternate field names
/// are resolved here and nowhere else.
#[derive(Debug, Default)]
pub(crate) struct PortalForm {
    pub(crate) content_type: Option<String>,
    pub(crate) text: Option<String>,
    pub(crate) source_lang: Option<String>,
    pub(crate) target_lang: Option<String>,
    pub(crate) model_ids: Vec<String>,
    pub(crate) return_audio: bool,
    pub(crate) audio: Option<UploadedFile>,
    pub(crate) pdf: Option<UploadedFile>,
}

const SOURCE_KEYS: &[&str] = &["sourceLang", "srcLang", "source"];
const TARGET_KEYS: &[&str] = &["targetLang", "tgtLang", "target"];
const MODEL_KEYS: &[&str] = &["modelIds", "modelId", "modelID"];

impl PortalForm {
    pub(crate) async fn read(mut multipart: Multipart) -> Result<Self, ServerError> {
        let mut parts: HashMap<String, UploadedFile> = HashMap::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| ServerError::bad_request(format!("invalid form data: {}", err)))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|err| ServerError::bad_request(format!("invalid form field {}: {}", name, err)))?;
            parts.insert(
                name,
                UploadedFile {
                    bytes: bytes.to_vec(),
                    content_type,
                },
            );
        }
        Ok(Self::from_parts(parts))
    }

    pub(crate) fn from_parts(mut parts: HashMap<String, UploadedFile>) -> Self {
        let text_of = |parts: &HashMap<String, UploadedFile>, keys: &[&str]| {
            keys.iter()
                .filter_map(|key| parts.get(*key))
                .map(|part| String::from_utf8_lossy(&part.bytes).trim().to_string())
                .find(|value| !value.is_empty())
        };

        let model_ids = MODEL_KEYS
            .iter()
            .filter_map(|key| parts.get(*key))
            .flat_map(|part| split_model_ids(&String::from_utf8_lossy(&part.bytes)))
            .fold(Vec::<String>::new(), |mut acc, model| {
                if !acc.contains(&model) {
                    acc.push(model);
                }
                acc
            });

        Self {
            content_type: text_of(&parts, &["contentType"]),
            text: parts
                .get("text")
                .map(|part| String::from_utf8_lossy(&part.bytes).to_string())
                .filter(|value| !value.trim().is_empty()),
            source_lang: text_of(&parts, SOURCE_KEYS),
            target_lang: text_of(&parts, TARGET_KEYS),
            model_ids,
            return_audio: text_of(&parts, &["returnAudio"])
                .map(|value| value.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            audio: parts.remove("audio").filter(|part| !part.bytes.is_empty()),
            pdf: parts
                .remove("pdf")
                .or_else(|| parts.remove("file"))
                .filter(|part| !part.bytes.is_empty()),
        }
    }
}
