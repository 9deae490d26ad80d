use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_MAX_CHARS: usize = 5000;

#[derive(Debug, Clone)]
pub struct Settings {
    pub addr: String,
    pub base_url: String,
    pub token: Option<String>,
    pub max_chars_per_request: usize,
    pub log_excerpt_chars: usize,
    pub max_upload_bytes: usize,
    pub timeouts: Timeouts,
    pub default_source: String,
    pub default_target: String,
    pub models: ModelDefaults,
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Timeouts {
    pub text: Duration,
    pub speech: Duration,
    pub pdf: Duration,
    pub unified: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct ModelDefaults {
    pub translation: Vec<String>,
    pub speech_to_text: Vec<String>,
    pub text_to_speech: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8787".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            max_chars_per_request: DEFAULT_MAX_CHARS,
            log_excerpt_chars: 1000,
            max_upload_bytes: 25 * 1024 * 1024,
            timeouts: Timeouts {
                text: Duration::from_secs(60),
                speech: Duration::from_secs(60),
                pdf: Duration::from_secs(300),
                unified: Duration::from_secs(300),
            },
            default_source: "en".to_string(),
            default_target: "hi".to_string(),
            models: ModelDefaults::default(),
            db_path: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    server: Option<ServerSection>,
    provider: Option<ProviderSection>,
    limits: Option<LimitsSection>,
    timeouts: Option<TimeoutsSection>,
    languages: Option<LanguagesSection>,
    models: Option<ModelsSection>,
    history: Option<HistorySection>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSection {
    addr: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderSection {
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LimitsSection {
    max_chars_per_request: Option<usize>,
    log_excerpt_chars: Option<usize>,
    max_upload_mb: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct TimeoutsSection {
    text_secs: Option<u64>,
    speech_secs: Option<u64>,
    pdf_secs: Option<u64>,
    unified_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LanguagesSection {
    default_source: Option<String>,
    default_target: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ModelsSection {
    translation: Option<Vec<String>>,
    speech_to_text: Option<Vec<String>>,
    text_to_speech: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct HistorySection {
    db_path: Option<String>,
}

/// Embedded defaults, then `settings.toml` / `settings.local.toml` in the
/// working directory, then `extra_path`, then environment overrides.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    settings
        .merge_str(DEFAULT_SETTINGS_TOML)
        .with_context(|| "failed to parse embedded settings")?;

    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            settings
                .merge_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
        }
    }

    settings.apply_env(|key| std::env::var(key).ok())?;
    settings.validate()?;
    Ok(settings)
}

impl Settings {
    pub fn merge_str(&mut self, content: &str) -> Result<()> {
        let parsed: SettingsFile = toml::from_str(content)?;
        self.merge(parsed);
        Ok(())
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(addr) = incoming.server.and_then(|server| server.addr) {
            if !addr.trim().is_empty() {
                self.addr = addr;
            }
        }
        if let Some(base_url) = incoming.provider.and_then(|provider| provider.base_url) {
            if !base_url.trim().is_empty() {
                self.base_url = base_url.trim_end_matches('/').to_string();
            }
        }
        if let Some(limits) = incoming.limits {
            if let Some(max) = limits.max_chars_per_request {
                self.max_chars_per_request = max;
            }
            if let Some(excerpt) = limits.log_excerpt_chars {
                self.log_excerpt_chars = excerpt;
            }
            if let Some(mb) = limits.max_upload_mb {
                if mb > 0 {
                    self.max_upload_bytes = mb * 1024 * 1024;
                }
            }
        }
        if let Some(timeouts) = incoming.timeouts {
            merge_secs(&mut self.timeouts.text, timeouts.text_secs);
            merge_secs(&mut self.timeouts.speech, timeouts.speech_secs);
            merge_secs(&mut self.timeouts.pdf, timeouts.pdf_secs);
            merge_secs(&mut self.timeouts.unified, timeouts.unified_secs);
        }
        if let Some(languages) = incoming.languages {
            if let Some(code) = languages.default_source {
                if !code.trim().is_empty() {
                    self.default_source = code.trim().to_lowercase();
                }
            }
            if let Some(code) = languages.default_target {
                if !code.trim().is_empty() {
                    self.default_target = code.trim().to_lowercase();
                }
            }
        }
        if let Some(models) = incoming.models {
            merge_models(&mut self.models.translation, models.translation);
            merge_models(&mut self.models.speech_to_text, models.speech_to_text);
            merge_models(&mut self.models.text_to_speech, models.text_to_speech);
        }
        if let Some(path) = incoming.history.and_then(|history| history.db_path) {
            let path = path.trim();
            self.db_path = if path.is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(token) = get("HF_TOKEN") {
            self.token = Some(token.trim().to_string());
        }
        if let Some(base_url) = get("HF_BASE_URL") {
            self.base_url = base_url.trim().trim_end_matches('/').to_string();
        }
        if let Some(raw) = get("MAX_CHARS_PER_REQ") {
            self.max_chars_per_request = raw
                .trim()
                .parse()
                .with_context(|| format!("MAX_CHARS_PER_REQ is not a number: {}", raw))?;
        }
        if let Some(path) = get("TRANSLATION_DB_PATH") {
            self.db_path = Some(PathBuf::from(path.trim()));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_chars_per_request == 0 {
            return Err(anyhow!("max characters per request must be greater than zero"));
        }
        if self.models.translation.is_empty() {
            return Err(anyhow!("no default translation models configured"));
        }
        if self.models.speech_to_text.is_empty() {
            return Err(anyhow!("no default speech-to-text models configured"));
        }
        if self.models.text_to_speech.is_empty() {
            return Err(anyhow!("no default text-to-speech models configured"));
        }
        Ok(())
    }
}

fn merge_secs(target: &mut Duration, secs: Option<u64>) {
    if let Some(secs) = secs {
        if secs > 0 {
            *target = Duration::from_secs(secs);
        }
    }
}

fn merge_models(target: &mut Vec<String>, incoming: Option<Vec<String>>) {
    let Some(models) = incoming else {
        return;
    };
    let models = models
        .into_iter()
        .map(|model| model.trim().to_string())
        .filter(|model| !model.is_empty())
        .collect::<Vec<_>>();
    if !models.is_empty() {
        *target = models;
    }
}
