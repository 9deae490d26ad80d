use whatlang::detect;

/// Below this many characters the detector's guess is noise.
pub const MIN_DETECT_CHARS: usize = 10;

pub const SUPPORTED: &[&str] = &[
    "en", "hi", "bn", "ta", "te", "mr", "gu", "kn", "ml", "pa", "ur", "fr", "de", "es", "it",
    "pt", "ru", "zh", "ja", "ko", "ar", "tr", "vi", "id", "th", "nl", "pl", "uk", "cs", "hu",
    "ro", "bg", "hr", "sr", "sk", "sl", "et", "lv", "lt", "fi", "da", "sv", "no", "is",
];

const ISO3_TO_ISO1: &[(&str, &str)] = &[
    ("eng", "en"),
    ("spa", "es"),
    ("fra", "fr"),
    ("deu", "de"),
    ("ita", "it"),
    ("por", "pt"),
    ("rus", "ru"),
    ("zho", "zh"),
    ("cmn", "zh"),
    ("jpn", "ja"),
    ("kor", "ko"),
    ("ara", "ar"),
    ("hin", "hi"),
    ("ben", "bn"),
    ("tam", "ta"),
    ("tel", "te"),
    ("mar", "mr"),
    ("guj", "gu"),
    ("kan", "kn"),
    ("mal", "ml"),
    ("pan", "pa"),
    ("urd", "ur"),
    ("tur", "tr"),
    ("vie", "vi"),
    ("ind", "id"),
    ("tha", "th"),
    ("nld", "nl"),
    ("pol", "pl"),
    ("ukr", "uk"),
    ("ces", "cs"),
    ("hun", "hu"),
    ("ron", "ro"),
    ("bul", "bg"),
    ("hrv", "hr"),
    ("srp", "sr"),
    ("slk", "sk"),
    ("slv", "sl"),
    ("est", "et"),
    ("lav", "lv"),
    ("lit", "lt"),
    ("fin", "fi"),
    ("dan", "da"),
    ("swe", "sv"),
    ("nor", "no"),
    ("nob", "no"),
    ("isl", "is"),
];

/// Guess the 2-letter code of `text`; `None` when too short, undetermined
/// or unmapped.
pub fn detect_iso1(text: &str) -> Option<&'static str> {
    if text.trim().chars().count() < MIN_DETECT_CHARS {
        return None;
    }
    let info = detect(text)?;
    iso3_to_iso1(info.lang().code())
}

pub fn iso3_to_iso1(code: &str) -> Option<&'static str> {
    let code = code.trim().to_lowercase();
    ISO3_TO_ISO1
        .iter()
        .find(|(iso3, _)| *iso3 == code)
        .map(|(_, iso1)| *iso1)
}

pub fn is_supported(code: &str) -> bool {
    SUPPORTED.contains(&code)
}

/// `code` if it is a supported 2-letter code, otherwise `fallback`.
pub fn normalize<'a>(code: Option<&'a str>, fallback: &'a str) -> &'a str {
    match code {
        Some(code) if is_supported(code) => code,
        _ => fallback,
    }
}

/// Resolve a caller-supplied source language. Blank and `auto` fall through
/// to detection, then to `fallback`.
pub fn resolve_source(explicit: Option<&str>, text: &str, fallback: &str) -> String {
    let explicit = explicit
        .map(str::trim)
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("auto"));
    let candidate = match explicit {
        Some(code) => Some(code.to_lowercase()),
        None => detect_iso1(text).map(str::to_string),
    };
    normalize(candidate.as_deref(), fallback).to_string()
}

pub fn resolve_target(explicit: Option<&str>, fallback: &str) -> String {
    let explicit = explicit
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase);
    normalize(explicit.as_deref(), fallback).to_string()
}
