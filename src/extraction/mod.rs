mod pdf;
mod speech;

pub use pdf::{ExtractFuture, PdfTextExtractor, Pdftotext, looks_like_pdf};
pub use speech::{parse_transcription, synthesize, transcribe};

pub const PDF_MIME: &str = "application/pdf";
pub const TEXT_MIME: &str = "text/plain";
pub const MP3_MIME: &str = "audio/mpeg";
pub const WAV_MIME: &str = "audio/wav";

/// Content type for an uploaded audio part: the declared type when it is an
/// audio type, else sniffed from the bytes, else `audio/mpeg`.
pub fn audio_content_type(declared: Option<&str>, bytes: &[u8]) -> String {
    if let Some(declared) = declared {
        let declared = declared.trim().to_lowercase();
        if declared.starts_with("audio/") {
            return declared;
        }
    }
    infer::get(bytes)
        .filter(|kind| kind.matcher_type() == infer::MatcherType::Audio)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| MP3_MIME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_audio_type_wins() {
        assert_eq!(audio_content_type(Some("audio/ogg"), b""), "audio/ogg");
    }

    #[test]
    fn wav_is_sniffed_when_undeclared() {
        let mut wav = b"RIFF".to_vec();
        wav.extend_from_slice(&[0x24, 0, 0, 0]);
        wav.extend_from_slice(b"WAVEfmt ");
        assert_eq!(
            audio_content_type(Some("application/octet-stream"), &wav),
            "audio/x-wav"
        );
    }

    #[test]
    fn unknown_bytes_default_to_mpeg() {
        assert_eq!(audio_content_type(None, b"???"), MP3_MIME);
    }
}
