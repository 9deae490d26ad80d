use crate::error::ChunkError;

pub const CHUNK_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub sequence_index: usize,
    pub payload: String,
}

/// Greedy fixed-size split on character count. Words and sentences may be cut.
pub fn split(text: &str, max_chars: usize) -> Result<Vec<Chunk>, ChunkError> {
    if max_chars == 0 {
        return Err(ChunkError::ZeroLimit);
    }
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut count = 0usize;
    for (offset, _) in text.char_indices() {
        if count == max_chars {
            chunks.push(Chunk {
                sequence_index: chunks.len(),
                payload: text[start..offset].to_string(),
            });
            start = offset;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(Chunk {
            sequence_index: chunks.len(),
            payload: text[start..].to_string(),
        });
    }
    Ok(chunks)
}

pub fn needs_chunking(text: &str, max_chars: usize) -> bool {
    text.chars().count() > max_chars
}

/// Reassemble per-chunk outputs in sequence order.
pub fn join(mut parts: Vec<(usize, String)>, separator: &str) -> String {
    parts.sort_by_key(|(index, _)| *index);
    parts
        .into_iter()
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concat(chunks: &[Chunk]) -> String {
        chunks.iter().map(|chunk| chunk.payload.as_str()).collect()
    }

    #[test]
    fn split_reconstructs_input_for_many_sizes() {
        let inputs = [
            "a",
            "hello world",
            "The quick brown fox jumps over the lazy dog.",
            "नमस्ते दुनिया, यह एक परीक्षण है",
            "日本語のテキストを分割します",
            "mixed ascii + émojis 🎉🎉 and more",
        ];
        for text in inputs {
            for n in 1..=12 {
                let chunks = split(text, n).expect("split");
                assert_eq!(concat(&chunks), text, "n = {}", n);
                let last = chunks.len() - 1;
                for (index, chunk) in chunks.iter().enumerate() {
                    assert_eq!(chunk.sequence_index, index);
                    let len = chunk.payload.chars().count();
                    if index == last {
                        assert!(len >= 1 && len <= n);
                    } else {
                        assert_eq!(len, n);
                    }
                }
            }
        }
    }

    #[test]
    fn split_slices_mid_word() {
        let chunks = split("abcdefgh", 3).expect("split");
        let payloads: Vec<&str> = chunks.iter().map(|chunk| chunk.payload.as_str()).collect();
        assert_eq!(payloads, vec!["abc", "def", "gh"]);
    }

    #[test]
    fn split_exact_multiple_has_no_empty_tail() {
        let chunks = split("abcdef", 3).expect("split");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].payload, "def");
    }

    #[test]
    fn split_empty_text_yields_nothing() {
        assert!(split("", 5).expect("split").is_empty());
    }

    #[test]
    fn zero_limit_fails_fast() {
        assert!(matches!(split("abc", 0), Err(ChunkError::ZeroLimit)));
    }

    #[test]
    fn join_restores_sequence_order() {
        let parts = vec![
            (2, "third".to_string()),
            (0, "first".to_string()),
            (1, "second".to_string()),
        ];
        assert_eq!(join(parts, CHUNK_SEPARATOR), "first\n\nsecond\n\nthird");
    }

    #[test]
    fn chunking_threshold_counts_characters() {
        assert!(!needs_chunking("ééé", 3));
        assert!(needs_chunking("éééé", 3));
    }
}
