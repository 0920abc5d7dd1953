//! Best-effort text extraction from uploaded bytes
//!
//! Extraction never fails: an empty string is the signal for
//! unreadable/unsupported input, and the pipeline turns that into the
//! document's error status.

use regex::bytes::Regex;

/// Minimum readable characters for an embedded binary section to count
const MIN_SECTION_CHARS: usize = 10;

/// Converts raw bytes plus a declared media type into bounded plain text.
pub struct TextExtractor {
    /// Input bytes considered; anything beyond is ignored
    max_input_bytes: usize,
    /// Hard cap on output length in characters
    max_output_chars: usize,
    /// Matches embedded data sections in PDF-like binary formats
    section_re: Regex,
}

impl TextExtractor {
    pub fn new(max_input_bytes: usize, max_output_chars: usize) -> Self {
        let section_re = Regex::new(r"(?s)stream[\r\n]+(.*?)[\r\n]+endstream")
            .expect("invalid section pattern");
        Self {
            max_input_bytes,
            max_output_chars,
            section_re,
        }
    }

    /// Extract plain text from `bytes` according to the declared media type.
    ///
    /// Output is always at most `max_output_chars` characters; any total
    /// failure yields an empty string rather than an error.
    pub fn extract(&self, bytes: &[u8], media_type: &str) -> String {
        let input = &bytes[..bytes.len().min(self.max_input_bytes)];

        let text = match media_type {
            "text/plain" | "text/markdown" => String::from_utf8_lossy(input).into_owned(),
            "application/pdf" => self.extract_from_binary(input),
            t if t == "text/csv" || t.contains("csv") => {
                String::from_utf8_lossy(input).into_owned()
            }
            // Unknown types only pass if they actually decode as UTF-8;
            // binary garbage must come back empty so the caller can flag it.
            _ => match std::str::from_utf8(input) {
                Ok(s) => s.to_string(),
                Err(_) => String::new(),
            },
        };

        self.truncate_chars(text.trim().to_string())
    }

    /// Degraded extraction for PDF-like binary formats.
    ///
    /// No structural parsing: readable ASCII is pulled out of embedded data
    /// sections, falling back to a whole-buffer scan. Fidelity is
    /// intentionally sacrificed for robustness against arbitrary input.
    fn extract_from_binary(&self, input: &[u8]) -> String {
        let mut parts: Vec<String> = Vec::new();

        for cap in self.section_re.captures_iter(input) {
            if let Some(section) = cap.get(1) {
                let readable = printable_ascii(section.as_bytes());
                let readable = readable.trim();
                if readable.len() > MIN_SECTION_CHARS {
                    parts.push(readable.to_string());
                }
            }
        }

        if parts.is_empty() {
            // Whole-buffer scan with whitespace runs collapsed
            let readable = printable_ascii(input);
            return readable.split_whitespace().collect::<Vec<_>>().join(" ");
        }

        parts.join("\n\n")
    }

    /// Truncate to the output cap on a character boundary
    fn truncate_chars(&self, mut text: String) -> String {
        if let Some((idx, _)) = text.char_indices().nth(self.max_output_chars) {
            text.truncate(idx);
        }
        text
    }
}

/// Replace every byte outside printable ASCII (0x20-0x7E) and line breaks
/// with a space.
fn printable_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0x20..=0x7E => b as char,
            b'\r' | b'\n' => b as char,
            _ => ' ',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> TextExtractor {
        TextExtractor::new(500 * 1024, 50_000)
    }

    /// Small deterministic PRNG so fuzz-style tests stay reproducible
    struct XorShift(u32);

    impl XorShift {
        fn next(&mut self) -> u32 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            self.0 = x;
            x
        }

        fn fill(&mut self, buf: &mut [u8]) {
            for b in buf.iter_mut() {
                *b = (self.next() & 0xFF) as u8;
            }
        }
    }

    #[test]
    fn test_plain_text_passthrough() {
        let text = extractor().extract(b"hello world", "text/plain");
        assert_eq!(text, "hello world");
    }

    #[test]
    fn test_plain_text_lossy_decode() {
        let bytes = b"caf\xFF latte";
        let text = extractor().extract(bytes, "text/plain");
        assert!(text.starts_with("caf"));
        assert!(text.ends_with("latte"));
    }

    #[test]
    fn test_csv_variants_decoded() {
        assert_eq!(extractor().extract(b"a,b,c", "text/csv"), "a,b,c");
        assert_eq!(
            extractor().extract(b"a,b,c", "application/vnd.ms-excel-csv"),
            "a,b,c"
        );
    }

    #[test]
    fn test_unknown_type_valid_utf8() {
        let text = extractor().extract(b"some notes", "application/x-unknown");
        assert_eq!(text, "some notes");
    }

    #[test]
    fn test_unknown_type_binary_garbage_is_empty() {
        let bytes: Vec<u8> = vec![0xFE, 0xFF, 0x00, 0x01, 0x80, 0x90];
        let text = extractor().extract(&bytes, "application/octet-stream");
        assert!(text.is_empty());
    }

    #[test]
    fn test_pdf_section_extraction() {
        let bytes = b"%PDF-1.4\nstream\nQuarterly revenue grew twelve percent\nendstream\ntrailer";
        let text = extractor().extract(bytes, "application/pdf");
        assert!(text.contains("Quarterly revenue grew twelve percent"));
    }

    #[test]
    fn test_pdf_section_with_binary_noise() {
        let mut bytes = b"stream\n".to_vec();
        bytes.extend_from_slice(b"Total: \x00\x01 1,204 units shipped");
        bytes.extend_from_slice(b"\nendstream");
        let text = extractor().extract(&bytes, "application/pdf");
        assert!(text.contains("1,204 units shipped"));
        assert!(!text.contains('\x00'));
    }

    #[test]
    fn test_pdf_fallback_scan() {
        // No stream sections at all: readable runs are still recovered
        let mut bytes = vec![0xDE, 0xAD, 0xBE, 0xEF];
        bytes.extend_from_slice(b"annual summary");
        bytes.extend_from_slice(&[0x00, 0x01]);
        let text = extractor().extract(&bytes, "application/pdf");
        assert!(text.contains("annual summary"));
    }

    #[test]
    fn test_output_never_exceeds_cap() {
        let small = TextExtractor::new(500 * 1024, 16);
        let text = small.extract("abcdefghij".repeat(10).as_bytes(), "text/plain");
        assert_eq!(text.chars().count(), 16);
    }

    #[test]
    fn test_cap_respects_char_boundaries() {
        let small = TextExtractor::new(500 * 1024, 3);
        let text = small.extract("日本語テキスト".as_bytes(), "text/plain");
        assert_eq!(text, "日本語");
    }

    #[test]
    fn test_input_cap_applied_before_processing() {
        let small = TextExtractor::new(8, 50_000);
        let text = small.extract(b"0123456789abcdef", "text/plain");
        assert_eq!(text, "01234567");
    }

    #[test]
    fn test_arbitrary_bytes_never_panic() {
        let mut rng = XorShift(0x9E3779B9);
        let media_types = [
            "text/plain",
            "text/csv",
            "application/pdf",
            "application/octet-stream",
            "image/png",
            "",
        ];
        let ex = TextExtractor::new(4096, 1024);

        for size in [0usize, 1, 7, 64, 1024, 4096, 8192] {
            let mut buf = vec![0u8; size];
            rng.fill(&mut buf);
            for media_type in media_types {
                let out = ex.extract(&buf, media_type);
                assert!(out.chars().count() <= 1024);
            }
        }
    }
}
