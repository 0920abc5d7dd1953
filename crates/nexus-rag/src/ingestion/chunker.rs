//! Fixed-window text chunking with overlap

/// Splits text into overlapping character windows.
///
/// Consecutive windows share `overlap` characters so a query landing near a
/// window boundary still retrieves enough surrounding context.
pub struct TextChunker {
    /// Window size in characters
    chunk_size: usize,
    /// Overlap between consecutive windows
    overlap: usize,
    /// Upper bound on emitted chunks; the earliest are kept
    max_chunks: usize,
}

impl TextChunker {
    /// Create a new chunker. The overlap is clamped below the window size;
    /// a degenerate configuration would otherwise never advance.
    pub fn new(chunk_size: usize, overlap: usize, max_chunks: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        let overlap = if overlap >= chunk_size {
            tracing::warn!(
                "chunk overlap {} >= chunk size {}, clamping",
                overlap,
                chunk_size
            );
            chunk_size - 1
        } else {
            overlap
        };
        Self {
            chunk_size,
            overlap,
            max_chunks,
        }
    }

    /// Split `text` into ordered, trimmed, overlapping windows.
    ///
    /// Windows cover `[start, start + chunk_size)` in characters; each next
    /// window starts `overlap` characters before the previous end. The final
    /// window may be shorter. Text no longer than one window yields exactly
    /// one chunk; empty text yields none.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every character, plus an end sentinel, so windows
        // can be sliced without splitting a code point.
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());
        let char_len = offsets.len() - 1;

        let mut chunks = Vec::new();
        let mut start = 0usize;

        loop {
            let end = (start + self.chunk_size).min(char_len);
            chunks.push(text[offsets[start]..offsets[end]].trim().to_string());

            if end >= char_len || chunks.len() >= self.max_chunks {
                break;
            }
            start = end - self.overlap;
        }

        chunks
    }
}
