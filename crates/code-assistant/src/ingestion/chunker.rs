//! Text chunking with sentence boundaries and overlap

use unicode_segmentation::UnicodeSegmentation;

/// A chunk of document text ready for embedding
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    /// Position of the chunk within its document
    pub index: usize,
    /// Chunk text
    pub content: String,
}

/// Text chunker with configurable size and overlap
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
    /// Minimum chunk size
    min_size: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            overlap: overlap.min(chunk_size.saturating_sub(1)),
            min_size: 20,
        }
    }

    /// Drop chunks shorter than `min_size` characters
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    /// Split text into overlapping chunks that end on sentence boundaries when possible
    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let mut chunks = Vec::new();
        let mut current_chunk = String::new();

        for sentence in self.split_into_pieces(text) {
            if !current_chunk.is_empty()
                && current_chunk.len() + sentence.len() > self.chunk_size
            {
                self.push_chunk(&mut chunks, &current_chunk);

                // Start new chunk with overlap
                current_chunk = self.get_overlap_text(&current_chunk);
            }

            current_chunk.push_str(sentence);
        }

        // Save final chunk
        self.push_chunk(&mut chunks, &current_chunk);

        // A short document still yields one chunk
        if chunks.is_empty() && !text.trim().is_empty() {
            chunks.push(TextChunk {
                index: 0,
                content: text.trim().to_string(),
            });
        }

        chunks
    }

    fn push_chunk(&self, chunks: &mut Vec<TextChunk>, text: &str) {
        let trimmed = text.trim();
        if trimmed.len() >= self.min_size {
            chunks.push(TextChunk {
                index: chunks.len(),
                content: trimmed.to_string(),
            });
        }
    }

    /// Sentences, with any sentence longer than the chunk size cut at char boundaries
    fn split_into_pieces<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut pieces = Vec::new();
        for sentence in text.split_sentence_bounds() {
            let mut rest = sentence;
            while rest.len() > self.chunk_size {
                let mut cut = self.chunk_size;
                while cut > 0 && !rest.is_char_boundary(cut) {
                    cut -= 1;
                }
                if cut == 0 {
                    break;
                }
                pieces.push(&rest[..cut]);
                rest = &rest[cut..];
            }
            if !rest.is_empty() {
                pieces.push(rest);
            }
        }
        pieces
    }

    /// Get overlap text from the end of a chunk
    fn get_overlap_text(&self, text: &str) -> String {
        if self.overlap == 0 {
            return String::new();
        }
        if text.len() <= self.overlap {
            return text.to_string();
        }

        let mut start = text.len().saturating_sub(self.overlap);

        // Ensure we're at a valid UTF-8 character boundary
        while start > 0 && !text.is_char_boundary(start) {
            start -= 1;
        }

        let overlap_text = &text[start..];

        // Try to start at a sentence boundary
        if let Some(pos) = overlap_text.find(". ") {
            return overlap_text[pos + 2..].to_string();
        }

        // Fall back to word boundary
        if let Some(pos) = overlap_text.find(' ') {
            return overlap_text[pos + 1..].to_string();
        }

        overlap_text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunker = TextChunker::new(1000, 200);
        let chunks = chunker.chunk("Binary search halves the range each step.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn test_tiny_text_still_indexed() {
        let chunker = TextChunker::new(1000, 200);
        let chunks = chunker.chunk("ok");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "ok");
        assert!(chunker.chunk("  \n ").is_empty());
    }

    #[test]
    fn test_chunks_respect_size_and_overlap() {
        let sentence = "The quick brown fox jumps over the lazy dog. ";
        let text = sentence.repeat(100);
        let chunker = TextChunker::new(300, 60);
        let chunks = chunker.chunk(&text);

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert!(chunk.content.len() <= 300 + 60, "chunk {} too long", i);
        }

        // Consecutive chunks share text
        let tail: String = chunks[0].content.chars().rev().take(20).collect::<Vec<_>>().into_iter().rev().collect();
        assert!(chunks[1].content.contains(tail.trim()));
    }

    #[test]
    fn test_long_sentence_is_split() {
        let text = "a".repeat(2500);
        let chunker = TextChunker::new(1000, 0);
        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.content.len() <= 1000));
    }
}
