//! Sentence-aware text chunking.
//!
//! Text is cut into windows of at most `chunk_size` whitespace tokens.
//! Window edges fall on sentence boundaries where possible; consecutive
//! windows share `chunk_overlap` tokens.

#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    /// `chunk_size` is raised to 1 and `chunk_overlap` capped below it.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        // Leading words of `current` already emitted in the previous chunk
        let mut carried = 0;

        for sentence in sentences(text) {
            let words: Vec<&str> = sentence.split_whitespace().collect();
            if words.is_empty() {
                continue;
            }

            if current.len() > carried && current.len() + words.len() > self.chunk_size {
                chunks.push(current.join(" "));
                current = self.tail(&current);
                carried = current.len();
            }

            current.extend(words);

            // A single sentence longer than a window is cut by word count
            while current.len() > self.chunk_size {
                chunks.push(current[..self.chunk_size].join(" "));
                let step = self.chunk_size - self.chunk_overlap;
                current.drain(..step);
                carried = self.chunk_overlap;
            }
        }

        if current.len() > carried {
            chunks.push(current.join(" "));
        }

        chunks
    }

    fn tail<'a>(&self, words: &[&'a str]) -> Vec<&'a str> {
        let start = words.len().saturating_sub(self.chunk_overlap);
        words[start..].to_vec()
    }
}

/// Split after `.`, `!` or `?` followed by whitespace, and at every newline.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let end = i + c.len_utf8();
        let boundary = match c {
            '\n' => true,
            '.' | '!' | '?' => chars.peek().is_none_or(|(_, next)| next.is_whitespace()),
            _ => false,
        };
        if boundary {
            out.push(&text[start..end]);
            start = end;
        }
    }

    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}
