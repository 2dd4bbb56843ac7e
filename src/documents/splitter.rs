//! Recursive character splitter used to re-split retrieved chunks.
//!
//! Tries separators from coarsest to finest (`"\n\n"`, `"\n"`, `" "`, `""`),
//! recursing into any piece that is still too long, then greedily merges
//! adjacent pieces back up to `chunk_size` with up to `chunk_overlap`
//! characters shared between neighbours. All sizes are in characters.

/// Default separator hierarchy: paragraphs, lines, words, characters.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    /// Create a splitter with the default separator hierarchy.
    ///
    /// * `chunk_size`: target maximum characters per piece
    /// * `chunk_overlap`: characters carried between consecutive pieces
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the separator hierarchy. An empty separator splits into characters.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into trimmed, non-empty pieces in original order.
    pub fn split(&self, text: &str) -> Vec<String> {
        let separators: Vec<&str> = self.separators.iter().map(String::as_str).collect();
        self.split_recursive(text, &separators)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // First separator present in the text wins; "" always matches
        let mut separator = separators.last().copied().unwrap_or("");
        let mut finer: &[&str] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = candidate;
                break;
            }
            if text.contains(candidate) {
                separator = candidate;
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut pieces = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for split in split_keeping_separator(text, separator) {
            if char_len(split) < self.chunk_size {
                pending.push(split);
                continue;
            }

            if !pending.is_empty() {
                pieces.extend(self.merge(&pending));
                pending.clear();
            }

            if finer.is_empty() {
                pieces.push(split.to_string());
            } else {
                pieces.extend(self.split_recursive(split, finer));
            }
        }

        if !pending.is_empty() {
            pieces.extend(self.merge(&pending));
        }

        pieces
    }

    /// Greedily join small splits into pieces of at most `chunk_size`.
    ///
    /// When a piece closes, splits are dropped from its front until what remains
    /// is within `chunk_overlap` and leaves room for the next split; the remainder
    /// opens the next piece.
    fn merge(&self, splits: &[&str]) -> Vec<String> {
        let mut merged = Vec::new();
        let mut window: Vec<(&str, usize)> = Vec::new();
        let mut total = 0;

        for split in splits {
            let len = char_len(split);

            if total + len > self.chunk_size && !window.is_empty() {
                if let Some(piece) = join_window(&window) {
                    merged.push(piece);
                }

                while total > self.chunk_overlap
                    || (total > 0 && total + len > self.chunk_size)
                {
                    let (_, front) = window.remove(0);
                    total -= front;
                }
            }

            window.push((split, len));
            total += len;
        }

        if let Some(piece) = join_window(&window) {
            merged.push(piece);
        }

        merged
    }
}

fn join_window(window: &[(&str, usize)]) -> Option<String> {
    let joined: String = window.iter().map(|(s, _)| *s).collect();
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Split text at a separator, attaching each separator to the start of the
/// piece that follows it. Empty pieces are dropped.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut result = Vec::new();
    let mut start = 0;

    for (pos, _) in text.match_indices(separator) {
        if pos > start {
            result.push(&text[start..pos]);
        }
        start = pos;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
