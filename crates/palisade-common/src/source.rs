//! The source file model.
//!
//! A [`SourceFile`] owns the raw source text together with a line-start
//! index, computed once up front so the diagnostics sink can turn a byte
//! offset into a `(line, column)` pair without rescanning the text.

use crate::span::Span;

/// A source file: its path, full text, and a cache of line-start offsets.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
    pub text: String,
    /// Byte offset of the first character of each line. Always starts with 0.
    line_starts: Vec<u32>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0u32];
        for pos in memchr::memchr_iter(b'\n', text.as_bytes()) {
            line_starts.push(pos as u32 + 1);
        }
        SourceFile {
            path: path.into(),
            text,
            line_starts,
        }
    }

    /// The 0-indexed line containing `offset`.
    pub fn line_index(&self, offset: u32) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        }
    }

    /// The text of a single 0-indexed line, without its trailing newline.
    pub fn line_text(&self, line: usize) -> &str {
        let start = *self.line_starts.get(line).unwrap_or(&(self.text.len() as u32)) as usize;
        let end = self
            .line_starts
            .get(line + 1)
            .map(|&e| e as usize)
            .unwrap_or(self.text.len());
        self.text[start..end].trim_end_matches(['\n', '\r'])
    }

    /// 0-indexed (line, column) for a byte offset, column counted in characters.
    pub fn line_col(&self, offset: u32) -> (usize, usize) {
        let line = self.line_index(offset);
        let line_start = self.line_starts[line];
        let col = self.text[line_start as usize..offset as usize].chars().count();
        (line, col)
    }

    pub fn slice(&self, span: Span) -> &str {
        span.slice_safe(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_line_starts() {
        let src = SourceFile::new("t.pls", "a;\nb;\nc;");
        assert_eq!(src.line_index(0), 0);
        assert_eq!(src.line_index(3), 1);
        assert_eq!(src.line_index(6), 2);
        assert_eq!(src.line_text(1), "b;");
    }

    #[test]
    fn line_col_counts_characters() {
        let src = SourceFile::new("t.pls", "x := 1;\ny := 2;");
        assert_eq!(src.line_col(8), (1, 0));
    }
}
