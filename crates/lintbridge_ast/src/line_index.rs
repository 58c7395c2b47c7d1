//! Line-start offset table.
//!
//! Converts between the linter's 1-based line/column positions and the
//! host's 0-based byte offsets.

use crate::{Location, Position, Span};

/// Line-start offset table for one document.
///
/// Recognizes `\n`, `\r\n` and lone `\r` as line terminators.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    /// Byte offset of the first character of each line.
    line_starts: Vec<u32>,
}

impl<'a> LineIndex<'a> {
    /// Builds the table for `text`.
    pub fn new(text: &'a str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = vec![0];
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => line_starts.push((i + 1) as u32),
                b'\r' => {
                    if bytes.get(i + 1) == Some(&b'\n') {
                        i += 1;
                    }
                    line_starts.push((i + 1) as u32);
                }
                _ => {}
            }
            i += 1;
        }
        Self { text, line_starts }
    }

    /// Returns the indexed text.
    #[inline]
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Returns the byte offset where the 1-based `line` starts.
    pub fn line_start(&self, line: u32) -> Option<u32> {
        let idx = line.checked_sub(1)? as usize;
        self.line_starts.get(idx).copied()
    }

    /// Byte offset just past the last non-terminator character of a line.
    fn line_content_end(&self, idx: usize) -> usize {
        let start = self.line_starts[idx] as usize;
        let next = self
            .line_starts
            .get(idx + 1)
            .map(|&s| s as usize)
            .unwrap_or(self.text.len());
        let line = &self.text[start..next];
        let content = line
            .strip_suffix("\r\n")
            .or_else(|| line.strip_suffix('\n'))
            .or_else(|| line.strip_suffix('\r'))
            .unwrap_or(line);
        start + content.len()
    }

    /// Converts a 1-based position to a byte offset.
    ///
    /// Out-of-range input is clamped: a column past the end of its line
    /// lands on the line end, a line past the end of the document lands on
    /// the text length, and a column inside a surrogate pair lands on the
    /// start of that character.
    pub fn offset_of(&self, position: Position) -> u32 {
        let idx = position.line.saturating_sub(1) as usize;
        let Some(&start) = self.line_starts.get(idx) else {
            return self.text.len() as u32;
        };
        let start = start as usize;
        let end = self.line_content_end(idx);
        let target = position.column.saturating_sub(1) as usize;

        let mut units = 0usize;
        for (rel, ch) in self.text[start..end].char_indices() {
            if units >= target {
                return (start + rel) as u32;
            }
            units += ch.len_utf16();
            if units > target {
                return (start + rel) as u32;
            }
        }
        end as u32
    }

    /// Converts a byte offset to a 1-based position.
    pub fn position_of(&self, offset: u32) -> Position {
        let mut offset = (offset as usize).min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        let idx = match self.line_starts.binary_search(&(offset as u32)) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let start = self.line_starts[idx] as usize;
        let column = self.text[start..offset].encode_utf16().count() as u32 + 1;
        Position::new(idx as u32 + 1, column)
    }

    /// Converts a byte span to a location.
    pub fn location_of(&self, span: Span) -> Location {
        Location::new(self.position_of(span.start), self.position_of(span.end))
    }
}
