//! Line buffer: the one open document.
//!
//! A `LineBuffer` is an ordered, 1-indexed list of lines plus a current-line
//! pointer and a dirty flag. Lines are opaque byte strings: nothing here
//! assumes UTF-8, and a line may hold any byte except the newline that
//! separated it on disk.
//!
//! # Invariant
//!
//! `1 <= current <= len + 1` after every public operation. `len + 1` is the
//! "end of buffer" position: it is where `#` points and where appends land.
//!
//! Range operations take already-validated 1-indexed inclusive bounds; the
//! command layer is responsible for rejecting bad addresses before calling
//! in here.

use std::io::{self, BufRead};

/// A single line of text, without its terminator.
pub type Line = Vec<u8>;

// ---------------------------------------------------------------------------
// LineBuffer
// ---------------------------------------------------------------------------

/// The in-memory document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<Line>,
    current: usize,
    dirty: bool,
}

impl LineBuffer {
    // -- Construction -------------------------------------------------------

    /// Create an empty, clean buffer with the cursor on line 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            current: 1,
            dirty: false,
        }
    }

    /// Create a buffer from owned lines.
    #[must_use]
    pub const fn from_lines(lines: Vec<Line>) -> Self {
        Self {
            lines,
            current: 1,
            dirty: false,
        }
    }

    /// Create a buffer by splitting `text` on `\n`. A trailing newline
    /// produces a trailing empty line; the empty string produces no lines.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            return Self::new();
        }
        Self::from_lines(text.split('\n').map(|l| l.as_bytes().to_vec()).collect())
    }

    /// Read one line per record from `reader`.
    ///
    /// Records are `\n`-terminated; a `\r` before the terminator is dropped,
    /// and a final unterminated record counts as a line.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying reader.
    pub fn read_from<R: BufRead>(mut reader: R) -> io::Result<Self> {
        let mut lines = Vec::new();
        let mut record = Vec::new();
        loop {
            record.clear();
            if reader.read_until(b'\n', &mut record)? == 0 {
                break;
            }
            if record.last() == Some(&b'\n') {
                record.pop();
            }
            if record.last() == Some(&b'\r') {
                record.pop();
            }
            lines.push(record.clone());
        }
        Ok(Self::from_lines(lines))
    }

    // -- Access -------------------------------------------------------------

    /// Number of lines.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when the buffer holds no lines.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// All lines in document order.
    #[inline]
    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Line `n` (1-indexed), or `None` when out of range.
    #[must_use]
    pub fn line(&self, n: usize) -> Option<&[u8]> {
        n.checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .map(Vec::as_slice)
    }

    /// The current line number.
    #[inline]
    #[must_use]
    pub const fn current(&self) -> usize {
        self.current
    }

    /// The end-of-buffer position, `len + 1`.
    #[inline]
    #[must_use]
    pub fn end(&self) -> usize {
        self.lines.len() + 1
    }

    /// Move the current line, clamped into `1..=len + 1`.
    pub fn set_current(&mut self, n: usize) {
        self.current = n.clamp(1, self.end());
    }

    /// Whether anything changed since the last save.
    #[inline]
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flag the buffer as saved.
    pub const fn mark_clean(&mut self) {
        self.dirty = false;
    }

    // -- Editing ------------------------------------------------------------

    /// Replace the content of line `n`. Returns `false` if `n` is out of
    /// range.
    pub fn replace_line(&mut self, n: usize, content: Line) -> bool {
        let Some(slot) = n.checked_sub(1).and_then(|idx| self.lines.get_mut(idx)) else {
            return false;
        };
        *slot = content;
        self.dirty = true;
        true
    }

    /// Delete lines `start..=end`. The line that followed the range becomes
    /// current; when the range reached the end of the buffer, the new last
    /// line does.
    pub fn delete(&mut self, start: usize, end: usize) {
        debug_assert!(1 <= start && start <= end && end <= self.len());
        self.lines.drain(start - 1..end);
        self.dirty = true;
        self.current = start.min(self.len().max(1));
    }

    /// Remove the first `n` lines (clamped to the buffer length) and reset
    /// the current line to 1.
    pub fn drop_head(&mut self, n: usize) {
        let n = n.min(self.len());
        self.lines.drain(..n);
        self.current = 1;
        self.dirty = true;
    }

    /// Insert `lines` so the first of them becomes line `before`
    /// (`before == len + 1` appends). Current is left alone.
    pub fn insert(&mut self, before: usize, lines: Vec<Line>) {
        debug_assert!(1 <= before && before <= self.end());
        if lines.is_empty() {
            return;
        }
        let at = before - 1;
        self.lines.splice(at..at, lines);
        self.dirty = true;
    }

    /// Copy `start..=end` to just before line `before`. The first copy
    /// becomes current.
    pub fn copy_range(&mut self, start: usize, end: usize, before: usize) {
        debug_assert!(1 <= start && start <= end && end <= self.len());
        let block = self.lines[start - 1..end].to_vec();
        self.insert(before, block);
        self.set_current(before);
    }

    /// Move `start..=end` to just before line `before`, which must not fall
    /// inside `start + 1..=end`. The first moved line becomes current.
    pub fn move_range(&mut self, start: usize, end: usize, before: usize) {
        debug_assert!(1 <= start && start <= end && end <= self.len());
        debug_assert!(!(start < before && before <= end));
        let count = end - start + 1;
        let block: Vec<Line> = self.lines.drain(start - 1..end).collect();
        let dest = if before > end { before - count } else { before };
        self.insert(dest, block);
        self.set_current(dest);
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Byte search
// ---------------------------------------------------------------------------

/// Offset of the first occurrence of `needle` in `haystack`.
///
/// An empty needle matches at offset 0.
#[must_use]
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(buf: &LineBuffer) -> String {
        let joined: Vec<String> = buf
            .lines()
            .iter()
            .map(|l| String::from_utf8_lossy(l).into_owned())
            .collect();
        joined.join("\n")
    }

    const SIX: &str = "uno\ndue\ntre\nquattro\ncinque\nsei";

    // -- Construction -------------------------------------------------------

    #[test]
    fn new_buffer_is_empty_and_clean() {
        let buf = LineBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.current(), 1);
        assert_eq!(buf.end(), 1);
        assert!(!buf.is_dirty());
    }

    #[test]
    fn from_text_splits_on_newline() {
        let buf = LineBuffer::from_text("a\nb\n");
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.line(3), Some(&b""[..]));
    }

    #[test]
    fn from_empty_text_has_no_lines() {
        assert!(LineBuffer::from_text("").is_empty());
    }

    #[test]
    fn read_from_strips_terminators() {
        let buf = LineBuffer::read_from(&b"one\r\ntwo\nthree"[..]).unwrap();
        assert_eq!(text(&buf), "one\ntwo\nthree");
    }

    #[test]
    fn read_from_trailing_newline_adds_no_line() {
        let buf = LineBuffer::read_from(&b"one\ntwo\n"[..]).unwrap();
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn read_from_keeps_non_utf8_bytes() {
        let buf = LineBuffer::read_from(&b"caf\xe9\n"[..]).unwrap();
        assert_eq!(buf.line(1), Some(&b"caf\xe9"[..]));
    }

    #[test]
    fn read_from_empty_input() {
        assert!(LineBuffer::read_from(&b""[..]).unwrap().is_empty());
    }

    // -- Access -------------------------------------------------------------

    #[test]
    fn line_is_one_indexed() {
        let buf = LineBuffer::from_text(SIX);
        assert_eq!(buf.line(0), None);
        assert_eq!(buf.line(1), Some(&b"uno"[..]));
        assert_eq!(buf.line(6), Some(&b"sei"[..]));
        assert_eq!(buf.line(7), None);
    }

    #[test]
    fn set_current_clamps() {
        let mut buf = LineBuffer::from_text(SIX);
        buf.set_current(0);
        assert_eq!(buf.current(), 1);
        buf.set_current(99);
        assert_eq!(buf.current(), 7);
        buf.set_current(4);
        assert_eq!(buf.current(), 4);
    }

    // -- Editing ------------------------------------------------------------

    #[test]
    fn replace_line_marks_dirty() {
        let mut buf = LineBuffer::from_text(SIX);
        assert!(buf.replace_line(2, b"two".to_vec()));
        assert_eq!(buf.line(2), Some(&b"two"[..]));
        assert!(buf.is_dirty());
    }

    #[test]
    fn replace_line_out_of_range() {
        let mut buf = LineBuffer::from_text("a");
        assert!(!buf.replace_line(2, b"x".to_vec()));
        assert!(!buf.replace_line(0, b"x".to_vec()));
        assert!(!buf.is_dirty());
    }

    #[test]
    fn delete_middle_range() {
        let mut buf = LineBuffer::from_text(SIX);
        buf.delete(2, 4);
        assert_eq!(text(&buf), "uno\ncinque\nsei");
        assert_eq!(buf.current(), 2);
        assert!(buf.is_dirty());
    }

    #[test]
    fn delete_tail_lands_on_last_line() {
        let mut buf = LineBuffer::from_text("uno\ndue\ntre");
        buf.delete(2, 3);
        assert_eq!(text(&buf), "uno");
        assert_eq!(buf.current(), 1);
    }

    #[test]
    fn delete_everything() {
        let mut buf = LineBuffer::from_text("uno\ndue");
        buf.delete(1, 2);
        assert!(buf.is_empty());
        assert_eq!(buf.current(), 1);
    }

    #[test]
    fn drop_head_resets_current() {
        let mut buf = LineBuffer::from_text(SIX);
        buf.set_current(5);
        buf.drop_head(4);
        assert_eq!(text(&buf), "cinque\nsei");
        assert_eq!(buf.current(), 1);
    }

    #[test]
    fn drop_head_clamps() {
        let mut buf = LineBuffer::from_text("a\nb");
        buf.drop_head(10);
        assert!(buf.is_empty());
    }

    #[test]
    fn insert_before_and_append() {
        let mut buf = LineBuffer::from_text("a\nc");
        buf.insert(2, vec![b"b".to_vec()]);
        buf.insert(4, vec![b"d".to_vec()]);
        assert_eq!(text(&buf), "a\nb\nc\nd");
    }

    #[test]
    fn insert_nothing_stays_clean() {
        let mut buf = LineBuffer::from_text("a");
        buf.insert(1, Vec::new());
        assert!(!buf.is_dirty());
    }

    #[test]
    fn copy_before_range() {
        let mut buf = LineBuffer::from_text(SIX);
        buf.copy_range(5, 5, 1);
        assert_eq!(text(&buf), "cinque\nuno\ndue\ntre\nquattro\ncinque\nsei");
        assert_eq!(buf.current(), 1);
    }

    #[test]
    fn copy_after_range() {
        let mut buf = LineBuffer::from_text(SIX);
        buf.copy_range(1, 3, 5);
        assert_eq!(
            text(&buf),
            "uno\ndue\ntre\nquattro\nuno\ndue\ntre\ncinque\nsei"
        );
        assert_eq!(buf.current(), 5);
    }

    #[test]
    fn copy_to_end() {
        let mut buf = LineBuffer::from_text(SIX);
        buf.copy_range(1, 2, 7);
        assert_eq!(text(&buf), "uno\ndue\ntre\nquattro\ncinque\nsei\nuno\ndue");
    }

    #[test]
    fn move_backward() {
        let mut buf = LineBuffer::from_text(SIX);
        buf.move_range(5, 5, 1);
        assert_eq!(text(&buf), "cinque\nuno\ndue\ntre\nquattro\nsei");
        assert_eq!(buf.current(), 1);
    }

    #[test]
    fn move_forward() {
        let mut buf = LineBuffer::from_text(SIX);
        buf.move_range(1, 3, 5);
        assert_eq!(text(&buf), "quattro\nuno\ndue\ntre\ncinque\nsei");
        assert_eq!(buf.current(), 2);
    }

    #[test]
    fn move_to_end() {
        let mut buf = LineBuffer::from_text(SIX);
        buf.move_range(1, 2, 7);
        assert_eq!(text(&buf), "tre\nquattro\ncinque\nsei\nuno\ndue");
        assert_eq!(buf.current(), 5);
    }

    // -- find ---------------------------------------------------------------

    #[test]
    fn find_substring() {
        assert_eq!(find(b"gentil farfalletta", b"far"), Some(7));
        assert_eq!(find(b"abc", b"abcd"), None);
        assert_eq!(find(b"abc", b"x"), None);
        assert_eq!(find(b"abc", b""), Some(0));
    }
}
