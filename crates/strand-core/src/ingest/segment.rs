//! Incremental line segmentation.
//!
//! Stream fragments arrive with arbitrary split points, so a logical line
//! may span several fragments. The segmenter buffers the unterminated tail
//! of each fragment and prepends it to the next one, emitting only lines
//! that were newline-terminated in the cumulative stream.

/// Splits arbitrary text fragments into complete lines.
///
/// Pure state machine over `(carry-over, fragment)`; no I/O. The emitted
/// line sequence is invariant under how the stream was chunked.
#[derive(Debug, Default)]
pub struct LineSegmenter {
    carry: String,
}

impl LineSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the next fragment and returns the complete lines it finished.
    ///
    /// A trailing `\r` is stripped from every emitted line so CRLF streams
    /// segment the same as LF streams.
    pub fn push(&mut self, fragment: &str) -> Vec<String> {
        let mut lines = Vec::new();
        for ch in fragment.chars() {
            if ch == '\n' {
                let mut line = std::mem::take(&mut self.carry);
                if line.ends_with('\r') {
                    line.pop();
                }
                lines.push(line);
            } else {
                self.carry.push(ch);
            }
        }
        lines
    }

    /// Flushes the trailing partial line at end of stream, if any.
    pub fn finish(self) -> Option<String> {
        if self.carry.is_empty() {
            None
        } else {
            Some(self.carry)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Collects all lines emitted for a given fragmentation of `text`.
    fn segment(fragments: &[&str]) -> Vec<String> {
        let mut segmenter = LineSegmenter::new();
        let mut lines = Vec::new();
        for fragment in fragments {
            lines.extend(segmenter.push(fragment));
        }
        lines.extend(segmenter.finish());
        lines
    }

    #[test]
    fn emits_only_terminated_lines() {
        let mut segmenter = LineSegmenter::new();
        assert_eq!(segmenter.push("data: hel"), Vec::<String>::new());
        assert_eq!(segmenter.push("lo\ndata: wor"), vec!["data: hello"]);
        assert_eq!(segmenter.push("ld\n"), vec!["data: world"]);
        assert_eq!(segmenter.finish(), None);
    }

    #[test]
    fn finish_flushes_trailing_partial() {
        let mut segmenter = LineSegmenter::new();
        segmenter.push("no newline here");
        assert_eq!(segmenter.finish(), Some("no newline here".to_string()));
    }

    #[test]
    fn strips_carriage_returns() {
        let mut segmenter = LineSegmenter::new();
        assert_eq!(segmenter.push("a\r\nb\r\n"), vec!["a", "b"]);
    }

    #[test]
    fn split_invariance() {
        let text = "event: step\ndata: {\"content\":\"hi\"}\n\ndata: [DONE]\ntail";
        let whole = segment(&[text]);

        // Every split point of the full text yields the same line sequence.
        for split in 0..=text.len() {
            if !text.is_char_boundary(split) {
                continue;
            }
            let (a, b) = text.split_at(split);
            assert_eq!(segment(&[a, b]), whole, "split at byte {}", split);
        }

        // Including pathological one-byte fragments.
        let bytes: Vec<String> = text.chars().map(|c| c.to_string()).collect();
        let refs: Vec<&str> = bytes.iter().map(|s| s.as_str()).collect();
        assert_eq!(segment(&refs), whole);
    }

    #[test]
    fn empty_fragments_emit_nothing() {
        let mut segmenter = LineSegmenter::new();
        assert!(segmenter.push("").is_empty());
        assert_eq!(segmenter.push("x\n"), vec!["x"]);
    }
}
