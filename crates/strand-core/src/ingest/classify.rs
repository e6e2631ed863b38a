//! Line and payload classification.
//!
//! Each logical line of the stream is sorted into exactly one category
//! before any decoding happens. Data payloads are classified a second time
//! once extracted, because backends occasionally wrap control markers or
//! step narration inside `data:` records.

/// Prefix of SSE control-event lines (`event: step`, `event: complete`, …).
pub const CONTROL_PREFIX: &str = "event:";

/// Prefix of SSE data lines.
pub const DATA_PREFIX: &str = "data:";

/// Sentinel payload marking the end of the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Marker phrase the backend emits when an agent begins executing,
/// e.g. `Agent 'liManus' starting execution`.
pub const LIFECYCLE_MARKER: &str = "starting execution";

/// Prefixes identifying step/agent progress narration.
pub const STEP_PREFIXES: [&str; 2] = ["Step ", "Agent "];

/// The category of one logical line (or extracted payload).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// `event:`-prefixed control line; never rendered as content.
    ControlEvent(String),
    /// Agent-execution-start narration; rendered verbatim as a step message.
    LifecycleStart(String),
    /// Step/agent progress narration; rendered verbatim as a step message.
    StepMarker(String),
    /// The `[DONE]` sentinel; terminates accumulation.
    StreamEnd,
    /// A data payload bound for the payload decoder.
    Data(String),
    /// An unprefixed non-empty line; decoded exactly like a data payload.
    PlainText(String),
}

/// Classifies one logical line (terminating newline already removed).
///
/// Returns `None` for lines that are blank after trimming. Pure function;
/// classifying the same line twice yields the same tag.
///
/// Tie-break order: control prefix, lifecycle marker, step prefix, then the
/// data prefix (whose payload may be the end sentinel), then plain text.
pub fn classify_line(line: &str) -> Option<LineClass> {
    if line.trim().is_empty() {
        return None;
    }
    if let Some(name) = line.strip_prefix(CONTROL_PREFIX) {
        return Some(LineClass::ControlEvent(name.trim().to_string()));
    }
    if line.contains(LIFECYCLE_MARKER) {
        return Some(LineClass::LifecycleStart(line.trim().to_string()));
    }
    if has_step_prefix(line) {
        return Some(LineClass::StepMarker(line.trim().to_string()));
    }
    if let Some(payload) = line.strip_prefix(DATA_PREFIX) {
        let payload = payload.trim();
        if payload == DONE_SENTINEL {
            return Some(LineClass::StreamEnd);
        }
        return Some(LineClass::Data(payload.to_string()));
    }
    Some(LineClass::PlainText(line.trim().to_string()))
}

/// Classifies an already-extracted payload.
///
/// Applies the same tie-break as [`classify_line`], but without stripping a
/// further `data:` prefix: whatever is not a control marker, lifecycle
/// marker, step marker, or the end sentinel is a [`LineClass::Data`] payload
/// for the decoder.
pub fn classify_payload(payload: &str) -> Option<LineClass> {
    let payload = payload.trim();
    if payload.is_empty() {
        return None;
    }
    if let Some(name) = payload.strip_prefix(CONTROL_PREFIX) {
        return Some(LineClass::ControlEvent(name.trim().to_string()));
    }
    if payload.contains(LIFECYCLE_MARKER) {
        return Some(LineClass::LifecycleStart(payload.to_string()));
    }
    if has_step_prefix(payload) {
        return Some(LineClass::StepMarker(payload.to_string()));
    }
    if payload == DONE_SENTINEL {
        return Some(LineClass::StreamEnd);
    }
    Some(LineClass::Data(payload.to_string()))
}

fn has_step_prefix(text: &str) -> bool {
    STEP_PREFIXES.iter().any(|p| text.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_lines_win_over_everything() {
        assert_eq!(
            classify_line("event: step"),
            Some(LineClass::ControlEvent("step".to_string()))
        );
        // Even when the remainder looks like a step marker.
        assert_eq!(
            classify_line("event: Step 1"),
            Some(LineClass::ControlEvent("Step 1".to_string()))
        );
    }

    #[test]
    fn lifecycle_marker_matches_anywhere_in_the_line() {
        let line = "data: Agent 'liManus' starting execution";
        assert_eq!(
            classify_line(line),
            Some(LineClass::LifecycleStart(line.to_string()))
        );
    }

    #[test]
    fn step_prefixes_classify_before_data() {
        assert_eq!(
            classify_line("Step 2: searching flights"),
            Some(LineClass::StepMarker("Step 2: searching flights".to_string()))
        );
        assert_eq!(
            classify_line("Agent planner selected"),
            Some(LineClass::StepMarker("Agent planner selected".to_string()))
        );
    }

    #[test]
    fn data_lines_are_trimmed_and_done_is_terminal() {
        assert_eq!(
            classify_line("data:  {\"content\":\"hi\"} "),
            Some(LineClass::Data("{\"content\":\"hi\"}".to_string()))
        );
        assert_eq!(classify_line("data: [DONE]"), Some(LineClass::StreamEnd));
    }

    #[test]
    fn unprefixed_lines_fall_back_to_plain_text() {
        assert_eq!(
            classify_line("hello world"),
            Some(LineClass::PlainText("hello world".to_string()))
        );
    }

    #[test]
    fn blank_lines_classify_to_nothing() {
        assert_eq!(classify_line(""), None);
        assert_eq!(classify_line("   "), None);
        assert_eq!(classify_payload("  "), None);
    }

    #[test]
    fn classification_is_pure() {
        let line = "data: {\"result\":\"ok\"}";
        assert_eq!(classify_line(line), classify_line(line));
    }

    #[test]
    fn payloads_are_reclassified() {
        assert_eq!(
            classify_payload("Step 3: booking"),
            Some(LineClass::StepMarker("Step 3: booking".to_string()))
        );
        assert_eq!(
            classify_payload("event:complete"),
            Some(LineClass::ControlEvent("complete".to_string()))
        );
        assert_eq!(classify_payload("[DONE]"), Some(LineClass::StreamEnd));
        assert_eq!(
            classify_payload("plain content"),
            Some(LineClass::Data("plain content".to_string()))
        );
    }
}
