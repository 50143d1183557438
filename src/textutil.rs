//! Clipping of model-facing and display text.
//!
//! Tool output is byte-capped before it goes back into the transcript, and
//! confirmation summaries are char-capped to stay on one terminal line.
//! Both cuts must land on character boundaries.

/// Marker appended to tool output that was clipped.
pub const CLIP_MARKER: &str = "\n...[truncated]";

/// Cap tool output at `max_bytes` bytes of content, appending
/// [`CLIP_MARKER`] when anything was dropped.
pub fn clip_output(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut clipped = String::with_capacity(max_bytes + CLIP_MARKER.len());
    for (offset, ch) in text.char_indices() {
        if offset + ch.len_utf8() > max_bytes {
            break;
        }
        clipped.push(ch);
    }
    clipped.push_str(CLIP_MARKER);
    clipped
}

/// Cap a one-line summary at `max_chars` characters, appending an ellipsis
/// when anything was dropped.
pub fn clip_summary(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((offset, _)) => format!("{}...", &text[..offset]),
    }
}
