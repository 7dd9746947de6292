//! Undo engine: removes the most recent complete stroke from a log.
//!
//! Strokes are delimited globally, not per author: the log is one shared
//! timeline, so undo removes the last stroke regardless of who drew it.
//! The log is popped from the end through the last [`Action::EndStroke`]
//! and then back to the previous one, so the whole stroke disappears along
//! with any unterminated segments trailing it. A log with no `EndStroke`
//! at all is cleared entirely.

use super::Action;

/// Returns the length the log keeps after one undo.
///
/// This is one past the second-to-last `EndStroke`, or `0` when the log
/// holds fewer than two of them.
#[must_use]
pub fn undo_boundary(log: &[Action]) -> usize {
    let Some(last) = log.iter().rposition(Action::is_end_stroke) else {
        return 0;
    };
    log.iter()
        .take(last)
        .rposition(Action::is_end_stroke)
        .map_or(0, |previous| previous.saturating_add(1))
}

/// Returns `log` with the most recent complete stroke removed.
///
/// An empty log stays empty.
#[must_use]
pub fn undo(log: &[Action]) -> Vec<Action> {
    log.iter().take(undo_boundary(log)).cloned().collect()
}

/// Applies [`undo`] in place and returns how many entries were removed.
pub fn undo_in_place(log: &mut Vec<Action>) -> usize {
    let keep = undo_boundary(log);
    let removed = log.len().saturating_sub(keep);
    log.truncate(keep);
    removed
}

/// Counts complete strokes (i.e. `EndStroke` markers) in the log.
#[must_use]
pub fn stroke_count(log: &[Action]) -> usize {
    log.iter().filter(|action| action.is_end_stroke()).count()
}
