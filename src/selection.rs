//! Selection capture: promoting a live text selection into a passage.
//!
//! A small state machine driven by pointer events. The platform's selection
//! mechanism (the surface that knows what text is highlighted and where) is
//! abstracted behind [`SelectionHost`] so the machine itself stays pure and
//! testable. While a selection is pending the host may clear it when other
//! UI reacts to focus changes, so the driver is expected to call
//! [`SelectionCapture::tick`] on a short interval to reassert the captured
//! range; leaving the pending state makes further ticks no-ops, which is
//! how the reassert timer is torn down.

use uuid::Uuid;

use crate::locate;
use crate::models::Passage;

/// Platform selection surface the capture machine observes and controls.
///
/// `Range` is an opaque, cloneable handle the host can later reassert as
/// the active selection.
pub trait SelectionHost {
    type Range: Clone;

    /// The current active selection, if any, with its raw (untrimmed) text
    /// and an anchor position for menu placement.
    fn capture(&self) -> Option<CapturedSelection<Self::Range>>;

    /// Re-apply `range` as the active selection.
    fn reassert(&mut self, range: &Self::Range);

    /// Clear the active selection entirely.
    fn clear(&mut self);
}

/// What the host reports when a selection exists.
#[derive(Debug, Clone)]
pub struct CapturedSelection<R> {
    pub text: String,
    pub range: R,
    /// Bounding-box-derived position for the context menu, in host units.
    pub anchor: (f64, f64),
}

#[derive(Debug, Clone)]
enum State<R> {
    Idle,
    Pending(CapturedSelection<R>),
}

/// The capture state machine. One instance per mounted document view.
pub struct SelectionCapture<H: SelectionHost> {
    state: State<H::Range>,
}

impl<H: SelectionHost> Default for SelectionCapture<H> {
    fn default() -> Self {
        Self { state: State::Idle }
    }
}

impl<H: SelectionHost> SelectionCapture<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, State::Pending(_))
    }

    /// The pending selection's trimmed text, if any.
    pub fn pending_text(&self) -> Option<&str> {
        match &self.state {
            State::Pending(captured) => Some(captured.text.trim()),
            State::Idle => None,
        }
    }

    /// The context-menu anchor for the pending selection, if any.
    pub fn menu_anchor(&self) -> Option<(f64, f64)> {
        match &self.state {
            State::Pending(captured) => Some(captured.anchor),
            State::Idle => None,
        }
    }

    /// Pointer released inside the selectable region. Enters `Pending` when
    /// the host reports a selection with non-whitespace text; otherwise
    /// stays (or returns to) `Idle`.
    pub fn pointer_up(&mut self, host: &H) {
        match host.capture() {
            Some(captured) if !captured.text.trim().is_empty() => {
                self.state = State::Pending(captured);
            }
            _ => self.state = State::Idle,
        }
    }

    /// Pointer pressed outside both the selectable region and the context
    /// menu. Cancels a pending selection without creating a passage.
    pub fn pointer_down_outside(&mut self) {
        self.state = State::Idle;
    }

    /// Periodic reassert while pending. No-op once the machine is idle.
    pub fn tick(&self, host: &mut H) {
        if let State::Pending(captured) = &self.state {
            host.reassert(&captured.range);
        }
    }

    /// Promote the pending selection into a new [`Passage`].
    ///
    /// The passage text is the trimmed captured text; offsets are derived
    /// best-effort from `document_text` through the span locator and fall
    /// back to zero when the text cannot be placed. Clears the host
    /// selection and returns to `Idle`. Returns `None` when nothing is
    /// pending or the captured text was whitespace.
    pub fn commit(&mut self, host: &mut H, project_id: &str, document_text: &str) -> Option<Passage> {
        let captured = match std::mem::replace(&mut self.state, State::Idle) {
            State::Pending(captured) => captured,
            State::Idle => return None,
        };

        let text = captured.text.trim().to_string();
        if text.is_empty() {
            return None;
        }

        let (start, end) = match locate::locate(&text, document_text) {
            Some(start) => (start, locate::clamp_span_end(document_text, start + text.len())),
            None => (0, 0),
        };

        host.clear();

        Some(Passage {
            id: Uuid::new_v4().to_string(),
            text,
            start,
            end,
            project_id: project_id.to_string(),
        })
    }
}
