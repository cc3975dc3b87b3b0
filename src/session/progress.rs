/// Boxed progress callback, called with values in `[0, 1]`.
pub type ProgressCallback = Box<dyn FnMut(f64) + Send>;

/// Stages of one compile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompilePhase {
    /// Nothing started yet.
    Idle,
    /// Fetching and decoding the cover and audio tracks.
    LoadingAssets,
    /// Resampling and mixing audio.
    Mixing,
    /// Rendering and submitting frames.
    Rendering,
    /// Flushing audio and finalizing the container.
    Finalizing,
    /// Output produced.
    Done,
    /// Compile aborted with an error.
    Failed,
}

impl CompilePhase {
    /// `Done` or `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Forwards progress to an optional callback.
///
/// Values are clamped to `[0, 1]` and never go backwards. Once the compile is
/// [`CompilePhase::Done`] or [`CompilePhase::Failed`] the callback is not called again.
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    phase: CompilePhase,
    last: f64,
}

impl ProgressReporter {
    /// Wrap `callback` (or nothing).
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            phase: CompilePhase::Idle,
            last: 0.0,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> CompilePhase {
        self.phase
    }

    /// Last value handed to the callback (0 before the first call).
    pub fn last(&self) -> f64 {
        self.last
    }

    /// Move to `phase`. Terminal phases are final.
    pub fn enter(&mut self, phase: CompilePhase) {
        if self.phase.is_terminal() || self.phase == phase {
            return;
        }
        tracing::debug!(from = ?self.phase, to = ?phase, "compile phase");
        self.phase = phase;
    }

    /// Report `value`.
    pub fn report(&mut self, value: f64) {
        if self.phase.is_terminal() {
            return;
        }
        let value = if value.is_nan() {
            self.last
        } else {
            value.clamp(0.0, 1.0).max(self.last)
        };
        self.last = value;
        if let Some(cb) = self.callback.as_mut() {
            cb(value);
        }
    }

    /// Mark success, making sure the last reported value is exactly `1.0`.
    pub fn complete(&mut self) {
        if self.phase.is_terminal() {
            return;
        }
        if self.last < 1.0 {
            self.report(1.0);
        }
        self.enter(CompilePhase::Done);
    }

    /// Mark failure; no further values are reported.
    pub fn fail(&mut self) {
        self.enter(CompilePhase::Failed);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/progress.rs"]
mod tests;
