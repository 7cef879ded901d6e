//! Progress reporting for archive passes.
//!
//! Archive reading and filtering report through [`ProgressCallback`] so the
//! library stays independent of any terminal backend. The `indicatif`
//! implementation lives in `hotspot_cli_utils`.

/// Receives progress updates from a long-running archive pass.
pub trait ProgressCallback: Send + Sync {
    /// Sets the number of work units expected, once known.
    fn set_total(&self, total: u64);

    /// Sets the absolute position.
    fn set_position(&self, pos: u64);

    /// Advances the position by `delta`.
    fn inc(&self, delta: u64);

    /// Replaces the status message.
    fn set_message(&self, msg: String);

    /// Marks the pass complete with a closing message.
    fn finish(&self, msg: String);
}

/// Discards every update. Used by tests and non-interactive callers.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn set_position(&self, _pos: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
