//! Progress notification port
//!
//! Defines the interface for reporting lifecycle progress while a prompt is
//! in flight.

use oneshot_domain::{Model, Response};
use std::time::Duration;

/// Callback for progress updates during a run
///
/// Implementations live in the presentation layer.
pub trait ProgressNotifier: Send + Sync {
    /// Called before the client is started
    fn on_connecting(&self);

    /// Called once the session exists
    fn on_session_created(&self, session_id: &str, model: &Model);

    /// Called when the prompt has been handed to the session
    fn on_waiting(&self, timeout: Duration);

    /// Called when the complete response has arrived
    fn on_response(&self, _response: &Response) {}

    /// Called when the run fails, once the session is released and before
    /// the client is stopped
    fn on_failure(&self, _error: &str) {}

    /// Called after the client has been stopped, whatever the outcome
    fn on_finished(&self) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_connecting(&self) {}
    fn on_session_created(&self, _session_id: &str, _model: &Model) {}
    fn on_waiting(&self, _timeout: Duration) {}
}
