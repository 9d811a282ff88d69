//! Error reporting towards the host.
//!
//! The binding never presents UI. Fetch and decode failures are forwarded as [`ErrorReport`]s to
//! an [`ErrorSink`]; the host decides whether to show a popup, a toast or nothing.

use crate::binding::BindingId;
use crate::errors::ImageError;
use tokio::sync::mpsc;

/// A failure of one binding.
#[derive(Debug)]
pub struct ErrorReport {
    /// Binding that failed
    pub binding: BindingId,
    /// Identifier that was being fetched
    pub source: String,
    /// What went wrong
    pub error: ImageError,
}

/// Process-wide receiver of binding failures.
pub trait ErrorSink: Send + Sync {
    fn report(&self, report: ErrorReport);
}

/// Sink that only logs. Used when the host did not install one.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn report(&self, report: ErrorReport) {
        log::error!("Binding[{:?}]: cannot load {:?}: {}", report.binding, report.source, report.error);
    }
}

/// Forward reports to a channel, e.g. to an error-dialog task on the UI side.
impl ErrorSink for mpsc::UnboundedSender<ErrorReport> {
    fn report(&self, report: ErrorReport) {
        if let Err(e) = self.send(report) {
            log::warn!("error sink is gone, dropping report: {}", e.0.error);
        }
    }
}
