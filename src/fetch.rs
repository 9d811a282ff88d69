//! Fetch controller.
//!
//! Keeps track of the identifier a binding wants to show and of the one request that is allowed
//! to change what it shows. Provider work is spawned off the loop; its result travels back over a
//! channel as a [`Delivery`] and only touches binding state once [`FetchController::accept`] has
//! matched it against the request that is still current.

use crate::errors::ImageError;
use crate::provider::{DecodedSource, ResourceProvider};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Identifies one issued request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

/// Result of a request, sent back to the loop.
#[derive(Debug)]
pub struct Delivery {
    pub request: RequestId,
    pub source: String,
    pub result: Result<DecodedSource, ImageError>,
}

/// What [`FetchController::fetch`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Content already applied, or the context is cancelled
    Skipped,
    /// Empty identifier, the displayed frame should be cleared
    Cleared,
    /// A request was issued
    Started(RequestId),
}

/// What a delivery turned out to be.
#[derive(Debug)]
pub enum Accepted {
    /// Fresh content for the current identifier
    Fresh(DecodedSource),
    /// The current request failed
    Failed { source: String, error: ImageError },
    /// Superseded or cancelled, must be ignored
    Stale { source: String },
}

/// Represents the in-flight request so it can be cancelled once it is no longer needed.
struct Inflight {
    id: RequestId,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

pub struct FetchController {
    provider: Arc<dyn ResourceProvider>,
    source: String,
    /// Current content of `source` was retrieved and applied
    ok: bool,
    inflight: Option<Inflight>,
    next_id: u64,
    issued: u64,
    tx: mpsc::UnboundedSender<Delivery>,
    rx: mpsc::UnboundedReceiver<Delivery>,
}

impl FetchController {
    pub fn new(provider: Arc<dyn ResourceProvider>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            provider,
            source: String::new(),
            ok: false,
            inflight: None,
            next_id: 0,
            issued: 0,
            tx,
            rx,
        }
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn is_inflight(&self) -> bool {
        self.inflight.is_some()
    }

    /// Number of requests handed to the provider so far.
    #[inline]
    pub fn issued(&self) -> u64 {
        self.issued
    }

    /// Sets the identifier. Returns `None` when it did not change.
    pub fn set_source(&mut self, source: &str, ctx: &CancellationToken) -> Option<FetchOutcome> {
        if self.source == source {
            return None;
        }
        self.source = source.to_string();
        self.ok = false;
        Some(self.fetch(ctx))
    }

    /// Issues a request for the current identifier under `ctx`, if one is needed.
    pub fn fetch(&mut self, ctx: &CancellationToken) -> FetchOutcome {
        if self.ok || ctx.is_cancelled() {
            return FetchOutcome::Skipped;
        }

        // Only the newest request may change what is shown
        self.cancel_inflight();

        if self.source.is_empty() {
            return FetchOutcome::Cleared;
        }

        self.next_id += 1;
        self.issued += 1;
        let id = RequestId(self.next_id);
        let cancel = ctx.child_token();
        let source = self.source.clone();
        let tx = self.tx.clone();

        let task = match Handle::try_current() {
            Ok(handle) => {
                let fut = self.provider.fetch(cancel.clone(), source.clone());
                let token = cancel.clone();
                Some(handle.spawn(async move {
                    let result = tokio::select! {
                        biased;
                        _ = token.cancelled() => Err(ImageError::Canceled),
                        r = fut => r,
                    };
                    let _ = tx.send(Delivery { request: id, source, result });
                }))
            }
            Err(e) => {
                log::warn!("cannot fetch {source:?}: {e}");
                let _ = tx.send(Delivery { request: id, source, result: Err(ImageError::NoRuntime) });
                None
            }
        };

        self.inflight = Some(Inflight { id, cancel, task });
        FetchOutcome::Started(id)
    }

    /// Waits for the next delivery. Cancel-safe.
    pub async fn next_delivery(&mut self) -> Delivery {
        match self.rx.recv().await {
            Some(delivery) => delivery,
            // We hold a sender ourselves, so the channel never closes
            None => futures::future::pending().await,
        }
    }

    /// Returns a delivery that is already queued, without waiting.
    pub fn try_next_delivery(&mut self) -> Option<Delivery> {
        self.rx.try_recv().ok()
    }

    /// Matches a delivery against the current request.
    pub fn accept(&mut self, delivery: Delivery) -> Accepted {
        let current = match &self.inflight {
            Some(inflight) => inflight.id == delivery.request && !inflight.cancel.is_cancelled(),
            None => false,
        };
        if !current {
            return Accepted::Stale { source: delivery.source };
        }
        self.inflight = None;

        match delivery.result {
            Ok(decoded) => {
                self.ok = true;
                Accepted::Fresh(decoded)
            }
            Err(ImageError::Canceled) => Accepted::Stale { source: delivery.source },
            Err(error) => Accepted::Failed { source: delivery.source, error },
        }
    }

    /// Cancels the in-flight request, if any. Its delivery will be treated as stale.
    pub fn cancel_inflight(&mut self) {
        if let Some(inflight) = self.inflight.take() {
            inflight.cancel.cancel();
            drop(inflight.task);
        }
    }
}

impl Drop for FetchController {
    fn drop(&mut self) {
        self.cancel_inflight();
    }
}
