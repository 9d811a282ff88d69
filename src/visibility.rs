//! Visibility gate.
//!
//! A [`VisibilityGate`] hands out the cancellation token that all work done on behalf of a surface
//! runs under. A fresh token is minted every time the surface becomes visible (a *renewal*), and
//! it is cancelled as soon as the surface stops being visible. Everything spawned with the token
//! observes that cancellation cooperatively.
//!
//! ```
//! use onlineimage::visibility::{Transition, VisibilityGate};
//! use tokio_util::sync::CancellationToken;
//!
//! let mut gate = VisibilityGate::new(CancellationToken::new());
//! assert!(gate.current().is_cancelled());
//!
//! let Transition::Renewed(token) = gate.set_visible(true) else { unreachable!() };
//! assert!(!token.is_cancelled());
//!
//! gate.set_visible(false);
//! assert!(token.is_cancelled());
//! ```

use tokio_util::sync::CancellationToken;

/// Callback invoked with the new token on every renewal.
pub type RenewCallback = Box<dyn FnMut(&CancellationToken) + Send>;

/// Result of [`VisibilityGate::set_visible`].
#[derive(Debug, Clone)]
pub enum Transition {
    /// The surface became visible, here is the token of the new epoch
    Renewed(CancellationToken),
    /// The surface became invisible, the previous token was cancelled
    Suspended,
    /// Nothing changed
    Unchanged,
}

pub struct VisibilityGate {
    /// Lifetime of the owner. Every epoch token is a child of this one.
    parent: CancellationToken,
    /// Token of the current epoch. Pre-cancelled until the first renewal.
    current: CancellationToken,
    visible: bool,
    epoch: u64,
    on_renew: Vec<RenewCallback>,
}

impl VisibilityGate {
    pub fn new(parent: CancellationToken) -> Self {
        let current = parent.child_token();
        current.cancel();

        Self {
            parent,
            current,
            visible: false,
            epoch: 0,
            on_renew: Vec::new(),
        }
    }

    /// Registers a callback that runs on every renewal.
    pub fn on_renew(&mut self, cb: impl FnMut(&CancellationToken) + Send + 'static) {
        self.on_renew.push(Box::new(cb));
    }

    pub fn set_visible(&mut self, visible: bool) -> Transition {
        if self.visible == visible {
            return Transition::Unchanged;
        }
        self.visible = visible;

        // There is only ever one live token
        self.current.cancel();

        if !visible {
            return Transition::Suspended;
        }

        self.current = self.parent.child_token();
        self.epoch += 1;

        for cb in self.on_renew.iter_mut() {
            cb(&self.current);
        }

        Transition::Renewed(self.current.clone())
    }

    /// Token of the current epoch, read at the moment work starts.
    pub fn current(&self) -> CancellationToken {
        self.current.clone()
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Number of renewals so far.
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Cancels the current epoch for good.
    pub fn close(&mut self) {
        self.visible = false;
        self.current.cancel();
    }
}

impl Drop for VisibilityGate {
    fn drop(&mut self) {
        self.current.cancel();
    }
}
