use crate::binding::{BindingCommand, BindingId};
use crate::errors::BindingError;
use crate::render::Frame;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Cloneable handle to a binding owned by a [`crate::binding::BindingWorker`].
#[derive(Clone, Debug)]
pub struct BindingHandle {
    binding_id: BindingId,
    cmd_tx: mpsc::Sender<BindingCommand>,
    frames: watch::Receiver<Option<Arc<Frame>>>,
}

impl BindingHandle {
    pub(crate) fn new(
        binding_id: BindingId,
        cmd_tx: mpsc::Sender<BindingCommand>,
        frames: watch::Receiver<Option<Arc<Frame>>>,
    ) -> Self {
        Self { binding_id, cmd_tx, frames }
    }

    pub fn id(&self) -> BindingId {
        self.binding_id
    }

    /// Latest painted frame. Never blocks.
    pub fn frame(&self) -> Option<Arc<Frame>> {
        self.frames.borrow().clone()
    }

    /// Receiver that is notified every time a frame is painted.
    pub fn subscribe_frames(&self) -> watch::Receiver<Option<Arc<Frame>>> {
        self.frames.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.cmd_tx.is_closed()
    }

    pub async fn send(&self, cmd: BindingCommand) -> Result<(), BindingError> {
        self.cmd_tx.send(cmd).await.map_err(|_| BindingError::WorkerClosed)
    }

    pub async fn set_source<S: Into<String>>(&self, source: S) -> Result<(), BindingError> {
        self.send(BindingCommand::SetSource { source: source.into() }).await
    }

    pub async fn set_visible(&self, visible: bool) -> Result<(), BindingError> {
        self.send(BindingCommand::SetVisible { visible }).await
    }

    pub async fn map(&self) -> Result<(), BindingError> {
        self.send(BindingCommand::Map).await
    }

    pub async fn unmap(&self) -> Result<(), BindingError> {
        self.send(BindingCommand::Unmap).await
    }

    pub async fn bind_focus_scope(&self, scope: Option<watch::Receiver<bool>>) -> Result<(), BindingError> {
        self.send(BindingCommand::BindFocusScope { scope }).await
    }

    pub async fn set_focused(&self, focused: bool) -> Result<(), BindingError> {
        self.send(BindingCommand::SetFocused { focused }).await
    }

    pub async fn geometry_changed(&self) -> Result<(), BindingError> {
        self.send(BindingCommand::GeometryChanged).await
    }

    pub async fn start_animation(&self) -> Result<(), BindingError> {
        self.send(BindingCommand::StartAnimation).await
    }

    pub async fn stop_animation(&self) -> Result<(), BindingError> {
        self.send(BindingCommand::StopAnimation).await
    }

    pub async fn close(&self) -> Result<(), BindingError> {
        self.send(BindingCommand::Close).await
    }
}
