use crate::binding::{BindingCommand, BindingHandle, ImageBinding};
use crate::render::Frame;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

const COMMAND_QUEUE: usize = 64;

/// Task that owns an [`ImageBinding`] and drives its loop.
pub struct BindingWorker {
    binding: ImageBinding,
    cmd_rx: mpsc::Receiver<BindingCommand>,
    frame_tx: watch::Sender<Option<Arc<Frame>>>,
}

impl BindingWorker {
    /// Moves the binding onto its own task. Must be called from within a tokio runtime.
    pub fn spawn(binding: ImageBinding) -> (BindingHandle, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE);
        let (frame_tx, frame_rx) = watch::channel(None);
        let handle = BindingHandle::new(binding.id(), cmd_tx, frame_rx);

        let worker = Self { binding, cmd_rx, frame_tx };
        let join = tokio::spawn(worker.run());
        (handle, join)
    }

    pub async fn run(mut self) {
        log::debug!("Binding[{:?}]: worker started", self.binding.id());

        loop {
            tokio::select! {
                msg = self.cmd_rx.recv() => {
                    let Some(cmd) = msg else {
                        // Every handle is gone
                        break;
                    };
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                event = self.binding.next_event() => {
                    self.binding.handle_event(event);
                }
            }
            self.publish();
        }

        self.binding.close();
        log::debug!("Binding[{:?}]: worker exiting", self.binding.id());
    }

    /// Applies a command. Returns false when the worker should stop.
    fn handle_command(&mut self, cmd: BindingCommand) -> bool {
        log::trace!("Binding[{:?}]: {:?}", self.binding.id(), cmd);

        match cmd {
            BindingCommand::SetSource { source } => self.binding.set_source(&source),
            BindingCommand::SetVisible { visible } => self.binding.set_visible(visible),
            BindingCommand::Map => self.binding.on_map(),
            BindingCommand::Unmap => self.binding.on_unmap(),
            BindingCommand::BindFocusScope { scope } => self.binding.bind_focus_scope(scope),
            BindingCommand::SetFocused { focused } => self.binding.set_focused(focused),
            BindingCommand::GeometryChanged => self.binding.notify_geometry_changed(),
            BindingCommand::StartAnimation => self.binding.start_animation(),
            BindingCommand::StopAnimation => self.binding.stop_animation(),
            BindingCommand::Close => return false,
        }
        true
    }

    /// Paints when the binding asked for it and the surface is mapped. A cleared binding is
    /// published even while hidden, so readers never see a frame it no longer shows.
    fn publish(&mut self) {
        let cleared = self.binding.displayed_frame().is_none();
        if self.binding.needs_repaint() && (self.binding.is_visible() || cleared) {
            let frame = self.binding.paint();
            self.frame_tx.send_replace(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BindingConfig;
    use crate::testing::{MockProvider, TestSurface};

    const A: &str = "https://example.com/a.png";

    fn spawn(mock: &Arc<MockProvider>) -> (BindingHandle, JoinHandle<()>) {
        let surface = Arc::new(TestSurface::new(8, 8, 1));
        BindingWorker::spawn(ImageBinding::new(BindingConfig::default(), mock.clone(), surface))
    }

    async fn wait_for_call(mock: &MockProvider, n: usize) {
        while mock.calls().len() < n {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn publishes_painted_frames() {
        let mock = MockProvider::new();
        let (handle, join) = spawn(&mock);
        let mut frames = handle.subscribe_frames();

        handle.map().await.unwrap();
        handle.set_source(A).await.unwrap();
        wait_for_call(&mock, 1).await;
        mock.resolve_static(A, 4, 4);

        frames.wait_for(|f| f.is_some()).await.unwrap();
        let frame = handle.frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (8, 8));

        handle.close().await.unwrap();
        join.await.unwrap();
        assert!(handle.is_closed());
        assert!(matches!(handle.map().await, Err(crate::errors::BindingError::WorkerClosed)));
    }

    #[tokio::test]
    async fn clearing_the_source_publishes_an_empty_frame() {
        let mock = MockProvider::new();
        let (handle, join) = spawn(&mock);
        let mut frames = handle.subscribe_frames();

        handle.map().await.unwrap();
        handle.set_source(A).await.unwrap();
        wait_for_call(&mock, 1).await;
        mock.resolve_static(A, 4, 4);
        frames.wait_for(|f| f.is_some()).await.unwrap();

        handle.set_source("").await.unwrap();
        frames.wait_for(|f| f.is_none()).await.unwrap();

        handle.close().await.unwrap();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn clearing_while_hidden_drops_the_published_frame() {
        let mock = MockProvider::new();
        let (handle, join) = spawn(&mock);
        let mut frames = handle.subscribe_frames();

        handle.map().await.unwrap();
        handle.set_source(A).await.unwrap();
        wait_for_call(&mock, 1).await;
        mock.resolve_static(A, 4, 4);
        frames.wait_for(|f| f.is_some()).await.unwrap();

        handle.unmap().await.unwrap();
        handle.set_source("").await.unwrap();
        frames.wait_for(|f| f.is_none()).await.unwrap();
        assert!(handle.frame().is_none());

        handle.close().await.unwrap();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn dropping_every_handle_stops_the_worker() {
        let mock = MockProvider::new();
        let (handle, join) = spawn(&mock);
        let other = handle.clone();
        drop(handle);
        drop(other);
        join.await.unwrap();
    }

    #[tokio::test]
    async fn remap_fetches_again() {
        let mock = MockProvider::new();
        let (handle, join) = spawn(&mock);

        handle.map().await.unwrap();
        handle.set_source(A).await.unwrap();
        wait_for_call(&mock, 1).await;
        handle.unmap().await.unwrap();
        handle.map().await.unwrap();
        wait_for_call(&mock, 2).await;
        assert_eq!(mock.calls_for(A), 2);
        assert!(handle.frame().is_none());

        handle.close().await.unwrap();
        join.await.unwrap();
    }
}
