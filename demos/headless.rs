use onlineimage::{
    BindingConfig, BindingWorker, ErrorReport, Geometry, ImageBinding, NetConfig, SchemeProvider, Surface,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// A surface without a window. It has a fixed allocation and only logs redraw requests.
struct HeadlessSurface {
    geometry: Geometry,
}

impl Surface for HeadlessSurface {
    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn queue_draw(&self) {
        log::trace!("redraw requested");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://upload.wikimedia.org/wikipedia/commons/2/2c/Rotating_earth_%28large%29.gif".into());

    // Network side: which schemes we serve, and how much we are willing to download.
    let net_cfg = NetConfig::builder().user_agent("onlineimage-headless/0.1").build()?;
    let provider = Arc::new(SchemeProvider::with_defaults(&net_cfg)?);

    // Binding side: cap animations at 30 fps instead of the default 50.
    let binding_cfg = BindingConfig::builder().max_fps(30).build()?;
    let surface = Arc::new(HeadlessSurface { geometry: Geometry::new(320, 240, 1) });

    // Failures end up here instead of in a dialog.
    let (error_tx, mut error_rx) = mpsc::unbounded_channel::<ErrorReport>();

    let binding = ImageBinding::new(binding_cfg, provider, surface).with_error_sink(Arc::new(error_tx));
    let (handle, join) = BindingWorker::spawn(binding);

    // The "window" the surface lives in. Toggling this pauses and resumes animations.
    let (focus_tx, focus_rx) = watch::channel(true);
    handle.bind_focus_scope(Some(focus_rx)).await?;

    handle.set_source(url.clone()).await?;
    handle.map().await?;

    let mut frames = handle.subscribe_frames();
    let deadline = tokio::time::sleep(Duration::from_secs(5));
    tokio::pin!(deadline);
    let mut painted = 0usize;

    loop {
        tokio::select! {
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(frame) = frames.borrow_and_update().clone() {
                    painted += 1;
                    log::info!("painted frame {:?} ({}x{})", frame.id(), frame.width(), frame.height());
                }
                if painted == 10 {
                    log::info!("window lost focus");
                    let _ = focus_tx.send(false);
                }
            }
            Some(report) = error_rx.recv() => {
                log::error!("{} failed: {}", report.source, report.error);
                break;
            }
            _ = &mut deadline => break,
        }
    }

    log::info!("{painted} frames painted for {url}");
    handle.close().await?;
    join.await?;

    Ok(())
}
