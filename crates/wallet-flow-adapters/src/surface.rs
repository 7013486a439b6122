use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use wallet_flow_core::{OverlaySurface, PanelContent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    ShowBusy(String),
    UpdateBusy(String),
    HideBusy,
    Mount(PanelContent),
    Unmount,
}

/// Headless overlay renderer: logs each call and keeps an ordered record a
/// shell or test can inspect. Unmounting waits out the hide animation.
#[derive(Debug, Clone, Default)]
pub struct RecordingOverlaySurface {
    events: Arc<Mutex<Vec<SurfaceEvent>>>,
    hide_delay: Duration,
}

impl RecordingOverlaySurface {
    pub fn with_hide_delay(hide_delay: Duration) -> Self {
        Self {
            events: Arc::default(),
            hide_delay,
        }
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.log().clone()
    }

    pub fn drain(&self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut *self.log())
    }

    fn record(&self, event: SurfaceEvent) {
        self.log().push(event);
    }

    fn log(&self) -> MutexGuard<'_, Vec<SurfaceEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OverlaySurface for RecordingOverlaySurface {
    fn show_busy(&self, label: &str) {
        tracing::info!(label, "busy shown");
        self.record(SurfaceEvent::ShowBusy(label.to_owned()));
    }

    fn update_busy(&self, label: &str) {
        tracing::info!(label, "busy relabelled");
        self.record(SurfaceEvent::UpdateBusy(label.to_owned()));
    }

    fn hide_busy(&self) {
        tracing::debug!("busy hidden");
        self.record(SurfaceEvent::HideBusy);
    }

    fn mount_panel(&self, panel: &PanelContent) {
        match panel {
            PanelContent::Review { title, fee, .. } => {
                tracing::info!(%title, %fee, "review panel mounted")
            }
            PanelContent::Error { heading, message } => {
                tracing::info!(%heading, %message, "error panel mounted")
            }
            PanelContent::Share { title, .. } => tracing::info!(%title, "share panel mounted"),
            PanelContent::Options { title, options } => {
                tracing::info!(%title, count = options.len(), "options panel mounted")
            }
        }
        self.record(SurfaceEvent::Mount(panel.clone()));
    }

    fn unmount_panel(&self) -> impl Future<Output = ()> + Send {
        let surface = self.clone();
        async move {
            if !surface.hide_delay.is_zero() {
                tokio::time::sleep(surface.hide_delay).await;
            }
            tracing::debug!("panel unmounted");
            surface.record(SurfaceEvent::Unmount);
        }
    }

    fn discard_panel(&self) {
        tracing::debug!("panel discarded");
        self.record(SurfaceEvent::Unmount);
    }
}
