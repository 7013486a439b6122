//! Single-slot arbitration for the busy indicator and the bottom panel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::{OverlayEntry, PanelContent};
use crate::ports::OverlaySurface;

pub struct OverlayCoordinator<S> {
    inner: Arc<OverlayInner<S>>,
}

impl<S> Clone for OverlayCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct OverlayInner<S> {
    surface: S,
    busy: Mutex<Option<String>>,
    panel: Mutex<Option<PanelContent>>,
    // Held across the hide animation so panel changes never overlap.
    panel_ops: tokio::sync::Mutex<()>,
}

impl<S> OverlayCoordinator<S>
where
    S: OverlaySurface,
{
    pub fn new(surface: S) -> Self {
        Self {
            inner: Arc::new(OverlayInner {
                surface,
                busy: Mutex::new(None),
                panel: Mutex::new(None),
                panel_ops: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn surface(&self) -> &S {
        &self.inner.surface
    }

    /// Shows the busy indicator, or relabels it in place when already shown.
    pub fn show_busy(&self, label: &str) {
        let mut busy = self.busy_slot();
        match busy.as_deref() {
            Some(current) if current == label => return,
            Some(_) => self.inner.surface.update_busy(label),
            None => self.inner.surface.show_busy(label),
        }
        *busy = Some(label.to_owned());
    }

    pub fn hide_busy(&self) {
        if self.busy_slot().take().is_some() {
            self.inner.surface.hide_busy();
        }
    }

    /// Replaces the active panel. The old panel is fully unmounted before the
    /// new one mounts; concurrent calls queue behind each other.
    pub async fn present_panel(&self, content: PanelContent) {
        let _serial = self.inner.panel_ops.lock().await;
        let previous = self.panel_slot().take();
        if previous.is_some() {
            self.inner.surface.unmount_panel().await;
        }
        self.inner.surface.mount_panel(&content);
        *self.panel_slot() = Some(content);
    }

    pub async fn dismiss_panel(&self) {
        let _serial = self.inner.panel_ops.lock().await;
        let previous = self.panel_slot().take();
        if previous.is_some() {
            self.inner.surface.unmount_panel().await;
        }
    }

    /// Clears both slots synchronously. Used when the run that owns the
    /// overlays goes away without a chance to await the hide animation.
    pub fn retire_now(&self) {
        self.hide_busy();
        if self.panel_slot().take().is_some() {
            self.inner.surface.discard_panel();
        }
    }

    pub fn busy_label(&self) -> Option<String> {
        self.busy_slot().clone()
    }

    pub fn active_panel(&self) -> Option<PanelContent> {
        self.panel_slot().clone()
    }

    pub fn snapshot(&self) -> Vec<OverlayEntry> {
        let mut entries = Vec::with_capacity(2);
        if let Some(label) = self.busy_label() {
            entries.push(OverlayEntry::Busy(label));
        }
        if let Some(panel) = self.active_panel() {
            entries.push(OverlayEntry::Panel(panel));
        }
        entries
    }

    fn busy_slot(&self) -> MutexGuard<'_, Option<String>> {
        self.inner
            .busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn panel_slot(&self) -> MutexGuard<'_, Option<PanelContent>> {
        self.inner
            .panel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
