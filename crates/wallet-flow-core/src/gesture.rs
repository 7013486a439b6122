//! Swipe-to-confirm: turns a continuous drag on a bounded track into one
//! discrete confirmation.

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    pub track_length: f64,
    pub thumb_size: f64,
    /// Fraction of `track_length - thumb_size` the thumb must travel.
    pub confirm_threshold_ratio: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            track_length: 320.0,
            thumb_size: 56.0,
            confirm_threshold_ratio: 1.0,
        }
    }
}

impl GestureConfig {
    pub fn max_offset(&self) -> f64 {
        self.track_length - self.thumb_size
    }

    pub fn threshold(&self) -> f64 {
        self.max_offset() * self.confirm_threshold_ratio
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.track_length.is_finite()
            || !self.thumb_size.is_finite()
            || !self.confirm_threshold_ratio.is_finite()
        {
            return Err(ValidationError::InvalidGeometry(
                "dimensions must be finite".to_owned(),
            ));
        }
        if self.thumb_size <= 0.0 || self.thumb_size >= self.track_length {
            return Err(ValidationError::InvalidGeometry(format!(
                "thumb {} does not fit track {}",
                self.thumb_size, self.track_length
            )));
        }
        if self.confirm_threshold_ratio <= 0.0 || self.confirm_threshold_ratio > 1.0 {
            return Err(ValidationError::InvalidGeometry(format!(
                "threshold ratio {} outside (0, 1]",
                self.confirm_threshold_ratio
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GesturePhase {
    Idle,
    Dragging,
    Confirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureState {
    pub current_offset: f64,
    pub threshold: f64,
    pub phase: GesturePhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEndOutcome {
    /// Threshold reached; the confirm event fires with this outcome, once.
    Confirmed,
    /// Released early; the thumb animates back to the start.
    SnappedBack,
    /// Already confirmed. Nothing fires until `reset()`.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct SwipeConfirmGesture {
    config: GestureConfig,
    offset: f64,
    phase: GesturePhase,
}

impl SwipeConfirmGesture {
    pub fn new(config: GestureConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self {
            config,
            offset: 0.0,
            phase: GesturePhase::Idle,
        })
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn state(&self) -> GestureState {
        GestureState {
            current_offset: self.offset,
            threshold: self.config.threshold(),
            phase: self.phase,
        }
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    /// Thumb position as a fraction of the travel, for renderers.
    pub fn progress(&self) -> f64 {
        self.offset / self.config.max_offset()
    }

    pub fn on_drag_update(&mut self, delta_x: f64) -> GesturePhase {
        if self.phase == GesturePhase::Confirmed || !delta_x.is_finite() {
            return self.phase;
        }
        self.offset = (self.offset + delta_x).clamp(0.0, self.config.max_offset());
        self.phase = GesturePhase::Dragging;
        self.phase
    }

    pub fn on_drag_end(&mut self) -> DragEndOutcome {
        match self.phase {
            GesturePhase::Confirmed => DragEndOutcome::Ignored,
            _ if self.offset >= self.config.threshold() => {
                self.offset = self.config.max_offset();
                self.phase = GesturePhase::Confirmed;
                DragEndOutcome::Confirmed
            }
            _ => {
                self.offset = 0.0;
                self.phase = GesturePhase::Idle;
                DragEndOutcome::SnappedBack
            }
        }
    }

    pub fn reset(&mut self) {
        self.offset = 0.0;
        self.phase = GesturePhase::Idle;
    }
}
