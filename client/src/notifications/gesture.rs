//! Gesture resolution for the notification popup.
//!
//! Rendering and animation belong to the UI toolkit; this module only
//! decides where a gesture ends up.

/// Downward release velocity (units per second) that always dismisses.
pub const DISMISS_VELOCITY: f64 = 500.0;
/// Fraction of the popup height past which a drag dismisses.
pub const DISMISS_DISTANCE_RATIO: f64 = 0.3;

pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 3.0;
pub const DOUBLE_TAP_SCALE: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissResolution {
    /// Animate out and close the popup.
    Close,
    /// Spring back to the resting position.
    SpringBack,
}

/// Resolves a vertical drag released with `velocity_y` after moving
/// `translation_y` (positive is downward).
pub fn resolve_dismiss(
    velocity_y: f64,
    translation_y: f64,
    popup_height: f64,
) -> DismissResolution {
    let past_distance = popup_height > 0.0 && translation_y > popup_height * DISMISS_DISTANCE_RATIO;

    if velocity_y > DISMISS_VELOCITY || past_distance {
        DismissResolution::Close
    } else {
        DismissResolution::SpringBack
    }
}

/// Zoom and pan applied to the popup image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageTransform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
    pan_origin: (f64, f64),
}

impl Default for ImageTransform {
    fn default() -> Self {
        Self {
            scale: MIN_SCALE,
            translate_x: 0.0,
            translate_y: 0.0,
            pan_origin: (0.0, 0.0),
        }
    }
}

impl ImageTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_identity(&self) -> bool {
        self.scale == MIN_SCALE && self.translate_x == 0.0 && self.translate_y == 0.0
    }

    pub fn is_zoomed(&self) -> bool {
        self.scale > MIN_SCALE
    }

    /// Applies the pinch gesture's current scale factor.
    pub fn pinch(&mut self, gesture_scale: f64) {
        if gesture_scale.is_nan() {
            return;
        }
        self.scale = gesture_scale.clamp(MIN_SCALE, MAX_SCALE);
    }

    /// Snaps back to identity when the pinch ends unzoomed.
    pub fn pinch_end(&mut self) {
        if self.scale <= MIN_SCALE {
            self.reset();
        }
    }

    pub fn pan_start(&mut self) {
        self.pan_origin = (self.translate_x, self.translate_y);
    }

    /// Moves the image relative to where the pan started; ignored unless zoomed.
    pub fn pan(&mut self, translation_x: f64, translation_y: f64) {
        if self.is_zoomed() {
            self.translate_x = self.pan_origin.0 + translation_x;
            self.translate_y = self.pan_origin.1 + translation_y;
        }
    }

    pub fn double_tap(&mut self) {
        if self.is_zoomed() {
            self.reset();
        } else {
            self.scale = DOUBLE_TAP_SCALE;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
