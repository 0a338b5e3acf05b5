use crate::foundation::core::Vec2;

/// Multiplicative factor applied by one zoom-in (or divided by one zoom-out).
pub const ZOOM_STEP: f64 = 1.1;

/// Degrees added by one press of the rotate button.
pub const ROTATE_STEP_DEGREES: f64 = 90.0;

/// Upper bound of the rotation slider (inclusive).
pub const MAX_ROTATION_DEGREES: f64 = 360.0;

/// Inclusive bounds for [`PhotoTransform::scale`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScaleLimits {
    /// Smallest allowed scale.
    pub min: f64,
    /// Largest allowed scale.
    pub max: f64,
}

impl ScaleLimits {
    /// Limits used by the zoom controls.
    pub const DEFAULT: Self = Self { min: 0.1, max: 3.0 };

    /// Clamp `scale` into `[min, max]`.
    pub fn clamp(self, scale: f64) -> f64 {
        scale.clamp(self.min, self.max)
    }
}

impl Default for ScaleLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// User-adjustable placement of the photo relative to the frame's visual center.
///
/// Offsets are display-space pixels from the center of the preview container. Fields are
/// private so every mutation goes through a clamping setter: `scale` always lies in
/// [`ScaleLimits::DEFAULT`] and `rotation_degrees` in `[0, 360]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "TransformRepr", into = "TransformRepr")]
pub struct PhotoTransform {
    offset: Vec2,
    scale: f64,
    rotation_degrees: f64,
}

#[derive(Clone, Copy, serde::Serialize, serde::Deserialize)]
struct TransformRepr {
    offset_x: f64,
    offset_y: f64,
    scale: f64,
    rotation_degrees: f64,
}

impl From<TransformRepr> for PhotoTransform {
    fn from(r: TransformRepr) -> Self {
        let mut t = Self::new();
        t.set_offset(Vec2::new(r.offset_x, r.offset_y));
        t.set_scale(r.scale);
        t.set_rotation_degrees(r.rotation_degrees);
        t
    }
}

impl From<PhotoTransform> for TransformRepr {
    fn from(t: PhotoTransform) -> Self {
        Self {
            offset_x: t.offset.x,
            offset_y: t.offset.y,
            scale: t.scale,
            rotation_degrees: t.rotation_degrees,
        }
    }
}

impl Default for PhotoTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl PhotoTransform {
    /// Centered, unscaled, unrotated placement applied on upload.
    pub fn new() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
            rotation_degrees: 0.0,
        }
    }

    /// Offset from the container center, in display pixels.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Scale multiplier on the photo's base display size.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Rotation about the photo's own center, in degrees.
    pub fn rotation_degrees(&self) -> f64 {
        self.rotation_degrees
    }

    /// Rotation in radians.
    pub fn rotation_radians(&self) -> f64 {
        self.rotation_degrees.to_radians()
    }

    /// Replace the offset. Non-finite input is ignored.
    pub fn set_offset(&mut self, offset: Vec2) {
        if offset.is_finite() {
            self.offset = offset;
        }
    }

    /// Move the photo by a display-space delta. Non-finite input is ignored.
    pub fn translate_by(&mut self, delta: Vec2) {
        if delta.is_finite() {
            self.offset += delta;
        }
    }

    /// Set the scale, clamped to [`ScaleLimits::DEFAULT`]. Non-finite input is ignored.
    pub fn set_scale(&mut self, scale: f64) {
        if scale.is_finite() {
            self.scale = ScaleLimits::DEFAULT.clamp(scale);
        }
    }

    /// Multiply the scale by [`ZOOM_STEP`].
    pub fn zoom_in(&mut self) {
        self.set_scale(self.scale * ZOOM_STEP);
    }

    /// Divide the scale by [`ZOOM_STEP`].
    pub fn zoom_out(&mut self) {
        self.set_scale(self.scale / ZOOM_STEP);
    }

    /// Apply `steps` zoom presses at once (negative zooms out).
    ///
    /// Every press moves the scale monotonically, so clamping the closed form once equals
    /// clamping after each press.
    pub fn zoom_by_steps(&mut self, steps: i32) {
        if steps == 0 {
            return;
        }
        let target = self.scale * ZOOM_STEP.powi(steps);
        if !target.is_nan() {
            self.scale = ScaleLimits::DEFAULT.clamp(target);
        }
    }

    /// Slider input: clamp into `[0, 360]`.
    ///
    /// 360 is kept as-is rather than snapped to 0 so that reading the slider back yields the
    /// value that was written.
    pub fn set_rotation_degrees(&mut self, degrees: f64) {
        if degrees.is_finite() {
            self.rotation_degrees = degrees.clamp(0.0, MAX_ROTATION_DEGREES);
        }
    }

    /// Rotate button: add [`ROTATE_STEP_DEGREES`], wrapping into `[0, 360)`.
    pub fn rotate_step(&mut self) {
        self.rotate_steps(1);
    }

    /// `presses` rotate-button presses at once.
    pub fn rotate_steps(&mut self, presses: u32) {
        if presses == 0 {
            return;
        }
        // Four presses are a full turn.
        let turn = ROTATE_STEP_DEGREES * f64::from(presses % 4);
        self.rotation_degrees = (self.rotation_degrees + turn).rem_euclid(MAX_ROTATION_DEGREES);
    }

    /// Back to the upload defaults.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// A batch of transform edits produced by one UI event.
///
/// Fields are applied in declaration order: absolute offset, relative offset, absolute scale,
/// zoom steps, absolute rotation, rotate steps.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TransformDelta {
    /// Replace the offset.
    pub offset: Option<Vec2>,
    /// Add to the offset.
    pub translate: Option<Vec2>,
    /// Replace the scale (clamped).
    pub scale: Option<f64>,
    /// Positive values zoom in, negative values zoom out, one [`ZOOM_STEP`] each.
    pub zoom_steps: i32,
    /// Replace the rotation (slider semantics).
    pub rotation_degrees: Option<f64>,
    /// Rotate-button presses.
    pub rotate_steps: u32,
}

impl TransformDelta {
    /// Absolute offset edit.
    pub fn offset(x: f64, y: f64) -> Self {
        Self {
            offset: Some(Vec2::new(x, y)),
            ..Self::default()
        }
    }

    /// Relative offset edit.
    pub fn translate(dx: f64, dy: f64) -> Self {
        Self {
            translate: Some(Vec2::new(dx, dy)),
            ..Self::default()
        }
    }

    /// Absolute scale edit.
    pub fn scale(scale: f64) -> Self {
        Self {
            scale: Some(scale),
            ..Self::default()
        }
    }

    /// One zoom-in step.
    pub fn zoom_in() -> Self {
        Self {
            zoom_steps: 1,
            ..Self::default()
        }
    }

    /// One zoom-out step.
    pub fn zoom_out() -> Self {
        Self {
            zoom_steps: -1,
            ..Self::default()
        }
    }

    /// Slider rotation edit.
    pub fn rotation(degrees: f64) -> Self {
        Self {
            rotation_degrees: Some(degrees),
            ..Self::default()
        }
    }

    /// One rotate-button press.
    pub fn rotate_step() -> Self {
        Self {
            rotate_steps: 1,
            ..Self::default()
        }
    }

    /// Whether applying this delta can change anything.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Merge `delta` into a copy of `current`; `current` itself is untouched.
pub fn update_transform(current: &PhotoTransform, delta: &TransformDelta) -> PhotoTransform {
    let mut next = *current;
    if let Some(offset) = delta.offset {
        next.set_offset(offset);
    }
    if let Some(d) = delta.translate {
        next.translate_by(d);
    }
    if let Some(s) = delta.scale {
        next.set_scale(s);
    }
    next.zoom_by_steps(delta.zoom_steps);
    if let Some(deg) = delta.rotation_degrees {
        next.set_rotation_degrees(deg);
    }
    next.rotate_steps(delta.rotate_steps);
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_centered_identity() {
        let t = PhotoTransform::new();
        assert_eq!(t.offset(), Vec2::ZERO);
        assert_eq!(t.scale(), 1.0);
        assert_eq!(t.rotation_degrees(), 0.0);
    }

    #[test]
    fn zoom_in_fifty_times_clamps_to_max() {
        let mut t = PhotoTransform::new();
        for _ in 0..50 {
            t.zoom_in();
        }
        assert_eq!(t.scale(), 3.0);
    }

    #[test]
    fn zoom_out_many_times_clamps_to_min() {
        let mut t = PhotoTransform::new();
        for _ in 0..100 {
            t.zoom_out();
        }
        assert_eq!(t.scale(), 0.1);
    }

    #[test]
    fn extreme_zoom_step_counts_clamp_without_iterating() {
        let up = update_transform(
            &PhotoTransform::new(),
            &TransformDelta {
                zoom_steps: i32::MAX,
                ..TransformDelta::default()
            },
        );
        assert_eq!(up.scale(), 3.0);

        let down = update_transform(
            &PhotoTransform::new(),
            &TransformDelta {
                zoom_steps: i32::MIN,
                ..TransformDelta::default()
            },
        );
        assert_eq!(down.scale(), 0.1);
    }

    #[test]
    fn batched_zoom_matches_repeated_presses() {
        let mut pressed = PhotoTransform::new();
        for _ in 0..7 {
            pressed.zoom_in();
        }
        let mut batched = PhotoTransform::new();
        batched.zoom_by_steps(7);
        assert!((pressed.scale() - batched.scale()).abs() < 1e-12);
    }

    #[test]
    fn set_scale_clamps_and_ignores_nan() {
        let mut t = PhotoTransform::new();
        t.set_scale(10.0);
        assert_eq!(t.scale(), 3.0);
        t.set_scale(-1.0);
        assert_eq!(t.scale(), 0.1);
        t.set_scale(f64::NAN);
        assert_eq!(t.scale(), 0.1);
    }

    #[test]
    fn rotation_slider_round_trips_including_360() {
        let mut t = PhotoTransform::new();
        for v in [0.0, 0.5, 45.0, 90.0, 179.25, 359.9, 360.0] {
            t.set_rotation_degrees(v);
            assert_eq!(t.rotation_degrees(), v);
        }
        t.set_rotation_degrees(400.0);
        assert_eq!(t.rotation_degrees(), 360.0);
        t.set_rotation_degrees(-5.0);
        assert_eq!(t.rotation_degrees(), 0.0);
    }

    #[test]
    fn rotate_step_wraps_below_360() {
        let mut t = PhotoTransform::new();
        t.set_rotation_degrees(270.0);
        t.rotate_step();
        assert_eq!(t.rotation_degrees(), 0.0);
        t.set_rotation_degrees(360.0);
        t.rotate_step();
        assert_eq!(t.rotation_degrees(), 90.0);
    }

    #[test]
    fn rotate_steps_match_repeated_presses() {
        let mut pressed = PhotoTransform::new();
        pressed.set_rotation_degrees(360.0);
        let mut batched = pressed;
        for _ in 0..5 {
            pressed.rotate_step();
        }
        batched.rotate_steps(5);
        assert_eq!(pressed.rotation_degrees(), 90.0);
        assert_eq!(batched.rotation_degrees(), 90.0);

        batched.rotate_steps(4);
        assert_eq!(batched.rotation_degrees(), 90.0);
    }

    #[test]
    fn translate_ignores_non_finite() {
        let mut t = PhotoTransform::new();
        t.translate_by(Vec2::new(3.0, -4.0));
        t.translate_by(Vec2::new(f64::INFINITY, 0.0));
        assert_eq!(t.offset(), Vec2::new(3.0, -4.0));
    }

    #[test]
    fn update_transform_is_pure_and_reclamps() {
        let current = PhotoTransform::new();
        let delta = TransformDelta {
            translate: Some(Vec2::new(30.0, 0.0)),
            zoom_steps: 50,
            rotation_degrees: Some(720.0),
            ..TransformDelta::default()
        };
        let next = update_transform(&current, &delta);
        assert_eq!(current, PhotoTransform::new());
        assert_eq!(next.offset(), Vec2::new(30.0, 0.0));
        assert_eq!(next.scale(), 3.0);
        assert_eq!(next.rotation_degrees(), 360.0);
    }

    #[test]
    fn negative_zoom_steps_zoom_out() {
        let next = update_transform(
            &PhotoTransform::new(),
            &TransformDelta {
                zoom_steps: -2,
                ..TransformDelta::default()
            },
        );
        assert!((next.scale() - 1.0 / (1.1 * 1.1)).abs() < 1e-12);
    }

    #[test]
    fn empty_delta_is_noop() {
        let mut t = PhotoTransform::new();
        t.set_scale(2.0);
        assert!(TransformDelta::default().is_empty());
        assert_eq!(update_transform(&t, &TransformDelta::default()), t);
    }

    #[test]
    fn deserialize_clamps_out_of_range_values() {
        let t: PhotoTransform = serde_json::from_str(
            r#"{"offset_x":1.0,"offset_y":2.0,"scale":9.0,"rotation_degrees":-10.0}"#,
        )
        .unwrap();
        assert_eq!(t.offset(), Vec2::new(1.0, 2.0));
        assert_eq!(t.scale(), 3.0);
        assert_eq!(t.rotation_degrees(), 0.0);
    }
}
