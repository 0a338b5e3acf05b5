//! Preview-to-export coordinate mapping.
//!
//! The live preview and the exported raster both go through [`map_to_output`]; the preview
//! simply maps onto its own rendered frame box (a 1:1 factor), so both agree on relative
//! position, size and rotation whatever the container size or pixel density.

use crate::{
    foundation::core::{Affine, PixelSize, Point, Rect, Size, Vec2},
    foundation::error::{TwibbonError, TwibbonResult},
    transform::state::PhotoTransform,
};

/// On-screen sizes measured at one layout pass, in display pixels.
///
/// Recomputed on every resize; never persisted.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DisplayGeometry {
    /// Preview container size.
    pub container: Size,
    /// Rendered size of the frame image.
    pub frame: Size,
    /// Rendered size of the photo before the transform's scale and rotation.
    pub photo_base: Size,
}

impl DisplayGeometry {
    /// Geometry where the frame fills the container exactly.
    pub fn new(frame: Size, photo_base: Size) -> Self {
        Self {
            container: frame,
            frame,
            photo_base,
        }
    }

    /// Derive geometry the way the preview lays things out: the frame is contain-fitted into
    /// the container and the photo is contain-fitted into the rendered frame box.
    pub fn fit_contain(container: Size, frame_natural: PixelSize, photo_natural: PixelSize) -> Self {
        let frame = contain(frame_natural.to_size(), container);
        let photo_base = contain(photo_natural.to_size(), frame);
        Self {
            container,
            frame,
            photo_base,
        }
    }

    /// Whether the rendered frame has a zero or non-finite extent.
    pub fn is_degenerate(&self) -> bool {
        !(self.frame.width.is_finite()
            && self.frame.height.is_finite()
            && self.frame.width > 0.0
            && self.frame.height > 0.0)
    }

    fn check(&self) -> TwibbonResult<()> {
        if self.is_degenerate() {
            return Err(TwibbonError::degenerate_layout(format!(
                "rendered frame is {}x{}",
                self.frame.width, self.frame.height
            )));
        }
        if !(self.photo_base.width.is_finite() && self.photo_base.height.is_finite()) {
            return Err(TwibbonError::degenerate_layout(
                "photo base size is not finite",
            ));
        }
        Ok(())
    }
}

fn contain(content: Size, bounds: Size) -> Size {
    if content.width <= 0.0 || content.height <= 0.0 {
        return Size::ZERO;
    }
    let k = (bounds.width / content.width).min(bounds.height / content.height);
    if !k.is_finite() || k <= 0.0 {
        return Size::ZERO;
    }
    Size::new(content.width * k, content.height * k)
}

/// Fully resolved photo draw parameters in output-canvas pixel space.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OutputDraw {
    /// Output-space center of the photo.
    pub anchor: Point,
    /// Drawn photo size before rotation.
    pub dest: Size,
    /// Rotation about `anchor`.
    pub rotation_radians: f64,
}

impl OutputDraw {
    /// The unrotated destination rectangle centered on the local origin.
    pub fn dest_rect(&self) -> Rect {
        Rect::new(
            -self.dest.width / 2.0,
            -self.dest.height / 2.0,
            self.dest.width / 2.0,
            self.dest.height / 2.0,
        )
    }

    /// Affine that takes an `image` pixel rectangle at the origin onto the destination.
    ///
    /// Canonical order: `T(anchor) * R(rot) * S(dest / image) * T(-image / 2)`.
    pub fn to_affine(&self, image: PixelSize) -> TwibbonResult<Affine> {
        if image.is_empty() {
            return Err(TwibbonError::invalid_asset("image has zero extent"));
        }
        let image = image.to_size();
        Ok(Affine::translate(self.anchor.to_vec2())
            * Affine::rotate(self.rotation_radians)
            * Affine::scale_non_uniform(self.dest.width / image.width, self.dest.height / image.height)
            * Affine::translate(Vec2::new(-image.width / 2.0, -image.height / 2.0)))
    }
}

/// Map a preview-space transform to drawing parameters on a canvas of `frame_natural` pixels.
///
/// Per-axis factors place the anchor; the photo is sized with the smaller factor so that it is
/// never stretched when the frame's rendered aspect differs from its natural aspect.
pub fn map_to_output(
    transform: &PhotoTransform,
    geometry: &DisplayGeometry,
    frame_natural: PixelSize,
) -> TwibbonResult<OutputDraw> {
    map_onto(transform, geometry, frame_natural.to_size())
}

fn map_onto(
    transform: &PhotoTransform,
    geometry: &DisplayGeometry,
    target: Size,
) -> TwibbonResult<OutputDraw> {
    geometry.check()?;

    let scale_x = target.width / geometry.frame.width;
    let scale_y = target.height / geometry.frame.height;
    let offset = transform.offset();

    let anchor = Point::new(
        (geometry.frame.width / 2.0 + offset.x) * scale_x,
        (geometry.frame.height / 2.0 + offset.y) * scale_y,
    );

    let uniform = scale_x.min(scale_y);
    let dest = Size::new(
        geometry.photo_base.width * transform.scale() * uniform,
        geometry.photo_base.height * transform.scale() * uniform,
    );

    Ok(OutputDraw {
        anchor,
        dest,
        rotation_radians: transform.rotation_radians(),
    })
}

/// Map a point in frame-box display coordinates to output-canvas coordinates.
pub fn display_to_output_point(
    point: Point,
    geometry: &DisplayGeometry,
    frame_natural: PixelSize,
) -> TwibbonResult<Point> {
    geometry.check()?;
    let target = frame_natural.to_size();
    Ok(Point::new(
        point.x * target.width / geometry.frame.width,
        point.y * target.height / geometry.frame.height,
    ))
}

/// Where the preview draws the photo inside the rendered frame box.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct PreviewPlacement {
    /// Photo placement in frame-box display pixels.
    pub draw: OutputDraw,
    /// Offset from the container center.
    pub offset: Vec2,
    /// Transform scale.
    pub scale: f64,
    /// Rotation in degrees.
    pub rotation_degrees: f64,
}

impl PreviewPlacement {
    /// CSS `transform` value for a photo element centered in its container.
    pub fn css_transform(&self) -> String {
        format!(
            "translate(-50%, -50%) translate({}px, {}px) scale({}) rotate({}deg)",
            self.offset.x, self.offset.y, self.scale, self.rotation_degrees
        )
    }
}

/// Display-space placement of the photo, computed with the same mapping as the export.
pub fn preview_placement(
    transform: &PhotoTransform,
    geometry: &DisplayGeometry,
) -> TwibbonResult<PreviewPlacement> {
    let draw = map_onto(transform, geometry, geometry.frame)?;
    Ok(PreviewPlacement {
        draw,
        offset: transform.offset(),
        scale: transform.scale(),
        rotation_degrees: transform.rotation_degrees(),
    })
}
