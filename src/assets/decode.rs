use std::sync::Arc;

use anyhow::Context;

use crate::{
    foundation::core::PixelSize,
    foundation::error::{TwibbonError, TwibbonResult},
    foundation::math::premultiply_rgba8_in_place,
};

/// Decoded raster in premultiplied RGBA8, immutable once built.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Intrinsic pixel size.
    pub fn natural_size(&self) -> PixelSize {
        PixelSize::new(self.width, self.height)
    }
}

/// How a byte buffer should be interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetKind {
    /// User photo: raster formats only.
    Photo,
    /// Decorative frame: raster, or SVG rasterized at its intrinsic size.
    Frame,
}

/// Accept any `image/*` content type, ignoring case, whitespace and parameters.
pub fn validate_content_type(content_type: &str) -> TwibbonResult<()> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.strip_prefix("image/") {
        Some(subtype) if !subtype.is_empty() => Ok(()),
        _ => Err(TwibbonError::invalid_asset(format!(
            "expected an image/* content type, got '{content_type}'"
        ))),
    }
}

/// Decode a raster image into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> TwibbonResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .context("decode image from memory")
        .map_err(|e| TwibbonError::invalid_asset(format!("{e:#}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Decode a frame asset: raster first, SVG as a fallback.
pub fn decode_frame(bytes: &[u8]) -> TwibbonResult<PreparedImage> {
    match decode_image(bytes) {
        Ok(img) => Ok(img),
        Err(raster_err) => {
            let tree = parse_svg(bytes).map_err(|svg_err| {
                TwibbonError::invalid_asset(format!(
                    "frame is neither a raster image ({raster_err}) nor svg ({svg_err})"
                ))
            })?;
            rasterize_svg(&tree)
        }
    }
}

/// Decode `bytes` according to `kind`.
pub fn decode_asset(bytes: &[u8], kind: AssetKind) -> TwibbonResult<PreparedImage> {
    match kind {
        AssetKind::Photo => decode_image(bytes),
        AssetKind::Frame => decode_frame(bytes),
    }
}

fn parse_svg(bytes: &[u8]) -> TwibbonResult<usvg::Tree> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    Ok(tree)
}

/// Rasterize an SVG at its intrinsic size, rounded up to whole pixels.
fn rasterize_svg(tree: &usvg::Tree) -> TwibbonResult<PreparedImage> {
    fn to_px(v: f32) -> TwibbonResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(TwibbonError::invalid_asset("svg has invalid width/height"));
        }
        Ok((v.ceil() as u32).max(1))
    }

    let size = tree.size();
    let width = to_px(size.width())?;
    let height = to_px(size.height())?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
        TwibbonError::surface_allocation(format!("failed to allocate {width}x{height} svg pixmap"))
    })?;

    let sx = (width as f32) / size.width();
    let sy = (height as f32) / size.height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);
    resvg::render(tree, xform, &mut pixmap.as_mut());

    // tiny-skia pixmaps are already premultiplied RGBA8.
    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(pixmap.take()),
    })
}
