//! Operations exposed to the surrounding UI.

use crate::{
    assets::decode::validate_content_type,
    assets::handle::{FrameAsset, PhotoAsset},
    foundation::error::{TwibbonError, TwibbonResult},
    mapping::mapper::{DisplayGeometry, map_to_output},
    render::compositor::{Compositor, ExportedImage},
    render::settings::ExportSettings,
    transform::state::PhotoTransform,
};

pub use crate::transform::state::update_transform;

/// Accept an upload and start decoding it; returns the photo handle and a default transform.
///
/// Only the declared content type is checked here. Undecodable bytes surface as
/// `InvalidAsset` when the handle is read.
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn load_photo(content_type: &str, bytes: Vec<u8>) -> TwibbonResult<(PhotoAsset, PhotoTransform)> {
    validate_content_type(content_type)?;
    Ok((PhotoAsset::decode_in_background(bytes), PhotoTransform::new()))
}

/// Map the preview transform to output space and composite a PNG.
///
/// Both images must have finished decoding; otherwise this returns `AssetNotReady` and does
/// no work.
#[tracing::instrument(skip_all)]
pub fn export_image(
    transform: &PhotoTransform,
    geometry: &DisplayGeometry,
    photo: &PhotoAsset,
    frame: &FrameAsset,
    settings: &ExportSettings,
) -> TwibbonResult<ExportedImage> {
    photo.0.get()?;
    let frame_size = frame.0.get()?.natural_size();
    let draw = map_to_output(transform, geometry, frame_size)?;
    Compositor::new(settings.clone())
        .render(photo, frame, &draw, frame_size)
        .inspect_err(|e| {
            if let TwibbonError::SurfaceAllocation(msg) = e {
                tracing::warn!(%msg, "export aborted");
            }
        })
}
