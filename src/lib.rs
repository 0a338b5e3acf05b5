//! Twibbon places a user photo behind a fixed decorative frame and exports the result at the
//! frame's native resolution.
//!
//! # Pipeline overview
//!
//! 1. **Transform state**: [`PhotoTransform`] holds offset, scale and rotation as edited in the
//!    live preview. Every mutation re-clamps.
//! 2. **Map**: [`map_to_output`] turns the preview-space transform plus the measured
//!    [`DisplayGeometry`] into an [`OutputDraw`] in the frame's natural pixel space.
//! 3. **Composite**: [`Compositor`] draws the photo with the mapped affine, then the frame on top,
//!    and encodes a PNG.
//!
//! The preview uses [`preview_placement`], which runs the same mapping onto the rendered frame
//! box, so preview and export agree.
//!
//! Decoding is the only asynchronous step: [`ImageHandle`] is a single-shot completion cell and
//! export reports [`TwibbonError::AssetNotReady`] instead of waiting.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;
mod mapping;
mod render;
mod session;
mod transform;

pub use assets::decode::{
    AssetKind, PreparedImage, decode_asset, decode_frame, decode_image, validate_content_type,
};
pub use assets::handle::{FrameAsset, ImageHandle, PhotoAsset};
pub use foundation::core::{Affine, PixelSize, Point, Rect, Size, Vec2};
pub use foundation::error::{TwibbonError, TwibbonResult};
pub use mapping::mapper::{
    DisplayGeometry, OutputDraw, PreviewPlacement, display_to_output_point, map_to_output,
    preview_placement,
};
pub use render::compositor::{Compositor, ExportedImage, RenderedFrame, encode_png};
pub use render::settings::{DEFAULT_FILE_NAME, DEFAULT_MAX_SURFACE_DIM, ExportSettings};
pub use session::api::{export_image, load_photo, update_transform};
pub use session::editor::EditorSession;
pub use transform::gesture::{DragGesture, DragOutcome, DragState, PointerEvent, PointerPhase};
pub use transform::state::{
    MAX_ROTATION_DEGREES, PhotoTransform, ROTATE_STEP_DEGREES, ScaleLimits, TransformDelta,
    ZOOM_STEP,
};
