use crate::{
    assets::decode::validate_content_type,
    assets::handle::{FrameAsset, PhotoAsset},
    foundation::core::Size,
    foundation::error::{TwibbonError, TwibbonResult},
    mapping::mapper::{DisplayGeometry, PreviewPlacement, preview_placement},
    render::compositor::ExportedImage,
    render::settings::ExportSettings,
    session::api::export_image,
    transform::gesture::{DragGesture, PointerEvent},
    transform::state::{PhotoTransform, TransformDelta, update_transform},
};

struct LoadedPhoto {
    asset: PhotoAsset,
    transform: PhotoTransform,
}

/// State owned by one editing session: the frame, the current photo and its transform, the
/// photo drag gesture and the last usable preview layout.
///
/// Every method either fully applies its change or leaves the session untouched.
pub struct EditorSession {
    frame: FrameAsset,
    photo: Option<LoadedPhoto>,
    drag: DragGesture,
    geometry: Option<DisplayGeometry>,
    container: Option<Size>,
    settings: ExportSettings,
}

impl EditorSession {
    /// New session with no photo.
    pub fn new(frame: FrameAsset, settings: ExportSettings) -> Self {
        Self {
            frame,
            photo: None,
            drag: DragGesture::new(),
            geometry: None,
            container: None,
            settings,
        }
    }

    /// The frame asset.
    pub fn frame(&self) -> &FrameAsset {
        &self.frame
    }

    /// The current photo, if any.
    pub fn photo(&self) -> Option<&PhotoAsset> {
        self.photo.as_ref().map(|p| &p.asset)
    }

    /// The current transform, if a photo is loaded.
    pub fn transform(&self) -> Option<PhotoTransform> {
        self.photo.as_ref().map(|p| p.transform)
    }

    /// Last accepted layout for the current photo.
    pub fn geometry(&self) -> Option<DisplayGeometry> {
        self.geometry
    }

    /// Validate and start decoding an upload. On rejection the previous photo is kept.
    pub fn upload_photo(&mut self, content_type: &str, bytes: Vec<u8>) -> TwibbonResult<PhotoTransform> {
        validate_content_type(content_type)?;
        Ok(self.set_photo(PhotoAsset::decode_in_background(bytes)))
    }

    /// Replace the photo with an already constructed asset and reset the transform.
    ///
    /// The previous layout described the old photo's base size, so it is dropped; the last
    /// container size is kept and re-fitted once the new photo has decoded.
    pub fn set_photo(&mut self, asset: PhotoAsset) -> PhotoTransform {
        let transform = PhotoTransform::new();
        self.photo = Some(LoadedPhoto { asset, transform });
        self.drag = DragGesture::new();
        self.geometry = None;
        transform
    }

    /// Drop the photo, its transform and its layout.
    pub fn clear_photo(&mut self) {
        self.photo = None;
        self.drag = DragGesture::new();
        self.geometry = None;
    }

    /// Apply an edit from a zoom/rotate control. Returns the new transform.
    pub fn apply(&mut self, delta: &TransformDelta) -> Option<PhotoTransform> {
        let photo = self.photo.as_mut()?;
        photo.transform = update_transform(&photo.transform, delta);
        Some(photo.transform)
    }

    /// Feed a pointer event to the photo drag gesture. Returns the new transform.
    pub fn pointer(&mut self, event: PointerEvent) -> Option<PhotoTransform> {
        let photo = self.photo.as_mut()?;
        photo.transform = self.drag.drag_photo(event, &photo.transform);
        Some(photo.transform)
    }

    /// Record a new preview layout. Degenerate layouts are skipped and the previous one kept.
    pub fn relayout(&mut self, geometry: DisplayGeometry) -> bool {
        if geometry.is_degenerate() {
            tracing::debug!(?geometry, "skipping degenerate layout");
            return false;
        }
        self.geometry = Some(geometry);
        true
    }

    /// Lay out the preview for a container, contain-fitting frame and photo.
    ///
    /// The container is remembered even when the layout cannot be computed yet. Returns
    /// `false` (and keeps the previous layout) until both images have decoded or when the
    /// container has no area.
    pub fn relayout_container(&mut self, container: Size) -> bool {
        self.container = Some(container);
        match self.fit_container(container) {
            Some(geometry) => self.relayout(geometry),
            None => false,
        }
    }

    /// Where the preview should draw the photo.
    pub fn preview_placement(&self) -> TwibbonResult<PreviewPlacement> {
        let photo = self.loaded()?;
        preview_placement(&photo.transform, &self.current_layout()?)
    }

    /// Composite the current state into a PNG.
    pub fn export(&self) -> TwibbonResult<ExportedImage> {
        let result = self.loaded().and_then(|photo| {
            export_image(
                &photo.transform,
                &self.current_layout()?,
                &photo.asset,
                &self.frame,
                &self.settings,
            )
        });
        if let Err(TwibbonError::AssetNotReady(msg)) = &result {
            tracing::warn!(%msg, "export requested before assets were ready");
        }
        result
    }

    fn loaded(&self) -> TwibbonResult<&LoadedPhoto> {
        self.photo
            .as_ref()
            .ok_or_else(|| TwibbonError::asset_not_ready("no photo has been uploaded"))
    }

    fn fit_container(&self, container: Size) -> Option<DisplayGeometry> {
        let frame = self.frame.natural_size()?;
        let photo = self.photo()?.0.natural_size()?;
        Some(DisplayGeometry::fit_contain(container, frame, photo))
    }

    /// Layout for the current photo: the last accepted one, else the remembered container
    /// re-fitted for this photo, else the frame shown at its natural size.
    fn current_layout(&self) -> TwibbonResult<DisplayGeometry> {
        if let Some(g) = self.geometry {
            return Ok(g);
        }
        if let Some(g) = self
            .container
            .and_then(|c| self.fit_container(c))
            .filter(|g| !g.is_degenerate())
        {
            return Ok(g);
        }
        let frame = self.frame.0.get()?.natural_size();
        let photo = self.loaded()?.asset.0.get()?.natural_size();
        Ok(DisplayGeometry::fit_contain(frame.to_size(), frame, photo))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::assets::decode::PreparedImage;
    use crate::assets::handle::ImageHandle;
    use crate::foundation::core::Vec2;

    fn solid(w: u32, h: u32, px: [u8; 4]) -> PreparedImage {
        PreparedImage {
            width: w,
            height: h,
            rgba8_premul: Arc::new(px.repeat((w * h) as usize)),
        }
    }

    fn session() -> EditorSession {
        let mut s = EditorSession::new(
            FrameAsset::from_image(solid(20, 20, [0, 0, 0, 0])),
            ExportSettings::default(),
        );
        s.set_photo(PhotoAsset::from_image(solid(10, 10, [255, 0, 0, 255])));
        s
    }

    #[test]
    fn rejected_upload_keeps_previous_photo() {
        let mut s = session();
        s.apply(&TransformDelta::zoom_in());
        let before = s.transform();
        let err = s.upload_photo("text/plain", vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, TwibbonError::InvalidAsset(_)));
        assert_eq!(s.transform(), before);
        assert!(s.photo().unwrap().0.is_ready());
    }

    #[test]
    fn upload_resets_transform() {
        let mut s = session();
        s.apply(&TransformDelta::translate(5.0, 5.0));
        let t = s.upload_photo("image/png", b"bytes".to_vec()).unwrap();
        assert_eq!(t, PhotoTransform::new());
        assert_eq!(s.transform(), Some(PhotoTransform::new()));
    }

    #[test]
    fn edits_without_photo_are_noops() {
        let mut s = session();
        s.clear_photo();
        assert_eq!(s.apply(&TransformDelta::zoom_in()), None);
        assert_eq!(s.pointer(PointerEvent::start(0.0, 0.0)), None);
        assert!(matches!(s.export(), Err(TwibbonError::AssetNotReady(_))));
    }

    #[test]
    fn degenerate_relayout_keeps_previous_geometry() {
        let mut s = session();
        let good = DisplayGeometry::new(Size::new(200.0, 200.0), Size::new(100.0, 100.0));
        assert!(s.relayout(good));
        assert!(!s.relayout(DisplayGeometry::new(Size::ZERO, Size::ZERO)));
        assert_eq!(s.geometry(), Some(good));
        assert!(!s.relayout_container(Size::ZERO));
        assert_eq!(s.geometry(), Some(good));
    }

    #[test]
    fn pointer_drag_moves_offset() {
        let mut s = session();
        s.pointer(PointerEvent::start(10.0, 10.0));
        s.pointer(PointerEvent::moved(25.0, 5.0));
        let t = s.pointer(PointerEvent::end(30.0, 0.0)).unwrap();
        assert_eq!(t.offset(), Vec2::new(20.0, -10.0));
    }

    #[test]
    fn new_upload_is_laid_out_with_its_own_aspect() {
        let mut s = session();
        s.set_photo(PhotoAsset::from_image(solid(40, 10, [255, 0, 0, 255])));
        assert!(s.relayout_container(Size::new(100.0, 100.0)));
        assert_eq!(s.preview_placement().unwrap().draw.dest, Size::new(100.0, 25.0));

        s.set_photo(PhotoAsset::from_image(solid(10, 40, [0, 0, 255, 255])));
        assert_eq!(s.geometry(), None);
        let dest = s.preview_placement().unwrap().draw.dest;
        assert_eq!(dest, Size::new(25.0, 100.0));
        assert_eq!(dest.width * 4.0, dest.height);

        // Output is the 20x20 frame: the tall photo spans x in [7.5, 12.5].
        let out = s.export().unwrap();
        let img = image::load_from_memory(&out.bytes).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(10, 2).0, [0, 0, 255, 255]);
        assert_eq!(img.get_pixel(2, 10).0, [0, 0, 0, 0]);
    }

    #[test]
    fn clear_photo_drops_layout() {
        let mut s = session();
        assert!(s.relayout_container(Size::new(60.0, 60.0)));
        s.clear_photo();
        assert_eq!(s.geometry(), None);
    }

    #[test]
    fn export_pending_photo_is_not_ready() {
        let mut s = session();
        s.set_photo(PhotoAsset(ImageHandle::pending("photo")));
        let err = s.export().unwrap_err();
        assert!(matches!(err, TwibbonError::AssetNotReady(_)));
        assert!(err.is_user_visible());
    }

    #[test]
    fn export_without_layout_uses_natural_frame_box() {
        let s = session();
        let out = s.export().unwrap();
        assert_eq!((out.width, out.height), (20, 20));
        assert_eq!(out.file_name, "twibbon-image.png");
        let placement = s.preview_placement().unwrap();
        assert_eq!(placement.draw.dest, Size::new(20.0, 20.0));
    }

    #[test]
    fn relayout_container_fits_frame_and_photo() {
        let mut s = session();
        assert!(s.relayout_container(Size::new(100.0, 50.0)));
        let g = s.geometry().unwrap();
        assert_eq!(g.frame, Size::new(50.0, 50.0));
        assert_eq!(g.photo_base, Size::new(50.0, 50.0));
    }
}
