//! Single-shot decode completion cells.
//!
//! Decoding is the only asynchronous step in the pipeline. A handle starts pending, is
//! completed exactly once (first write wins), and is read without locking afterwards.

use std::sync::{Arc, OnceLock};

use crate::{
    assets::decode::{AssetKind, PreparedImage, decode_asset},
    foundation::core::PixelSize,
    foundation::error::{TwibbonError, TwibbonResult},
};

type DecodeOutcome = Result<PreparedImage, String>;

/// Shared handle to an image that is decoding or has decoded.
#[derive(Clone, Debug)]
pub struct ImageHandle {
    label: &'static str,
    slot: Arc<OnceLock<DecodeOutcome>>,
}

impl ImageHandle {
    /// A handle whose decode has not completed yet.
    pub fn pending(label: &'static str) -> Self {
        Self {
            label,
            slot: Arc::new(OnceLock::new()),
        }
    }

    /// A handle that is already decoded.
    pub fn ready(label: &'static str, image: PreparedImage) -> Self {
        let handle = Self::pending(label);
        handle.complete(Ok(image));
        handle
    }

    /// Decode on the calling thread.
    pub fn decode_now(label: &'static str, bytes: &[u8], kind: AssetKind) -> Self {
        let handle = Self::pending(label);
        handle.complete(decode_asset(bytes, kind));
        handle
    }

    /// Start decoding on the rayon pool and return immediately.
    pub fn decode_in_background(label: &'static str, bytes: Vec<u8>, kind: AssetKind) -> Self {
        Self::run_in_background(label, move || decode_asset(&bytes, kind))
    }

    fn run_in_background<F>(label: &'static str, decode: F) -> Self
    where
        F: FnOnce() -> TwibbonResult<PreparedImage> + Send + 'static,
    {
        let handle = Self::pending(label);
        let completer = handle.clone();
        rayon::spawn(move || {
            completer.complete(catch_decode_panic(label, decode));
        });
        handle
    }

    /// Record the decode result. Returns `false` if the handle was already complete.
    pub fn complete(&self, result: TwibbonResult<PreparedImage>) -> bool {
        let outcome = result.map_err(|e| e.to_string());
        let ok = outcome.is_ok();
        let first = self.slot.set(outcome).is_ok();
        if first {
            tracing::debug!(asset = self.label, ok, "decode complete");
        }
        first
    }

    /// Name used in log and error messages.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Whether decode finished (successfully or not).
    pub fn is_complete(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Whether decode finished successfully.
    pub fn is_ready(&self) -> bool {
        matches!(self.slot.get(), Some(Ok(_)))
    }

    /// Decoded pixels, or `AssetNotReady` while pending, or `InvalidAsset` if decode failed.
    pub fn get(&self) -> TwibbonResult<&PreparedImage> {
        match self.slot.get() {
            None => Err(TwibbonError::asset_not_ready(format!(
                "{} is still decoding",
                self.label
            ))),
            Some(outcome) => self.resolve(outcome),
        }
    }

    /// Block until decode finishes.
    pub fn wait(&self) -> TwibbonResult<&PreparedImage> {
        self.resolve(self.slot.wait())
    }

    /// Intrinsic size once decoded.
    pub fn natural_size(&self) -> Option<PixelSize> {
        self.get().ok().map(PreparedImage::natural_size)
    }

    fn resolve<'a>(&self, outcome: &'a DecodeOutcome) -> TwibbonResult<&'a PreparedImage> {
        outcome.as_ref().map_err(|msg| {
            TwibbonError::invalid_asset(format!("{} failed to decode: {msg}", self.label))
        })
    }
}

/// A panicking decoder still completes the handle, so waiters never hang.
fn catch_decode_panic<F>(label: &'static str, decode: F) -> TwibbonResult<PreparedImage>
where
    F: FnOnce() -> TwibbonResult<PreparedImage>,
{
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(decode)).unwrap_or_else(|_| {
        tracing::warn!(asset = label, "decoder panicked");
        Err(TwibbonError::invalid_asset(format!("{label} decoder panicked")))
    })
}

/// The user's photo.
#[derive(Clone, Debug)]
pub struct PhotoAsset(pub ImageHandle);

/// The decorative frame; its natural size is the export resolution.
#[derive(Clone, Debug)]
pub struct FrameAsset(pub ImageHandle);

impl PhotoAsset {
    /// Decode a photo synchronously.
    pub fn decode(bytes: &[u8]) -> Self {
        Self(ImageHandle::decode_now("photo", bytes, AssetKind::Photo))
    }

    /// Start decoding a photo in the background.
    pub fn decode_in_background(bytes: Vec<u8>) -> Self {
        Self(ImageHandle::decode_in_background(
            "photo",
            bytes,
            AssetKind::Photo,
        ))
    }

    /// Wrap already-decoded pixels.
    pub fn from_image(image: PreparedImage) -> Self {
        Self(ImageHandle::ready("photo", image))
    }
}

impl FrameAsset {
    /// Decode a frame synchronously.
    pub fn decode(bytes: &[u8]) -> Self {
        Self(ImageHandle::decode_now("frame", bytes, AssetKind::Frame))
    }

    /// Start decoding a frame in the background.
    pub fn decode_in_background(bytes: Vec<u8>) -> Self {
        Self(ImageHandle::decode_in_background(
            "frame",
            bytes,
            AssetKind::Frame,
        ))
    }

    /// Wrap already-decoded pixels.
    pub fn from_image(image: PreparedImage) -> Self {
        Self(ImageHandle::ready("frame", image))
    }

    /// Export resolution, once decoded.
    pub fn natural_size(&self) -> Option<PixelSize> {
        self.0.natural_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_px() -> PreparedImage {
        PreparedImage {
            width: 1,
            height: 1,
            rgba8_premul: Arc::new(vec![1, 2, 3, 255]),
        }
    }

    #[test]
    fn pending_handle_reports_not_ready() {
        let h = ImageHandle::pending("photo");
        assert!(!h.is_complete());
        assert!(matches!(h.get(), Err(TwibbonError::AssetNotReady(_))));
        assert_eq!(h.natural_size(), None);
    }

    #[test]
    fn first_completion_wins() {
        let h = ImageHandle::pending("frame");
        assert!(h.complete(Ok(one_px())));
        assert!(!h.complete(Err(TwibbonError::invalid_asset("late"))));
        assert!(h.is_ready());
        assert_eq!(h.natural_size(), Some(PixelSize::new(1, 1)));
    }

    #[test]
    fn clones_observe_completion() {
        let h = ImageHandle::pending("photo");
        let other = h.clone();
        other.complete(Ok(one_px()));
        assert!(h.is_ready());
    }

    #[test]
    fn failed_decode_surfaces_invalid_asset() {
        let h = ImageHandle::decode_now("photo", b"nope", AssetKind::Photo);
        assert!(h.is_complete());
        assert!(!h.is_ready());
        assert!(matches!(h.get(), Err(TwibbonError::InvalidAsset(_))));
    }

    #[test]
    fn panicking_background_decode_completes_as_invalid() {
        let h = ImageHandle::run_in_background("photo", || panic!("corrupt stream"));
        assert!(matches!(h.wait(), Err(TwibbonError::InvalidAsset(_))));
        assert!(h.is_complete());
    }

    #[test]
    fn background_decode_completes() {
        let h = ImageHandle::decode_in_background("photo", b"nope".to_vec(), AssetKind::Photo);
        assert!(matches!(h.wait(), Err(TwibbonError::InvalidAsset(_))));
        assert!(h.is_complete());
    }
}
