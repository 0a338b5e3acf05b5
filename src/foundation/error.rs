/// Convenience result type used across the crate.
pub type TwibbonResult<T> = Result<T, TwibbonError>;

/// Error taxonomy for preview mapping, decoding and export.
///
/// Every error is terminal to the single operation that raised it; no operation leaves
/// transform or session state partially updated.
#[derive(thiserror::Error, Debug)]
pub enum TwibbonError {
    /// The supplied file is not a decodable image.
    #[error("invalid asset: {0}")]
    InvalidAsset(String),

    /// Display geometry has a zero or non-finite extent (container not laid out yet).
    #[error("degenerate layout: {0}")]
    DegenerateLayout(String),

    /// Export was requested before the photo or frame finished decoding.
    #[error("asset not ready: {0}")]
    AssetNotReady(String),

    /// The output raster could not be allocated.
    #[error("surface allocation error: {0}")]
    SurfaceAllocation(String),

    /// PNG encoding failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TwibbonError {
    /// Build a [`TwibbonError::InvalidAsset`].
    pub fn invalid_asset(msg: impl Into<String>) -> Self {
        Self::InvalidAsset(msg.into())
    }

    /// Build a [`TwibbonError::DegenerateLayout`].
    pub fn degenerate_layout(msg: impl Into<String>) -> Self {
        Self::DegenerateLayout(msg.into())
    }

    /// Build a [`TwibbonError::AssetNotReady`].
    pub fn asset_not_ready(msg: impl Into<String>) -> Self {
        Self::AssetNotReady(msg.into())
    }

    /// Build a [`TwibbonError::SurfaceAllocation`].
    pub fn surface_allocation(msg: impl Into<String>) -> Self {
        Self::SurfaceAllocation(msg.into())
    }

    /// Build a [`TwibbonError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Whether the UI should show this error to the user.
    ///
    /// Degenerate layouts are retried on the next layout event and never surfaced.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::DegenerateLayout(_))
    }
}
