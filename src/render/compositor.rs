use std::{io::Cursor, sync::Arc};

use anyhow::Context;

use crate::{
    assets::decode::PreparedImage,
    assets::handle::{FrameAsset, PhotoAsset},
    foundation::core::{Affine, PixelSize},
    foundation::error::{TwibbonError, TwibbonResult},
    foundation::math::unpremultiply_rgba8_in_place,
    mapping::mapper::OutputDraw,
    render::settings::ExportSettings,
};

/// A composited raster read back from the CPU surface.
#[derive(Clone, Debug)]
pub struct RenderedFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

/// Encoded export plus the name it should be downloaded under.
#[derive(Clone, Debug)]
pub struct ExportedImage {
    /// PNG byte stream.
    pub bytes: Vec<u8>,
    /// Suggested file name.
    pub file_name: String,
    /// Output width (the frame's natural width).
    pub width: u32,
    /// Output height (the frame's natural height).
    pub height: u32,
}

/// Draws photo then frame onto a surface of the frame's natural size.
#[derive(Clone, Debug, Default)]
pub struct Compositor {
    settings: ExportSettings,
}

impl Compositor {
    /// Compositor with the given export settings.
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }

    /// Active settings.
    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Composite and encode to PNG.
    ///
    /// Fails with `AssetNotReady` before touching any surface if either image is still decoding.
    #[tracing::instrument(skip(self, photo, frame), fields(w = frame_size.width, h = frame_size.height))]
    pub fn render(
        &self,
        photo: &PhotoAsset,
        frame: &FrameAsset,
        draw: &OutputDraw,
        frame_size: PixelSize,
    ) -> TwibbonResult<ExportedImage> {
        let photo = photo.0.get()?;
        let frame = frame.0.get()?;

        let rendered = self.rasterize(photo, frame, draw, frame_size)?;
        let bytes = encode_png(&rendered)?;
        tracing::debug!(bytes = bytes.len(), "encoded export");

        Ok(ExportedImage {
            bytes,
            file_name: self.settings.file_name.clone(),
            width: rendered.width,
            height: rendered.height,
        })
    }

    /// Composite into premultiplied RGBA8 without encoding.
    pub fn rasterize(
        &self,
        photo: &PreparedImage,
        frame: &PreparedImage,
        draw: &OutputDraw,
        frame_size: PixelSize,
    ) -> TwibbonResult<RenderedFrame> {
        let (width, height) = self.surface_dims(frame_size)?;
        let photo_affine = draw.to_affine(photo.natural_size())?;
        let photo_paint = image_paint(photo)?;
        let frame_paint = image_paint(frame)?;

        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        let mut ctx = vello_cpu::RenderContext::new(width, height);
        let canvas = vello_cpu::kurbo::Rect::new(0.0, 0.0, f64::from(width), f64::from(height));
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        if let Some([r, g, b, a]) = self.settings.clear_rgba {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.fill_rect(&canvas);
        }

        // Photo: translate to anchor, rotate, draw centered.
        ctx.set_transform(affine_to_cpu(photo_affine));
        ctx.set_paint(photo_paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(photo.width),
            f64::from(photo.height),
        ));

        // Restore: nothing of the photo transform may leak into the frame draw.
        let frame_affine = Affine::scale_non_uniform(
            f64::from(width) / f64::from(frame.width.max(1)),
            f64::from(height) / f64::from(frame.height.max(1)),
        );
        ctx.set_transform(affine_to_cpu(frame_affine));
        ctx.set_paint(frame_paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(frame.width),
            f64::from(frame.height),
        ));

        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        Ok(RenderedFrame {
            width: u32::from(width),
            height: u32::from(height),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn surface_dims(&self, size: PixelSize) -> TwibbonResult<(u16, u16)> {
        if size.is_empty() {
            return Err(TwibbonError::surface_allocation(format!(
                "output surface {}x{} is empty",
                size.width, size.height
            )));
        }
        let max = self.settings.max_surface_dim;
        if size.width > max || size.height > max {
            return Err(TwibbonError::surface_allocation(format!(
                "output surface {}x{} exceeds {max}x{max}",
                size.width, size.height
            )));
        }
        let w: u16 = size.width.try_into().map_err(|_| {
            TwibbonError::surface_allocation("surface width exceeds raster backend limit")
        })?;
        let h: u16 = size.height.try_into().map_err(|_| {
            TwibbonError::surface_allocation("surface height exceeds raster backend limit")
        })?;
        Ok((w, h))
    }
}

/// Encode a rendered frame as straight-alpha PNG.
pub fn encode_png(frame: &RenderedFrame) -> TwibbonResult<Vec<u8>> {
    let mut data = frame.data.clone();
    if frame.premultiplied {
        unpremultiply_rgba8_in_place(&mut data);
    }
    let img = image::RgbaImage::from_raw(frame.width, frame.height, data)
        .ok_or_else(|| TwibbonError::encode("rendered frame byte length mismatch"))?;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("write png")
        .map_err(|e| TwibbonError::encode(format!("{e:#}")))?;
    Ok(buf)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn image_paint(img: &PreparedImage) -> TwibbonResult<vello_cpu::Image> {
    let w: u16 = img
        .width
        .try_into()
        .map_err(|_| TwibbonError::surface_allocation("image width exceeds u16"))?;
    let h: u16 = img
        .height
        .try_into()
        .map_err(|_| TwibbonError::surface_allocation("image height exceeds u16"))?;
    if Some(img.rgba8_premul.len()) != img.natural_size().rgba8_len() {
        return Err(TwibbonError::invalid_asset(
            "prepared image byte length mismatch",
        ));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(img.width as usize * img.height as usize);
    for px in img.rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, may_have_opacities);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}
