//! Composite a photo behind a frame and write `twibbon-image.png`.
//!
//! Usage: `cargo run --example export_png -- <photo> <frame> [out_dir] [offset_x offset_y scale degrees]`

use std::path::PathBuf;

use anyhow::Context;
use twibbon::{
    EditorSession, ExportSettings, FrameAsset, PhotoTransform, Size, TransformDelta, Vec2,
};

fn content_type_for(path: &std::path::Path) -> &'static str {
    match image::ImageFormat::from_path(path) {
        Ok(fmt) => fmt.to_mime_type(),
        Err(_) => "application/octet-stream",
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (Some(photo_path), Some(frame_path)) = (args.first(), args.get(1)) else {
        anyhow::bail!("usage: export_png <photo> <frame> [out_dir] [dx dy scale degrees]");
    };
    let out_dir = PathBuf::from(args.get(2).map(String::as_str).unwrap_or("."));
    let numbers: Vec<f64> = args
        .iter()
        .skip(3)
        .map(|s| s.parse::<f64>())
        .collect::<Result<_, _>>()
        .context("parse transform arguments")?;

    let frame_bytes =
        std::fs::read(frame_path).with_context(|| format!("read frame '{frame_path}'"))?;
    let photo_bytes =
        std::fs::read(photo_path).with_context(|| format!("read photo '{photo_path}'"))?;

    let frame = FrameAsset::decode_in_background(frame_bytes);
    let mut session = EditorSession::new(frame.clone(), ExportSettings::from_env());
    session.upload_photo(content_type_for(std::path::Path::new(photo_path)), photo_bytes)?;

    frame.0.wait()?;
    if let Some(photo) = session.photo() {
        photo.0.wait()?;
    }

    // A 500px square preview, as a phone-sized layout would produce.
    session.relayout_container(Size::new(500.0, 500.0));

    if let [dx, dy, scale, degrees] = numbers[..] {
        session.apply(&TransformDelta {
            offset: Some(Vec2::new(dx, dy)),
            scale: Some(scale),
            rotation_degrees: Some(degrees),
            ..TransformDelta::default()
        });
    }

    let placement = session.preview_placement()?;
    eprintln!("preview css: {}", placement.css_transform());
    eprintln!(
        "transform: {}",
        serde_json::to_string(&session.transform().unwrap_or_else(PhotoTransform::new))?
    );

    let exported = session.export()?;
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("create output dir '{}'", out_dir.display()))?;
    let out = out_dir.join(&exported.file_name);
    std::fs::write(&out, &exported.bytes).with_context(|| format!("write png '{}'", out.display()))?;

    eprintln!("wrote {} ({}x{})", out.display(), exported.width, exported.height);
    Ok(())
}
