//! Shrinks rendered memes before upload. Animated GIFs are never touched.

use image::ImageFormat;
use std::io::Cursor;
use tracing::debug;

/// Downscale so the longest side is at most `max_side`, re-encoding in the source format.
/// Returns `None` when the image should be sent as is (GIF, already small, undecodable,
/// or the result would not be smaller).
pub fn compress_image(data: &[u8], max_side: u32) -> Option<Vec<u8>> {
    let format = image::guess_format(data).ok()?;
    if format == ImageFormat::Gif {
        return None;
    }
    let img = image::load_from_memory_with_format(data, format).ok()?;
    if img.width() <= max_side && img.height() <= max_side {
        return None;
    }
    let resized = img.thumbnail(max_side, max_side);
    let mut out = Vec::new();
    if let Err(e) = resized.write_to(&mut Cursor::new(&mut out), format) {
        debug!(error = %e, ?format, "Re-encode failed; keeping original");
        return None;
    }
    debug!(before = data.len(), after = out.len(), "Compressed meme image");
    (out.len() < data.len()).then_some(out)
}
