use super::{Arc, ImageBuffer, ImageFrame, RenderImage, Rgba};
use crate::types::Frame;

pub(super) fn frame_to_image(frame: &Frame) -> Option<Arc<RenderImage>> {
    let mut bgra = frame.rgba.clone();

    // GPUI expects BGRA; convert in place to avoid the async asset pipeline and flicker.
    for px in bgra.chunks_exact_mut(4) {
        px.swap(0, 2);
    }

    let buffer = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(frame.width, frame.height, bgra)?;
    let frame = ImageFrame::new(buffer);

    Some(Arc::new(RenderImage::new(vec![frame])))
}
