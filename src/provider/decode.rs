use crate::animation::{AnimationFrame, FrameSequence, LoopCount};
use crate::errors::ImageError;
use crate::provider::DecodedSource;
use crate::render::Frame;
use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, DynamicImage, ImageFormat};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Display time for frames that declare none. Zero-delay frames are treated the same way browsers
/// treat them.
pub const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(100);

/// Decodes an encoded image. GIF, APNG and animated WebP become animations when they carry more
/// than one frame, everything else becomes a static frame.
pub fn decode_bytes(bytes: &[u8]) -> Result<DecodedSource, ImageError> {
    let format = image::guess_format(bytes)?;

    match format {
        ImageFormat::Gif => decode_animation(GifDecoder::new(Cursor::new(bytes))?),
        ImageFormat::Png => {
            let decoder = PngDecoder::new(Cursor::new(bytes))?;
            if decoder.is_apng()? {
                decode_animation(decoder.apng()?)
            } else {
                decode_still(DynamicImage::from_decoder(decoder)?)
            }
        }
        ImageFormat::WebP => {
            let decoder = WebPDecoder::new(Cursor::new(bytes))?;
            if decoder.has_animation() {
                decode_animation(decoder)
            } else {
                decode_still(DynamicImage::from_decoder(decoder)?)
            }
        }
        _ => decode_still(image::load_from_memory_with_format(bytes, format)?),
    }
}

/// Runs [`decode_bytes`] on the blocking pool, giving up early when `cancel` fires.
pub async fn decode_off_thread(bytes: Vec<u8>, cancel: &CancellationToken) -> Result<DecodedSource, ImageError> {
    let task = tokio::task::spawn_blocking(move || decode_bytes(&bytes));

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ImageError::Canceled),
        joined = task => match joined {
            Ok(result) => result,
            Err(e) => Err(ImageError::InvalidData(format!("decoder task failed: {e}"))),
        },
    }
}

fn decode_still(img: DynamicImage) -> Result<DecodedSource, ImageError> {
    Ok(DecodedSource::Static(Arc::new(Frame::new(img.into_rgba8()))))
}

fn decode_animation<'a>(decoder: impl AnimationDecoder<'a>) -> Result<DecodedSource, ImageError> {
    let mut frames = decoder
        .into_frames()
        .collect_frames()?
        .into_iter()
        .map(|f| {
            let delay = Duration::from(f.delay());
            let delay = if delay.is_zero() { DEFAULT_FRAME_DELAY } else { delay };
            AnimationFrame::new(Frame::new(f.into_buffer()), delay)
        })
        .collect::<Vec<_>>();

    if frames.len() == 1 {
        let only = frames.remove(0);
        return Ok(DecodedSource::Static(only.frame));
    }

    // The image crate does not expose the loop extension, so animations loop forever
    let sequence = FrameSequence::new(frames, LoopCount::Infinite)?;
    Ok(DecodedSource::Animated(Arc::new(sequence)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{gif_bytes, png_bytes};

    #[test]
    fn png_becomes_a_static_frame() {
        let decoded = decode_bytes(&png_bytes(3, 2)).unwrap();
        match decoded {
            DecodedSource::Static(frame) => {
                assert_eq!(frame.width(), 3);
                assert_eq!(frame.height(), 2);
            }
            other => panic!("expected a static frame, got {:?}", other),
        }
    }

    #[test]
    fn multi_frame_gif_becomes_an_animation() {
        let decoded = decode_bytes(&gif_bytes(&[40, 0, 70])).unwrap();
        let DecodedSource::Animated(anim) = decoded else { panic!("expected an animation") };
        let it = anim.iter();
        assert_eq!(it.delay(), Some(Duration::from_millis(40)));
        assert_eq!(anim.static_frame().size(), it.frame().size());
    }

    #[test]
    fn single_frame_gif_is_static() {
        let decoded = decode_bytes(&gif_bytes(&[40])).unwrap();
        assert!(!decoded.is_animated());
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ImageError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn off_thread_decoding_honours_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = decode_off_thread(png_bytes(2, 2), &cancel).await.unwrap_err();
        assert!(err.is_canceled());
    }
}
