use std::path::Path;

use ffmpeg_next as ffmpeg;
use image::GrayImage;
use log::{info, warn};
use mofreak_core::FrameSource;

use crate::errors::{DatasetError, Result};

/// FFmpeg-backed grayscale decoder for one video file. The input is
/// opened exactly once; decoding consumes the decoder, so a file that
/// vanishes mid-run fails at `open` or not at all.
pub struct GrayVideoDecoder {
    input: ffmpeg::format::context::Input,
    decoder: ffmpeg::decoder::Video,
    stream_index: usize,
    width: u32,
    height: u32,
}

impl GrayVideoDecoder {
    /// Initializes FFmpeg; call once at program start.
    pub fn init() -> Result<()> {
        ffmpeg::init()
            .map_err(|e| DatasetError::Decode(format!("failed to initialize FFmpeg: {e}")))
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let input = ffmpeg::format::input(&path).map_err(|e| {
            DatasetError::UnopenableSource(format!("{}: {e}", path.as_ref().display()))
        })?;

        let stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| DatasetError::Decode("no video stream found".to_string()))?;
        let stream_index = stream.index();

        let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| DatasetError::Decode(format!("failed to create codec context: {e}")))?;
        let decoder = context
            .decoder()
            .video()
            .map_err(|e| DatasetError::Decode(format!("failed to create decoder: {e}")))?;

        let width = decoder.width();
        let height = decoder.height();
        Ok(Self {
            input,
            decoder,
            stream_index,
            width,
            height,
        })
    }

    /// Decodes the video into grayscale frames in decode order.
    ///
    /// A failure mid-stream ends decoding with the frames gathered so far,
    /// so a truncated video still contributes its valid prefix.
    pub fn decode_frames(self) -> Result<Vec<GrayImage>> {
        let GrayVideoDecoder {
            mut input,
            mut decoder,
            stream_index,
            width,
            height,
        } = self;

        let mut scaler = ffmpeg::software::scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::format::Pixel::GRAY8,
            width,
            height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| DatasetError::Decode(format!("failed to create scaler: {e}")))?;

        let mut frames = Vec::new();
        let mut receive = |decoder: &mut ffmpeg::decoder::Video,
                           scaler: &mut ffmpeg::software::scaling::Context|
         -> Option<GrayImage> {
            let mut decoded = ffmpeg::frame::Video::empty();
            match decoder.receive_frame(&mut decoded) {
                Ok(()) => {
                    let mut gray = ffmpeg::frame::Video::empty();
                    if let Err(e) = scaler.run(&decoded, &mut gray) {
                        warn!("frame conversion failed, ending video early: {e}");
                        return None;
                    }
                    Some(gray_frame_to_image(&gray, width, height))
                }
                Err(_) => None,
            }
        };

        for (stream, packet) in input.packets() {
            if stream.index() != stream_index {
                continue;
            }
            if let Err(e) = decoder.send_packet(&packet) {
                warn!("decode failed mid-video, keeping {} frames: {e}", frames.len());
                return Ok(frames);
            }
            while let Some(frame) = receive(&mut decoder, &mut scaler) {
                frames.push(frame);
            }
        }

        if decoder.send_eof().is_ok() {
            while let Some(frame) = receive(&mut decoder, &mut scaler) {
                frames.push(frame);
            }
        }

        info!("decoded {} grayscale frames", frames.len());
        Ok(frames)
    }
}

/// Copies a GRAY8 frame row by row, honoring the FFmpeg stride.
fn gray_frame_to_image(frame: &ffmpeg::frame::Video, width: u32, height: u32) -> GrayImage {
    let stride = frame.stride(0);
    let data = frame.data(0);
    let mut pixels = Vec::with_capacity((width * height) as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + width as usize]);
    }
    GrayImage::from_raw(width, height, pixels).expect("frame buffer matches its dimensions")
}

/// Frame source over a fully decoded video, consumed frame by frame by the
/// assembler.
pub struct BufferedFrameSource {
    frames: std::vec::IntoIter<GrayImage>,
}

impl BufferedFrameSource {
    pub fn new(frames: Vec<GrayImage>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.len() == 0
    }
}

impl FrameSource for BufferedFrameSource {
    fn next_frame(&mut self) -> Option<GrayImage> {
        self.frames.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use mofreak_core::FrameSource;

    #[test]
    fn buffered_source_yields_frames_in_order_then_none() {
        let frames: Vec<GrayImage> = (0..3u8)
            .map(|v| GrayImage::from_pixel(4, 4, Luma([v])))
            .collect();
        let mut source = BufferedFrameSource::new(frames);
        assert_eq!(source.len(), 3);

        for expected in 0..3u8 {
            let frame = source.next_frame().expect("frame should be present");
            assert_eq!(frame.get_pixel(0, 0)[0], expected);
        }
        assert!(source.next_frame().is_none());
        assert!(source.is_empty());
    }

    #[test]
    fn missing_file_fails_at_open() {
        GrayVideoDecoder::init().expect("ffmpeg should initialize");
        let err = GrayVideoDecoder::open("/nonexistent/clip.avi")
            .err()
            .expect("opening a missing file should fail");
        assert!(matches!(err, DatasetError::UnopenableSource(_)));
    }
}
