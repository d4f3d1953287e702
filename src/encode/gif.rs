use std::io::Write;

use base64::Engine as _;
use image::codecs::gif::{GifEncoder, Repeat};

use crate::{
    encode::sink::{FrameSink, Playback, SinkConfig},
    foundation::error::{DwiError, DwiResult},
    render::composite::FrameRGBA,
    render::job::RenderConfiguration,
};

/// NeuQuant sampling speed passed to the GIF encoder (1 = best, 30 = fastest).
pub const GIF_QUANTIZE_SPEED: i32 = 10;

/// Largest frame side a GIF logical screen can describe.
const MAX_GIF_DIMENSION: u32 = u16::MAX as u32;

/// Streams frames into an animated GIF written to `W`.
///
/// The GIF trailer is written when the encoder is released in [`FrameSink::end`].
pub struct GifSink<W: Write + Send> {
    writer: Option<W>,
    encoder: Option<GifEncoder<W>>,
    cfg: Option<SinkConfig>,
    next_index: u32,
}

impl<W: Write + Send> GifSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            encoder: None,
            cfg: None,
            next_index: 0,
        }
    }
}

impl<W: Write + Send> FrameSink for GifSink<W> {
    fn begin(&mut self, cfg: SinkConfig) -> DwiResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(DwiError::render("gif frame size must be non-zero"));
        }
        if cfg.width > MAX_GIF_DIMENSION || cfg.height > MAX_GIF_DIMENSION {
            return Err(DwiError::render(format!(
                "gif frame size {}x{} exceeds {MAX_GIF_DIMENSION}",
                cfg.width, cfg.height
            )));
        }
        let writer = self
            .writer
            .take()
            .ok_or_else(|| DwiError::render("gif sink already started"))?;

        let mut encoder = GifEncoder::new_with_speed(writer, GIF_QUANTIZE_SPEED);
        if let Some(repeat) = gif_repeat(cfg.playback) {
            encoder
                .set_repeat(repeat)
                .map_err(|e| DwiError::render(format!("gif repeat: {e}")))?;
        }
        self.encoder = Some(encoder);
        self.cfg = Some(cfg);
        self.next_index = 0;
        Ok(())
    }

    fn push_frame(&mut self, index: u32, frame: &FrameRGBA, delay_ms: u32) -> DwiResult<()> {
        let (Some(cfg), Some(encoder)) = (self.cfg.as_ref(), self.encoder.as_mut()) else {
            return Err(DwiError::render("gif sink not started"));
        };
        if index != self.next_index {
            return Err(DwiError::render(format!(
                "gif frames out of order: expected {}, got {index}",
                self.next_index
            )));
        }
        if (frame.width, frame.height) != (cfg.width, cfg.height) {
            return Err(DwiError::render(format!(
                "frame {index} is {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }

        let buffer = image::RgbaImage::from_raw(frame.width, frame.height, frame.to_straight_rgba())
            .ok_or_else(|| DwiError::render("frame buffer does not match its dimensions"))?;
        let delay = image::Delay::from_numer_denom_ms(delay_ms, 1);
        encoder
            .encode_frame(image::Frame::from_parts(buffer, 0, 0, delay))
            .map_err(|e| DwiError::render(format!("gif encode frame {index}: {e}")))?;
        self.next_index += 1;
        Ok(())
    }

    fn end(&mut self) -> DwiResult<()> {
        let Some(cfg) = self.cfg.as_ref() else {
            return Err(DwiError::render("gif sink not started"));
        };
        if self.next_index != cfg.frame_count {
            return Err(DwiError::render(format!(
                "gif ended after {} of {} frames",
                self.next_index, cfg.frame_count
            )));
        }
        // Dropping the encoder writes the trailer.
        drop(self.encoder.take());
        Ok(())
    }
}

/// Netscape loop extension for `playback`; `None` means no extension (play once).
///
/// The extension counts repeats after the first play, so `Times(n)` maps to `n - 1`.
pub fn gif_repeat(playback: Playback) -> Option<Repeat> {
    match playback {
        Playback::Forever => Some(Repeat::Infinite),
        Playback::Times(0 | 1) => None,
        Playback::Times(n) => Some(Repeat::Finite(n - 1)),
    }
}

/// Encode already composed frames into GIF bytes using `config` for timing and looping.
pub fn encode_gif(frames: &[FrameRGBA], config: &RenderConfiguration) -> DwiResult<Vec<u8>> {
    let first = frames
        .first()
        .ok_or_else(|| DwiError::render("cannot encode a gif without frames"))?;
    let delays = config.frame_delays();
    if delays.len() != frames.len() {
        return Err(DwiError::render(format!(
            "{} frames but {} delays",
            frames.len(),
            delays.len()
        )));
    }

    let mut out = Vec::new();
    let mut sink = GifSink::new(&mut out);
    sink.begin(SinkConfig {
        width: first.width,
        height: first.height,
        frame_count: frames.len() as u32,
        playback: Playback::from_loop(config.looping),
    })?;
    for (i, (frame, delay)) in frames.iter().zip(delays).enumerate() {
        sink.push_frame(i as u32, frame, delay)?;
    }
    sink.end()?;
    drop(sink);
    Ok(out)
}

/// `data:image/gif;base64,...` preview of GIF bytes.
pub fn gif_data_url(bytes: &[u8]) -> String {
    format!(
        "data:image/gif;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
