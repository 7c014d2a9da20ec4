//! Pluggable frame drawing.

use super::{Surface, VideoSink};
use crate::media::MediaError;
use image::imageops::{self, FilterType};
use thiserror::Error;

/// Errors raised while drawing a frame.
#[derive(Debug, Clone, Error)]
pub enum DrawError {
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error("frame buffer does not match its dimensions")]
    MalformedFrame,
}

/// Draws the sink's current frame onto a surface.
///
/// Any `Fn(&mut VideoSink, &mut Surface) -> Result<(), DrawError>` closure
/// is an image handler. Handlers run on the render thread while holding the
/// session's sink and surface, but not the session lock: they may query the
/// widget (`is_running`, `has_stream`, `stats`, ...) but must not call
/// `capture`, `stop`, `restart` or `clean_up`, which wait for the draw to
/// finish and would deadlock.
pub trait ImageHandler: Send + Sync {
    /// Draws one frame.
    fn draw(&self, video: &mut VideoSink, surface: &mut Surface) -> Result<(), DrawError>;
}

impl<F> ImageHandler for F
where
    F: Fn(&mut VideoSink, &mut Surface) -> Result<(), DrawError> + Send + Sync,
{
    fn draw(&self, video: &mut VideoSink, surface: &mut Surface) -> Result<(), DrawError> {
        self(video, surface)
    }
}

/// Default handler: the whole frame, scaled to the sink size, at the origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawFullFrame;

impl ImageHandler for DrawFullFrame {
    fn draw(&self, video: &mut VideoSink, surface: &mut Surface) -> Result<(), DrawError> {
        let frame = video.read_frame()?;
        tracing::trace!(sequence = frame.sequence(), "drawing frame");
        let image = frame.into_image().ok_or(DrawError::MalformedFrame)?;

        if image.dimensions() == (video.width(), video.height()) {
            surface.draw_image(&image, 0, 0);
        } else {
            let scaled = imageops::resize(&image, video.width(), video.height(), FilterType::Nearest);
            surface.draw_image(&scaled, 0, 0);
        }
        Ok(())
    }
}
