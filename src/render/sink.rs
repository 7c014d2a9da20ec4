//! The live video element a stream is attached to.

use crate::media::{Frame, MediaError, MediaStream};

/// Holds the attached stream and the size frames are drawn at.
pub struct VideoSink {
    width: u32,
    height: u32,
    stream: Option<Box<dyn MediaStream>>,
    playing: bool,
}

impl VideoSink {
    /// Creates an empty sink with the viewport size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            stream: None,
            playing: false,
        }
    }

    /// Display width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Display height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Attaches a stream, replacing (and releasing) any previous one.
    pub fn attach(&mut self, stream: Box<dyn MediaStream>) -> Result<(), MediaError> {
        let previous = self.release();
        self.stream = Some(stream);
        previous.map(|_| ())
    }

    /// Starts playback of the attached stream.
    pub fn play(&mut self) {
        self.playing = self.stream.is_some();
    }

    /// Whether a stream is attached.
    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Whether the sink can supply a frame right now.
    pub fn is_ready(&self) -> bool {
        self.playing && self.stream.as_ref().is_some_and(|s| s.is_ready())
    }

    /// Pulls the current frame from the stream.
    pub fn read_frame(&mut self) -> Result<Frame, MediaError> {
        match self.stream.as_mut() {
            Some(stream) if self.playing => stream.read_frame(),
            _ => Err(MediaError::FrameUnavailable),
        }
    }

    /// Stops every track and detaches the stream.
    ///
    /// Returns the number of tracks stopped. The stream is detached even
    /// when stopping fails.
    pub fn release(&mut self) -> Result<usize, MediaError> {
        self.playing = false;
        match self.stream.take() {
            Some(mut stream) => {
                let tracks = stream.track_count();
                stream.stop_tracks()?;
                Ok(tracks)
            }
            None => Ok(0),
        }
    }
}

impl std::fmt::Debug for VideoSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoSink")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("has_stream", &self.stream.is_some())
            .field("playing", &self.playing)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaCapability, MockMedia, StreamConstraints};

    #[test]
    fn test_not_ready_until_playing() {
        let media = MockMedia::new();
        let mut sink = VideoSink::new(32, 24);
        assert!(!sink.is_ready());

        sink.attach(media.acquire(&StreamConstraints::Default).unwrap()).unwrap();
        assert!(!sink.is_ready());
        assert!(sink.read_frame().is_err());

        sink.play();
        assert!(sink.is_ready());
        assert!(sink.read_frame().is_ok());
    }

    #[test]
    fn test_release_stops_tracks() {
        let media = MockMedia::new();
        let mut sink = VideoSink::new(32, 24);
        sink.attach(media.acquire(&StreamConstraints::Default).unwrap()).unwrap();
        sink.play();

        assert_eq!(sink.release().unwrap(), 1);
        assert!(!sink.has_stream());
        assert!(media.all_stopped());
        assert_eq!(sink.release().unwrap(), 0);
    }

    #[test]
    fn test_release_failure_still_detaches() {
        let media = MockMedia::new().failing_track_stop();
        let mut sink = VideoSink::new(32, 24);
        sink.attach(media.acquire(&StreamConstraints::Default).unwrap()).unwrap();

        assert!(sink.release().is_err());
        assert!(!sink.has_stream());
    }
}
