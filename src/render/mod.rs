//! Live preview: video sink, drawing surface and the render loop.

mod handler;
mod looping;
mod sink;
mod surface;

pub use handler::{DrawError, DrawFullFrame, ImageHandler};
pub use looping::RenderLoop;
pub use sink::VideoSink;
pub use surface::{HeadlessHost, Surface, SurfaceError, SurfaceHost};
