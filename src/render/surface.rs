//! Drawing surfaces and the host that places them in a container.

use crate::config::within_pixel_budget;
use image::{imageops, Rgb, RgbImage};
use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised by a [`SurfaceHost`].
#[derive(Debug, Clone, Error)]
pub enum SurfaceError {
    #[error("container element with id {0} not found")]
    ContainerNotFound(String),
    #[error("failed to detach surface from {container}: {reason}")]
    DetachFailed { container: String, reason: String },
    #[error("surface of {width}x{height} pixels exceeds the allocation limit")]
    TooLarge { width: u32, height: u32 },
}

/// An RGB canvas the render loop draws onto and capture encodes from.
#[derive(Clone)]
pub struct Surface {
    image: RgbImage,
}

impl Surface {
    /// Creates a black surface of the given size.
    ///
    /// Use [`Surface::try_new`] for sizes that come from configuration.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, Rgb([0, 0, 0])),
        }
    }

    /// Creates a black surface, refusing sizes beyond
    /// [`MAX_PIXELS`](crate::config::MAX_PIXELS).
    pub fn try_new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        if !within_pixel_budget(width, height) {
            return Err(SurfaceError::TooLarge { width, height });
        }
        Ok(Self::new(width, height))
    }

    /// Surface width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Surface height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Current contents.
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Mutable access for custom image handlers.
    pub fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }

    /// Copies `source` onto the surface with its top-left corner at `(x, y)`.
    ///
    /// Parts of `source` that fall outside the surface are clipped.
    pub fn draw_image(&mut self, source: &RgbImage, x: i64, y: i64) {
        imageops::replace(&mut self.image, source, x, y);
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Creates and destroys drawing surfaces inside a named container.
pub trait SurfaceHost: Send + Sync {
    /// Creates a surface of the given size and attaches it to `container`.
    fn create_surface(&self, container: &str, width: u32, height: u32)
        -> Result<Surface, SurfaceError>;

    /// Detaches a surface from `container` and drops it.
    fn destroy_surface(&self, container: &str, surface: Surface) -> Result<(), SurfaceError>;
}

/// In-memory host with a fixed set of containers.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    /// Attached surface count per container.
    containers: Mutex<HashMap<String, usize>>,
    fail_detach: bool,
}

impl HeadlessHost {
    /// Creates a host without containers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a host with one container.
    pub fn with_container(id: impl Into<String>) -> Self {
        let host = Self::default();
        host.add_container(id);
        host
    }

    /// Makes every detach fail, for exercising cleanup error paths.
    pub fn failing_detach(mut self) -> Self {
        self.fail_detach = true;
        self
    }

    /// Registers a container.
    pub fn add_container(&self, id: impl Into<String>) {
        self.containers.lock().entry(id.into()).or_insert(0);
    }

    /// Number of surfaces currently attached to `container`.
    pub fn attached(&self, container: &str) -> usize {
        self.containers.lock().get(container).copied().unwrap_or(0)
    }
}

impl SurfaceHost for HeadlessHost {
    fn create_surface(
        &self,
        container: &str,
        width: u32,
        height: u32,
    ) -> Result<Surface, SurfaceError> {
        let mut containers = self.containers.lock();
        let attached = containers
            .get_mut(container)
            .ok_or_else(|| SurfaceError::ContainerNotFound(container.to_string()))?;
        let surface = Surface::try_new(width, height)?;
        *attached += 1;
        Ok(surface)
    }

    fn destroy_surface(&self, container: &str, surface: Surface) -> Result<(), SurfaceError> {
        drop(surface);
        if self.fail_detach {
            return Err(SurfaceError::DetachFailed {
                container: container.to_string(),
                reason: "host refused detach".to_string(),
            });
        }
        let mut containers = self.containers.lock();
        match containers.get_mut(container) {
            Some(attached) => {
                *attached = attached.saturating_sub(1);
                Ok(())
            }
            None => Err(SurfaceError::ContainerNotFound(container.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_draw_clips() {
        let mut surface = Surface::new(4, 4);
        let patch = RgbImage::from_pixel(3, 3, Rgb([255, 0, 0]));

        surface.draw_image(&patch, 2, 2);

        assert_eq!(surface.image().get_pixel(3, 3), &Rgb([255, 0, 0]));
        assert_eq!(surface.image().get_pixel(1, 1), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_host_attach_detach() {
        let host = HeadlessHost::with_container("cam");

        let surface = host.create_surface("cam", 8, 6).unwrap();
        assert_eq!((surface.width(), surface.height()), (8, 6));
        assert_eq!(host.attached("cam"), 1);

        host.destroy_surface("cam", surface).unwrap();
        assert_eq!(host.attached("cam"), 0);
    }

    #[test]
    fn test_oversized_surface_refused() {
        let host = HeadlessHost::with_container("cam");

        assert!(matches!(
            host.create_surface("cam", u32::MAX, u32::MAX),
            Err(SurfaceError::TooLarge { .. })
        ));
        assert_eq!(host.attached("cam"), 0);
    }

    #[test]
    fn test_missing_container() {
        let host = HeadlessHost::new();
        assert!(matches!(
            host.create_surface("cam", 8, 6),
            Err(SurfaceError::ContainerNotFound(_))
        ));
    }
}
