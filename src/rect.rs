use ash::vk::{Extent2D, Offset2D, Rect2D, Viewport};

/// Axis-aligned rectangle used for viewport and scissor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_extent(extent: Extent2D) -> Self {
        Self::new(0.0, 0.0, extent.width as f32, extent.height as f32)
    }

    pub fn to_viewport(self) -> Viewport {
        Viewport {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    pub fn to_scissor(self) -> Rect2D {
        Rect2D {
            offset: Offset2D {
                x: self.x as i32,
                y: self.y as i32,
            },
            extent: Extent2D {
                width: self.width as u32,
                height: self.height as u32,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_uses_full_depth_range() {
        let viewport = Rect::new(0.0, 0.0, 800.0, 600.0).to_viewport();
        assert_eq!(viewport.min_depth, 0.0);
        assert_eq!(viewport.max_depth, 1.0);
        assert_eq!(viewport.width, 800.0);
        assert_eq!(viewport.height, 600.0);
    }

    #[test]
    fn scissor_truncates_to_integers() {
        let scissor = Rect::new(1.9, 2.1, 800.7, 600.2).to_scissor();
        assert_eq!(scissor.offset, Offset2D { x: 1, y: 2 });
        assert_eq!(
            scissor.extent,
            Extent2D {
                width: 800,
                height: 600
            }
        );
    }

    #[test]
    fn from_extent_starts_at_origin() {
        let rect = Rect::from_extent(Extent2D {
            width: 640,
            height: 480,
        });
        assert_eq!(rect, Rect::new(0.0, 0.0, 640.0, 480.0));
    }
}
