use serde::{Deserialize, Serialize};

/// Screen coordinate in device pixels. Origin is the top-left corner of the
/// viewport and `y` grows downward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> ScreenPoint {
        self.point_at_relative(0.5, 0.5)
    }

    /// `(0, 0)` is the top-left corner and `(1, 1)` the bottom-right one.
    /// Offsets outside `[0, 1]` extrapolate past the edges.
    pub fn point_at_relative(&self, rel_x: f32, rel_y: f32) -> ScreenPoint {
        ScreenPoint {
            x: self.x + self.width * rel_x,
            y: self.y + self.height * rel_y,
        }
    }

    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint {
            x: self.width as f32 * 0.5,
            y: self.height as f32 * 0.5,
        }
    }

    /// Vertical midpoint of the bottom half of the screen.
    pub fn lower_half_midpoint(&self) -> ScreenPoint {
        ScreenPoint {
            x: self.width as f32 * 0.5,
            y: self.height as f32 * 0.75,
        }
    }

    /// Vertical midpoint of the top half of the screen.
    pub fn upper_half_midpoint(&self) -> ScreenPoint {
        ScreenPoint {
            x: self.width as f32 * 0.5,
            y: self.height as f32 * 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds3 {
    pub center: WorldPoint,
    pub extents: WorldPoint,
}

impl Bounds3 {
    pub fn center(&self) -> WorldPoint {
        self.center
    }
}

pub const DEFAULT_PIXELS_PER_UNIT: f32 = 32.0;

/// Orthographic view. `depth` only matters for hit ordering between routing
/// modules; the projection ignores `z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewCamera {
    pub position: WorldPoint,
    pub pixels_per_unit: f32,
    pub depth: f32,
}

impl Default for ViewCamera {
    fn default() -> Self {
        Self {
            position: WorldPoint::default(),
            pixels_per_unit: DEFAULT_PIXELS_PER_UNIT,
            depth: 0.0,
        }
    }
}

impl ViewCamera {
    pub fn world_to_screen(&self, world: WorldPoint, viewport: Viewport) -> ScreenPoint {
        let x = (world.x - self.position.x) * self.pixels_per_unit + viewport.width as f32 * 0.5;
        let y = viewport.height as f32 * 0.5 - (world.y - self.position.y) * self.pixels_per_unit;
        ScreenPoint { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_maps_to_viewport_center() {
        let camera = ViewCamera::default();
        let point = camera.world_to_screen(WorldPoint::default(), Viewport::new(800, 600));
        assert_eq!(point, ScreenPoint::new(400.0, 300.0));
    }

    #[test]
    fn camera_offset_shifts_screen_position() {
        let camera = ViewCamera {
            position: WorldPoint {
                x: 10.0,
                y: -5.0,
                z: 0.0,
            },
            pixels_per_unit: 10.0,
            depth: 0.0,
        };
        let point = camera.world_to_screen(
            WorldPoint {
                x: 12.0,
                y: -4.0,
                z: 3.0,
            },
            Viewport::new(800, 600),
        );
        assert_eq!(point, ScreenPoint::new(420.0, 290.0));
    }

    #[test]
    fn relative_offsets_are_measured_from_top_left() {
        let rect = ScreenRect::new(100.0, 50.0, 200.0, 40.0);
        assert_eq!(rect.center(), ScreenPoint::new(200.0, 70.0));
        assert_eq!(rect.point_at_relative(0.0, 0.0), ScreenPoint::new(100.0, 50.0));
        assert_eq!(rect.point_at_relative(0.25, 1.0), ScreenPoint::new(150.0, 90.0));
        assert_eq!(rect.point_at_relative(1.5, 0.5), ScreenPoint::new(400.0, 70.0));
    }

    #[test]
    fn contains_excludes_far_edges() {
        let rect = ScreenRect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains(ScreenPoint::new(0.0, 0.0)));
        assert!(rect.contains(ScreenPoint::new(9.9, 9.9)));
        assert!(!rect.contains(ScreenPoint::new(10.0, 5.0)));
        assert!(!rect.contains(ScreenPoint::new(5.0, -0.1)));
    }

    #[test]
    fn half_screen_midpoints() {
        let viewport = Viewport::new(1280, 720);
        assert_eq!(viewport.lower_half_midpoint(), ScreenPoint::new(640.0, 540.0));
        assert_eq!(viewport.upper_half_midpoint(), ScreenPoint::new(640.0, 180.0));
        assert_eq!(viewport.center(), ScreenPoint::new(640.0, 360.0));
    }
}
