//! Drawing surface abstraction
//!
//! Windows never talk to a GPU or toolkit directly from the core. They draw
//! through this trait, which the host implements on top of whatever renderer
//! it uses. [`crate::mock::RecordingSurface`] implements it for tests.

/// RGBA color as floats (0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Create a new opaque color
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create a new color with alpha
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// White color
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Black color
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Transparent
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);
}

/// Rectangle with position and size
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Check if a point is inside this rectangle
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

/// Render target a window draws itself onto
pub trait Surface {
    /// Full drawable area
    fn bounds(&self) -> Rect;

    /// Fill a rectangle with a (possibly translucent) color
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Draw a run of text with its top-left corner at `(x, y)`
    fn draw_text(&mut self, text: &str, x: f32, y: f32, color: Color);
}
