//! Recording surface for testing
//!
//! Provides a RecordingSurface that implements [`Surface`] and records every
//! draw call for test assertions, without requiring a renderer.

use crate::surface::{Color, Rect, Surface};

/// Record of a draw call for test inspection
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    /// A rectangle was filled
    FillRect { rect: Rect, color: Color },
    /// Text was drawn
    Text { text: String, x: f32, y: f32 },
}

/// A surface that records all draw calls instead of rendering
#[derive(Debug, Default)]
pub struct RecordingSurface {
    /// All draw calls made to this surface
    pub calls: Vec<DrawCall>,
    bounds: Rect,
}

impl RecordingSurface {
    /// Create a recording surface of the given size
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            calls: Vec::new(),
            bounds: Rect::new(0.0, 0.0, width, height),
        }
    }

    /// Clear all recorded calls
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Get the number of recorded calls
    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    // === Assertion helpers ===

    /// All text runs in draw order
    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Check if a text run was drawn
    pub fn has_text(&self, needle: &str) -> bool {
        self.texts().iter().any(|t| *t == needle)
    }

    /// Check if a translucent rectangle covering the whole surface was drawn
    pub fn has_overlay(&self) -> bool {
        self.calls.iter().any(|call| {
            matches!(call, DrawCall::FillRect { rect, color }
                if *rect == self.bounds && color.a > 0.0 && color.a < 1.0)
        })
    }
}

impl Surface for RecordingSurface {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.calls.push(DrawCall::FillRect { rect, color });
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, _color: Color) {
        self.calls.push(DrawCall::Text {
            text: text.to_string(),
            x,
            y,
        });
    }
}
