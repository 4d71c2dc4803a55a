//! Window frame math for drag and resize gestures.
use crate::config::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Where the root container sits on the page.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Position {
    /// Anchored to the configured corner through right/bottom offsets.
    #[default]
    Anchored,
    /// Moved by a drag; right/bottom anchoring no longer applies.
    Absolute { left: f64, top: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    pub position: Position,
}

impl Frame {
    pub fn from_theme(theme: &Theme) -> Self {
        Self {
            width: f64::from(theme.window_width),
            height: f64::from(theme.window_height),
            position: Position::Anchored,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeLimits {
    pub min_width: f64,
    pub min_height: f64,
    pub max_width: Option<f64>,
    pub max_height: Option<f64>,
}

impl SizeLimits {
    pub fn from_theme(theme: &Theme) -> Self {
        Self {
            min_width: f64::from(theme.min_window_width),
            min_height: f64::from(theme.min_window_height),
            max_width: theme.max_window_width.map(f64::from),
            max_height: theme.max_window_height.map(f64::from),
        }
    }

    fn clamp_width(&self, width: f64) -> f64 {
        clamp(width, self.min_width, self.max_width)
    }

    fn clamp_height(&self, height: f64) -> f64 {
        clamp(height, self.min_height, self.max_height)
    }
}

fn clamp(value: f64, min: f64, max: Option<f64>) -> f64 {
    let capped = match max {
        Some(max) if max >= min => value.min(max),
        _ => value,
    };
    capped.max(min)
}

/// Header drag in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pointer_origin: Point,
    root_origin: Point,
}

impl DragSession {
    /// `root_origin` is the root container's top-left corner at press time.
    pub fn start(pointer: Point, root_origin: Point) -> Self {
        Self {
            pointer_origin: pointer,
            root_origin,
        }
    }

    pub fn position(&self, pointer: Point) -> Position {
        Position::Absolute {
            left: self.root_origin.x + (pointer.x - self.pointer_origin.x),
            top: self.root_origin.y + (pointer.y - self.pointer_origin.y),
        }
    }
}

/// Corner resize in progress. The handle sits top-left, so the window grows as the pointer
/// moves up and left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeSession {
    pointer_origin: Point,
    start_width: f64,
    start_height: f64,
}

impl ResizeSession {
    pub fn start(pointer: Point, frame: &Frame) -> Self {
        Self {
            pointer_origin: pointer,
            start_width: frame.width,
            start_height: frame.height,
        }
    }

    pub fn size(&self, pointer: Point, limits: &SizeLimits) -> (f64, f64) {
        let dx = pointer.x - self.pointer_origin.x;
        let dy = pointer.y - self.pointer_origin.y;
        (
            limits.clamp_width(self.start_width - dx),
            limits.clamp_height(self.start_height - dy),
        )
    }
}
