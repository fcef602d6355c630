use glam::Vec2;

/// Axis-aligned rectangle in pixels (top-left origin, +Y down).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub const fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// Rectangle spanning two corners, in any order.
    #[inline]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        let min = a.min(b);
        Self::from_origin_size(min, a.max(b) - min)
    }

    #[inline]
    pub fn x(self) -> f32 {
        self.origin.x
    }

    #[inline]
    pub fn y(self) -> f32 {
        self.origin.y
    }

    #[inline]
    pub fn width(self) -> f32 {
        self.size.x
    }

    #[inline]
    pub fn height(self) -> f32 {
        self.size.y
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn center(self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Normalizes the rectangle so width/height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        Self::from_corners(self.min(), self.max())
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        let r = self.normalized();
        p.cmpge(r.min()).all() && p.cmplt(r.max()).all()
    }

    #[inline]
    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let a = self.normalized();
        let b = other.normalized();

        let min = a.min().max(b.min());
        let max = a.max().min(b.max());
        let size = max - min;

        if size.x <= 0.0 || size.y <= 0.0 {
            None
        } else {
            Some(Rect::from_origin_size(min, size))
        }
    }
}

/// Integer viewport/scissor rectangle in backbuffer pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct ViewRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ViewRect {
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Viewport covering a full `width` x `height` target.
    #[inline]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Clips the rectangle against a `target_w` x `target_h` surface.
    ///
    /// Returns `None` if nothing is left.
    pub fn clamped_to(self, target_w: u32, target_h: u32) -> Option<ViewRect> {
        let x0 = self.x.min(target_w);
        let y0 = self.y.min(target_h);
        let x1 = self.x.saturating_add(self.width).min(target_w);
        let y1 = self.y.saturating_add(self.height).min(target_h);
        let r = ViewRect::new(x0, y0, x1 - x0, y1 - y0);
        (!r.is_empty()).then_some(r)
    }
}

impl From<ViewRect> for Rect {
    fn from(r: ViewRect) -> Self {
        Rect::new(r.x as f32, r.y as f32, r.width as f32, r.height as f32)
    }
}
