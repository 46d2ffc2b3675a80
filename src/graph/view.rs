use eframe::egui::{Pos2, Vec2};

const MIN_SCALE: f32 = 0.05;
const MAX_SCALE: f32 = 8.0;

/// Pan and zoom applied on top of layout coordinates:
/// `screen = origin + translate + world * scale`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub translate: Vec2,
    pub scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: Self = Self {
        translate: Vec2::ZERO,
        scale: 1.0,
    };

    /// Transform that shows `point` at the middle of a `canvas`-sized view.
    pub fn focus_on(point: Vec2, canvas: Vec2, scale: f32) -> Self {
        Self {
            translate: canvas / 2.0 - point * scale,
            scale,
        }
    }

    pub fn world_to_screen(&self, origin: Pos2, world: Vec2) -> Pos2 {
        origin + self.translate + world * self.scale
    }

    pub fn screen_to_world(&self, origin: Pos2, screen: Pos2) -> Vec2 {
        (screen - origin - self.translate) / self.scale
    }

    /// Multiplies the scale by `factor`, keeping the world point under
    /// `anchor` fixed on screen.
    pub fn zoom_about(&mut self, origin: Pos2, anchor: Pos2, factor: f32) {
        let world = self.screen_to_world(origin, anchor);
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.translate = anchor - origin - world * self.scale;
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.translate += delta;
    }
}
