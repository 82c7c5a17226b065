//! Math types shared between asset payloads and the renderer.
//!
//! SIMD-accelerated vector types from [`glam`], re-exported so downstream crates
//! do not need to pin their own `glam` version.
//!
//! [`glam`]: https://docs.rs/glam

pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

/// Linear RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color(Vec4);

impl Color {
    pub const TRANSPARENT: Color = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Self::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color(Vec4::new(r, g, b, a))
    }

    pub fn from_array(rgba: [f32; 4]) -> Self {
        Color(Vec4::from_array(rgba))
    }

    pub fn to_array(self) -> [f32; 4] {
        self.0.to_array()
    }
}

impl From<Color> for Vec4 {
    fn from(color: Color) -> Self {
        color.0
    }
}
