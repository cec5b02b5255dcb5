use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul};

/// A simple 2D vector struct.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    /// Creates a new Vec2.
    pub fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    /// Vector of the given length pointing `angle` radians counter-clockwise from +x.
    pub fn from_polar(length: f64, angle: f64) -> Self {
        Vec2 { x: length * angle.cos(), y: length * angle.sin() }
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        Vec2::new(self.x * scalar, self.y * scalar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_3;

    #[test]
    fn polar_round_trips_length_and_angle() {
        let v = Vec2::from_polar(3.0, -FRAC_PI_3);
        assert!((v.x.hypot(v.y) - 3.0).abs() < 1e-12);
        assert!((v.y.atan2(v.x) + FRAC_PI_3).abs() < 1e-12);
    }

    #[test]
    fn add_and_scale() {
        let p = Vec2::new(1.0, -2.0) + Vec2::new(0.5, 0.5) * 2.0;
        assert_eq!(p, Vec2::new(2.0, -1.0));
    }
}
