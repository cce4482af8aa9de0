//! Affine helpers shared by transform components and constraints.
//!
//! Coefficients follow kurbo's layout `[a, b, c, d, e, f]`, mapping
//! `x' = a*x + c*y + e` and `y' = b*x + d*y + f`.

use kurbo::{Affine, Point, Vec2};

/// Decomposed form of an affine transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformComponents {
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation: f64,
    pub skew: f64,
}

impl Default for TransformComponents {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            skew: 0.0,
        }
    }
}

impl TransformComponents {
    pub fn translation(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Local transform as translate * rotate * scale.
pub fn local_transform(x: f32, y: f32, rotation: f32, scale_x: f32, scale_y: f32) -> Affine {
    Affine::translate((x as f64, y as f64))
        * Affine::rotate(rotation as f64)
        * Affine::scale_non_uniform(scale_x as f64, scale_y as f64)
}

pub fn decompose(m: &Affine) -> TransformComponents {
    let [m0, m1, m2, m3, m4, m5] = m.as_coeffs();
    let rotation = m1.atan2(m0);
    let denom = m0 * m0 + m1 * m1;
    let scale_x = denom.sqrt();
    let scale_y = if scale_x == 0.0 {
        0.0
    } else {
        (m0 * m3 - m2 * m1) / scale_x
    };
    let skew = (m0 * m2 + m1 * m3).atan2(denom);
    TransformComponents {
        x: m4,
        y: m5,
        scale_x,
        scale_y,
        rotation,
        skew,
    }
}

pub fn compose(c: &TransformComponents) -> Affine {
    let mut m = Affine::translate((c.x, c.y))
        * Affine::rotate(c.rotation)
        * Affine::scale_non_uniform(c.scale_x, c.scale_y);
    if c.skew != 0.0 {
        m *= Affine::new([1.0, 0.0, c.skew.tan(), 1.0, 0.0, 0.0]);
    }
    m
}

/// Inverse of `m`, or `None` when the determinant is zero or not finite.
pub fn invert(m: &Affine) -> Option<Affine> {
    let det = m.determinant();
    if det == 0.0 || !det.is_finite() {
        None
    } else {
        Some(m.inverse())
    }
}

/// Replace the translation column of `m`.
pub fn with_translation(m: &Affine, t: Vec2) -> Affine {
    let [a, b, c, d, _, _] = m.as_coeffs();
    Affine::new([a, b, c, d, t.x, t.y])
}

pub fn translation(m: &Affine) -> Point {
    let [_, _, _, _, e, f] = m.as_coeffs();
    Point::new(e, f)
}

/// Shortest signed angular difference `to - from`, in (-pi, pi].
pub fn angle_delta(from: f64, to: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    let mut diff = (to - from) % TAU;
    if diff > PI {
        diff -= TAU;
    } else if diff <= -PI {
        diff += TAU;
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "left={a} right={b}");
    }

    #[test]
    fn decompose_recovers_components() {
        let m = local_transform(10.0, -4.0, 0.5, 2.0, 3.0);
        let c = decompose(&m);
        approx(c.x, 10.0);
        approx(c.y, -4.0);
        approx(c.rotation, 0.5);
        approx(c.scale_x, 2.0);
        approx(c.scale_y, 3.0);
        approx(c.skew, 0.0);

        let back = compose(&c).as_coeffs();
        for (a, b) in back.iter().zip(m.as_coeffs().iter()) {
            approx(*a, *b);
        }
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let m = Affine::scale_non_uniform(0.0, 1.0);
        assert!(invert(&m).is_none());
        let ok = invert(&Affine::translate((3.0, 4.0))).unwrap();
        let p = ok * Point::new(3.0, 4.0);
        approx(p.x, 0.0);
        approx(p.y, 0.0);
    }

    #[test]
    fn angle_delta_wraps() {
        approx(angle_delta(0.1, -0.1), -0.2);
        approx(angle_delta(3.0, -3.0), 2.0 * std::f64::consts::PI - 6.0);
    }
}
