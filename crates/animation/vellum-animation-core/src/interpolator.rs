//! Cubic bezier easing with a precomputed sample table.
//!
//! The curve runs from (0,0) to (1,1) with control points (x1,y1) and
//! (x2,y2). `transform(x)` solves for the curve parameter whose x equals the
//! input and returns the matching y.

use serde::{Deserialize, Serialize};

const SPLINE_TABLE_SIZE: usize = 11;
const SAMPLE_STEP_SIZE: f32 = 1.0 / (SPLINE_TABLE_SIZE as f32 - 1.0);
const NEWTON_ITERATIONS: usize = 4;
const NEWTON_MIN_SLOPE: f32 = 0.001;
const SUBDIVISION_PRECISION: f32 = 0.000_000_1;
const SUBDIVISION_MAX_ITERATIONS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
struct CubicPoints {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "CubicPoints", into = "CubicPoints")]
pub struct CubicInterpolator {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    values: [f32; SPLINE_TABLE_SIZE],
}

impl From<CubicPoints> for CubicInterpolator {
    fn from(p: CubicPoints) -> Self {
        CubicInterpolator::new(p.x1, p.y1, p.x2, p.y2)
    }
}

impl From<CubicInterpolator> for CubicPoints {
    fn from(c: CubicInterpolator) -> Self {
        CubicPoints {
            x1: c.x1,
            y1: c.y1,
            x2: c.x2,
            y2: c.y2,
        }
    }
}

/// Bezier coordinate at parameter `t` for control values `a1`, `a2`.
fn calc_bezier(t: f32, a1: f32, a2: f32) -> f32 {
    (((1.0 - 3.0 * a2 + 3.0 * a1) * t + (3.0 * a2 - 6.0 * a1)) * t + 3.0 * a1) * t
}

fn get_slope(t: f32, a1: f32, a2: f32) -> f32 {
    3.0 * (1.0 - 3.0 * a2 + 3.0 * a1) * t * t + 2.0 * (3.0 * a2 - 6.0 * a1) * t + 3.0 * a1
}

impl CubicInterpolator {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        let mut values = [0.0; SPLINE_TABLE_SIZE];
        for (i, v) in values.iter_mut().enumerate() {
            *v = calc_bezier(i as f32 * SAMPLE_STEP_SIZE, x1, x2);
        }
        Self {
            x1,
            y1,
            x2,
            y2,
            values,
        }
    }

    pub fn control_points(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    fn newton_raphson(&self, x: f32, mut guess: f32) -> f32 {
        for _ in 0..NEWTON_ITERATIONS {
            let slope = get_slope(guess, self.x1, self.x2);
            if slope == 0.0 {
                return guess;
            }
            let current_x = calc_bezier(guess, self.x1, self.x2) - x;
            guess -= current_x / slope;
        }
        guess
    }

    fn binary_subdivide(&self, x: f32, mut a: f32, mut b: f32) -> f32 {
        let mut current_t = a;
        for _ in 0..SUBDIVISION_MAX_ITERATIONS {
            current_t = a + (b - a) / 2.0;
            let current_x = calc_bezier(current_t, self.x1, self.x2) - x;
            if current_x > 0.0 {
                b = current_t;
            } else {
                a = current_t;
            }
            if current_x.abs() <= SUBDIVISION_PRECISION {
                break;
            }
        }
        current_t
    }

    /// Curve parameter whose x coordinate is `x`.
    fn get_t(&self, x: f32) -> f32 {
        let mut interval_start = 0.0;
        let mut current_sample = 1;
        let last_sample = SPLINE_TABLE_SIZE - 1;

        while current_sample != last_sample && self.values[current_sample] <= x {
            interval_start += SAMPLE_STEP_SIZE;
            current_sample += 1;
        }
        current_sample -= 1;

        let span = self.values[current_sample + 1] - self.values[current_sample];
        let dist = if span == 0.0 {
            0.0
        } else {
            (x - self.values[current_sample]) / span
        };
        let guess = interval_start + dist * SAMPLE_STEP_SIZE;

        let initial_slope = get_slope(guess, self.x1, self.x2);
        if initial_slope >= NEWTON_MIN_SLOPE {
            self.newton_raphson(x, guess)
        } else if initial_slope == 0.0 {
            guess
        } else {
            self.binary_subdivide(x, interval_start, interval_start + SAMPLE_STEP_SIZE)
        }
    }

    /// Eased value for a linear factor in [0, 1].
    pub fn transform(&self, x: f32) -> f32 {
        calc_bezier(self.get_t(x), self.y1, self.y2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    #[test]
    fn linear_control_points_are_identity() {
        let c = CubicInterpolator::new(1.0 / 3.0, 1.0 / 3.0, 2.0 / 3.0, 2.0 / 3.0);
        for i in 0..=10 {
            let x = i as f32 / 10.0;
            approx(c.transform(x), x, 1e-4);
        }
    }

    #[test]
    fn endpoints_are_fixed() {
        let c = CubicInterpolator::new(0.42, 0.0, 0.58, 1.0);
        approx(c.transform(0.0), 0.0, 1e-5);
        approx(c.transform(1.0), 1.0, 1e-4);
        approx(c.transform(0.5), 0.5, 1e-3);
        assert!(c.transform(0.2) < 0.2);
        assert!(c.transform(0.8) > 0.8);
    }

    #[test]
    fn deserializes_from_control_points() {
        let c: CubicInterpolator =
            serde_json::from_str(r#"{ "x1": 0.25, "y1": 0.1, "x2": 0.25, "y2": 1.0 }"#).unwrap();
        assert_eq!(c.control_points(), [0.25, 0.1, 0.25, 1.0]);
        assert!(c.transform(0.5) > 0.5);
    }
}
