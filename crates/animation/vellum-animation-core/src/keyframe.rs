//! Keyframes and the keyed objects/properties that own them.

use log::warn;
use serde::{Deserialize, Serialize};
use vellum_scene_core::{Artboard, ComponentId, PropertyKey};

use crate::interpolator::CubicInterpolator;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationType {
    /// Keep the from-frame's value until the next frame.
    Hold,
    #[default]
    Linear,
    /// Ease through the frame's cubic interpolator; linear when none is set.
    Cubic,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyFrameValue {
    Number(f32),
    /// Packed ARGB.
    Color(u32),
    Bool(bool),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyFrame {
    pub seconds: f32,
    pub value: KeyFrameValue,
    #[serde(default)]
    pub interpolation: InterpolationType,
    /// Index into the owning animation's interpolator table.
    #[serde(default)]
    pub interpolator: Option<usize>,
}

impl KeyFrame {
    pub fn new(seconds: f32, value: KeyFrameValue) -> Self {
        Self {
            seconds,
            value,
            interpolation: InterpolationType::Linear,
            interpolator: None,
        }
    }

    pub fn number(seconds: f32, value: f32) -> Self {
        Self::new(seconds, KeyFrameValue::Number(value))
    }

    pub fn with_interpolation(mut self, interpolation: InterpolationType) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_interpolator(mut self, index: usize) -> Self {
        self.interpolation = InterpolationType::Cubic;
        self.interpolator = Some(index);
        self
    }
}

/// Time-ordered keyframes for one property of one component.
///
/// Frames must be sorted by `seconds`; they are searched, never re-sorted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyedProperty {
    pub property: PropertyKey,
    pub keyframes: Vec<KeyFrame>,
}

/// Per-channel linear blend of two ARGB colors.
pub fn lerp_color(from: u32, to: u32, mix: f32) -> u32 {
    let channel = |shift: u32| {
        let a = ((from >> shift) & 0xFF) as f32;
        let b = ((to >> shift) & 0xFF) as f32;
        ((a + (b - a) * mix).round().clamp(0.0, 255.0) as u32) << shift
    };
    channel(24) | channel(16) | channel(8) | channel(0)
}

impl KeyedProperty {
    pub fn new(property: PropertyKey, keyframes: Vec<KeyFrame>) -> Self {
        Self {
            property,
            keyframes,
        }
    }

    /// Index of the first frame at or after `seconds`, or `len` when past the
    /// last frame.
    pub fn closest_frame_index(&self, seconds: f32) -> usize {
        let frames = &self.keyframes;
        let Some(last) = frames.last() else {
            return 0;
        };
        if seconds > last.seconds {
            return frames.len();
        }
        let (mut lo, mut hi) = (0usize, frames.len() - 1);
        while lo <= hi {
            let mid = (lo + hi) / 2;
            let t = frames[mid].seconds;
            if t < seconds {
                lo = mid + 1;
            } else if t > seconds {
                if mid == 0 {
                    break;
                }
                hi = mid - 1;
            } else {
                return mid;
            }
        }
        lo
    }

    /// Value this property takes at `seconds`, before mixing.
    pub fn sample(&self, seconds: f32, interpolators: &[CubicInterpolator]) -> Option<KeyFrameValue> {
        let frames = &self.keyframes;
        let index = self.closest_frame_index(seconds);
        if frames.is_empty() {
            return None;
        }
        if index == 0 {
            return Some(frames[0].value);
        }
        if index >= frames.len() {
            return frames.last().map(|f| f.value);
        }
        let from = &frames[index - 1];
        let to = &frames[index];
        if seconds == to.seconds {
            return Some(to.value);
        }
        if from.interpolation == InterpolationType::Hold {
            return Some(from.value);
        }

        let span = to.seconds - from.seconds;
        let mut f = if span > 0.0 {
            (seconds - from.seconds) / span
        } else {
            0.0
        };
        if from.interpolation == InterpolationType::Cubic {
            if let Some(cubic) = from.interpolator.and_then(|i| interpolators.get(i)) {
                f = cubic.transform(f);
            }
        }
        Some(match (from.value, to.value) {
            (KeyFrameValue::Number(a), KeyFrameValue::Number(b)) => KeyFrameValue::Number(a + (b - a) * f),
            (KeyFrameValue::Color(a), KeyFrameValue::Color(b)) => KeyFrameValue::Color(lerp_color(a, b, f)),
            (value, _) => value,
        })
    }

    /// Write the sampled value into `object`, blended with what is there by `mix`.
    pub fn apply(
        &self,
        artboard: &mut Artboard,
        object: ComponentId,
        seconds: f32,
        mix: f32,
        interpolators: &[CubicInterpolator],
    ) {
        let Some(value) = self.sample(seconds, interpolators) else {
            return;
        };
        match value {
            KeyFrameValue::Number(v) => {
                let value = if mix == 1.0 {
                    v
                } else {
                    let current = artboard.get_double(object, self.property).unwrap_or(v);
                    current * (1.0 - mix) + v * mix
                };
                artboard.set_double(object, self.property, value);
            }
            KeyFrameValue::Color(c) => {
                let value = if mix == 1.0 {
                    c
                } else {
                    let current = artboard.get_color(object, self.property).unwrap_or(c);
                    lerp_color(current, c, mix)
                };
                artboard.set_color(object, self.property, value);
            }
            KeyFrameValue::Bool(b) => {
                if mix > 0.0 {
                    artboard.set_bool(object, self.property, b);
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyedObject {
    pub object: ComponentId,
    pub properties: Vec<KeyedProperty>,
}

impl KeyedObject {
    pub fn new(object: ComponentId, properties: Vec<KeyedProperty>) -> Self {
        Self { object, properties }
    }

    pub fn apply(&self, artboard: &mut Artboard, seconds: f32, mix: f32, interpolators: &[CubicInterpolator]) {
        if artboard.resolve(self.object).is_none() {
            warn!("keyed object {} does not resolve; skipping", self.object);
            return;
        }
        for property in &self.properties {
            property.apply(artboard, self.object, seconds, mix, interpolators);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    fn number(v: Option<KeyFrameValue>) -> f32 {
        match v {
            Some(KeyFrameValue::Number(n)) => n,
            other => panic!("expected number, got {other:?}"),
        }
    }

    fn track() -> KeyedProperty {
        KeyedProperty::new(
            PropertyKey::X,
            vec![
                KeyFrame::number(0.0, 0.0),
                KeyFrame::number(1.0, 10.0).with_interpolation(InterpolationType::Hold),
                KeyFrame::number(2.0, 20.0),
                KeyFrame::number(3.0, 40.0),
            ],
        )
    }

    #[test]
    fn closest_frame_index_searches() {
        let t = track();
        assert_eq!(t.closest_frame_index(-1.0), 0);
        assert_eq!(t.closest_frame_index(0.0), 0);
        assert_eq!(t.closest_frame_index(0.5), 1);
        assert_eq!(t.closest_frame_index(2.0), 2);
        assert_eq!(t.closest_frame_index(2.5), 3);
        assert_eq!(t.closest_frame_index(3.0), 3);
        assert_eq!(t.closest_frame_index(3.5), 4);
    }

    #[test]
    fn sample_interpolates_holds_and_clamps() {
        let t = track();
        approx(number(t.sample(-1.0, &[])), 0.0, 1e-6);
        approx(number(t.sample(0.5, &[])), 5.0, 1e-6);
        // frame at 1.0 holds until 2.0
        approx(number(t.sample(1.5, &[])), 10.0, 1e-6);
        approx(number(t.sample(2.0, &[])), 20.0, 1e-6);
        approx(number(t.sample(2.5, &[])), 30.0, 1e-6);
        approx(number(t.sample(9.0, &[])), 40.0, 1e-6);
    }

    #[test]
    fn cubic_frames_use_interpolator_table() {
        let t = KeyedProperty::new(
            PropertyKey::X,
            vec![KeyFrame::number(0.0, 0.0).with_interpolator(0), KeyFrame::number(1.0, 1.0)],
        );
        let ease_in = [CubicInterpolator::new(0.42, 0.0, 1.0, 1.0)];
        assert!(number(t.sample(0.5, &ease_in)) < 0.5);
        // a missing interpolator falls back to linear
        approx(number(t.sample(0.5, &[])), 0.5, 1e-6);
    }

    #[test]
    fn colors_lerp_per_channel() {
        assert_eq!(lerp_color(0xFF00_0000, 0xFFFF_FFFF, 0.5), 0xFF80_8080);
        assert_eq!(lerp_color(0x0000_00FF, 0xFF00_0000, 1.0), 0xFF00_0000);
        let t = KeyedProperty::new(
            PropertyKey::Color,
            vec![
                KeyFrame::new(0.0, KeyFrameValue::Color(0xFF00_0000)),
                KeyFrame::new(1.0, KeyFrameValue::Color(0xFF00_00FF)),
            ],
        );
        assert_eq!(t.sample(0.5, &[]), Some(KeyFrameValue::Color(0xFF00_0080)));
    }

    #[test]
    fn bools_are_held() {
        let t = KeyedProperty::new(
            PropertyKey::IsVisible,
            vec![
                KeyFrame::new(0.0, KeyFrameValue::Bool(true)),
                KeyFrame::new(1.0, KeyFrameValue::Bool(false)),
            ],
        );
        assert_eq!(t.sample(0.99, &[]), Some(KeyFrameValue::Bool(true)));
        assert_eq!(t.sample(1.0, &[]), Some(KeyFrameValue::Bool(false)));
    }
}
