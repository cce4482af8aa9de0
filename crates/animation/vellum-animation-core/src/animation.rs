use serde::{Deserialize, Serialize};
use vellum_scene_core::Artboard;

use crate::interpolator::CubicInterpolator;
use crate::keyframe::KeyedObject;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    /// Play to the boundary and stop there.
    #[default]
    OneShot,
    /// Wrap to the opposite boundary.
    Loop,
    /// Reflect at each boundary, flipping direction.
    PingPong,
}

fn default_fps() -> u32 {
    60
}

fn default_duration() -> u32 {
    60
}

fn one() -> f32 {
    1.0
}

/// Authored, immutable animation data. Shared between instances via `Arc`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearAnimation {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Length in frames.
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default = "one")]
    pub speed: f32,
    #[serde(default, rename = "loop")]
    pub loop_mode: LoopMode,
    #[serde(default)]
    pub work_start: u32,
    #[serde(default)]
    pub work_end: u32,
    #[serde(default)]
    pub enable_work_area: bool,
    /// Shared easing curves referenced by keyframes.
    #[serde(default)]
    pub interpolators: Vec<CubicInterpolator>,
    #[serde(default)]
    pub keyed_objects: Vec<KeyedObject>,
}

impl Default for LinearAnimation {
    fn default() -> Self {
        Self {
            name: String::new(),
            fps: default_fps(),
            duration: default_duration(),
            speed: 1.0,
            loop_mode: LoopMode::OneShot,
            work_start: 0,
            work_end: 0,
            enable_work_area: false,
            interpolators: Vec::new(),
            keyed_objects: Vec::new(),
        }
    }
}

impl LinearAnimation {
    /// First playable frame.
    pub fn start_frame(&self) -> f32 {
        if self.enable_work_area {
            self.work_start as f32
        } else {
            0.0
        }
    }

    /// Last playable frame.
    pub fn end_frame(&self) -> f32 {
        if self.enable_work_area {
            self.work_end as f32
        } else {
            self.duration as f32
        }
    }

    pub fn start_seconds(&self) -> f32 {
        self.start_frame() / self.fps as f32
    }

    pub fn end_seconds(&self) -> f32 {
        self.end_frame() / self.fps as f32
    }

    pub fn duration_seconds(&self) -> f32 {
        self.end_seconds() - self.start_seconds()
    }

    /// Convert a global time to local frame time within the playable range
    /// according to the loop mode. Used for scrubbing.
    pub fn global_to_local_seconds(&self, seconds: f32) -> f32 {
        match self.loop_mode {
            LoopMode::OneShot => seconds + self.start_seconds(),
            LoopMode::Loop => {
                let d = self.duration_seconds();
                if d <= 0.0 {
                    return self.start_seconds();
                }
                seconds.rem_euclid(d) + self.start_seconds()
            }
            LoopMode::PingPong => {
                let d = self.duration_seconds();
                if d <= 0.0 {
                    return self.start_seconds();
                }
                let local = seconds.rem_euclid(d);
                let cycle = (seconds / d).floor() as i64;
                let local = if cycle.rem_euclid(2) == 0 { local } else { d - local };
                local + self.start_seconds()
            }
        }
    }

    /// Apply every keyed object at `seconds`, blended by `mix`.
    pub fn apply(&self, artboard: &mut Artboard, seconds: f32, mix: f32) {
        for object in &self.keyed_objects {
            object.apply(artboard, seconds, mix, &self.interpolators);
        }
    }

    pub fn validate_basic(&self) -> Result<(), String> {
        if self.fps == 0 {
            return Err(format!("animation '{}' has fps 0", self.name));
        }
        if self.enable_work_area && self.work_end < self.work_start {
            return Err(format!(
                "animation '{}' work area ends ({}) before it starts ({})",
                self.name, self.work_end, self.work_start
            ));
        }
        if !self.speed.is_finite() {
            return Err(format!("animation '{}' speed is not finite", self.name));
        }
        for object in &self.keyed_objects {
            for property in &object.properties {
                for frame in &property.keyframes {
                    if !frame.seconds.is_finite() {
                        return Err(format!(
                            "animation '{}' has a non-finite keyframe time on {}",
                            self.name, object.object
                        ));
                    }
                    if let Some(i) = frame.interpolator {
                        if i >= self.interpolators.len() {
                            return Err(format!(
                                "animation '{}' keyframe references interpolator {i} of {}",
                                self.name,
                                self.interpolators.len()
                            ));
                        }
                    }
                }
                if property.keyframes.windows(2).any(|w| w[1].seconds < w[0].seconds) {
                    return Err(format!(
                        "animation '{}' keyframes on {} are not time-ordered",
                        self.name, object.object
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::{KeyFrame, KeyedProperty};
    use vellum_scene_core::{ComponentId, PropertyKey};

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    #[test]
    fn work_area_bounds_seconds() {
        let mut a = LinearAnimation {
            fps: 2,
            duration: 10,
            ..Default::default()
        };
        approx(a.duration_seconds(), 5.0, 1e-6);
        a.enable_work_area = true;
        a.work_start = 4;
        a.work_end = 10;
        approx(a.start_seconds(), 2.0, 1e-6);
        approx(a.end_seconds(), 5.0, 1e-6);
        approx(a.duration_seconds(), 3.0, 1e-6);
    }

    #[test]
    fn global_to_local_wraps_per_loop_mode() {
        let mut a = LinearAnimation {
            fps: 1,
            duration: 4,
            loop_mode: LoopMode::Loop,
            ..Default::default()
        };
        approx(a.global_to_local_seconds(5.0), 1.0, 1e-6);
        a.loop_mode = LoopMode::PingPong;
        approx(a.global_to_local_seconds(5.0), 3.0, 1e-6);
        a.loop_mode = LoopMode::OneShot;
        approx(a.global_to_local_seconds(5.0), 5.0, 1e-6);
    }

    #[test]
    fn validation_rejects_unordered_keyframes() {
        let a = LinearAnimation {
            name: "bad".into(),
            keyed_objects: vec![KeyedObject::new(
                ComponentId(1),
                vec![KeyedProperty::new(
                    PropertyKey::X,
                    vec![KeyFrame::number(1.0, 0.0), KeyFrame::number(0.5, 1.0)],
                )],
            )],
            ..Default::default()
        };
        let err = a.validate_basic().unwrap_err();
        assert!(err.contains("not time-ordered"), "{err}");
        assert!(LinearAnimation::default().validate_basic().is_ok());
    }
}
