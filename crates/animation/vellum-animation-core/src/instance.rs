//! Playback state for one animation.
//!
//! Time is kept in seconds but boundary handling is done in frames so that
//! work-area bounds are exact. `advance` returns whether the instance still
//! has something to play.

use std::sync::Arc;

use log::warn;
use vellum_scene_core::Artboard;

use crate::animation::{LinearAnimation, LoopMode};

#[derive(Clone, Debug)]
pub struct LinearAnimationInstance {
    animation: Arc<LinearAnimation>,
    time: f32,
    total_time: f32,
    last_total_time: f32,
    spilled_time: f32,
    direction: f32,
    speed: f32,
    loop_override: Option<LoopMode>,
    did_loop: bool,
}

impl LinearAnimationInstance {
    pub fn new(animation: Arc<LinearAnimation>) -> Self {
        Self::with_speed(animation, 1.0)
    }

    /// `speed` multiplies the animation's own speed (a state's speed, say).
    pub fn with_speed(animation: Arc<LinearAnimation>, speed: f32) -> Self {
        let time = if animation.speed * speed >= 0.0 {
            animation.start_seconds()
        } else {
            animation.end_seconds()
        };
        Self {
            animation,
            time,
            total_time: 0.0,
            last_total_time: 0.0,
            spilled_time: 0.0,
            direction: 1.0,
            speed,
            loop_override: None,
            did_loop: false,
        }
    }

    pub fn animation(&self) -> &Arc<LinearAnimation> {
        &self.animation
    }

    pub fn name(&self) -> &str {
        &self.animation.name
    }

    /// Current local time in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Seek. Total and last-total time move in lockstep so exit-time checks
    /// keep seeing the same step size.
    pub fn set_time(&mut self, seconds: f32) {
        if self.time == seconds {
            return;
        }
        self.time = seconds;
        let step = self.total_time - self.last_total_time;
        self.total_time = seconds - self.animation.start_seconds();
        self.last_total_time = self.total_time - step;
    }

    /// Accumulated absolute playback time, ignoring wraps.
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// `total_time` before the most recent advance.
    pub fn last_total_time(&self) -> f32 {
        self.last_total_time
    }

    /// Time that ran past a one-shot boundary during the last advance.
    pub fn spilled_time(&self) -> f32 {
        self.spilled_time
    }

    pub(crate) fn clear_spilled_time(&mut self) {
        self.spilled_time = 0.0;
    }

    pub fn direction(&self) -> f32 {
        self.direction
    }

    /// +1 plays forward, -1 backward. Other values are normalized by sign.
    pub fn set_direction(&mut self, direction: f32) {
        self.direction = if direction < 0.0 { -1.0 } else { 1.0 };
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_override.unwrap_or(self.animation.loop_mode)
    }

    /// Override the authored loop mode for this instance only.
    pub fn set_loop_mode(&mut self, mode: Option<LoopMode>) {
        self.loop_override = mode;
    }

    /// Whether the last advance wrapped, reflected or clamped.
    pub fn did_loop(&self) -> bool {
        self.did_loop
    }

    pub fn advance(&mut self, elapsed_seconds: f32) -> bool {
        let animation = Arc::clone(&self.animation);
        let delta = elapsed_seconds * animation.speed * self.speed * self.direction;
        self.spilled_time = 0.0;
        if !(self.time + delta).is_finite() {
            warn!("animation '{}' ignored a non-finite advance", animation.name);
            self.did_loop = false;
            return true;
        }
        if delta == 0.0 {
            self.did_loop = false;
            return true;
        }

        self.last_total_time = self.total_time;
        self.total_time += delta.abs();
        self.time += delta;

        let fps = animation.fps as f32;
        let mut frames = self.time * fps;
        let start = animation.start_frame();
        let end = animation.end_frame();
        let range = end - start;
        let direction = if delta < 0.0 { -1.0 } else { 1.0 };
        let mut keep_going = true;
        let mut did_loop = false;

        match self.loop_mode() {
            LoopMode::OneShot => {
                if direction > 0.0 && frames > end {
                    keep_going = false;
                    self.spilled_time = (frames - end) / fps;
                    frames = end;
                    self.time = frames / fps;
                    did_loop = true;
                } else if direction < 0.0 && frames < start {
                    keep_going = false;
                    self.spilled_time = (start - frames) / fps;
                    frames = start;
                    self.time = frames / fps;
                    did_loop = true;
                }
            }
            LoopMode::Loop => {
                if range <= 0.0 {
                    self.time = start / fps;
                    did_loop = true;
                } else if direction > 0.0 && frames >= end {
                    self.spilled_time = (frames - end) / fps;
                    frames = start + (frames - start) % range;
                    self.time = frames / fps;
                    did_loop = true;
                } else if direction < 0.0 && frames <= start {
                    self.spilled_time = (start - frames) / fps;
                    frames = end - ((start - frames) % range).abs();
                    self.time = frames / fps;
                    did_loop = true;
                }
            }
            LoopMode::PingPong => {
                if range <= 0.0 {
                    self.time = start / fps;
                    did_loop = true;
                } else {
                    let overshoot = if direction > 0.0 && frames >= end {
                        Some(frames - end)
                    } else if direction < 0.0 && frames < start {
                        Some(start - frames)
                    } else {
                        None
                    };
                    if let Some(overshoot) = overshoot {
                        // Fold whole there-and-back sweeps away; what is left
                        // crosses one boundary (odd reflections) or two (even).
                        let rest = overshoot.rem_euclid(2.0 * range);
                        let odd = if direction > 0.0 { rest <= range } else { rest < range };
                        let (near, far) = if direction > 0.0 { (end, start) } else { (start, end) };
                        if odd {
                            self.spilled_time = rest / fps;
                            frames = near - direction * rest;
                            self.direction = -self.direction;
                        } else {
                            self.spilled_time = (rest - range) / fps;
                            frames = far + direction * (rest - range);
                        }
                        self.time = frames / fps;
                        did_loop = true;
                    }
                }
            }
        }

        self.did_loop = did_loop;
        keep_going
    }

    pub fn apply(&self, artboard: &mut Artboard, mix: f32) {
        self.animation.apply(artboard, self.time, mix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-5, "left={a} right={b}");
    }

    fn anim(loop_mode: LoopMode) -> Arc<LinearAnimation> {
        Arc::new(LinearAnimation {
            fps: 2,
            duration: 10,
            loop_mode,
            ..Default::default()
        })
    }

    #[test]
    fn zero_advance_keeps_playing_and_clears_loop_flag() {
        let mut i = LinearAnimationInstance::new(anim(LoopMode::OneShot));
        i.advance(9.0);
        assert!(i.did_loop());
        assert!(i.advance(0.0));
        assert!(!i.did_loop());
        approx(i.time(), 5.0);
    }

    #[test]
    fn negative_speed_starts_at_end() {
        let i = LinearAnimationInstance::with_speed(anim(LoopMode::Loop), -1.0);
        approx(i.time(), 5.0);
    }

    #[test]
    fn set_time_keeps_step_in_lockstep() {
        let mut i = LinearAnimationInstance::new(anim(LoopMode::Loop));
        i.advance(1.0);
        i.set_time(4.0);
        approx(i.total_time(), 4.0);
        approx(i.last_total_time(), 3.0);
    }

    #[test]
    fn one_shot_records_spill() {
        let mut i = LinearAnimationInstance::new(anim(LoopMode::OneShot));
        assert!(i.advance(4.0));
        assert!(!i.advance(1.5));
        approx(i.spilled_time(), 0.5);
        approx(i.time(), 5.0);
    }
}
