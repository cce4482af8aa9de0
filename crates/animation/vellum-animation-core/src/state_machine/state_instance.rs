use std::sync::Arc;

use vellum_scene_core::Artboard;

use super::inputs::SmiInput;
use super::reset::AnimationReset;
use super::{LayerState, StateKind};
use crate::animation::LinearAnimation;
use crate::instance::LinearAnimationInstance;

#[derive(Clone, Debug)]
struct BlendedAnimation {
    instance: LinearAnimationInstance,
    value: f32,
    input: Option<usize>,
    mix: f32,
}

#[derive(Clone, Debug)]
enum Playback {
    /// Entry, exit and any states carry no animation.
    System,
    Single {
        instance: Option<LinearAnimationInstance>,
        keep_going: bool,
    },
    Blend1D {
        input: Option<usize>,
        animations: Vec<BlendedAnimation>,
        reset: Option<AnimationReset>,
    },
    BlendDirect {
        animations: Vec<BlendedAnimation>,
    },
}

/// Runtime for one layer state.
#[derive(Clone, Debug)]
pub(crate) struct StateInstance {
    state: usize,
    playback: Playback,
}

fn resolve(animations: &[Arc<LinearAnimation>], index: Option<usize>) -> Option<Arc<LinearAnimation>> {
    index.and_then(|i| animations.get(i)).cloned()
}

fn number(inputs: &[SmiInput], index: Option<usize>) -> Option<f32> {
    index.and_then(|i| inputs.get(i)).and_then(SmiInput::as_number)
}

/// First index whose value is at or above `value`; `len` when none is.
fn blend_index(animations: &[BlendedAnimation], value: f32) -> usize {
    animations.partition_point(|a| a.value < value)
}

impl StateInstance {
    pub(crate) fn new(state: usize, def: &LayerState, animations: &[Arc<LinearAnimation>]) -> Self {
        let playback = match &def.kind {
            StateKind::Entry | StateKind::Exit | StateKind::Any => Playback::System,
            StateKind::Animation { animation, speed } => Playback::Single {
                instance: resolve(animations, *animation)
                    .map(|a| LinearAnimationInstance::with_speed(a, *speed)),
                keep_going: true,
            },
            StateKind::Blend1D {
                input,
                animations: blends,
                reset,
            } => {
                let reset = reset.then(|| {
                    AnimationReset::from_animations(
                        blends
                            .iter()
                            .filter_map(|b| b.animation.and_then(|i| animations.get(i)))
                            .map(|a| a.as_ref()),
                    )
                });
                let mut list: Vec<BlendedAnimation> = blends
                    .iter()
                    .filter_map(|b| {
                        resolve(animations, b.animation).map(|a| BlendedAnimation {
                            instance: LinearAnimationInstance::new(a),
                            value: b.value,
                            input: None,
                            mix: 0.0,
                        })
                    })
                    .collect();
                list.sort_by(|a, b| a.value.total_cmp(&b.value));
                Playback::Blend1D {
                    input: *input,
                    animations: list,
                    reset,
                }
            }
            StateKind::BlendDirect { animations: blends } => Playback::BlendDirect {
                animations: blends
                    .iter()
                    .filter_map(|b| {
                        resolve(animations, b.animation).map(|a| BlendedAnimation {
                            instance: LinearAnimationInstance::new(a),
                            value: 0.0,
                            input: b.input,
                            mix: 0.0,
                        })
                    })
                    .collect(),
            },
        };
        Self { state, playback }
    }

    /// Index of the layer state this instance plays.
    pub(crate) fn state(&self) -> usize {
        self.state
    }

    pub(crate) fn advance(&mut self, seconds: f32, inputs: &[SmiInput]) {
        match &mut self.playback {
            Playback::System => {}
            Playback::Single {
                instance,
                keep_going,
            } => {
                *keep_going = match instance {
                    Some(i) => i.advance(seconds),
                    None => false,
                };
            }
            Playback::Blend1D { input, animations, .. } => {
                for a in animations.iter_mut() {
                    a.instance.advance(seconds);
                }
                let value = number(inputs, *input).unwrap_or(0.0);
                let index = blend_index(animations, value);
                let to = animations.get(index).map(|a| a.value);
                let from = index.checked_sub(1).and_then(|i| animations.get(i)).map(|a| a.value);
                let (mix, mix_from) = match (from, to) {
                    (Some(f), Some(t)) if t != f => {
                        let m = (value - f) / (t - f);
                        (m, 1.0 - m)
                    }
                    _ => (1.0, 1.0),
                };
                for a in animations.iter_mut() {
                    a.mix = if to == Some(a.value) {
                        mix
                    } else if from == Some(a.value) {
                        mix_from
                    } else {
                        0.0
                    };
                }
            }
            Playback::BlendDirect { animations } => {
                for a in animations.iter_mut() {
                    a.instance.advance(seconds);
                    a.mix = match number(inputs, a.input) {
                        Some(v) => (v / 100.0).clamp(0.0, 1.0),
                        None => 1.0,
                    };
                }
            }
        }
    }

    pub(crate) fn apply(&mut self, artboard: &mut Artboard, mix: f32) {
        match &mut self.playback {
            Playback::System => {}
            Playback::Single { instance, .. } => {
                if let Some(i) = instance {
                    i.apply(artboard, mix);
                }
            }
            Playback::Blend1D { animations, reset, .. } => {
                if let Some(reset) = reset {
                    reset.apply(artboard);
                }
                for a in animations.iter() {
                    let m = mix * a.mix;
                    if m > 0.0 {
                        a.instance.apply(artboard, m);
                    }
                }
            }
            Playback::BlendDirect { animations } => {
                for a in animations {
                    let m = mix * a.mix;
                    if m > 0.0 {
                        a.instance.apply(artboard, m);
                    }
                }
            }
        }
    }

    /// Whether another advance could still change what this state applies.
    pub(crate) fn keep_going(&self) -> bool {
        match &self.playback {
            Playback::System => false,
            Playback::Single { keep_going, .. } => *keep_going,
            Playback::Blend1D { .. } | Playback::BlendDirect { .. } => true,
        }
    }

    pub(crate) fn animation_instance(&self) -> Option<&LinearAnimationInstance> {
        match &self.playback {
            Playback::Single { instance, .. } => instance.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn animation_instance_mut(&mut self) -> Option<&mut LinearAnimationInstance> {
        match &mut self.playback {
            Playback::Single { instance, .. } => instance.as_mut(),
            _ => None,
        }
    }

    /// Per-animation mixes of a blend state, in blend order.
    pub(crate) fn blend_mixes(&self) -> Vec<f32> {
        match &self.playback {
            Playback::Blend1D { animations, .. } | Playback::BlendDirect { animations } => {
                animations.iter().map(|a| a.mix).collect()
            }
            _ => Vec::new(),
        }
    }

    pub(crate) fn clear_spilled_time(&mut self) {
        if let Some(i) = self.animation_instance_mut() {
            i.clear_spilled_time();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::{BlendAnimation1D, StateMachineInput};

    fn approx(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-5, "left={a} right={b}");
    }

    fn animations() -> Vec<Arc<LinearAnimation>> {
        (0..3)
            .map(|i| {
                Arc::new(LinearAnimation {
                    name: format!("a{i}"),
                    ..Default::default()
                })
            })
            .collect()
    }

    fn blend_state() -> LayerState {
        LayerState::new(StateKind::Blend1D {
            input: Some(0),
            animations: vec![
                BlendAnimation1D { animation: Some(2), value: 100.0 },
                BlendAnimation1D { animation: Some(0), value: 0.0 },
                BlendAnimation1D { animation: Some(1), value: 50.0 },
            ],
            reset: false,
        })
    }

    fn inputs(value: f32) -> Vec<SmiInput> {
        vec![SmiInput::from_definition(&StateMachineInput::number("blend", value))]
    }

    #[test]
    fn blend_1d_mixes_neighbours() {
        let anims = animations();
        let mut s = StateInstance::new(3, &blend_state(), &anims);
        s.advance(0.0, &inputs(25.0));
        let mixes = s.blend_mixes();
        approx(mixes[0], 0.5);
        approx(mixes[1], 0.5);
        approx(mixes[2], 0.0);
        assert!(s.keep_going());

        s.advance(0.0, &inputs(75.0));
        let mixes = s.blend_mixes();
        approx(mixes[0], 0.0);
        approx(mixes[1], 0.5);
        approx(mixes[2], 0.5);
    }

    #[test]
    fn blend_1d_outside_range_gives_full_mix() {
        let anims = animations();
        let mut s = StateInstance::new(3, &blend_state(), &anims);
        s.advance(0.0, &inputs(150.0));
        assert_eq!(s.blend_mixes(), vec![0.0, 0.0, 1.0]);
        s.advance(0.0, &inputs(-10.0));
        assert_eq!(s.blend_mixes(), vec![1.0, 0.0, 0.0]);
        s.advance(0.0, &inputs(50.0));
        assert_eq!(s.blend_mixes(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn missing_animation_is_pass_through() {
        let anims = animations();
        let def = LayerState::new(StateKind::Animation { animation: Some(9), speed: 1.0 });
        let mut s = StateInstance::new(1, &def, &anims);
        assert!(s.animation_instance().is_none());
        s.advance(1.0, &[]);
        assert!(!s.keep_going());
    }
}
