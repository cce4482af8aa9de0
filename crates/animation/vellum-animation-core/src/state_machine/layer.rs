//! One layer of a running state machine.
//!
//! A layer has a current state and, while a transition is mixing, the state
//! it is leaving. Each advance:
//! 1. advances the current state,
//! 2. ramps the mix by `seconds / mix_time`,
//! 3. advances the exiting state unless it is held,
//! 4. evaluates transitions until no more fire. A state change consumes
//!    every fired trigger for the layer, so chained changes ignore them.

use std::sync::Arc;

use hashbrown::HashSet;
use log::{debug, warn};
use vellum_scene_core::Artboard;

use super::inputs::SmiInput;
use super::instance::StateChange;
use super::state_instance::StateInstance;
use super::{ConditionOp, LayerState, StateMachine, StateTransition, TransitionCondition};
use crate::animation::{LinearAnimation, LoopMode};
use crate::config::Config;

/// Borrowed view of the machine-level state a layer needs while advancing.
pub(crate) struct LayerContext<'a> {
    pub(crate) machine: &'a StateMachine,
    pub(crate) animations: &'a [Arc<LinearAnimation>],
    pub(crate) inputs: &'a [SmiInput],
    /// (trigger input, layer) pairs already used this advance.
    pub(crate) consumed: &'a mut HashSet<(usize, usize)>,
    pub(crate) changes: &'a mut Vec<StateChange>,
    pub(crate) config: &'a Config,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TransitionRef {
    state: usize,
    index: usize,
}

enum Allowed {
    Yes,
    No,
    WaitingForExit,
}

fn exit_time_seconds(transition: &StateTransition, animation: &LinearAnimation, absolute: bool) -> f32 {
    if transition.exit_time_is_percentage {
        let start = if absolute { animation.start_seconds() } else { 0.0 };
        start + transition.exit_time as f32 / 100.0 * animation.duration_seconds()
    } else {
        transition.exit_time as f32 / 1000.0
    }
}

#[derive(Clone, Debug)]
pub(crate) struct LayerInstance {
    layer: usize,
    current: StateInstance,
    from: Option<StateInstance>,
    transition: Option<TransitionRef>,
    mix: f32,
    mix_from: f32,
    hold_from: bool,
    waiting_for_exit: bool,
}

impl LayerInstance {
    /// `None` when the layer has no states to start from.
    pub(crate) fn new(layer: usize, machine: &StateMachine, animations: &[Arc<LinearAnimation>]) -> Option<Self> {
        let def = machine.layers.get(layer)?;
        let entry = def.entry_state()?;
        Some(Self {
            layer,
            current: StateInstance::new(entry, &def.states[entry], animations),
            from: None,
            transition: None,
            mix: 1.0,
            mix_from: 1.0,
            hold_from: false,
            waiting_for_exit: false,
        })
    }

    fn states<'m>(&self, machine: &'m StateMachine) -> &'m [LayerState] {
        &machine.layers[self.layer].states
    }

    fn transition_def<'m>(&self, machine: &'m StateMachine) -> Option<&'m StateTransition> {
        let r = self.transition?;
        self.states(machine).get(r.state)?.transitions.get(r.index)
    }

    pub(crate) fn current_state(&self) -> usize {
        self.current.state()
    }

    pub(crate) fn from_state(&self) -> Option<usize> {
        self.from.as_ref().map(StateInstance::state)
    }

    pub(crate) fn current(&self) -> &StateInstance {
        &self.current
    }

    pub(crate) fn mix(&self) -> f32 {
        self.mix
    }

    /// Seconds the active transition takes to mix in.
    fn mix_time(&self, machine: &StateMachine) -> f32 {
        let Some(transition) = self.transition_def(machine) else {
            return 0.0;
        };
        if transition.duration_is_percentage {
            let length = self
                .from
                .as_ref()
                .and_then(StateInstance::animation_instance)
                .map(|i| i.animation().duration_seconds())
                .unwrap_or(0.0);
            transition.duration as f32 / 100.0 * length
        } else {
            transition.duration as f32 / 1000.0
        }
    }

    pub(crate) fn is_transitioning(&self, machine: &StateMachine) -> bool {
        self.transition.is_some() && self.from.is_some() && self.mix < 1.0 && self.mix_time(machine) > 0.0
    }

    fn update_mix(&mut self, machine: &StateMachine, seconds: f32) {
        let mix_time = self.mix_time(machine);
        if self.transition.is_some() && self.from.is_some() && mix_time > 0.0 {
            self.mix = (self.mix + seconds / mix_time).clamp(0.0, 1.0);
        } else {
            self.mix = 1.0;
        }
        if self.mix >= 1.0 {
            self.from = None;
            self.hold_from = false;
        }
    }

    pub(crate) fn advance(&mut self, ctx: &mut LayerContext<'_>, seconds: f32) -> bool {
        self.current.advance(seconds, ctx.inputs);
        self.update_mix(ctx.machine, seconds);
        if self.mix < 1.0 && !self.hold_from {
            if let Some(from) = self.from.as_mut() {
                from.advance(seconds, ctx.inputs);
            }
        }

        let mut iterations = 0;
        while self.update_state(ctx) {
            iterations += 1;
            if iterations >= ctx.config.max_layer_iterations {
                warn!(
                    "state machine '{}' layer {} changed state {iterations} times in one advance; stopping",
                    ctx.machine.name, self.layer
                );
                break;
            }
        }

        self.current.clear_spilled_time();
        self.mix != 1.0 || self.waiting_for_exit || self.current.keep_going()
    }

    fn update_state(&mut self, ctx: &mut LayerContext<'_>) -> bool {
        if self.is_transitioning(ctx.machine) {
            return false;
        }
        self.waiting_for_exit = false;
        let current = self.current.state();
        if self.try_change_state(ctx, current) {
            return true;
        }
        match ctx.machine.layers[self.layer].any_state() {
            Some(any) if any != current => self.try_change_state(ctx, any),
            _ => false,
        }
    }

    /// Take the first allowed transition out of `source`.
    fn try_change_state(&mut self, ctx: &mut LayerContext<'_>, source: usize) -> bool {
        let machine = ctx.machine;
        let states = self.states(machine);
        let Some(state) = states.get(source) else {
            return false;
        };
        for (index, transition) in state.transitions.iter().enumerate() {
            match self.allowed(ctx, transition) {
                Allowed::Yes => {
                    if transition.state_to == self.current.state() {
                        continue;
                    }
                    let Some(next) = states.get(transition.state_to) else {
                        warn!(
                            "state machine '{}' layer {} state {source} transition {index} targets missing state {}; skipping",
                            machine.name, self.layer, transition.state_to
                        );
                        continue;
                    };
                    self.change_state(ctx, TransitionRef { state: source, index }, transition, next);
                    return true;
                }
                Allowed::WaitingForExit => self.waiting_for_exit = true,
                Allowed::No => {}
            }
        }
        false
    }

    /// Conditions and exit time are judged against the current state, also
    /// for transitions leaving the any state.
    fn allowed(&self, ctx: &LayerContext<'_>, transition: &StateTransition) -> Allowed {
        if transition.disabled {
            return Allowed::No;
        }
        for condition in &transition.conditions {
            let input = ctx.inputs.get(condition.input());
            let pass = match *condition {
                TransitionCondition::Trigger { input: index } => {
                    input.is_some_and(SmiInput::did_fire)
                        && !ctx.consumed.contains(&(index, self.layer))
                }
                TransitionCondition::Number { op, value, .. } => input
                    .and_then(SmiInput::as_number)
                    .is_some_and(|v| op.compare(v, value)),
                TransitionCondition::Bool { op, .. } => match (input.and_then(SmiInput::as_bool), op) {
                    (Some(v), ConditionOp::Equal) => v,
                    (Some(v), ConditionOp::NotEqual) => !v,
                    _ => false,
                },
            };
            if !pass {
                return Allowed::No;
            }
        }

        if transition.enable_exit_time {
            if let Some(instance) = self.current.animation_instance() {
                let animation = instance.animation();
                let duration = animation.duration_seconds();
                let mut exit_time = exit_time_seconds(transition, animation, false);
                // Exit times inside one loop apply to whichever loop we are on.
                if exit_time < duration && instance.loop_mode() != LoopMode::OneShot {
                    exit_time += (instance.last_total_time() / duration).floor() * duration;
                }
                if instance.total_time() < exit_time {
                    return Allowed::WaitingForExit;
                }
            }
        }
        Allowed::Yes
    }

    fn change_state(
        &mut self,
        ctx: &mut LayerContext<'_>,
        r: TransitionRef,
        transition: &StateTransition,
        next: &LayerState,
    ) {
        let state_to = transition.state_to;
        let next = StateInstance::new(state_to, next, ctx.animations);
        let mut outgoing = std::mem::replace(&mut self.current, next);

        for (input, _) in ctx.inputs.iter().enumerate().filter(|(_, i)| i.did_fire()) {
            ctx.consumed.insert((input, self.layer));
        }
        ctx.changes.push(StateChange {
            layer: self.layer,
            state: state_to,
        });
        debug!(
            "state machine '{}' layer {}: state {} -> {state_to}",
            ctx.machine.name,
            self.layer,
            outgoing.state()
        );

        if transition.pause_on_exit && transition.enable_exit_time {
            if let Some(instance) = outgoing.animation_instance_mut() {
                let exit = exit_time_seconds(transition, instance.animation(), true);
                instance.set_time(exit);
            }
        }
        let spilled = outgoing
            .animation_instance()
            .map(|i| i.spilled_time())
            .unwrap_or(0.0);

        self.transition = Some(r);
        self.hold_from = transition.pause_on_exit;
        self.from = Some(outgoing);
        if self.mix != 0.0 {
            self.mix_from = self.mix;
        }
        self.mix = 0.0;
        self.update_mix(ctx.machine, 0.0);
        self.waiting_for_exit = false;

        if spilled > 0.0 {
            self.current.advance(spilled, ctx.inputs);
        }
    }

    pub(crate) fn apply(&mut self, machine: &StateMachine, artboard: &mut Artboard) {
        let cubic = self.transition_def(machine).and_then(|t| t.interpolator.as_ref());
        let ease = |m: f32| cubic.map_or(m, |c| c.transform(m));
        if self.mix < 1.0 {
            if let Some(from) = self.from.as_mut() {
                from.apply(artboard, ease(self.mix_from));
            }
        }
        self.current.apply(artboard, ease(self.mix));
    }
}
