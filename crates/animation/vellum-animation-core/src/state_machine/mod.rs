//! State machine definitions and their runtime.
//!
//! - Definitions (`StateMachine`, layers, states, transitions, conditions)
//!   are authored data, validated once and shared through `Arc`.
//! - [`StateMachineInstance`] holds per-playback state: input values, one
//!   layer instance per layer, and the trigger consumption set.
//! - Layers advance independently; their outputs are applied in layer order,
//!   so later layers overwrite or blend over earlier ones.

mod inputs;
mod instance;
mod layer;
mod reset;
mod state_instance;

pub use inputs::{SmiBool, SmiInput, SmiNumber, SmiTrigger};
pub use instance::{StateChange, StateMachineInstance};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::interpolator::CubicInterpolator;

fn one() -> f32 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateMachine {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<StateMachineInput>,
    #[serde(default)]
    pub layers: Vec<StateMachineLayer>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateMachineInput {
    pub name: String,
    #[serde(flatten)]
    pub kind: InputKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputKind {
    Bool {
        #[serde(default)]
        value: bool,
    },
    Number {
        #[serde(default)]
        value: f32,
    },
    Trigger,
}

impl StateMachineInput {
    pub fn boolean(name: impl Into<String>, value: bool) -> Self {
        Self {
            name: name.into(),
            kind: InputKind::Bool { value },
        }
    }

    pub fn number(name: impl Into<String>, value: f32) -> Self {
        Self {
            name: name.into(),
            kind: InputKind::Number { value },
        }
    }

    pub fn trigger(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: InputKind::Trigger,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateMachineLayer {
    #[serde(default)]
    pub name: String,
    /// Transitions refer to states by index into this list.
    pub states: Vec<LayerState>,
}

impl StateMachineLayer {
    pub fn entry_state(&self) -> Option<usize> {
        self.states.iter().position(|s| matches!(s.kind, StateKind::Entry))
    }

    pub fn any_state(&self) -> Option<usize> {
        self.states.iter().position(|s| matches!(s.kind, StateKind::Any))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerState {
    #[serde(flatten)]
    pub kind: StateKind,
    #[serde(default)]
    pub transitions: Vec<StateTransition>,
}

impl LayerState {
    pub fn new(kind: StateKind) -> Self {
        Self {
            kind,
            transitions: Vec::new(),
        }
    }

    pub fn with_transition(mut self, transition: StateTransition) -> Self {
        self.transitions.push(transition);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateKind {
    Entry,
    Exit,
    Any,
    /// Plays one animation. `None` (or an unknown index) is a pass-through
    /// state that applies nothing.
    Animation {
        #[serde(default)]
        animation: Option<usize>,
        #[serde(default = "one")]
        speed: f32,
    },
    /// Blends neighbouring animations by where a number input falls between
    /// their values.
    #[serde(rename = "blend_1d")]
    Blend1D {
        #[serde(default)]
        input: Option<usize>,
        animations: Vec<BlendAnimation1D>,
        /// Write baseline values for every keyed property before blending,
        /// so properties an animation stops keying do not keep stale values.
        #[serde(default)]
        reset: bool,
    },
    /// Each animation's mix is read from its own number input (0..100).
    BlendDirect { animations: Vec<BlendAnimationDirect> },
}

impl StateKind {
    pub fn animation(animation: usize) -> Self {
        StateKind::Animation {
            animation: Some(animation),
            speed: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlendAnimation1D {
    #[serde(default)]
    pub animation: Option<usize>,
    pub value: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlendAnimationDirect {
    #[serde(default)]
    pub animation: Option<usize>,
    #[serde(default)]
    pub input: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub state_to: usize,
    #[serde(default)]
    pub conditions: Vec<TransitionCondition>,
    /// Milliseconds, or a percentage of the from-state's animation.
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub duration_is_percentage: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub enable_exit_time: bool,
    /// Milliseconds, or a percentage of the from-state's animation.
    #[serde(default)]
    pub exit_time: u32,
    #[serde(default)]
    pub exit_time_is_percentage: bool,
    /// Freeze the exiting animation at its exit time while mixing out.
    #[serde(default)]
    pub pause_on_exit: bool,
    /// Eases the mix ramp.
    #[serde(default)]
    pub interpolator: Option<CubicInterpolator>,
}

impl StateTransition {
    pub fn to(state_to: usize) -> Self {
        Self {
            state_to,
            conditions: Vec::new(),
            duration: 0,
            duration_is_percentage: false,
            disabled: false,
            enable_exit_time: false,
            exit_time: 0,
            exit_time_is_percentage: false,
            pause_on_exit: false,
            interpolator: None,
        }
    }

    pub fn when(mut self, condition: TransitionCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_duration(mut self, milliseconds: u32) -> Self {
        self.duration = milliseconds;
        self
    }

    pub fn with_exit_time(mut self, milliseconds: u32) -> Self {
        self.enable_exit_time = true;
        self.exit_time = milliseconds;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOp {
    Equal,
    NotEqual,
    LessThanOrEqual,
    GreaterThanOrEqual,
    LessThan,
    GreaterThan,
}

impl ConditionOp {
    pub fn compare(self, lhs: f32, rhs: f32) -> bool {
        match self {
            ConditionOp::Equal => lhs == rhs,
            ConditionOp::NotEqual => lhs != rhs,
            ConditionOp::LessThanOrEqual => lhs <= rhs,
            ConditionOp::GreaterThanOrEqual => lhs >= rhs,
            ConditionOp::LessThan => lhs < rhs,
            ConditionOp::GreaterThan => lhs > rhs,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransitionCondition {
    Number { input: usize, op: ConditionOp, value: f32 },
    /// `Equal` passes when the input is true, `NotEqual` when false.
    Bool { input: usize, op: ConditionOp },
    Trigger { input: usize },
}

impl TransitionCondition {
    pub fn input(&self) -> usize {
        match self {
            TransitionCondition::Number { input, .. }
            | TransitionCondition::Bool { input, .. }
            | TransitionCondition::Trigger { input } => *input,
        }
    }
}

impl StateMachine {
    /// Check every index reference. `animation_count` is the number of
    /// animations on the owning artboard.
    pub fn validate(&self, animation_count: usize) -> Result<(), String> {
        let input_kind = |index: usize| self.inputs.get(index).map(|i| &i.kind);
        let number_input = |index: Option<usize>, what: &str| -> Result<(), String> {
            match index.map(|i| (i, input_kind(i))) {
                None | Some((_, Some(InputKind::Number { .. }))) => Ok(()),
                Some((i, _)) => Err(format!("{what} input {i} is not a number input")),
            }
        };

        for (l, layer) in self.layers.iter().enumerate() {
            let entries = layer
                .states
                .iter()
                .filter(|s| matches!(s.kind, StateKind::Entry))
                .count();
            if entries != 1 {
                return Err(format!("layer {l} has {entries} entry states, expected 1"));
            }
            let anys = layer
                .states
                .iter()
                .filter(|s| matches!(s.kind, StateKind::Any))
                .count();
            if anys > 1 {
                return Err(format!("layer {l} has {anys} any states"));
            }

            for (s, state) in layer.states.iter().enumerate() {
                let animations: Vec<Option<usize>> = match &state.kind {
                    StateKind::Animation { animation, .. } => vec![*animation],
                    StateKind::Blend1D { input, animations, .. } => {
                        number_input(*input, "blend state")?;
                        animations.iter().map(|a| a.animation).collect()
                    }
                    StateKind::BlendDirect { animations } => {
                        for a in animations {
                            number_input(a.input, "direct blend")?;
                        }
                        animations.iter().map(|a| a.animation).collect()
                    }
                    _ => Vec::new(),
                };
                // Unknown animations are tolerated; the state plays nothing.
                for index in animations.into_iter().flatten() {
                    if index >= animation_count {
                        warn!(
                            "state machine '{}' layer {l} state {s} references missing animation {index}",
                            self.name
                        );
                    }
                }
                for (t, transition) in state.transitions.iter().enumerate() {
                    if transition.state_to >= layer.states.len() {
                        return Err(format!(
                            "layer {l} state {s} transition {t} targets missing state {}",
                            transition.state_to
                        ));
                    }
                    for condition in &transition.conditions {
                        let ok = matches!(
                            (condition, input_kind(condition.input())),
                            (TransitionCondition::Number { .. }, Some(InputKind::Number { .. }))
                                | (TransitionCondition::Bool { .. }, Some(InputKind::Bool { .. }))
                                | (TransitionCondition::Trigger { .. }, Some(InputKind::Trigger))
                        );
                        if !ok {
                            return Err(format!(
                                "layer {l} state {s} transition {t} condition references input {} of the wrong type",
                                condition.input()
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_state_machine() -> StateMachine {
        StateMachine {
            name: "sm".into(),
            inputs: vec![StateMachineInput::number("level", 0.0), StateMachineInput::trigger("go")],
            layers: vec![StateMachineLayer {
                name: "base".into(),
                states: vec![
                    LayerState::new(StateKind::Entry).with_transition(StateTransition::to(1)),
                    LayerState::new(StateKind::animation(0)).with_transition(
                        StateTransition::to(2).when(TransitionCondition::Trigger { input: 1 }),
                    ),
                    LayerState::new(StateKind::Exit),
                ],
            }],
        }
    }

    #[test]
    fn validates_references() {
        let sm = two_state_machine();
        assert!(sm.validate(1).is_ok());

        let mut bad = sm.clone();
        bad.layers[0].states[1].transitions[0].conditions[0] = TransitionCondition::Bool {
            input: 0,
            op: ConditionOp::Equal,
        };
        assert!(bad.validate(1).unwrap_err().contains("wrong type"));

        let mut bad = sm.clone();
        bad.layers[0].states[0].transitions[0].state_to = 9;
        assert!(bad.validate(1).unwrap_err().contains("missing state"));

        let mut bad = sm;
        bad.layers[0].states.remove(0);
        assert!(bad.validate(1).unwrap_err().contains("entry"));
    }

    #[test]
    fn deserializes_states_and_conditions() {
        let json = r#"{
            "name": "sm",
            "inputs": [ { "name": "on", "type": "bool", "value": true } ],
            "layers": [ { "states": [
                { "type": "entry", "transitions": [ { "state_to": 1 } ] },
                { "type": "animation", "animation": 0, "transitions": [
                    { "state_to": 0, "duration": 250, "conditions": [
                        { "type": "bool", "input": 0, "op": "not_equal" } ] } ] },
                { "type": "blend_1d", "input": null, "animations": [ { "animation": 0, "value": 10 } ] }
            ] } ]
        }"#;
        let sm: StateMachine = serde_json::from_str(json).unwrap();
        assert_eq!(sm.inputs[0].kind, InputKind::Bool { value: true });
        assert_eq!(sm.layers[0].entry_state(), Some(0));
        assert_eq!(sm.layers[0].any_state(), None);
        let StateKind::Animation { speed, .. } = sm.layers[0].states[1].kind else {
            panic!("expected animation state");
        };
        assert_eq!(speed, 1.0);
        assert_eq!(sm.layers[0].states[1].transitions[0].duration, 250);
        assert!(sm.validate(1).is_ok());
    }
}
