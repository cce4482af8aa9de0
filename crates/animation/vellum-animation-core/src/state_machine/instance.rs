use std::sync::Arc;

use hashbrown::HashSet;
use log::warn;
use vellum_scene_core::Artboard;

use super::inputs::{SmiBool, SmiInput, SmiNumber, SmiTrigger};
use super::layer::{LayerContext, LayerInstance};
use super::StateMachine;
use crate::animation::LinearAnimation;
use crate::config::Config;
use crate::instance::LinearAnimationInstance;

/// A layer entered a new state during the last advance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateChange {
    pub layer: usize,
    /// Index into the layer's states.
    pub state: usize,
}

/// Playback of one state machine against one artboard.
#[derive(Clone, Debug)]
pub struct StateMachineInstance {
    machine: Arc<StateMachine>,
    animations: Vec<Arc<LinearAnimation>>,
    inputs: Vec<SmiInput>,
    layers: Vec<LayerInstance>,
    consumed: HashSet<(usize, usize)>,
    state_changes: Vec<StateChange>,
    needs_advance: bool,
    config: Config,
}

impl StateMachineInstance {
    /// `animations` are the owning artboard's animations; states index into
    /// them.
    pub fn new(machine: Arc<StateMachine>, animations: Vec<Arc<LinearAnimation>>) -> Self {
        Self::with_config(machine, animations, Config::default())
    }

    pub fn with_config(machine: Arc<StateMachine>, animations: Vec<Arc<LinearAnimation>>, config: Config) -> Self {
        let inputs = machine.inputs.iter().map(SmiInput::from_definition).collect();
        let layers = (0..machine.layers.len())
            .filter_map(|l| {
                let layer = LayerInstance::new(l, &machine, &animations);
                if layer.is_none() {
                    warn!("state machine '{}' layer {l} has no entry state; skipping", machine.name);
                }
                layer
            })
            .collect();
        Self {
            machine,
            animations,
            inputs,
            layers,
            consumed: HashSet::new(),
            state_changes: Vec::new(),
            needs_advance: true,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.machine.name
    }

    pub fn definition(&self) -> &Arc<StateMachine> {
        &self.machine
    }

    /// Advance every layer by `seconds`. Returns whether any layer still has
    /// work to do (mixing, waiting on an exit time, or playing).
    pub fn advance(&mut self, seconds: f32) -> bool {
        self.consumed.clear();
        self.state_changes.clear();

        let mut ctx = LayerContext {
            machine: &self.machine,
            animations: &self.animations,
            inputs: &self.inputs,
            consumed: &mut self.consumed,
            changes: &mut self.state_changes,
            config: &self.config,
        };
        let mut keep_going = false;
        for layer in self.layers.iter_mut() {
            if layer.advance(&mut ctx, seconds) {
                keep_going = true;
            }
        }

        for input in self.inputs.iter_mut() {
            input.take_changed();
            if let SmiInput::Trigger(trigger) = input {
                trigger.retire();
            }
        }
        self.needs_advance = keep_going;
        keep_going
    }

    /// Write every layer's output into `artboard`, in layer order.
    pub fn apply(&mut self, artboard: &mut Artboard) {
        for layer in self.layers.iter_mut() {
            layer.apply(&self.machine, artboard);
        }
    }

    /// Advance, apply, then sweep the artboard.
    pub fn advance_and_apply(&mut self, artboard: &mut Artboard, seconds: f32) -> bool {
        let keep_going = self.advance(seconds);
        self.apply(artboard);
        artboard.advance(seconds);
        keep_going
    }

    /// True until an advance reports nothing left to do and no input has
    /// changed since.
    pub fn needs_advance(&self) -> bool {
        self.needs_advance || self.inputs.iter().any(SmiInput::changed)
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn input(&self, index: usize) -> Option<&SmiInput> {
        self.inputs.get(index)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &SmiInput> {
        self.inputs.iter()
    }

    fn input_named(&mut self, name: &str) -> Option<&mut SmiInput> {
        self.inputs.iter_mut().find(|i| i.name() == name)
    }

    pub fn get_bool(&mut self, name: &str) -> Option<&mut SmiBool> {
        match self.input_named(name)? {
            SmiInput::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn get_number(&mut self, name: &str) -> Option<&mut SmiNumber> {
        match self.input_named(name)? {
            SmiInput::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn get_trigger(&mut self, name: &str) -> Option<&mut SmiTrigger> {
        match self.input_named(name)? {
            SmiInput::Trigger(t) => Some(t),
            _ => None,
        }
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// State the layer is in (or mixing into).
    pub fn current_state(&self, layer: usize) -> Option<usize> {
        self.layers.get(layer).map(LayerInstance::current_state)
    }

    /// State the layer is mixing out of, if a transition is in progress.
    pub fn from_state(&self, layer: usize) -> Option<usize> {
        self.layers.get(layer).and_then(LayerInstance::from_state)
    }

    pub fn layer_mix(&self, layer: usize) -> Option<f32> {
        self.layers.get(layer).map(LayerInstance::mix)
    }

    pub fn is_transitioning(&self, layer: usize) -> bool {
        self.layers
            .get(layer)
            .is_some_and(|l| l.is_transitioning(&self.machine))
    }

    /// Animation playing in the layer's current state, for single-animation
    /// states.
    pub fn current_animation(&self, layer: usize) -> Option<&LinearAnimationInstance> {
        self.layers.get(layer)?.current().animation_instance()
    }

    /// Per-animation mixes of the layer's current state when it is a blend.
    pub fn blend_mixes(&self, layer: usize) -> Vec<f32> {
        self.layers
            .get(layer)
            .map(|l| l.current().blend_mixes())
            .unwrap_or_default()
    }

    /// States entered during the last advance.
    pub fn state_changes(&self) -> &[StateChange] {
        &self.state_changes
    }
}
