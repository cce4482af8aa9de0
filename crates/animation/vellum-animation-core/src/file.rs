//! A bundle of artboards with their animations and state machines.

use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use vellum_scene_core::{Artboard, Component, ImportError};

use crate::animation::LinearAnimation;
use crate::config::Config;
use crate::error::FileError;
use crate::instance::LinearAnimationInstance;
use crate::state_machine::{StateMachine, StateMachineInstance};

/// Serialized form of one artboard and the data authored against it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArtboardAsset {
    /// Slot 0 must be the artboard component. `null` slots are kept so ids
    /// stay stable.
    pub objects: Vec<Option<Component>>,
    #[serde(default)]
    pub animations: Vec<LinearAnimation>,
    #[serde(default)]
    pub state_machines: Vec<StateMachine>,
}

#[derive(Deserialize)]
struct FileDocument {
    artboards: Vec<ArtboardAsset>,
}

#[derive(Clone, Debug)]
struct FileArtboard {
    artboard: Artboard,
    animations: Vec<Arc<LinearAnimation>>,
    state_machines: Vec<Arc<StateMachine>>,
}

/// Template artboards plus their shared authored data. Instances copy the
/// artboard and share everything else.
#[derive(Clone, Debug)]
pub struct File {
    artboards: Vec<FileArtboard>,
    config: Config,
}

impl File {
    /// Parse `{ "artboards": [ { "objects": [...], "animations": [...],
    /// "state_machines": [...] } ] }`.
    pub fn from_json(text: &str) -> Result<Self, FileError> {
        let doc: FileDocument = serde_json::from_str(text)?;
        Self::from_assets(doc.artboards)
    }

    /// Initialize each artboard and validate what is authored against it.
    pub fn from_assets(assets: Vec<ArtboardAsset>) -> Result<Self, FileError> {
        if assets.is_empty() {
            return Err(FileError::NoArtboards);
        }
        let mut artboards = Vec::with_capacity(assets.len());
        for (index, asset) in assets.into_iter().enumerate() {
            artboards.push(load_artboard(index, asset)?);
        }
        Ok(Self {
            artboards,
            config: Config::default(),
        })
    }

    /// Config handed to every state machine instance created from this file.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn artboard_count(&self) -> usize {
        self.artboards.len()
    }

    /// Template artboard by name; the first match wins.
    pub fn artboard(&self, name: &str) -> Option<&Artboard> {
        self.position(name).map(|i| &self.artboards[i].artboard)
    }

    pub fn artboard_at(&self, index: usize) -> Option<&Artboard> {
        self.artboards.get(index).map(|a| &a.artboard)
    }

    /// The first artboard in the file.
    pub fn artboard_default(&self) -> Option<&Artboard> {
        self.artboard_at(0)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.artboards.iter().position(|a| a.artboard.name() == name)
    }

    pub fn instance(&self, name: &str) -> Result<ArtboardInstance, FileError> {
        self.position(name)
            .and_then(|i| self.instance_at(i))
            .ok_or_else(|| FileError::UnknownArtboard(name.to_string()))
    }

    pub fn instance_at(&self, index: usize) -> Option<ArtboardInstance> {
        let template = self.artboards.get(index)?;
        Some(ArtboardInstance {
            artboard: template.artboard.instance(),
            animations: template.animations.clone(),
            state_machines: template.state_machines.clone(),
            config: self.config,
        })
    }
}

fn load_artboard(index: usize, asset: ArtboardAsset) -> Result<FileArtboard, FileError> {
    if asset.objects.is_empty() {
        return Err(FileError::Import {
            index,
            source: ImportError::Empty,
        });
    }
    let artboard = Artboard::from_objects(asset.objects).map_err(|e| FileError::Import {
        index,
        source: e.into(),
    })?;

    for animation in &asset.animations {
        animation
            .validate_basic()
            .map_err(|reason| FileError::InvalidAnimation {
                name: animation.name.clone(),
                reason,
            })?;
        for object in &animation.keyed_objects {
            if artboard.resolve(object.object).is_none() {
                warn!(
                    "animation '{}' keys {} which is not on artboard '{}'",
                    animation.name,
                    object.object,
                    artboard.name()
                );
            }
        }
    }
    for machine in &asset.state_machines {
        machine
            .validate(asset.animations.len())
            .map_err(|reason| FileError::InvalidStateMachine {
                name: machine.name.clone(),
                reason,
            })?;
    }

    debug!(
        "loaded artboard '{}': {} objects, {} animations, {} state machines",
        artboard.name(),
        artboard.len(),
        asset.animations.len(),
        asset.state_machines.len()
    );
    Ok(FileArtboard {
        artboard,
        animations: asset.animations.into_iter().map(Arc::new).collect(),
        state_machines: asset.state_machines.into_iter().map(Arc::new).collect(),
    })
}

/// An independent copy of a template artboard with handles to its animations
/// and state machines.
#[derive(Clone, Debug)]
pub struct ArtboardInstance {
    artboard: Artboard,
    animations: Vec<Arc<LinearAnimation>>,
    state_machines: Vec<Arc<StateMachine>>,
    config: Config,
}

impl ArtboardInstance {
    pub fn artboard(&self) -> &Artboard {
        &self.artboard
    }

    pub fn artboard_mut(&mut self) -> &mut Artboard {
        &mut self.artboard
    }

    pub fn animation_count(&self) -> usize {
        self.animations.len()
    }

    pub fn animation(&self, name: &str) -> Option<LinearAnimationInstance> {
        let index = self.animations.iter().position(|a| a.name == name)?;
        self.animation_at(index)
    }

    pub fn animation_at(&self, index: usize) -> Option<LinearAnimationInstance> {
        self.animations
            .get(index)
            .map(|a| LinearAnimationInstance::new(Arc::clone(a)))
    }

    pub fn state_machine_count(&self) -> usize {
        self.state_machines.len()
    }

    pub fn state_machine(&self, name: &str) -> Option<StateMachineInstance> {
        let index = self.state_machines.iter().position(|m| m.name == name)?;
        self.state_machine_at(index)
    }

    pub fn state_machine_at(&self, index: usize) -> Option<StateMachineInstance> {
        let machine = self.state_machines.get(index)?;
        Some(StateMachineInstance::with_config(
            Arc::clone(machine),
            self.animations.clone(),
            self.config,
        ))
    }

    /// Run the artboard's update sweep.
    pub fn advance(&mut self, elapsed_seconds: f32) -> bool {
        self.artboard.advance(elapsed_seconds)
    }
}
