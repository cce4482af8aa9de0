#![allow(dead_code)]
//! Keyframed animation and state machines for Vellum artboards.
//!
//! Authored data ([`LinearAnimation`], [`StateMachine`]) is immutable and
//! shared through `Arc`. Playback state lives in [`LinearAnimationInstance`]
//! and [`StateMachineInstance`], which write property values into an
//! [`vellum_scene_core::Artboard`]; the artboard's own sweep then resolves the
//! resulting dirt.

pub mod animation;
pub mod config;
pub mod error;
pub mod file;
pub mod instance;
pub mod interpolator;
pub mod keyframe;
pub mod state_machine;

pub use animation::{LinearAnimation, LoopMode};
pub use config::Config;
pub use error::FileError;
pub use file::{ArtboardAsset, ArtboardInstance, File};
pub use instance::LinearAnimationInstance;
pub use interpolator::CubicInterpolator;
pub use keyframe::{InterpolationType, KeyFrame, KeyFrameValue, KeyedObject, KeyedProperty};
pub use state_machine::{
    BlendAnimation1D, BlendAnimationDirect, ConditionOp, InputKind, LayerState, SmiBool, SmiInput,
    SmiNumber, SmiTrigger, StateChange, StateKind, StateMachine, StateMachineInput,
    StateMachineInstance, StateMachineLayer, StateTransition, TransitionCondition,
};
