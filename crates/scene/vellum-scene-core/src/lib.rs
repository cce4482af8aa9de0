#![allow(dead_code)]
//! vellum-scene-core: the component graph behind a Vellum artboard.
//!
//! Components live in a flat arena owned by [`Artboard`]. Loading links
//! parent and target references, builds dependency edges, and sorts them once
//! into a stable update order. Each frame, property writes raise dirt bits
//! and a single sweep updates only what became dirty, producers first.

pub mod artboard;
pub mod component;
pub mod config;
mod dependency;
pub mod dirt;
pub mod ids;
mod ik;
mod link;
pub mod math;
pub mod properties;
pub mod render;
pub mod status;
mod update;

pub use artboard::{Artboard, SweepStats};
pub use component::{
    ArtboardData, BoneData, Component, ComponentKind, ConstraintData, ConstraintRule, DistanceMode,
    PaintData, ParametricPathData, PathComposerData, ShapeData, SolidColorData, TransformData,
    TransformSpace,
};
pub use config::SceneConfig;
pub use dirt::{ComponentDirt, Dirt};
pub use ids::ComponentId;
pub use properties::{PropertyKey, PropertyType};
pub use render::{PaintStyle, RenderPaint, Renderer};
pub use status::{ImportError, Status, StatusCode};

pub use kurbo;
