//! Component records stored in an artboard's object arena.
//!
//! Each slot holds a [`Component`]: the authored fields shared by every kind
//! (`name`, `parent`), the kind-specific payload in [`ComponentKind`], and the
//! runtime bookkeeping the dependency engine maintains (resolved links, dirt,
//! dependents, graph order).

use crate::dirt::Dirt;
use crate::ids::ComponentId;
use kurbo::{Affine, BezPath};
use serde::{Deserialize, Serialize};

fn one() -> f32 {
    1.0
}

fn yes() -> bool {
    true
}

fn identity() -> Affine {
    Affine::IDENTITY
}

fn default_color() -> u32 {
    0xFF74_7474
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Component {
    #[serde(default)]
    pub name: String,
    /// Authored parent reference. `None` only for the artboard itself.
    #[serde(default, rename = "parent")]
    pub parent_id: Option<ComponentId>,
    #[serde(flatten)]
    pub kind: ComponentKind,

    #[serde(skip)]
    pub(crate) parent: Option<ComponentId>,
    #[serde(skip)]
    pub(crate) children: Vec<ComponentId>,
    #[serde(skip)]
    pub(crate) dirt: Dirt,
    #[serde(skip)]
    pub(crate) dependents: Vec<ComponentId>,
    #[serde(skip)]
    pub(crate) graph_order: Option<u32>,
}

impl Component {
    pub fn new(name: impl Into<String>, parent: Option<ComponentId>, kind: ComponentKind) -> Self {
        Self {
            name: name.into(),
            parent_id: parent,
            kind,
            parent: None,
            children: Vec::new(),
            dirt: Dirt::default(),
            dependents: Vec::new(),
            graph_order: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved parent, available once the artboard is initialized.
    pub fn parent(&self) -> Option<ComponentId> {
        self.parent
    }

    pub fn children(&self) -> &[ComponentId] {
        &self.children
    }

    pub fn dirt(&self) -> Dirt {
        self.dirt
    }

    pub fn has_dirt(&self, value: impl Into<Dirt>) -> bool {
        self.dirt.contains(value)
    }

    pub fn dependents(&self) -> &[ComponentId] {
        &self.dependents
    }

    /// Position in the artboard's dependency order. `None` until the
    /// component has been included in a sort.
    pub fn graph_order(&self) -> Option<u32> {
        self.graph_order
    }

    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    pub fn type_key(&self) -> u16 {
        self.kind.type_key()
    }
}

/// Closed set of component kinds understood by the runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentKind {
    Artboard(ArtboardData),
    Node(TransformData),
    Shape(ShapeData),
    Rectangle(ParametricPathData),
    Ellipse(ParametricPathData),
    /// Created implicitly for every shape during initialization.
    #[serde(skip_deserializing)]
    PathComposer(PathComposerData),
    Fill(PaintData),
    Stroke(PaintData),
    SolidColor(SolidColorData),
    RootBone(BoneData),
    Bone(BoneData),
    Constraint(ConstraintData),
}

impl ComponentKind {
    /// Stable numeric key identifying the kind in serialized files.
    pub fn type_key(&self) -> u16 {
        match self {
            ComponentKind::Artboard(_) => 1,
            ComponentKind::Node(_) => 2,
            ComponentKind::Shape(_) => 3,
            ComponentKind::Ellipse(_) => 4,
            ComponentKind::Rectangle(_) => 7,
            ComponentKind::PathComposer(_) => 9,
            ComponentKind::SolidColor(_) => 18,
            ComponentKind::Fill(_) => 20,
            ComponentKind::Stroke(_) => 24,
            ComponentKind::Bone(_) => 40,
            ComponentKind::RootBone(_) => 41,
            ComponentKind::Constraint(c) => match c.rule {
                ConstraintRule::Ik { .. } => 81,
                ConstraintRule::Distance { .. } => 82,
                ConstraintRule::Translation { .. } => 87,
                ConstraintRule::Scale { .. } => 88,
                ConstraintRule::Rotation { .. } => 89,
            },
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ComponentKind::Artboard(_) => "artboard",
            ComponentKind::Node(_) => "node",
            ComponentKind::Shape(_) => "shape",
            ComponentKind::Rectangle(_) => "rectangle",
            ComponentKind::Ellipse(_) => "ellipse",
            ComponentKind::PathComposer(_) => "path_composer",
            ComponentKind::Fill(_) => "fill",
            ComponentKind::Stroke(_) => "stroke",
            ComponentKind::SolidColor(_) => "solid_color",
            ComponentKind::RootBone(_) => "root_bone",
            ComponentKind::Bone(_) => "bone",
            ComponentKind::Constraint(_) => "constraint",
        }
    }

    pub fn transform(&self) -> Option<&TransformData> {
        match self {
            ComponentKind::Node(t) => Some(t),
            ComponentKind::Shape(s) => Some(&s.transform),
            ComponentKind::Rectangle(p) | ComponentKind::Ellipse(p) => Some(&p.transform),
            ComponentKind::RootBone(b) | ComponentKind::Bone(b) => Some(&b.transform),
            _ => None,
        }
    }

    pub fn transform_mut(&mut self) -> Option<&mut TransformData> {
        match self {
            ComponentKind::Node(t) => Some(t),
            ComponentKind::Shape(s) => Some(&mut s.transform),
            ComponentKind::Rectangle(p) | ComponentKind::Ellipse(p) => Some(&mut p.transform),
            ComponentKind::RootBone(b) | ComponentKind::Bone(b) => Some(&mut b.transform),
            _ => None,
        }
    }

    pub fn is_transform(&self) -> bool {
        self.transform().is_some()
    }

    pub fn is_path(&self) -> bool {
        matches!(self, ComponentKind::Rectangle(_) | ComponentKind::Ellipse(_))
    }

    pub fn is_paint(&self) -> bool {
        matches!(self, ComponentKind::Fill(_) | ComponentKind::Stroke(_))
    }

    pub fn is_bone(&self) -> bool {
        matches!(self, ComponentKind::RootBone(_) | ComponentKind::Bone(_))
    }

    /// Kinds that may parent transform components.
    pub fn is_container(&self) -> bool {
        matches!(self, ComponentKind::Artboard(_)) || self.is_transform()
    }

    pub fn paint(&self) -> Option<&PaintData> {
        match self {
            ComponentKind::Fill(p) | ComponentKind::Stroke(p) => Some(p),
            _ => None,
        }
    }

    pub fn paint_mut(&mut self) -> Option<&mut PaintData> {
        match self {
            ComponentKind::Fill(p) | ComponentKind::Stroke(p) => Some(p),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ArtboardData {
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
}

/// Fields shared by every transform component.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransformData {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "one")]
    pub scale_x: f32,
    #[serde(default = "one")]
    pub scale_y: f32,
    #[serde(default = "one")]
    pub opacity: f32,

    #[serde(skip, default = "identity")]
    pub(crate) local: Affine,
    #[serde(skip, default = "identity")]
    pub(crate) world: Affine,
    #[serde(skip, default = "one")]
    pub(crate) render_opacity: f32,
    #[serde(skip)]
    pub(crate) constraints: Vec<ComponentId>,
}

impl Default for TransformData {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 1.0,
            local: Affine::IDENTITY,
            world: Affine::IDENTITY,
            render_opacity: 1.0,
            constraints: Vec::new(),
        }
    }
}

impl TransformData {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    pub fn local_transform(&self) -> Affine {
        self.local
    }

    pub fn world_transform(&self) -> Affine {
        self.world
    }

    pub fn render_opacity(&self) -> f32 {
        self.render_opacity
    }

    /// Constraints attached to this component, in application order.
    pub fn constraints(&self) -> &[ComponentId] {
        &self.constraints
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ShapeData {
    #[serde(flatten)]
    pub transform: TransformData,
    /// Drawing key; lower values are drawn first.
    #[serde(default)]
    pub draw_order: i32,

    #[serde(skip)]
    pub(crate) composer: Option<ComponentId>,
    #[serde(skip)]
    pub(crate) paths: Vec<ComponentId>,
    #[serde(skip)]
    pub(crate) paints: Vec<ComponentId>,
}

impl ShapeData {
    pub fn new(transform: TransformData) -> Self {
        Self {
            transform,
            ..Self::default()
        }
    }

    pub fn with_draw_order(mut self, draw_order: i32) -> Self {
        self.draw_order = draw_order;
        self
    }

    pub fn paths(&self) -> &[ComponentId] {
        &self.paths
    }

    pub fn paints(&self) -> &[ComponentId] {
        &self.paints
    }

    pub fn composer(&self) -> Option<ComponentId> {
        self.composer
    }
}

/// Rectangle and ellipse geometry, centered on the local origin.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ParametricPathData {
    #[serde(flatten)]
    pub transform: TransformData,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub corner_radius: f32,

    #[serde(skip)]
    pub(crate) shape: Option<ComponentId>,
    #[serde(skip)]
    pub(crate) local_path: BezPath,
}

impl ParametricPathData {
    pub fn sized(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn local_path(&self) -> &BezPath {
        &self.local_path
    }

    pub fn shape(&self) -> Option<ComponentId> {
        self.shape
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PathComposerData {
    #[serde(skip)]
    pub(crate) world_path: BezPath,
}

impl PathComposerData {
    /// Union of the shape's paths in artboard space.
    pub fn world_path(&self) -> &BezPath {
        &self.world_path
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaintData {
    #[serde(default = "yes")]
    pub is_visible: bool,
    /// Stroke width; ignored by fills.
    #[serde(default = "one")]
    pub thickness: f32,

    #[serde(skip)]
    pub(crate) shape: Option<ComponentId>,
    #[serde(skip)]
    pub(crate) color_source: Option<ComponentId>,
    #[serde(skip)]
    pub(crate) render_color: u32,
}

impl Default for PaintData {
    fn default() -> Self {
        Self {
            is_visible: true,
            thickness: 1.0,
            shape: None,
            color_source: None,
            render_color: 0,
        }
    }
}

impl PaintData {
    /// A visible paint; `thickness` only matters for strokes.
    pub fn with_thickness(thickness: f32) -> Self {
        Self {
            thickness,
            ..Self::default()
        }
    }

    /// ARGB color after applying the owning shape's render opacity.
    pub fn render_color(&self) -> u32 {
        self.render_color
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolidColorData {
    /// Packed ARGB.
    #[serde(default = "default_color")]
    pub color: u32,
}

impl Default for SolidColorData {
    fn default() -> Self {
        Self {
            color: default_color(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BoneData {
    #[serde(flatten)]
    pub transform: TransformData,
    #[serde(default)]
    pub length: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformSpace {
    #[default]
    World,
    Local,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMode {
    #[default]
    Closer,
    Further,
    Exact,
}

/// What a constraint copies from its target.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintRule {
    Translation {
        #[serde(default = "one")]
        copy_factor_x: f32,
        #[serde(default = "one")]
        copy_factor_y: f32,
        #[serde(default)]
        offset: bool,
        #[serde(default)]
        space: TransformSpace,
    },
    Rotation {
        #[serde(default = "one")]
        copy_factor: f32,
        #[serde(default)]
        offset: bool,
    },
    Scale {
        #[serde(default = "one")]
        copy_factor_x: f32,
        #[serde(default = "one")]
        copy_factor_y: f32,
        #[serde(default)]
        offset: bool,
    },
    Distance {
        #[serde(default)]
        distance: f32,
        #[serde(default)]
        mode: DistanceMode,
    },
    /// Rotates a bone chain so the tip of the constrained bone reaches the
    /// target. Only valid on bones.
    Ik {
        /// Ancestor bones that join the chain above the constrained one.
        #[serde(default)]
        parent_bone_count: u32,
        /// Bend the other way.
        #[serde(default)]
        invert_direction: bool,
    },
}

/// A constraint adjusts its parent's world transform toward a target.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConstraintData {
    pub target: ComponentId,
    #[serde(default = "one")]
    pub strength: f32,
    pub rule: ConstraintRule,
}

impl ConstraintData {
    pub fn new(target: ComponentId, rule: ConstraintRule) -> Self {
        Self {
            target,
            strength: 1.0,
            rule,
        }
    }
}
