//! The artboard: root component and owner of the object arena.
//!
//! - `initialize` links every object (two passes), builds dependency edges and
//!   computes the dependency order once.
//! - `add_dirt` marks components and optionally their dependents, notifying the
//!   artboard so the next sweep runs.
//! - `update_components` walks the dependency order and calls each dirty
//!   component's update exactly once, restarting if an update dirtied a
//!   component earlier in the order.

use hashbrown::HashMap;
use kurbo::{Affine, BezPath, Point};
use log::{debug, trace, warn};
use serde::Deserialize;

use crate::component::{Component, ComponentKind, PathComposerData};
use crate::config::SceneConfig;
use crate::dependency::DependencySorter;
use crate::dirt::{filthy, ComponentDirt, Dirt};
use crate::ids::ComponentId;
use crate::math;
use crate::status::{ImportError, StatusCode};

/// Counters from the most recent `update_components` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Passes over the dependency order, including restarts.
    pub passes: u32,
    /// Calls into component updates.
    pub updates: u32,
}

#[derive(Deserialize)]
struct ArtboardDocument {
    objects: Vec<Option<Component>>,
}

#[derive(Clone, Debug)]
pub struct Artboard {
    pub(crate) objects: Vec<Option<Component>>,
    pub(crate) dependency_order: Vec<ComponentId>,
    pub(crate) draw_order: Vec<ComponentId>,
    /// Artboard-level flags, only `Components` is used.
    pub(crate) dirt: Dirt,
    pub(crate) dirt_depth: u32,
    pub(crate) config: SceneConfig,
    names: HashMap<String, ComponentId>,
    initialized: bool,
    is_instance: bool,
    last_sweep: SweepStats,
}

impl Artboard {
    /// Wrap an object list whose slot 0 is the artboard. Nothing is linked
    /// until [`Artboard::initialize`] runs.
    pub fn new(objects: Vec<Option<Component>>) -> Self {
        Self::with_config(objects, SceneConfig::default())
    }

    pub fn with_config(objects: Vec<Option<Component>>, config: SceneConfig) -> Self {
        Self {
            objects,
            dependency_order: Vec::new(),
            draw_order: Vec::new(),
            dirt: Dirt::default(),
            dirt_depth: 0,
            config,
            names: HashMap::new(),
            initialized: false,
            is_instance: false,
            last_sweep: SweepStats::default(),
        }
    }

    /// Build and initialize in one step.
    pub fn from_objects(objects: Vec<Option<Component>>) -> Result<Self, StatusCode> {
        let mut artboard = Self::new(objects);
        artboard.initialize()?;
        Ok(artboard)
    }

    /// Parse `{ "objects": [ ... ] }` and initialize the result.
    pub fn from_json(text: &str) -> Result<Self, ImportError> {
        let doc: ArtboardDocument = serde_json::from_str(text)?;
        if doc.objects.is_empty() {
            return Err(ImportError::Empty);
        }
        Ok(Self::from_objects(doc.objects)?)
    }

    /// Link all objects, build the dependency graph and sort it.
    ///
    /// Fails on the first link error; the artboard must then be discarded.
    pub fn initialize(&mut self) -> Result<(), StatusCode> {
        if self.initialized {
            return Ok(());
        }
        match self.objects.first() {
            Some(Some(c)) if matches!(c.kind, ComponentKind::Artboard(_)) => {}
            _ => {
                return Err(StatusCode::invalid(
                    ComponentId::ARTBOARD,
                    "slot 0 must hold the artboard",
                ))
            }
        }

        self.attach_implicit_components();

        for index in 0..self.objects.len() {
            self.link_dirty(ComponentId::from_index(index))?;
        }
        for index in 0..self.objects.len() {
            self.link_clean(ComponentId::from_index(index))?;
        }

        for (index, slot) in self.objects.iter_mut().enumerate() {
            if let Some(component) = slot {
                component.dirt = filthy();
                if !component.name.is_empty() {
                    self.names
                        .entry(component.name.clone())
                        .or_insert(ComponentId::from_index(index));
                }
            }
        }

        self.sort_dependencies();
        self.rebuild_draw_order();
        self.initialized = true;
        debug!(
            "artboard initialized: {} objects, {} ordered, {} drawables",
            self.objects.len(),
            self.dependency_order.len(),
            self.draw_order.len()
        );
        Ok(())
    }

    /// Every shape gets a composer child that merges its paths.
    fn attach_implicit_components(&mut self) {
        let shapes: Vec<ComponentId> = self
            .objects
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Some(c) if matches!(c.kind, ComponentKind::Shape(_)) => {
                    Some(ComponentId::from_index(i))
                }
                _ => None,
            })
            .collect();
        for shape in shapes {
            self.objects.push(Some(Component::new(
                "",
                Some(shape),
                ComponentKind::PathComposer(PathComposerData::default()),
            )));
        }
    }

    /// Clear previous edges, rebuild them and recompute the dependency order.
    pub(crate) fn sort_dependencies(&mut self) {
        for component in self.objects.iter_mut().flatten() {
            component.dependents.clear();
            component.graph_order = None;
        }
        for index in 0..self.objects.len() {
            self.build_dependencies(ComponentId::from_index(index));
        }

        let mut sorter = DependencySorter::new(self.objects.len());
        let order = sorter.sort(&mut self.objects);
        for (position, id) in order.iter().enumerate() {
            if let Some(component) = self.objects[id.index()].as_mut() {
                component.graph_order = Some(position as u32);
            }
        }
        debug!("dependency order computed for {} components", order.len());
        self.dependency_order = order;
        self.dirt |= ComponentDirt::Components;
        self.dirt_depth = 0;
    }

    /// Re-run build + sort after components were added post-initialize.
    pub fn rebuild_dependencies(&mut self) {
        self.sort_dependencies();
        self.rebuild_draw_order();
    }

    /// Append a component to a live artboard. It is linked immediately but
    /// takes no part in the sweep until [`Artboard::rebuild_dependencies`].
    pub fn add_component(&mut self, mut component: Component) -> Result<ComponentId, StatusCode> {
        let id = ComponentId::from_index(self.objects.len());
        component.dirt = filthy();
        let is_shape = matches!(component.kind, ComponentKind::Shape(_));
        let name = component.name.clone();
        self.objects.push(Some(component));

        let mut added = vec![id];
        if is_shape {
            let composer = ComponentId::from_index(self.objects.len());
            let mut c = Component::new(
                "",
                Some(id),
                ComponentKind::PathComposer(PathComposerData::default()),
            );
            c.dirt = filthy();
            self.objects.push(Some(c));
            added.push(composer);
        }

        let linked = added
            .iter()
            .try_for_each(|&a| self.link_dirty(a))
            .and_then(|_| added.iter().try_for_each(|&a| self.link_clean(a)));
        if let Err(err) = linked {
            self.detach(&added);
            return Err(err);
        }
        if !name.is_empty() {
            self.names.entry(name).or_insert(id);
        }
        Ok(id)
    }

    /// Roll back a failed `add_component`.
    fn detach(&mut self, added: &[ComponentId]) {
        for component in self.objects.iter_mut().flatten() {
            component.children.retain(|c| !added.contains(c));
            if let Some(t) = component.kind.transform_mut() {
                t.constraints.retain(|c| !added.contains(c));
            }
            match &mut component.kind {
                ComponentKind::Shape(s) => {
                    s.paths.retain(|c| !added.contains(c));
                    s.paints.retain(|c| !added.contains(c));
                    if s.composer.is_some_and(|c| added.contains(&c)) {
                        s.composer = None;
                    }
                }
                ComponentKind::Fill(p) | ComponentKind::Stroke(p) => {
                    if p.color_source.is_some_and(|c| added.contains(&c)) {
                        p.color_source = None;
                    }
                }
                _ => {}
            }
        }
        let keep = added.iter().map(|a| a.index()).min().unwrap_or(self.objects.len());
        self.objects.truncate(keep);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn name(&self) -> &str {
        self.resolve(ComponentId::ARTBOARD)
            .map(|c| c.name())
            .unwrap_or_default()
    }

    pub fn width(&self) -> f32 {
        match self.resolve(ComponentId::ARTBOARD).map(|c| &c.kind) {
            Some(ComponentKind::Artboard(a)) => a.width,
            _ => 0.0,
        }
    }

    pub fn height(&self) -> f32 {
        match self.resolve(ComponentId::ARTBOARD).map(|c| &c.kind) {
            Some(ComponentKind::Artboard(a)) => a.height,
            _ => 0.0,
        }
    }

    /// Look up a component by id. Null slots and out-of-range ids yield `None`.
    pub fn resolve(&self, id: ComponentId) -> Option<&Component> {
        self.objects.get(id.index()).and_then(|slot| slot.as_ref())
    }

    pub(crate) fn resolve_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.objects.get_mut(id.index()).and_then(|slot| slot.as_mut())
    }

    /// First component carrying `name`, in object order.
    pub fn find(&self, name: &str) -> Option<ComponentId> {
        self.names.get(name).copied()
    }

    pub fn objects(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.objects
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|c| (ComponentId::from_index(i), c)))
    }

    /// Components in update order; producers precede consumers.
    pub fn dependency_order(&self) -> &[ComponentId] {
        &self.dependency_order
    }

    /// Drawables in paint order.
    pub fn draw_order(&self) -> &[ComponentId] {
        &self.draw_order
    }

    pub fn last_sweep(&self) -> SweepStats {
        self.last_sweep
    }

    /// Whether the next sweep has work.
    pub fn has_dirt(&self) -> bool {
        self.dirt.contains(ComponentDirt::Components)
    }

    /// Register `dependent` as depending on `on`. Duplicate registration is a
    /// programming error: it asserts in debug builds and is ignored otherwise.
    pub fn add_dependent(&mut self, on: ComponentId, dependent: ComponentId) {
        let Some(component) = self.resolve_mut(on) else {
            return;
        };
        if component.dependents.contains(&dependent) {
            debug_assert!(false, "{dependent} already depends on {on}");
            return;
        }
        component.dependents.push(dependent);
    }

    /// OR `value` into the component's dirt. Returns `false` without touching
    /// anything when every requested bit was already set; otherwise notifies
    /// the artboard and, if `recurse`, pushes the same bits to every dependent.
    /// Dependents that already carry the bits stop the walk down their branch.
    pub fn add_dirt(&mut self, id: ComponentId, value: impl Into<Dirt>, recurse: bool) -> bool {
        let value = value.into();
        if !self.add_own_dirt(id, value) {
            return false;
        }
        if recurse {
            let mut stack: Vec<ComponentId> = self
                .resolve(id)
                .map(|c| c.dependents.iter().rev().copied().collect())
                .unwrap_or_default();
            while let Some(next) = stack.pop() {
                if self.add_own_dirt(next, value) {
                    if let Some(c) = self.resolve(next) {
                        stack.extend(c.dependents.iter().rev().copied());
                    }
                }
            }
        }
        true
    }

    fn add_own_dirt(&mut self, id: ComponentId, value: Dirt) -> bool {
        let Some(component) = self.resolve_mut(id) else {
            return false;
        };
        if component.dirt.contains(value) {
            return false;
        }
        component.dirt |= value;
        let order = component.graph_order;
        let constraint_owner = match component.kind {
            ComponentKind::Constraint(_) => component.parent,
            _ => None,
        };

        self.on_component_dirty(order);

        if let Some(owner) = constraint_owner {
            self.mark_transform_dirty(owner);
            // IK also poses the bones above the one it sits on.
            for bone in self.ik_chain(id) {
                if bone != owner {
                    self.mark_transform_dirty(bone);
                }
            }
        }
        true
    }

    fn on_component_dirty(&mut self, order: Option<u32>) {
        self.dirt |= ComponentDirt::Components;
        if let Some(order) = order {
            if order < self.dirt_depth {
                self.dirt_depth = order;
            }
        }
    }

    /// Local transform changed: mark it, then the world transform of the
    /// component and everything downstream.
    pub fn mark_transform_dirty(&mut self, id: ComponentId) {
        if !self.add_dirt(id, ComponentDirt::Transform, false) {
            return;
        }
        self.mark_world_transform_dirty(id);
    }

    pub fn mark_world_transform_dirty(&mut self, id: ComponentId) {
        self.add_dirt(id, ComponentDirt::WorldTransform, true);
    }

    /// Run the sweep. Returns `true` if anything was dirty on entry.
    pub fn update_components(&mut self) -> bool {
        if !self.dirt.contains(ComponentDirt::Components) {
            self.last_sweep = SweepStats::default();
            return false;
        }
        let max_steps = self.config.max_update_passes.max(1);
        let mut stats = SweepStats::default();

        while self.dirt.contains(ComponentDirt::Components) && stats.passes < max_steps {
            self.dirt &= !Dirt::from(ComponentDirt::Components);
            stats.passes += 1;

            let count = self.dependency_order.len();
            let mut i = 0;
            while i < count {
                let id = self.dependency_order[i];
                self.dirt_depth = i as u32;
                let Some(component) = self.resolve_mut(id) else {
                    i += 1;
                    continue;
                };
                let dirt = component.dirt;
                if dirt.is_empty() {
                    i += 1;
                    continue;
                }
                component.dirt = Dirt::default();
                trace!("update {id} ({}) {:?}", component.kind.kind_name(), dirt);
                self.update_component(id, dirt);
                stats.updates += 1;

                if (self.dirt_depth as usize) < i {
                    break;
                }
                i += 1;
            }
        }

        if self.dirt.contains(ComponentDirt::Components) {
            warn!(
                "update sweep stopped after {} passes with components still dirty",
                stats.passes
            );
        }
        self.last_sweep = stats;
        true
    }

    /// Per-frame entry point for the scene; returns whether anything updated.
    pub fn advance(&mut self, _elapsed_seconds: f32) -> bool {
        self.update_components()
    }

    /// Copy the mutable graph. Dependency order and draw order carry over.
    pub fn instance(&self) -> Artboard {
        let mut copy = self.clone();
        copy.is_instance = true;
        copy
    }

    pub fn is_instance(&self) -> bool {
        self.is_instance
    }

    pub fn world_transform(&self, id: ComponentId) -> Option<Affine> {
        match self.resolve(id)?.kind {
            ComponentKind::Artboard(_) => Some(Affine::IDENTITY),
            ref kind => kind.transform().map(|t| t.world),
        }
    }

    pub fn render_opacity(&self, id: ComponentId) -> Option<f32> {
        match self.resolve(id)?.kind {
            ComponentKind::Artboard(_) => Some(1.0),
            ref kind => kind.transform().map(|t| t.render_opacity),
        }
    }

    /// Map an artboard-space point into `id`'s local space.
    pub fn world_to_local(&self, id: ComponentId, point: Point) -> Result<Point, StatusCode> {
        let world = self.world_transform(id).ok_or_else(|| {
            StatusCode::invalid(id, "component has no transform")
        })?;
        let inverse = math::invert(&world).ok_or(StatusCode::FailedInversion { id })?;
        Ok(inverse * point)
    }

    /// Merged artboard-space geometry of a shape.
    pub fn shape_path(&self, shape: ComponentId) -> Option<&BezPath> {
        let ComponentKind::Shape(s) = &self.resolve(shape)?.kind else {
            return None;
        };
        match &self.resolve(s.composer?)?.kind {
            ComponentKind::PathComposer(p) => Some(&p.world_path),
            _ => None,
        }
    }

    /// Stable sort of drawables by their draw order key.
    pub(crate) fn rebuild_draw_order(&mut self) {
        let mut drawables: Vec<(i32, ComponentId)> = self
            .objects()
            .filter_map(|(id, c)| match &c.kind {
                ComponentKind::Shape(s) => Some((s.draw_order, id)),
                _ => None,
            })
            .collect();
        drawables.sort_by_key(|(z, _)| *z);
        self.draw_order = drawables.into_iter().map(|(_, id)| id).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ArtboardData, TransformData};

    fn artboard_with_nodes(n: usize) -> Artboard {
        let mut objects = vec![Some(Component::new(
            "root",
            None,
            ComponentKind::Artboard(ArtboardData::default()),
        ))];
        for i in 0..n {
            objects.push(Some(Component::new(
                format!("n{i}"),
                Some(ComponentId::from_index(i)),
                ComponentKind::Node(TransformData::default()),
            )));
        }
        Artboard::from_objects(objects).unwrap()
    }

    #[test]
    fn add_dirt_short_circuits_when_bits_present() {
        let mut ab = artboard_with_nodes(2);
        ab.update_components();
        let n = ComponentId(1);
        assert!(ab.add_dirt(n, ComponentDirt::Path, false));
        let masks = |ab: &Artboard| -> Vec<Dirt> { ab.objects().map(|(_, c)| c.dirt()).collect() };
        let before = masks(&ab);
        let depth = ab.dirt_depth;

        // A recursive call would reach the child; the short circuit must stop it.
        assert!(!ab.add_dirt(n, ComponentDirt::Path, true));
        assert_eq!(masks(&ab), before);
        assert!(ab.resolve(ComponentId(2)).unwrap().dirt().is_empty());
        assert_eq!(ab.dirt_depth, depth);
        assert!(ab.has_dirt());
    }

    #[test]
    fn deep_chains_propagate_without_recursion() {
        let mut ab = artboard_with_nodes(50_000);
        ab.update_components();
        assert!(ab.add_dirt(ComponentId(1), ComponentDirt::Paint, true));
        assert!(ab.objects().skip(1).all(|(_, c)| c.has_dirt(ComponentDirt::Paint)));
    }

    #[test]
    fn sweep_clears_dirt_and_reports_stats() {
        let mut ab = artboard_with_nodes(3);
        assert!(ab.update_components());
        assert!(!ab.has_dirt());
        assert!(ab.objects().all(|(_, c)| c.dirt().is_empty()));
        assert_eq!(ab.last_sweep().passes, 1);
        assert!(!ab.update_components());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "already depends")]
    fn duplicate_dependent_asserts_in_debug() {
        let mut ab = artboard_with_nodes(1);
        ab.add_dependent(ComponentId(0), ComponentId(1));
    }

    #[test]
    fn first_slot_must_be_artboard() {
        let objects = vec![Some(Component::new(
            "n",
            None,
            ComponentKind::Node(TransformData::default()),
        ))];
        let err = Artboard::from_objects(objects).unwrap_err();
        assert_eq!(err.category(), "invalid_object");
    }
}
