//! Two-phase linking run by `Artboard::initialize`.
//!
//! Pass one resolves each component's own references (parent, constraint
//! target) and fills in children lists. Pass two runs once every component
//! has finished pass one, so it may walk ancestors and register with them.

use crate::artboard::Artboard;
use crate::component::{ComponentKind, ConstraintRule};
use crate::ids::ComponentId;
use crate::status::{Status, StatusCode};

impl Artboard {
    pub(crate) fn link_dirty(&mut self, id: ComponentId) -> Status {
        let Some(component) = self.resolve(id) else {
            return Ok(());
        };
        if id == ComponentId::ARTBOARD {
            return Ok(());
        }
        if matches!(component.kind, ComponentKind::Artboard(_)) {
            return Err(StatusCode::invalid(id, "only slot 0 may hold an artboard"));
        }
        let parent = component
            .parent_id
            .ok_or_else(|| StatusCode::invalid(id, "component has no parent"))?;
        if parent == id {
            return Err(StatusCode::invalid(id, "component is its own parent"));
        }
        if self.resolve(parent).is_none() {
            return Err(StatusCode::MissingObject {
                id,
                what: "parent",
                reference: parent,
            });
        }

        if let ComponentKind::Constraint(constraint) = &component.kind {
            let target = constraint.target;
            match self.resolve(target) {
                None => {
                    return Err(StatusCode::MissingObject {
                        id,
                        what: "target",
                        reference: target,
                    })
                }
                Some(t) if !t.kind.is_transform() => {
                    return Err(StatusCode::invalid(
                        id,
                        format!("constraint target {target} is a {}", t.kind.kind_name()),
                    ))
                }
                Some(_) => {}
            }
        }

        if let Some(component) = self.resolve_mut(id) {
            component.parent = Some(parent);
        }
        if let Some(parent) = self.resolve_mut(parent) {
            parent.children.push(id);
        }
        Ok(())
    }

    pub(crate) fn link_clean(&mut self, id: ComponentId) -> Status {
        let Some(component) = self.resolve(id) else {
            return Ok(());
        };
        let Some(parent_id) = component.parent else {
            return Ok(());
        };
        let parent_kind = match self.resolve(parent_id) {
            Some(p) => &p.kind,
            None => return Ok(()),
        };
        let kind = &component.kind;

        match kind {
            ComponentKind::Artboard(_) => Ok(()),
            ComponentKind::Node(_) | ComponentKind::Shape(_) | ComponentKind::RootBone(_) => {
                expect_parent(id, parent_kind.is_container(), "a transform container", parent_kind)
            }
            ComponentKind::Bone(_) => {
                expect_parent(id, parent_kind.is_bone(), "a bone", parent_kind)
            }
            ComponentKind::Rectangle(_) | ComponentKind::Ellipse(_) => {
                expect_parent(id, parent_kind.is_container(), "a transform container", parent_kind)?;
                let shape = self.shape_ancestor(id).ok_or_else(|| {
                    StatusCode::invalid(id, "path has no shape ancestor")
                })?;
                if let Some(c) = self.resolve_mut(id) {
                    if let ComponentKind::Rectangle(p) | ComponentKind::Ellipse(p) = &mut c.kind {
                        p.shape = Some(shape);
                    }
                }
                if let Some(ComponentKind::Shape(s)) = self.resolve_mut(shape).map(|c| &mut c.kind) {
                    s.paths.push(id);
                }
                Ok(())
            }
            ComponentKind::PathComposer(_) => {
                expect_parent(id, matches!(parent_kind, ComponentKind::Shape(_)), "a shape", parent_kind)?;
                if let Some(ComponentKind::Shape(s)) = self.resolve_mut(parent_id).map(|c| &mut c.kind) {
                    s.composer = Some(id);
                }
                Ok(())
            }
            ComponentKind::Fill(_) | ComponentKind::Stroke(_) => {
                expect_parent(id, matches!(parent_kind, ComponentKind::Shape(_)), "a shape", parent_kind)?;
                if let Some(paint) = self.resolve_mut(id).and_then(|c| c.kind.paint_mut()) {
                    paint.shape = Some(parent_id);
                }
                if let Some(ComponentKind::Shape(s)) = self.resolve_mut(parent_id).map(|c| &mut c.kind) {
                    s.paints.push(id);
                }
                Ok(())
            }
            ComponentKind::SolidColor(_) => {
                let Some(paint) = parent_kind.paint() else {
                    return expect_parent(id, false, "a fill or stroke", parent_kind);
                };
                if paint.color_source.is_some() {
                    return Err(StatusCode::invalid(id, "paint already has a color"));
                }
                if let Some(paint) = self.resolve_mut(parent_id).and_then(|c| c.kind.paint_mut()) {
                    paint.color_source = Some(id);
                }
                Ok(())
            }
            ComponentKind::Constraint(c) => {
                if matches!(c.rule, ConstraintRule::Ik { .. }) {
                    expect_parent(id, parent_kind.is_bone(), "a bone", parent_kind)?;
                }
                expect_parent(id, parent_kind.is_transform(), "a transform component", parent_kind)?;
                if let Some(t) = self.resolve_mut(parent_id).and_then(|c| c.kind.transform_mut()) {
                    t.constraints.push(id);
                }
                Ok(())
            }
        }
    }

    /// Nearest shape above `id`, walking resolved parents.
    fn shape_ancestor(&self, id: ComponentId) -> Option<ComponentId> {
        let mut current = self.resolve(id)?.parent;
        while let Some(ancestor) = current {
            let component = self.resolve(ancestor)?;
            if matches!(component.kind, ComponentKind::Shape(_)) {
                return Some(ancestor);
            }
            current = component.parent;
        }
        None
    }
}

fn expect_parent(id: ComponentId, ok: bool, wanted: &str, actual: &ComponentKind) -> Status {
    if ok {
        Ok(())
    } else {
        Err(StatusCode::invalid(
            id,
            format!("parent must be {wanted}, found {}", actual.kind_name()),
        ))
    }
}
