//! Per-kind update bodies invoked by the sweep.

use kurbo::{Affine, BezPath, Ellipse, Point, Rect, RoundedRect, Shape as _};

use crate::artboard::Artboard;
use crate::component::{ComponentKind, ConstraintRule, DistanceMode, TransformSpace};
use crate::dirt::{ComponentDirt, Dirt};
use crate::ids::ComponentId;
use crate::math;

fn any(dirt: Dirt, bits: impl Into<Dirt>) -> bool {
    !(dirt & bits.into()).is_empty()
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

impl Artboard {
    pub(crate) fn update_component(&mut self, id: ComponentId, dirt: Dirt) {
        let Some(component) = self.resolve(id) else {
            return;
        };
        match &component.kind {
            ComponentKind::Artboard(_) => {
                if dirt.contains(ComponentDirt::DrawOrder) {
                    self.rebuild_draw_order();
                }
            }
            ComponentKind::PathComposer(_) => {
                if any(dirt, ComponentDirt::Path | ComponentDirt::WorldTransform) {
                    self.compose_paths(id);
                }
            }
            ComponentKind::Fill(_) | ComponentKind::Stroke(_) => {
                if any(dirt, ComponentDirt::Paint | ComponentDirt::RenderOpacity) {
                    self.update_paint(id);
                }
            }
            ComponentKind::SolidColor(_) | ComponentKind::Constraint(_) => {}
            ComponentKind::Node(_)
            | ComponentKind::Shape(_)
            | ComponentKind::Rectangle(_)
            | ComponentKind::Ellipse(_)
            | ComponentKind::RootBone(_)
            | ComponentKind::Bone(_) => self.update_transform(id, dirt),
        }
    }

    fn update_transform(&mut self, id: ComponentId, dirt: Dirt) {
        let Some(component) = self.resolve(id) else {
            return;
        };
        let Some(data) = component.kind.transform() else {
            return;
        };
        let parent = component.parent;
        let parent_world = parent
            .and_then(|p| self.world_transform(p))
            .unwrap_or(Affine::IDENTITY);
        let parent_opacity = parent
            .and_then(|p| self.render_opacity(p))
            .unwrap_or(1.0);

        let mut local = data.local;
        if dirt.contains(ComponentDirt::Transform) {
            let (x, y) = match (&component.kind, parent.and_then(|p| self.resolve(p))) {
                (ComponentKind::Bone(_), Some(p)) => match &p.kind {
                    ComponentKind::RootBone(b) | ComponentKind::Bone(b) => (b.length, 0.0),
                    _ => (data.x, data.y),
                },
                _ => (data.x, data.y),
            };
            local = math::local_transform(x, y, data.rotation, data.scale_x, data.scale_y);
        }

        let mut world = data.world;
        if dirt.contains(ComponentDirt::WorldTransform) {
            world = parent_world * local;
            for constraint in data.constraints.iter().copied() {
                world = self.constrain(constraint, world, parent_world);
            }
        }

        let opacity = data.opacity * parent_opacity;
        let refresh_opacity = any(dirt, ComponentDirt::RenderOpacity | ComponentDirt::WorldTransform);

        let path = match &component.kind {
            ComponentKind::Rectangle(p) if dirt.contains(ComponentDirt::Path) => {
                let (w, h) = (p.width as f64 / 2.0, p.height as f64 / 2.0);
                let r = (p.corner_radius as f64).clamp(0.0, w.min(h).max(0.0));
                let tolerance = self.config.path_tolerance;
                Some(if r > 0.0 {
                    RoundedRect::new(-w, -h, w, h, r).to_path(tolerance)
                } else {
                    Rect::new(-w, -h, w, h).to_path(tolerance)
                })
            }
            ComponentKind::Ellipse(p) if dirt.contains(ComponentDirt::Path) => {
                let radii = (p.width as f64 / 2.0, p.height as f64 / 2.0);
                Some(Ellipse::new(Point::ZERO, radii, 0.0).to_path(self.config.path_tolerance))
            }
            _ => None,
        };

        let Some(component) = self.resolve_mut(id) else {
            return;
        };
        if let Some(path) = path {
            if let ComponentKind::Rectangle(p) | ComponentKind::Ellipse(p) = &mut component.kind {
                p.local_path = path;
            }
        }
        let mut solvers = Vec::new();
        if let Some(data) = component.kind.transform_mut() {
            data.local = local;
            data.world = world;
            if refresh_opacity {
                data.render_opacity = opacity;
            }
            if dirt.contains(ComponentDirt::WorldTransform) {
                solvers.extend(data.constraints.iter().copied());
            }
        }
        for constraint in solvers {
            if self.is_sorted(constraint) {
                self.solve_ik(constraint);
            }
        }
    }

    /// Components added after the last sort take no part in updates yet.
    fn is_sorted(&self, id: ComponentId) -> bool {
        self.resolve(id).is_some_and(|c| c.graph_order.is_some())
    }

    /// Move `world` toward what the constraint asks for, by its strength.
    fn constrain(&self, constraint: ComponentId, world: Affine, parent_world: Affine) -> Affine {
        if !self.is_sorted(constraint) {
            return world;
        }
        let Some(ComponentKind::Constraint(c)) = self.resolve(constraint).map(|c| &c.kind) else {
            return world;
        };
        let Some(target_world) = self.world_transform(c.target) else {
            return world;
        };
        let strength = c.strength as f64;

        match c.rule {
            ConstraintRule::Translation {
                copy_factor_x,
                copy_factor_y,
                offset,
                space,
            } => {
                let current = math::translation(&world);
                let target = math::translation(&target_world);
                let (fx, fy) = (copy_factor_x as f64, copy_factor_y as f64);
                let goal = match space {
                    TransformSpace::World => {
                        let mut g = Point::new(target.x * fx, target.y * fy);
                        if offset {
                            g += current.to_vec2();
                        }
                        g
                    }
                    TransformSpace::Local => {
                        let inverse = math::invert(&parent_world).unwrap_or(Affine::IDENTITY);
                        let t = inverse * target;
                        let mut g = Point::new(t.x * fx, t.y * fy);
                        if offset {
                            g += (inverse * current).to_vec2();
                        }
                        parent_world * g
                    }
                };
                math::with_translation(&world, current.lerp(goal, strength).to_vec2())
            }
            ConstraintRule::Rotation { copy_factor, offset } => {
                let mut parts = math::decompose(&world);
                let copied = math::decompose(&target_world).rotation * copy_factor as f64;
                let goal = if offset { parts.rotation + copied } else { copied };
                parts.rotation += math::angle_delta(parts.rotation, goal) * strength;
                math::compose(&parts)
            }
            ConstraintRule::Scale {
                copy_factor_x,
                copy_factor_y,
                offset,
            } => {
                let mut parts = math::decompose(&world);
                let target = math::decompose(&target_world);
                let mut gx = target.scale_x * copy_factor_x as f64;
                let mut gy = target.scale_y * copy_factor_y as f64;
                if offset {
                    gx *= parts.scale_x;
                    gy *= parts.scale_y;
                }
                parts.scale_x = lerp(parts.scale_x, gx, strength);
                parts.scale_y = lerp(parts.scale_y, gy, strength);
                math::compose(&parts)
            }
            ConstraintRule::Distance { distance, mode } => {
                let current = math::translation(&world);
                let target = math::translation(&target_world);
                let offset = current - target;
                let length = offset.hypot();
                let distance = distance as f64;
                let satisfied = match mode {
                    DistanceMode::Closer => length <= distance,
                    DistanceMode::Further => length >= distance,
                    DistanceMode::Exact => false,
                };
                if satisfied || length == 0.0 {
                    return world;
                }
                let goal = target + offset * (distance / length);
                math::with_translation(&world, current.lerp(goal, strength).to_vec2())
            }
            // Solved after the world transform is stored; see `solve_ik`.
            ConstraintRule::Ik { .. } => world,
        }
    }

    fn compose_paths(&mut self, id: ComponentId) {
        let Some(shape) = self.resolve(id).and_then(|c| c.parent) else {
            return;
        };
        let Some(ComponentKind::Shape(s)) = self.resolve(shape).map(|c| &c.kind) else {
            return;
        };
        let mut merged = BezPath::new();
        for path in &s.paths {
            let Some(ComponentKind::Rectangle(p) | ComponentKind::Ellipse(p)) =
                self.resolve(*path).map(|c| &c.kind)
            else {
                continue;
            };
            let world = p.transform.world;
            for el in p.local_path.elements() {
                merged.push(world * *el);
            }
        }
        if let Some(ComponentKind::PathComposer(c)) = self.resolve_mut(id).map(|c| &mut c.kind) {
            c.world_path = merged;
        }
    }

    fn update_paint(&mut self, id: ComponentId) {
        let Some(paint) = self.resolve(id).and_then(|c| c.kind.paint()) else {
            return;
        };
        let opacity = paint
            .shape
            .and_then(|s| self.render_opacity(s))
            .unwrap_or(1.0);
        let base = match paint.color_source.and_then(|c| self.resolve(c)).map(|c| &c.kind) {
            Some(ComponentKind::SolidColor(color)) => color.color,
            _ => 0,
        };
        let color = modulate_alpha(base, opacity);
        if let Some(paint) = self.resolve_mut(id).and_then(|c| c.kind.paint_mut()) {
            paint.render_color = color;
        }
    }
}

/// Scale the alpha channel of a packed ARGB color.
pub(crate) fn modulate_alpha(argb: u32, opacity: f32) -> u32 {
    let alpha = ((argb >> 24) & 0xFF) as f32 * opacity.clamp(0.0, 1.0);
    ((alpha.round() as u32) << 24) | (argb & 0x00FF_FFFF)
}

#[cfg(test)]
mod tests {
    use super::modulate_alpha;

    #[test]
    fn alpha_modulation() {
        assert_eq!(modulate_alpha(0xFF11_2233, 1.0), 0xFF11_2233);
        assert_eq!(modulate_alpha(0xFF11_2233, 0.0), 0x0011_2233);
        assert_eq!(modulate_alpha(0xFF11_2233, 0.5) >> 24, 128);
    }
}
