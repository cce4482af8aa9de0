//! Inverse kinematics for bone chains.
//!
//! The constraint sits on the tip bone. While the tip updates, the chain
//! (tip plus up to `parent_bone_count` ancestor bones) is re-posed:
//! - one bone turns to face the target,
//! - two bones are solved with the law of cosines,
//! - longer chains solve each bone against the tip in turn.
//!
//! Strength below one blends each bone's rotation from its FK pose toward the
//! solved angle along the shortest arc.

use std::f64::consts::{PI, TAU};

use kurbo::{Affine, Point, Vec2};

use crate::artboard::Artboard;
use crate::component::{ComponentKind, ConstraintRule};
use crate::ids::ComponentId;
use crate::math::{self, TransformComponents};

#[derive(Clone, Copy, Debug)]
struct ChainLink {
    bone: ComponentId,
    parent_world_inverse: Affine,
    /// FK pose relative to the parent, captured before solving.
    pose: TransformComponents,
    angle: f64,
}

/// Apply only the linear part of `m`.
fn transform_dir(m: &Affine, v: Vec2) -> Vec2 {
    let [a, b, c, d, _, _] = m.as_coeffs();
    Vec2::new(a * v.x + c * v.y, b * v.x + d * v.y)
}

fn angle_of(v: Vec2) -> f64 {
    v.y.atan2(v.x)
}

/// Angle opposite the side whose squared length leads `numerator`, or zero
/// when a side has no length.
fn cosine_angle(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    (numerator / denominator).clamp(-1.0, 1.0).acos()
}

impl Artboard {
    /// Bones an IK constraint poses, root first and ending at the bone it sits
    /// on. Empty for other constraints.
    pub(crate) fn ik_chain(&self, constraint: ComponentId) -> Vec<ComponentId> {
        let Some(component) = self.resolve(constraint) else {
            return Vec::new();
        };
        let ComponentKind::Constraint(c) = &component.kind else {
            return Vec::new();
        };
        let ConstraintRule::Ik { parent_bone_count, .. } = c.rule else {
            return Vec::new();
        };
        let Some(tip) = component.parent.filter(|p| self.is_bone(*p)) else {
            return Vec::new();
        };

        let mut chain = vec![tip];
        let mut remaining = parent_bone_count;
        let mut bone = tip;
        while remaining > 0 {
            let Some(parent) = self.resolve(bone).and_then(|b| b.parent).filter(|p| self.is_bone(*p)) else {
                break;
            };
            chain.push(parent);
            bone = parent;
            remaining -= 1;
        }
        chain.reverse();
        chain
    }

    fn is_bone(&self, id: ComponentId) -> bool {
        self.resolve(id).is_some_and(|c| c.kind.is_bone())
    }

    fn parent_world(&self, id: ComponentId) -> Affine {
        self.resolve(id)
            .and_then(|c| c.parent)
            .and_then(|p| self.world_transform(p))
            .unwrap_or(Affine::IDENTITY)
    }

    fn bone_world(&self, id: ComponentId) -> Affine {
        self.world_transform(id).unwrap_or(Affine::IDENTITY)
    }

    fn bone_tip(&self, id: ComponentId) -> Point {
        let length = match self.resolve(id).map(|c| &c.kind) {
            Some(ComponentKind::RootBone(b) | ComponentKind::Bone(b)) => b.length as f64,
            _ => 0.0,
        };
        self.bone_world(id) * Point::new(length, 0.0)
    }

    fn set_bone_transform(&mut self, id: ComponentId, local: Affine) {
        let world = self.parent_world(id) * local;
        if let Some(t) = self.resolve_mut(id).and_then(|c| c.kind.transform_mut()) {
            t.local = local;
            t.world = world;
        }
    }

    /// Re-pose `link`'s bone with `rotation`, keeping the rest of its pose.
    fn constrain_rotation(&mut self, link: &ChainLink, rotation: f64) {
        let local = math::compose(&TransformComponents {
            rotation,
            ..link.pose
        });
        self.set_bone_transform(link.bone, local);
    }

    /// Run the IK constraint `constraint`. Called while its tip bone updates.
    pub(crate) fn solve_ik(&mut self, constraint: ComponentId) {
        let Some(ComponentKind::Constraint(c)) = self.resolve(constraint).map(|c| &c.kind) else {
            return;
        };
        let ConstraintRule::Ik { invert_direction, .. } = c.rule else {
            return;
        };
        let strength = c.strength as f64;
        let Some(target) = self.world_transform(c.target).map(|m| math::translation(&m)) else {
            return;
        };

        let mut links: Vec<ChainLink> = Vec::new();
        for bone in self.ik_chain(constraint) {
            let parent_world_inverse = math::invert(&self.parent_world(bone)).unwrap_or(Affine::IDENTITY);
            let local = parent_world_inverse * self.bone_world(bone);
            if let Some(t) = self.resolve_mut(bone).and_then(|c| c.kind.transform_mut()) {
                t.local = local;
            }
            links.push(ChainLink {
                bone,
                parent_world_inverse,
                pose: math::decompose(&local),
                angle: 0.0,
            });
        }

        match links.len() {
            0 => return,
            1 => self.solve_one(&mut links[0], target),
            2 => self.solve_two(&mut links, 0, 1, target, invert_direction),
            count => {
                let last = count - 1;
                for i in 0..last {
                    self.solve_two(&mut links, i, last, target, invert_direction);
                    for j in i + 1..count {
                        let bone = links[j].bone;
                        links[j].parent_world_inverse =
                            math::invert(&self.parent_world(bone)).unwrap_or(Affine::IDENTITY);
                        let local = self.resolve(bone).and_then(|c| c.kind.transform()).map(|t| t.local);
                        if let Some(local) = local {
                            self.set_bone_transform(bone, local);
                        }
                    }
                }
            }
        }

        if strength != 1.0 {
            for link in &links {
                let from = link.pose.rotation % TAU;
                let to = link.angle % TAU;
                let mut diff = to - from;
                if diff > PI {
                    diff -= TAU;
                } else if diff < -PI {
                    diff += TAU;
                }
                self.constrain_rotation(link, from + diff * strength);
            }
        }
    }

    fn solve_one(&mut self, link: &mut ChainLink, target: Point) {
        let origin = math::translation(&self.bone_world(link.bone));
        let local = transform_dir(&link.parent_world_inverse, target - origin);
        let rotation = angle_of(local);
        self.constrain_rotation(link, rotation);
        link.angle = rotation;
    }

    /// Solve `links[first]` and its child against `links[tip]`.
    fn solve_two(&mut self, links: &mut [ChainLink], first: usize, tip: usize, target: Point, invert: bool) {
        let child = first + 1;
        let b1 = links[first].bone;
        let b2 = links[tip].bone;
        let inverse = links[first].parent_world_inverse;

        let pa = inverse * math::translation(&self.bone_world(b1));
        let pc = inverse * math::translation(&self.bone_world(links[child].bone));
        let pb = inverse * self.bone_tip(b2);
        let pt = inverse * target;

        let av = pb - pc;
        let bv = pc - pa;
        let cv = pt - pa;
        let (a, b, c) = (av.hypot(), bv.hypot(), cv.hypot());

        let angle_a = cosine_angle(-a * a + b * b + c * c, 2.0 * b * c);
        let angle_c = cosine_angle(a * a + b * b - c * c, 2.0 * a * b);

        // When bones sit between the child and the tip, correct for the bend
        // they already carry.
        let correction = match links.get(first + 2) {
            Some(second) if self.resolve(b2).and_then(|c| c.parent) != Some(b1) => {
                let pc = math::translation(&self.bone_world(links[child].bone));
                let local = transform_dir(&second.parent_world_inverse, self.bone_tip(b2) - pc);
                -angle_of(local)
            }
            _ => 0.0,
        };

        let (r1, r2) = if invert {
            (angle_of(cv) - angle_a, -angle_c + PI + correction)
        } else {
            (angle_a + angle_of(cv), angle_c - PI + correction)
        };

        let first_link = links[first];
        self.constrain_rotation(&first_link, r1);
        let child_link = links[child];
        self.constrain_rotation(&child_link, r2);
        if child != tip {
            let local = self.resolve(b2).and_then(|c| c.kind.transform()).map(|t| t.local);
            if let Some(local) = local {
                self.set_bone_transform(b2, local);
            }
        }
        links[first].angle = r1;
        links[child].angle = r2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ArtboardData, BoneData, Component, ConstraintData, TransformData};

    fn bone(parent: u32, length: f32, root: bool) -> Option<Component> {
        let data = BoneData {
            transform: TransformData::default(),
            length,
        };
        let kind = if root {
            ComponentKind::RootBone(data)
        } else {
            ComponentKind::Bone(data)
        };
        Some(Component::new("", Some(ComponentId(parent)), kind))
    }

    #[test]
    fn chain_walks_parent_bones_up_to_the_count() {
        let ik = |count| {
            Some(Component::new(
                "",
                Some(ComponentId(3)),
                ComponentKind::Constraint(ConstraintData::new(
                    ComponentId(5),
                    ConstraintRule::Ik {
                        parent_bone_count: count,
                        invert_direction: false,
                    },
                )),
            ))
        };
        let objects = |count| {
            vec![
                Some(Component::new("ab", None, ComponentKind::Artboard(ArtboardData::default()))),
                bone(0, 10.0, true),
                bone(1, 10.0, false),
                bone(2, 10.0, false),
                ik(count),
                Some(Component::new("target", Some(ComponentId(0)), ComponentKind::Node(TransformData::default()))),
            ]
        };
        let ab = Artboard::from_objects(objects(1)).unwrap();
        assert_eq!(ab.ik_chain(ComponentId(4)), vec![ComponentId(2), ComponentId(3)]);
        let ab = Artboard::from_objects(objects(9)).unwrap();
        assert_eq!(
            ab.ik_chain(ComponentId(4)),
            vec![ComponentId(1), ComponentId(2), ComponentId(3)]
        );
        assert!(ab.ik_chain(ComponentId(3)).is_empty());
    }

    #[test]
    fn cosine_angle_guards_degenerate_sides() {
        assert_eq!(cosine_angle(1.0, 0.0), 0.0);
        assert!((cosine_angle(-4.0, 2.0) - PI).abs() < 1e-12);
    }
}
