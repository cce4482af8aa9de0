//! Keyed property access used by animations and hosts.
//!
//! Setters compare against the stored value and, when it changes, run the
//! property's change notification so the right dirt reaches the right
//! components.

use serde::{Deserialize, Serialize};

use crate::artboard::Artboard;
use crate::component::{ComponentKind, ConstraintRule};
use crate::dirt::ComponentDirt;
use crate::ids::ComponentId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKey {
    X,
    Y,
    Rotation,
    ScaleX,
    ScaleY,
    Opacity,
    Width,
    Height,
    CornerRadius,
    Length,
    Strength,
    CopyFactor,
    CopyFactorX,
    CopyFactorY,
    Distance,
    Thickness,
    IsVisible,
    Color,
    DrawOrder,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyType {
    Double,
    Color,
    Bool,
}

impl PropertyKey {
    /// Stable numeric key used in serialized files.
    pub fn key(self) -> u16 {
        match self {
            PropertyKey::X => 13,
            PropertyKey::Y => 14,
            PropertyKey::Rotation => 15,
            PropertyKey::ScaleX => 16,
            PropertyKey::ScaleY => 17,
            PropertyKey::Opacity => 18,
            PropertyKey::Width => 20,
            PropertyKey::Height => 21,
            PropertyKey::DrawOrder => 23,
            PropertyKey::CornerRadius => 31,
            PropertyKey::Color => 37,
            PropertyKey::IsVisible => 41,
            PropertyKey::Thickness => 47,
            PropertyKey::Length => 89,
            PropertyKey::Strength => 172,
            PropertyKey::CopyFactor => 182,
            PropertyKey::CopyFactorX => 183,
            PropertyKey::CopyFactorY => 184,
            PropertyKey::Distance => 177,
        }
    }

    pub fn from_key(key: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.key() == key)
    }

    pub const ALL: [PropertyKey; 19] = [
        PropertyKey::X,
        PropertyKey::Y,
        PropertyKey::Rotation,
        PropertyKey::ScaleX,
        PropertyKey::ScaleY,
        PropertyKey::Opacity,
        PropertyKey::Width,
        PropertyKey::Height,
        PropertyKey::CornerRadius,
        PropertyKey::Length,
        PropertyKey::Strength,
        PropertyKey::CopyFactor,
        PropertyKey::CopyFactorX,
        PropertyKey::CopyFactorY,
        PropertyKey::Distance,
        PropertyKey::Thickness,
        PropertyKey::IsVisible,
        PropertyKey::Color,
        PropertyKey::DrawOrder,
    ];

    pub fn property_type(self) -> PropertyType {
        match self {
            PropertyKey::Color => PropertyType::Color,
            PropertyKey::IsVisible => PropertyType::Bool,
            _ => PropertyType::Double,
        }
    }
}

fn double_field(kind: &ComponentKind, key: PropertyKey) -> Option<f32> {
    if let Some(t) = kind.transform() {
        match key {
            PropertyKey::X => return Some(t.x),
            PropertyKey::Y => return Some(t.y),
            PropertyKey::Rotation => return Some(t.rotation),
            PropertyKey::ScaleX => return Some(t.scale_x),
            PropertyKey::ScaleY => return Some(t.scale_y),
            PropertyKey::Opacity => return Some(t.opacity),
            _ => {}
        }
    }
    match (kind, key) {
        (ComponentKind::Rectangle(p) | ComponentKind::Ellipse(p), PropertyKey::Width) => Some(p.width),
        (ComponentKind::Rectangle(p) | ComponentKind::Ellipse(p), PropertyKey::Height) => Some(p.height),
        (ComponentKind::Rectangle(p), PropertyKey::CornerRadius) => Some(p.corner_radius),
        (ComponentKind::Artboard(a), PropertyKey::Width) => Some(a.width),
        (ComponentKind::Artboard(a), PropertyKey::Height) => Some(a.height),
        (ComponentKind::RootBone(b) | ComponentKind::Bone(b), PropertyKey::Length) => Some(b.length),
        (ComponentKind::Stroke(p), PropertyKey::Thickness) => Some(p.thickness),
        (ComponentKind::Shape(s), PropertyKey::DrawOrder) => Some(s.draw_order as f32),
        (ComponentKind::Constraint(c), PropertyKey::Strength) => Some(c.strength),
        (ComponentKind::Constraint(c), _) => match (&c.rule, key) {
            (ConstraintRule::Rotation { copy_factor, .. }, PropertyKey::CopyFactor) => Some(*copy_factor),
            (
                ConstraintRule::Translation { copy_factor_x, .. } | ConstraintRule::Scale { copy_factor_x, .. },
                PropertyKey::CopyFactorX,
            ) => Some(*copy_factor_x),
            (
                ConstraintRule::Translation { copy_factor_y, .. } | ConstraintRule::Scale { copy_factor_y, .. },
                PropertyKey::CopyFactorY,
            ) => Some(*copy_factor_y),
            (ConstraintRule::Distance { distance, .. }, PropertyKey::Distance) => Some(*distance),
            _ => None,
        },
        _ => None,
    }
}

fn double_field_mut(kind: &mut ComponentKind, key: PropertyKey) -> Option<&mut f32> {
    if matches!(
        key,
        PropertyKey::X
            | PropertyKey::Y
            | PropertyKey::Rotation
            | PropertyKey::ScaleX
            | PropertyKey::ScaleY
            | PropertyKey::Opacity
    ) {
        let t = kind.transform_mut()?;
        return Some(match key {
            PropertyKey::X => &mut t.x,
            PropertyKey::Y => &mut t.y,
            PropertyKey::Rotation => &mut t.rotation,
            PropertyKey::ScaleX => &mut t.scale_x,
            PropertyKey::ScaleY => &mut t.scale_y,
            _ => &mut t.opacity,
        });
    }
    match (kind, key) {
        (ComponentKind::Rectangle(p) | ComponentKind::Ellipse(p), PropertyKey::Width) => Some(&mut p.width),
        (ComponentKind::Rectangle(p) | ComponentKind::Ellipse(p), PropertyKey::Height) => Some(&mut p.height),
        (ComponentKind::Rectangle(p), PropertyKey::CornerRadius) => Some(&mut p.corner_radius),
        (ComponentKind::RootBone(b) | ComponentKind::Bone(b), PropertyKey::Length) => Some(&mut b.length),
        (ComponentKind::Stroke(p), PropertyKey::Thickness) => Some(&mut p.thickness),
        (ComponentKind::Constraint(c), PropertyKey::Strength) => Some(&mut c.strength),
        (ComponentKind::Constraint(c), _) => match (&mut c.rule, key) {
            (ConstraintRule::Rotation { copy_factor, .. }, PropertyKey::CopyFactor) => Some(copy_factor),
            (
                ConstraintRule::Translation { copy_factor_x, .. } | ConstraintRule::Scale { copy_factor_x, .. },
                PropertyKey::CopyFactorX,
            ) => Some(copy_factor_x),
            (
                ConstraintRule::Translation { copy_factor_y, .. } | ConstraintRule::Scale { copy_factor_y, .. },
                PropertyKey::CopyFactorY,
            ) => Some(copy_factor_y),
            (ConstraintRule::Distance { distance, .. }, PropertyKey::Distance) => Some(distance),
            _ => None,
        },
        _ => None,
    }
}

impl Artboard {
    pub fn get_double(&self, id: ComponentId, key: PropertyKey) -> Option<f32> {
        double_field(&self.resolve(id)?.kind, key)
    }

    /// Store a numeric property. Returns `false` when the component does not
    /// carry `key`.
    pub fn set_double(&mut self, id: ComponentId, key: PropertyKey, value: f32) -> bool {
        if key == PropertyKey::DrawOrder {
            return self.set_draw_order(id, value.round() as i32);
        }
        let Some(component) = self.resolve_mut(id) else {
            return false;
        };
        let Some(slot) = double_field_mut(&mut component.kind, key) else {
            return false;
        };
        if *slot == value {
            return true;
        }
        *slot = value;
        self.property_changed(id, key);
        true
    }

    pub fn get_color(&self, id: ComponentId, key: PropertyKey) -> Option<u32> {
        match (&self.resolve(id)?.kind, key) {
            (ComponentKind::SolidColor(c), PropertyKey::Color) => Some(c.color),
            _ => None,
        }
    }

    pub fn set_color(&mut self, id: ComponentId, key: PropertyKey, value: u32) -> bool {
        let Some(component) = self.resolve_mut(id) else {
            return false;
        };
        let ComponentKind::SolidColor(c) = &mut component.kind else {
            return false;
        };
        if key != PropertyKey::Color {
            return false;
        }
        if c.color != value {
            c.color = value;
            self.property_changed(id, key);
        }
        true
    }

    pub fn get_bool(&self, id: ComponentId, key: PropertyKey) -> Option<bool> {
        match (self.resolve(id)?.kind.paint(), key) {
            (Some(p), PropertyKey::IsVisible) => Some(p.is_visible),
            _ => None,
        }
    }

    pub fn set_bool(&mut self, id: ComponentId, key: PropertyKey, value: bool) -> bool {
        if key != PropertyKey::IsVisible {
            return false;
        }
        let Some(paint) = self.resolve_mut(id).and_then(|c| c.kind.paint_mut()) else {
            return false;
        };
        if paint.is_visible != value {
            paint.is_visible = value;
            self.property_changed(id, key);
        }
        true
    }

    fn set_draw_order(&mut self, id: ComponentId, value: i32) -> bool {
        let Some(ComponentKind::Shape(s)) = self.resolve_mut(id).map(|c| &mut c.kind) else {
            return false;
        };
        if s.draw_order != value {
            s.draw_order = value;
            self.property_changed(id, PropertyKey::DrawOrder);
        }
        true
    }

    /// Change notification: translate a property write into dirt.
    fn property_changed(&mut self, id: ComponentId, key: PropertyKey) {
        match key {
            PropertyKey::X
            | PropertyKey::Y
            | PropertyKey::Rotation
            | PropertyKey::ScaleX
            | PropertyKey::ScaleY => self.mark_transform_dirty(id),
            PropertyKey::Opacity => {
                self.add_dirt(id, ComponentDirt::RenderOpacity, true);
            }
            PropertyKey::Width | PropertyKey::Height | PropertyKey::CornerRadius => {
                self.add_dirt(id, ComponentDirt::Path, true);
            }
            PropertyKey::Length => {
                let bones: Vec<ComponentId> = self
                    .resolve(id)
                    .map(|c| c.children.clone())
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|c| matches!(self.resolve(*c).map(|c| &c.kind), Some(ComponentKind::Bone(_))))
                    .collect();
                for bone in bones {
                    self.mark_transform_dirty(bone);
                }
            }
            PropertyKey::Strength
            | PropertyKey::CopyFactor
            | PropertyKey::CopyFactorX
            | PropertyKey::CopyFactorY
            | PropertyKey::Distance => {
                self.add_dirt(id, ComponentDirt::WorldTransform, false);
            }
            PropertyKey::Thickness | PropertyKey::IsVisible => {
                self.add_dirt(id, ComponentDirt::Paint, false);
            }
            PropertyKey::Color => {
                if let Some(paint) = self.resolve(id).and_then(|c| c.parent) {
                    self.add_dirt(paint, ComponentDirt::Paint, false);
                }
            }
            PropertyKey::DrawOrder => {
                self.add_dirt(ComponentId::ARTBOARD, ComponentDirt::DrawOrder, false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_keys_are_unique() {
        let keys: hashbrown::HashSet<u16> = PropertyKey::ALL.iter().map(|k| k.key()).collect();
        assert_eq!(keys.len(), PropertyKey::ALL.len());
        assert_eq!(PropertyKey::from_key(9999), None);
        assert_eq!(PropertyKey::from_key(13), Some(PropertyKey::X));
        assert_eq!(PropertyKey::IsVisible.property_type(), PropertyType::Bool);
    }
}
