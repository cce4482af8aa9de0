//! Baseline values written before a blend state mixes its animations.
//!
//! Every number or color property keyed by any of the state's animations gets
//! one entry. Properties keyed by the first animation start from that
//! animation's first keyframe; the rest start from whatever the artboard held
//! the first time the state was applied.

use vellum_scene_core::{Artboard, ComponentId, PropertyKey};

use crate::animation::LinearAnimation;
use crate::keyframe::KeyFrameValue;

#[derive(Clone, Debug)]
struct ResetEntry {
    object: ComponentId,
    property: PropertyKey,
    /// Decides which getter captures the value.
    kind: KeyFrameValue,
    value: Option<KeyFrameValue>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct AnimationReset {
    entries: Vec<ResetEntry>,
    captured: bool,
}

impl AnimationReset {
    pub(crate) fn from_animations<'a>(animations: impl IntoIterator<Item = &'a LinearAnimation>) -> Self {
        let mut entries: Vec<ResetEntry> = Vec::new();
        for (i, animation) in animations.into_iter().enumerate() {
            for object in &animation.keyed_objects {
                for property in &object.properties {
                    let Some(first) = property.keyframes.first() else {
                        continue;
                    };
                    if matches!(first.value, KeyFrameValue::Bool(_)) {
                        continue;
                    }
                    if entries
                        .iter()
                        .any(|e| e.object == object.object && e.property == property.property)
                    {
                        continue;
                    }
                    entries.push(ResetEntry {
                        object: object.object,
                        property: property.property,
                        kind: first.value,
                        value: (i == 0).then_some(first.value),
                    });
                }
            }
        }
        Self {
            entries,
            captured: false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Write every baseline at full strength.
    pub(crate) fn apply(&mut self, artboard: &mut Artboard) {
        if !self.captured {
            for entry in self.entries.iter_mut().filter(|e| e.value.is_none()) {
                entry.value = match entry.kind {
                    KeyFrameValue::Number(_) => artboard
                        .get_double(entry.object, entry.property)
                        .map(KeyFrameValue::Number),
                    KeyFrameValue::Color(_) => artboard
                        .get_color(entry.object, entry.property)
                        .map(KeyFrameValue::Color),
                    KeyFrameValue::Bool(_) => None,
                };
            }
            self.captured = true;
        }
        for entry in &self.entries {
            match entry.value {
                Some(KeyFrameValue::Number(v)) => {
                    artboard.set_double(entry.object, entry.property, v);
                }
                Some(KeyFrameValue::Color(c)) => {
                    artboard.set_color(entry.object, entry.property, c);
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::{KeyFrame, KeyedObject, KeyedProperty};

    fn keyed(property: PropertyKey, value: f32) -> LinearAnimation {
        LinearAnimation {
            keyed_objects: vec![KeyedObject::new(
                ComponentId(1),
                vec![KeyedProperty::new(property, vec![KeyFrame::number(0.0, value)])],
            )],
            ..Default::default()
        }
    }

    #[test]
    fn first_animation_sets_the_baseline() {
        let a = keyed(PropertyKey::X, 5.0);
        let b = keyed(PropertyKey::X, 9.0);
        let c = keyed(PropertyKey::Y, 1.0);
        let reset = AnimationReset::from_animations([&a, &b, &c]);
        assert_eq!(reset.len(), 2);
        assert_eq!(reset.entries[0].value, Some(KeyFrameValue::Number(5.0)));
        assert_eq!(reset.entries[1].value, None);
    }
}
