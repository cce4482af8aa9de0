use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a component inside its artboard's object list.
///
/// Ids are stable for the lifetime of an artboard; instances produced by
/// [`crate::Artboard::instance`] reuse the same ids.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub u32);

impl ComponentId {
    /// The artboard always occupies slot 0.
    pub const ARTBOARD: ComponentId = ComponentId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn from_index(index: usize) -> Self {
        ComponentId(index as u32)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artboard_is_slot_zero() {
        assert_eq!(ComponentId::ARTBOARD.index(), 0);
        assert_eq!(ComponentId::from_index(7), ComponentId(7));
        assert_eq!(ComponentId(3).to_string(), "#3");
    }
}
