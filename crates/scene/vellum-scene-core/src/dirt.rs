use flagset::{flags, FlagSet};

flags! {
    /// Per-component invalidation bits. A component with any bit set is
    /// visited by the next update sweep.
    pub enum ComponentDirt: u16 {
        Dependents,
        /// Artboard-level flag: at least one component is dirty and the
        /// update cycle has work to do.
        Components,
        /// Draw order needs to be re-computed.
        DrawOrder,
        /// Path geometry needs to be rebuilt.
        Path,
        /// Local transform must be recomputed from x/y/rotation/scale.
        Transform,
        /// World transform must be recomputed from the parent's world.
        WorldTransform,
        /// Stored render opacity needs to be refreshed.
        RenderOpacity,
        /// Resolved paint color needs to be rebuilt.
        Paint,
    }
}

pub type Dirt = FlagSet<ComponentDirt>;

/// Every bit raised. Freshly imported components start out like this so the
/// first sweep computes all derived state.
pub fn filthy() -> Dirt {
    FlagSet::full()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_superset_check() {
        let d: Dirt = ComponentDirt::Transform | ComponentDirt::WorldTransform;
        assert!(d.contains(ComponentDirt::Transform));
        assert!(d.contains(ComponentDirt::Transform | ComponentDirt::WorldTransform));
        assert!(!d.contains(ComponentDirt::Transform | ComponentDirt::Path));
    }

    #[test]
    fn filthy_has_every_bit() {
        let all = filthy();
        assert!(all.contains(ComponentDirt::Paint | ComponentDirt::DrawOrder));
        assert!(!Dirt::default().contains(ComponentDirt::Path));
    }
}
