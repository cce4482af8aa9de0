use serde::{Deserialize, Serialize};

/// Tunables for the update sweep.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Upper bound on restarted passes within a single `update_components`.
    pub max_update_passes: u32,
    /// Tolerance used when flattening curves into path segments.
    pub path_tolerance: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            max_update_passes: 100,
            path_tolerance: 0.1,
        }
    }
}
