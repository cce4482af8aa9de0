use serde::{Deserialize, Serialize};

/// Runtime tunables for state machine playback.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chained state changes allowed in one layer advance before giving up.
    pub max_layer_iterations: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_layer_iterations: 100,
        }
    }
}
