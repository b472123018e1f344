//! Persistence configuration section.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Persistence settings section
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistenceSection {
    /// Directory holding ray model artifacts, one per stereo head
    #[serde(default = "defaults::ray_model_dir")]
    pub ray_model_dir: String,

    /// Output directory for renderings
    #[serde(default = "defaults::output_dir")]
    pub output_dir: String,

    /// Edge length of top-down renderings (pixels)
    #[serde(default = "defaults::render_size")]
    pub render_size: usize,
}

impl Default for PersistenceSection {
    fn default() -> Self {
        Self {
            ray_model_dir: defaults::ray_model_dir(),
            output_dir: defaults::output_dir(),
            render_size: defaults::render_size(),
        }
    }
}

impl PersistenceSection {
    /// Artifact path of the ray model for head `index`.
    pub fn ray_model_path(&self, index: usize) -> PathBuf {
        PathBuf::from(&self.ray_model_dir).join(format!("head{}.dray", index))
    }
}
