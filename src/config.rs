//! Loading the optional catalog extension config from TOML.
//!
//! Deployments can append challenge variations without a rebuild:
//!
//! ```toml
//! [[variations]]
//! type = "questions"
//! target = 15
//! reward = 60
//! description = "Answer 15 questions today"
//! ```
//!
//! Validation (positive target/reward, non-empty description) happens when
//! the catalog absorbs the entries, see `Catalog::with_extras`.

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::ChallengeType;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct CatalogConfig {
  #[serde(default)]
  pub variations: Vec<VariationCfg>,
}

/// Extra catalog variation accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct VariationCfg {
  #[serde(rename = "type")]
  pub kind: ChallengeType,
  pub target: u32,
  pub reward: u32,
  pub description: String,
}

/// Attempt to load a `CatalogConfig` from CHALLENGE_CONFIG_PATH. On any
/// parsing/IO error, returns None and the built-in catalog is used alone.
pub fn load_catalog_config_from_env() -> Option<CatalogConfig> {
  let path = std::env::var("CHALLENGE_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<CatalogConfig>(&s) {
      Ok(cfg) => {
        info!(target: "prepdeck_backend", %path, extra = cfg.variations.len(), "Loaded catalog config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "prepdeck_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "prepdeck_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
