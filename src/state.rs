//! Application state: the challenge store, the template catalog, and the
//! shared random source used by set generation.
//!
//! The random source is a seedable `StdRng` behind a mutex rather than
//! `thread_rng` at the call site, so tests can pin the shuffle and the
//! variation picks to a seed.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::catalog::Catalog;
use crate::config::load_catalog_config_from_env;
use crate::domain::ChallengeType;
use crate::store::{ChallengeStore, MemoryStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ChallengeStore>,
    pub catalog: Arc<Catalog>,
    pub rng: Arc<Mutex<StdRng>>,
}

impl AppState {
    /// Build state from env: load the optional catalog config, merge it into
    /// the built-in catalog, and start on the in-memory store.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let catalog = match load_catalog_config_from_env() {
            Some(cfg) => Catalog::with_extras(&cfg),
            None => Catalog::builtin(),
        };

        // Inventory summary so a bad config is visible at startup.
        for kind in ChallengeType::ALL {
            info!(
                target: "challenge",
                kind = kind.as_str(),
                variations = catalog.variations(kind).len(),
                "Startup catalog inventory"
            );
        }

        Self::with_parts(Arc::new(MemoryStore::new()), catalog, StdRng::from_entropy())
    }

    /// Assemble state from explicit parts. Tests use this with a seeded rng
    /// and a fresh `MemoryStore`.
    pub fn with_parts(store: Arc<dyn ChallengeStore>, catalog: Catalog, rng: StdRng) -> Self {
        Self {
            store,
            catalog: Arc::new(catalog),
            rng: Arc::new(Mutex::new(rng)),
        }
    }
}
