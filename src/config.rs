//! Engine-wide tunables, loaded from a TOML file with sensible defaults
//! for everything so a missing config is never fatal.

use std::path::Path;

use serde::Deserialize;

use crate::environment::BATCH_COST_GOAL;
use crate::expression::POOL_SIZE;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub expression_pool_size: usize,
    pub batch_cost_goal: usize,
    pub tile_size: f64,
    pub cache_eviction_chance: f64,
    pub cache_idle_hits_threshold: u32,
    pub worker_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            expression_pool_size: POOL_SIZE,
            batch_cost_goal: BATCH_COST_GOAL,
            tile_size: 256.0,
            cache_eviction_chance: 0.1,
            cache_idle_hits_threshold: 4,
            worker_threads: num_cpus_fallback(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> anyhow::Result<EngineConfig> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn load_or_default(path: &Path) -> EngineConfig {
        match EngineConfig::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!(
                    "could not load config from {}: {err}; using defaults",
                    path.display()
                );
                EngineConfig::default()
            }
        }
    }
}

fn num_cpus_fallback() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = EngineConfig::default();
        assert!(cfg.tile_size > 0.0);
        assert!(cfg.worker_threads >= 1);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = EngineConfig::load_or_default(Path::new("/no/such/engine.toml"));
        assert_eq!(cfg.batch_cost_goal, BATCH_COST_GOAL);
    }

    #[test]
    fn partial_toml_fills_remaining_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("engine.toml");
        std::fs::write(&file, "tile_size = 128.0\n").unwrap();
        let cfg = EngineConfig::load(&file).unwrap();
        assert_eq!(cfg.tile_size, 128.0);
        assert_eq!(cfg.worker_threads, EngineConfig::default().worker_threads);
    }
}
