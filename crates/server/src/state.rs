use harvester_core::{Config, HarvestParams, Harvester, ItemStore};

/// Shared application state
pub struct AppState {
    config: Config,
    harvester: Harvester,
}

impl AppState {
    pub fn new(config: Config, harvester: Harvester) -> Self {
        Self { config, harvester }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn harvester(&self) -> &Harvester {
        &self.harvester
    }

    pub fn store(&self) -> &dyn ItemStore {
        self.harvester.store().as_ref()
    }

    /// Run parameters from the configured defaults.
    pub fn default_params(&self) -> HarvestParams {
        HarvestParams::from_config(&self.config)
    }
}
