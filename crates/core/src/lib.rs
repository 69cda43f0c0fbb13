pub mod config;
pub mod extract;
pub mod harvest;
pub mod metrics;
pub mod record;
pub mod source;
pub mod store;
pub mod testing;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use extract::{ListingExtractor, RecordExtractor};
pub use harvest::{HarvestError, HarvestParams, HarvestReport, Harvester};
pub use record::{EnrichedRecord, RawRecord, UNKNOWN};
pub use source::{FetchError, HttpPageSource, PageRequest, PageSource};
pub use store::{ItemStore, PersistError, SqliteItemStore, StoreError};
