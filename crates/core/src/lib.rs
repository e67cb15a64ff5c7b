pub mod bulk;
pub mod catalog;
pub mod config;
pub mod converter;
pub mod processor;
pub mod testing;

pub use bulk::{add_missing_format, BulkError, BulkRequest, BulkSummary};
pub use catalog::{BookRecord, CalibreDb, Catalog, CatalogConfig, CatalogError};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, ConversionConfig,
};
pub use converter::{Converter, ConverterConfig, ConverterError, EbookConvert, TargetFormat};
pub use processor::{
    separate_colliding_outputs, ConversionPool, ConversionReport, ConversionResult,
    ConversionTask, PoolConfig, PoolError, TaskError,
};
