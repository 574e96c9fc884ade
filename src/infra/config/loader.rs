use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    domain::message::is_valid_collection_name,
    infra::{
        config::{file_config::FileConfig, AppConfig},
        error::AppError,
    },
};

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const MIN_POLL_INTERVAL_MS: u64 = 10;

pub fn load(path: Option<&Path>) -> Result<AppConfig, AppError> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = AppConfig::default();

    if !config_path.exists() {
        return Ok(config);
    }

    let raw = fs::read_to_string(&config_path).map_err(|source| AppError::ConfigRead {
        path: config_path.clone(),
        source,
    })?;

    let file_config: FileConfig = toml::from_str(&raw).map_err(|source| AppError::ConfigParse {
        path: config_path,
        source,
    })?;

    file_config.merge_into(&mut config);
    validate(&config)?;
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<(), AppError> {
    if config.store.collection.trim().is_empty() {
        return Err(AppError::ConfigInvalid {
            field: "store.collection",
            details: "must not be empty".to_owned(),
        });
    }

    if !is_valid_collection_name(&config.store.collection) {
        return Err(AppError::ConfigInvalid {
            field: "store.collection",
            details: format!(
                "{:?} may only contain ASCII letters, digits, '_' and '-'",
                config.store.collection
            ),
        });
    }

    if config.store.poll_interval_ms < MIN_POLL_INTERVAL_MS {
        return Err(AppError::ConfigInvalid {
            field: "store.poll_interval_ms",
            details: format!("must be at least {MIN_POLL_INTERVAL_MS}"),
        });
    }

    Ok(())
}
