use std::{env, fs, path::PathBuf};

use crate::infra::{config::StoreConfig, error::AppError};

const APP_DIR_NAME: &str = "flashchat";

/// On-disk locations shared by every client process of one user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    pub data_dir: PathBuf,
    pub journal_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl StorageLayout {
    pub fn resolve(config: &StoreConfig) -> Result<Self, AppError> {
        let data_dir = match &config.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_base()
                .ok_or_else(|| AppError::StoragePathResolution {
                    details: "unable to resolve data base directory (XDG_DATA_HOME/HOME)".into(),
                })?
                .join(APP_DIR_NAME),
        };

        Ok(Self {
            journal_dir: data_dir.join("journal"),
            log_dir: data_dir.join("logs"),
            data_dir,
        })
    }

    pub fn ensure_dirs(&self) -> Result<(), AppError> {
        for dir in [&self.data_dir, &self.journal_dir, &self.log_dir] {
            fs::create_dir_all(dir).map_err(|source| AppError::StorageDirCreate {
                path: dir.clone(),
                source,
            })?;
        }

        Ok(())
    }
}

fn default_data_base() -> Option<PathBuf> {
    env::var_os("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(dirs::data_dir)
}
