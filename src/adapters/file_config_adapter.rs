//! INI file configuration adapter.

use crate::domain::error::StratError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StratError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| StratError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        log::debug!("loaded config from {}", path.display());
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, StratError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| StratError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn sections(&self) -> Vec<String> {
        let mut names = self.config.sections();
        names.sort();
        names
    }
}
