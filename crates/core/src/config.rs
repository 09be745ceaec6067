use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::classify::Classifier;
use crate::ignore::{IgnoreCatalog, IgnoreEntries, PatternError};
use crate::registry::SectionRegistryBuilder;
use crate::section::{builtin_sections, Section};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    InvalidPattern(#[from] PatternError),
    #[error("section names must not be empty")]
    EmptySectionName,
    #[error("section '{0}' is declared more than once")]
    DuplicateSection(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub ignore: IgnoreEntries,
    pub sections: Vec<Section>,
    pub replace_builtin_sections: bool,
}

impl ClassifierConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn build_classifier(&self) -> Result<Classifier, ConfigError> {
        let mut catalog = IgnoreCatalog::android_default();
        catalog.extend(&self.ignore)?;

        let mut builder = if self.replace_builtin_sections {
            SectionRegistryBuilder::new()
        } else {
            SectionRegistryBuilder::with_builtin_sections()
        };
        let mut names = if self.replace_builtin_sections {
            HashSet::new()
        } else {
            builtin_sections()
                .into_iter()
                .map(|section| section.name().to_string())
                .collect::<HashSet<_>>()
        };

        for section in &self.sections {
            if section.name().trim().is_empty() {
                return Err(ConfigError::EmptySectionName);
            }
            if !names.insert(section.name().to_string()) {
                return Err(ConfigError::DuplicateSection(section.name().to_string()));
            }
            debug!(section = section.name(), "registering configured section");
            builder.register(normalized_section(section));
        }

        Ok(Classifier::new(catalog, builder.build()))
    }
}

fn normalized_section(section: &Section) -> Section {
    Section::new(section.name())
        .with_interfaces(section.interfaces().iter().cloned())
        .with_libraries(section.libraries().iter().cloned())
        .with_folders(
            section
                .folders()
                .iter()
                .map(|folder| folder.trim_matches('/').to_string()),
        )
}

pub fn load_classifier(path: Option<&Path>) -> Result<Classifier, ConfigError> {
    match path {
        Some(path) => ClassifierConfig::from_file(path)?.build_classifier(),
        None => Ok(Classifier::android_default()),
    }
}
