//! File format selection by extension.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ConfigError, Result};

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Picks the format from the file extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

pub(crate) fn read<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = Format::from_path(path)?;
    let reader = BufReader::new(File::open(path)?);
    let value = match format {
        Format::Yaml => serde_yaml::from_reader(reader)?,
        Format::Json => serde_json::from_reader(reader)?,
    };
    Ok(value)
}

pub(crate) fn write<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let format = Format::from_path(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    match format {
        Format::Yaml => serde_yaml::to_writer(&mut writer, value)?,
        Format::Json => serde_json::to_writer_pretty(&mut writer, value)?,
    }
    writer.flush()?;
    Ok(())
}
