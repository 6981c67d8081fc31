//! Settings errors.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read settings from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write settings to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Settings files are `.json` or `.toml`.
    #[error("settings files must be .json or .toml, got '{0}'")]
    UnsupportedFormat(String),

    #[error("malformed JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed TOML settings: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("cannot encode settings as TOML: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// A value failed [`Config::validate`](crate::Config::validate).
    #[error("setting '{key}' has invalid value {value}")]
    ValueOutOfRange { key: String, value: String },

    #[error("no settings directory on this platform")]
    NoConfigDirectory,
}

impl ConfigError {
    pub(crate) fn out_of_range(key: &str, value: impl ToString) -> Self {
        ConfigError::ValueOutOfRange {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    pub(crate) fn read(path: &std::path::Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write(path: &std::path::Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<ConfigError> for geoedit_core::Error {
    fn from(err: ConfigError) -> Self {
        geoedit_core::Error::config(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_setting() {
        let err = ConfigError::UnsupportedFormat("yaml".to_string());
        assert_eq!(
            err.to_string(),
            "settings files must be .json or .toml, got 'yaml'"
        );

        let err = ConfigError::out_of_range("viewport.default_zoom", -1.0);
        assert_eq!(
            err.to_string(),
            "setting 'viewport.default_zoom' has invalid value -1"
        );
    }

    #[test]
    fn test_read_error_carries_path() {
        let io = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err = ConfigError::read(std::path::Path::new("/tmp/geoedit.toml"))(io);
        assert!(err.to_string().starts_with("cannot read settings from /tmp/geoedit.toml"));
    }

    #[test]
    fn test_conversion_into_core_error() {
        let err: geoedit_core::Error = ConfigError::NoConfigDirectory.into();
        assert!(matches!(err, geoedit_core::Error::Config(_)));
    }
}
