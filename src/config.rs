//! Runtime configuration
use serde_yaml::{self, Value};
use std::{fs::File, path::PathBuf};

use crate::{error::*, fatal_error};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Runtime configuration data
pub struct Config {
    /// Is logging enabled?
    logging: bool,
    /// Seed for the random number generator, entropy if unset
    random_seed: Option<u64>,
    /// Directory save states are written to, beside the story if unset
    save_directory: Option<PathBuf>,
}

impl TryFrom<Value> for Config {
    type Error = RuntimeError;

    fn try_from(data: Value) -> Result<Self, Self::Error> {
        let logging = match data["logging"].as_str() {
            Some(t) => t == "enabled",
            None => false,
        };
        let random_seed = match &data["random_seed"] {
            Value::Null => None,
            v => match v.as_u64() {
                Some(s) => Some(s),
                None => {
                    return fatal_error!(
                        ErrorCode::ConfigError,
                        "random_seed must be a positive integer: {:?}",
                        v
                    )
                }
            },
        };
        let save_directory = data["save_directory"].as_str().map(PathBuf::from);

        Ok(Config::new(logging, random_seed, save_directory))
    }
}

impl TryFrom<File> for Config {
    type Error = RuntimeError;

    fn try_from(value: File) -> Result<Self, Self::Error> {
        match serde_yaml::from_reader::<File, Value>(value) {
            Ok(data) => Config::try_from(data),
            Err(e) => fatal_error!(ErrorCode::ConfigError, "{}", e),
        }
    }
}

impl Config {
    /// Constructor
    ///
    /// # Arguments
    /// * `logging` - Logging enabled flag
    /// * `random_seed` - Optional RNG seed
    /// * `save_directory` - Optional save state directory
    pub fn new(logging: bool, random_seed: Option<u64>, save_directory: Option<PathBuf>) -> Self {
        Config {
            logging,
            random_seed,
            save_directory,
        }
    }

    pub fn logging(&self) -> bool {
        self.logging
    }

    pub fn random_seed(&self) -> Option<u64> {
        self.random_seed
    }

    pub fn save_directory(&self) -> Option<&PathBuf> {
        self.save_directory.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::{assert_ok, assert_ok_eq};

    use super::*;

    fn config(yaml: &str) -> Result<Config, RuntimeError> {
        let mut file = assert_ok!(tempfile::NamedTempFile::new());
        assert_ok!(file.write_all(yaml.as_bytes()));
        Config::try_from(assert_ok!(file.reopen()))
    }

    #[test]
    fn test_default() {
        let c = Config::default();
        assert!(!c.logging());
        assert!(c.random_seed().is_none());
        assert!(c.save_directory().is_none());
    }

    #[test]
    fn test_try_from_file() {
        let c = assert_ok!(config(
            "logging: enabled\nrandom_seed: 1234\nsave_directory: /tmp/saves\n"
        ));
        assert!(c.logging());
        assert_eq!(c.random_seed(), Some(1234));
        assert_eq!(c.save_directory(), Some(&PathBuf::from("/tmp/saves")));
    }

    #[test]
    fn test_try_from_file_defaults() {
        assert_ok_eq!(config("logging: disabled\n"), Config::default());
        assert_ok_eq!(config("{}"), Config::default());
    }

    #[test]
    fn test_try_from_file_errors() {
        assert_eq!(
            config("random_seed: -4\n").unwrap_err().code(),
            ErrorCode::ConfigError
        );
        assert_eq!(
            config("logging: [unterminated\n").unwrap_err().code(),
            ErrorCode::ConfigError
        );
    }
}
