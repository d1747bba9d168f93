//! Configuration file and credentials

use rotator_core::core_types::Sensitive;
use rotator_core::logging_facility::Profile;
use rotator_core::{CollectionId, RotatorError};
use rotator_engine::commands::rotate::RotationOptions;
use rotator_engine::commands::shuffle::ShuffleOptions;
use rotator_remote::{ClientConfig, RateLimitPolicy};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_CONFIG_PATH: &str = "rotator.toml";

/// Environment variable holding the bearer token
pub const TOKEN_ENV: &str = "ROTATOR_ACCESS_TOKEN";

/// Largest `count` the collections endpoint accepts
const MAX_PAGE_SIZE: usize = 200;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RotatorConfig {
    pub collections: CollectionsConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub rotation: RotationConfig,
    #[serde(default)]
    pub shuffle: ShuffleConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionsConfig {
    pub main: Option<u64>,
    pub backup: Option<u64>,
    pub manual_backup: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub rate_limit: RateLimitPolicy,
    /// Wait after a 429 with no usable reset header
    pub fallback_wait_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RotationConfig {
    pub page_size: usize,
    pub max_consecutive_failures: usize,
}

impl Default for RotationConfig {
    fn default() -> Self {
        let options = RotationOptions::default();
        Self {
            page_size: options.page_size,
            max_consecutive_failures: options.max_consecutive_failures,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShuffleConfig {
    pub sample_size: usize,
    pub min_offset: usize,
}

impl Default for ShuffleConfig {
    fn default() -> Self {
        let options = ShuffleOptions::default();
        Self {
            sample_size: options.sample_size,
            min_offset: options.min_offset,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    pub directory: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data/archives"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub profile: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            profile: "development".to_string(),
        }
    }
}

impl RotatorConfig {
    /// Read and validate the configuration file. A missing file is fatal.
    pub fn load(path: &Path) -> Result<Self, RotatorError> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => RotatorError::MissingConfiguration {
                key: path.display().to_string(),
            },
            _ => RotatorError::Io {
                op: "read_config".to_string(),
                message: format!("{}: {}", path.display(), e),
            },
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    /// `origin` names the source in error messages
    pub fn parse(text: &str, origin: &str) -> Result<Self, RotatorError> {
        let config: Self = toml::from_str(text).map_err(|e| RotatorError::InvalidConfiguration {
            key: origin.to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), RotatorError> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.rotation.page_size) {
            return Err(RotatorError::InvalidConfiguration {
                key: "rotation.page_size".to_string(),
                reason: format!("must be between 1 and {}", MAX_PAGE_SIZE),
            });
        }
        if self.shuffle.sample_size == 0 {
            return Err(RotatorError::InvalidConfiguration {
                key: "shuffle.sample_size".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        // index 0 is never a shuffle target
        if self.shuffle.min_offset.max(1) >= self.shuffle.sample_size {
            return Err(RotatorError::InvalidConfiguration {
                key: "shuffle.min_offset".to_string(),
                reason: format!(
                    "must be less than shuffle.sample_size ({})",
                    self.shuffle.sample_size
                ),
            });
        }
        self.logging_profile().map(|_| ())
    }

    /// Resolve a named or numeric collection reference
    pub fn collection(&self, reference: CollectionRef) -> Result<CollectionId, RotatorError> {
        let (key, id) = match reference {
            CollectionRef::Id(id) => return Ok(id),
            CollectionRef::Main => ("collections.main", self.collections.main),
            CollectionRef::Backup => ("collections.backup", self.collections.backup),
            CollectionRef::ManualBackup => {
                ("collections.manual_backup", self.collections.manual_backup)
            }
        };
        id.map(CollectionId).ok_or_else(|| RotatorError::MissingConfiguration {
            key: key.to_string(),
        })
    }

    pub fn logging_profile(&self) -> Result<Profile, RotatorError> {
        self.logging
            .profile
            .parse()
            .map_err(|reason| RotatorError::InvalidConfiguration {
                key: "logging.profile".to_string(),
                reason,
            })
    }

    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::default().with_rate_limit(self.api.rate_limit);
        if let Some(secs) = self.api.fallback_wait_secs {
            config = config.with_fallback_wait_secs(secs);
        }
        match &self.api.base_url {
            Some(url) => config.with_base_url(url.as_str()),
            None => config,
        }
    }

    pub fn rotation_options(&self) -> RotationOptions {
        RotationOptions {
            page_size: self.rotation.page_size,
            max_consecutive_failures: self.rotation.max_consecutive_failures,
        }
    }

    pub fn shuffle_options(&self) -> ShuffleOptions {
        ShuffleOptions {
            sample_size: self.shuffle.sample_size,
            min_offset: self.shuffle.min_offset,
            page_size: self.rotation.page_size,
        }
    }
}

/// Read the bearer token from the environment
pub fn access_token() -> Result<Sensitive<String>, RotatorError> {
    std::env::var(TOKEN_ENV)
        .ok()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .map(Sensitive::new)
        .ok_or_else(|| RotatorError::MissingConfiguration {
            key: TOKEN_ENV.to_string(),
        })
}

/// A collection named on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionRef {
    Main,
    Backup,
    /// Hand-picked favourites, used to restock the main queue
    ManualBackup,
    Id(CollectionId),
}

impl FromStr for CollectionRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(CollectionRef::Main),
            "backup" => Ok(CollectionRef::Backup),
            "manual-backup" | "manual_backup" | "ultimate" => Ok(CollectionRef::ManualBackup),
            other => other.parse::<CollectionId>().map(CollectionRef::Id).map_err(|_| {
                format!(
                    "'{}' is not a collection name (main, backup, manual-backup) or id",
                    other
                )
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [collections]
        main = 1234
        backup = 5678
        manual_backup = 9012

        [api]
        base_url = "http://localhost:8080/1.1/"
        rate_limit = "fail_fast"
        fallback_wait_secs = 30

        [rotation]
        page_size = 100
        max_consecutive_failures = 3

        [shuffle]
        sample_size = 300
        min_offset = 50

        [archive]
        directory = "archives"

        [logging]
        profile = "production"
    "#;

    #[test]
    fn test_full_config() {
        let config = RotatorConfig::parse(FULL, "test").unwrap();

        assert_eq!(config.collection(CollectionRef::Main).unwrap(), CollectionId(1234));
        assert_eq!(
            config.collection(CollectionRef::ManualBackup).unwrap(),
            CollectionId(9012)
        );
        assert_eq!(config.client_config().base_url, "http://localhost:8080/1.1");
        assert_eq!(config.client_config().rate_limit, RateLimitPolicy::FailFast);
        assert_eq!(config.client_config().fallback_wait_secs, 30);
        assert_eq!(config.rotation_options().max_consecutive_failures, 3);
        assert_eq!(config.shuffle_options().page_size, 100);
        assert_eq!(config.archive.directory, PathBuf::from("archives"));
        assert_eq!(config.logging_profile().unwrap(), Profile::Production);
    }

    #[test]
    fn test_defaults() {
        let config = RotatorConfig::parse("[collections]\nmain = 1\nbackup = 2\n", "test").unwrap();

        assert_eq!(config.rotation.page_size, 200);
        assert_eq!(config.rotation.max_consecutive_failures, 5);
        assert_eq!(config.shuffle.sample_size, 600);
        assert_eq!(config.shuffle.min_offset, 200);
        assert_eq!(config.api.rate_limit, RateLimitPolicy::TrackAndAwait);
        assert_eq!(config.client_config().base_url, "https://api.twitter.com/1.1");
        assert_eq!(config.client_config().fallback_wait_secs, 60);
        assert_eq!(config.archive.directory, PathBuf::from("data/archives"));
    }

    #[test]
    fn test_missing_collections_section() {
        let err = RotatorConfig::parse("[rotation]\npage_size = 10\n", "test").unwrap_err();
        assert!(err.is_fatal_configuration());
    }

    #[test]
    fn test_unconfigured_collection_is_missing() {
        let config = RotatorConfig::parse("[collections]\nmain = 1\n", "test").unwrap();

        let err = config.collection(CollectionRef::Backup).unwrap_err();
        assert_eq!(
            err,
            RotatorError::MissingConfiguration {
                key: "collections.backup".to_string()
            }
        );
    }

    #[test]
    fn test_page_size_bounds() {
        let err = RotatorConfig::parse(
            "[collections]\nmain = 1\n[rotation]\npage_size = 500\n",
            "test",
        )
        .unwrap_err();
        assert!(matches!(err, RotatorError::InvalidConfiguration { ref key, .. } if key == "rotation.page_size"));
    }

    #[test]
    fn test_min_offset_must_leave_room_in_sample() {
        for shuffle in [
            "sample_size = 100\nmin_offset = 100",
            "sample_size = 100\nmin_offset = 250",
            "sample_size = 1\nmin_offset = 0",
        ] {
            let text = format!("[collections]\nmain = 1\n[shuffle]\n{}\n", shuffle);
            let err = RotatorConfig::parse(&text, "test").unwrap_err();
            assert!(
                matches!(err, RotatorError::InvalidConfiguration { ref key, .. } if key == "shuffle.min_offset"),
                "{} should be rejected",
                shuffle
            );
        }

        let config = RotatorConfig::parse(
            "[collections]\nmain = 1\n[shuffle]\nsample_size = 100\nmin_offset = 99\n",
            "test",
        )
        .unwrap();
        assert_eq!(config.shuffle_options().min_offset, 99);
    }

    #[test]
    fn test_unknown_profile() {
        let err = RotatorConfig::parse(
            "[collections]\nmain = 1\n[logging]\nprofile = \"loud\"\n",
            "test",
        )
        .unwrap_err();
        assert!(err.is_fatal_configuration());
    }

    #[test]
    fn test_collection_ref_parsing() {
        assert_eq!("main".parse::<CollectionRef>(), Ok(CollectionRef::Main));
        assert_eq!(
            "manual-backup".parse::<CollectionRef>(),
            Ok(CollectionRef::ManualBackup)
        );
        assert_eq!(
            "custom-42".parse::<CollectionRef>(),
            Ok(CollectionRef::Id(CollectionId(42)))
        );
        assert_eq!(
            "42".parse::<CollectionRef>(),
            Ok(CollectionRef::Id(CollectionId(42)))
        );
        assert!("queue".parse::<CollectionRef>().is_err());
    }
}
