//! Configuration for firstrun.
//!
//! Sources are merged in order, later sources winning:
//! 1. Built-in defaults (a SQLite primary store in the platform data
//!    directory, no legacy store, build number `0`).
//! 2. An optional configuration file; TOML, YAML or JSON chosen by extension.
//! 3. `FIRSTRUN_*` environment variables, with `__` separating nested keys
//!    (`FIRSTRUN_PRIMARY__PATH=/data/flags.db`).
//!
//! ```toml
//! [primary]
//! backend = "sqlite"
//! path = "/var/lib/app/firstrun.db"
//!
//! [legacy]
//! backend = "file"
//! path = "/var/lib/app/shared_prefs.json"
//!
//! [build]
//! source = "package"
//! version = "2.3.0+118"
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "FIRSTRUN_";
pub const DEFAULT_DATABASE: &str = "firstrun.db";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Store that every flag is read from first and written to.
    pub primary: StoreConfig,
    /// Store consulted, read-only, when the primary doesn't have a key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy: Option<StoreConfig>,
    #[serde(default)]
    pub build: BuildConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    Sqlite { path: PathBuf },
    File { path: PathBuf },
}
impl StoreConfig {
    pub fn path(&self) -> &Path {
        match self {
            Self::Sqlite { path } | Self::File { path } => path,
        }
    }
}

/// Where the running application's build number comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum BuildConfig {
    Fixed { number: u32 },
    /// A package version string such as `"2.3.0+118"` or `"118"`.
    Package { version: String },
}
impl Default for BuildConfig {
    fn default() -> Self {
        Self::Fixed { number: 0 }
    }
}

impl Config {
    /// Platform data directory for firstrun (`~/.local/share/firstrun` on
    /// Linux).
    pub fn default_data_dir() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "firstrun").ok_or_raise(|| ErrorKind::NoHomeDirectory)?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Assemble every configuration source, without extracting it.
    ///
    /// Without a home directory there is no default primary store, and the
    /// file or environment has to name one.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let data_dir = match Self::default_data_dir() {
            Ok(dir) => Some(dir),
            Err(err) => {
                tracing::debug!(error = ?err, "No default primary store");
                None
            },
        };
        Self::layered(data_dir.as_deref(), file)
    }

    fn layered(data_dir: Option<&Path>, file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::new();
        if let Some(dir) = data_dir {
            let primary = StoreConfig::Sqlite { path: dir.join(DEFAULT_DATABASE) };
            figment = figment.merge(Serialized::default("primary", primary));
        }
        if let Some(file) = file {
            if !file.is_file() {
                exn::bail!(ErrorKind::Invalid(format!("config file not found: {}", file.display())));
            }
            tracing::debug!(path = %file.display(), "Loading configuration file");
            figment = match file.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(file)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
                Some("json") => figment.merge(Json::file(file)),
                _ => exn::bail!(ErrorKind::Invalid(format!("unsupported config file format: {}", file.display()))),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load configuration from defaults, an optional file and the environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(file)?)
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for store in std::iter::once(&self.primary).chain(self.legacy.as_ref()) {
            if !store.path().is_absolute() {
                exn::bail!(ErrorKind::Invalid(format!("store path must be absolute: {}", store.path().display())));
            }
        }
        if let Some(legacy) = &self.legacy
            && legacy.path() == self.primary.path()
        {
            exn::bail!(ErrorKind::Invalid("legacy store cannot share the primary store's path".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn base() -> Figment {
        Figment::from(Serialized::defaults(Config {
            primary: StoreConfig::Sqlite { path: PathBuf::from("/default/firstrun.db") },
            legacy: None,
            build: BuildConfig::default(),
        }))
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_figment(base()).unwrap();
        assert_eq!(config.primary, StoreConfig::Sqlite { path: PathBuf::from("/default/firstrun.db") });
        assert_eq!(config.legacy, None);
        assert_eq!(config.build, BuildConfig::Fixed { number: 0 });
    }

    #[test]
    fn test_toml_overrides() {
        let toml = r#"
            [legacy]
            backend = "file"
            path = "/prefs.json"

            [build]
            source = "package"
            version = "2.3.0+118"
        "#;
        let config = Config::from_figment(base().merge(Toml::string(toml))).unwrap();
        assert_eq!(config.primary.path(), Path::new("/default/firstrun.db"));
        assert_eq!(config.legacy, Some(StoreConfig::File { path: PathBuf::from("/prefs.json") }));
        assert_eq!(config.build, BuildConfig::Package { version: "2.3.0+118".to_string() });
    }

    #[test]
    fn test_json_overrides() {
        let json = r#"{"primary": {"backend": "file", "path": "/flags.json"}, "build": {"source": "fixed", "number": 9}}"#;
        let config = Config::from_figment(base().merge(Json::string(json))).unwrap();
        assert_eq!(config.primary, StoreConfig::File { path: PathBuf::from("/flags.json") });
        assert_eq!(config.build, BuildConfig::Fixed { number: 9 });
    }

    #[rstest]
    #[case(r#"primary = { backend = "sqlite", path = "relative.db" }"#)]
    #[case(r#"legacy = { backend = "file", path = "prefs.json" }"#)]
    #[case(r#"legacy = { backend = "file", path = "/default/firstrun.db" }"#)]
    fn test_invalid(#[case] toml: &str) {
        let err = Config::from_figment(base().merge(Toml::string(toml))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[rstest]
    #[case(r#"primary = { backend = "redis", path = "/x" }"#)]
    #[case(r#"build = { source = "fixed", number = -1 }"#)]
    fn test_unparseable(#[case] toml: &str) {
        let err = Config::from_figment(base().merge(Toml::string(toml))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Load));
    }

    #[test]
    fn test_load_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("firstrun.yaml");
        std::fs::write(&path, "primary:\n  backend: file\n  path: /flags.json\n").unwrap();
        let config = Config::from_figment(Config::figment(Some(&path)).unwrap()).unwrap();
        assert_eq!(config.primary, StoreConfig::File { path: PathBuf::from("/flags.json") });
    }

    #[test]
    fn test_file_without_home_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("firstrun.toml");
        std::fs::write(&path, "[primary]\nbackend = \"sqlite\"\npath = \"/flags.db\"\n").unwrap();
        let config = Config::from_figment(Config::layered(None, Some(&path)).unwrap()).unwrap();
        assert_eq!(config.primary, StoreConfig::Sqlite { path: PathBuf::from("/flags.db") });

        let err = Config::from_figment(Config::layered(None, None).unwrap()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Load));
    }

    #[test]
    fn test_default_primary_in_data_dir() {
        let config = Config::from_figment(Config::layered(Some(Path::new("/data")), None).unwrap()).unwrap();
        assert_eq!(config.primary, StoreConfig::Sqlite { path: PathBuf::from("/data/firstrun.db") });
    }

    #[rstest]
    #[case("firstrun.ini", true)]
    #[case("missing.toml", false)]
    fn test_unusable_file(#[case] name: &str, #[case] create: bool) {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(name);
        if create {
            std::fs::write(&path, "primary = sqlite").unwrap();
        }
        let err = Config::figment(Some(&path)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }
}
