// Build settings: real/mock mode, default credentials, "bin mode"
//
// `BuildContext` is passed explicitly into the factory. The process-wide
// copy behind `global()` only seeds `Registry::new()`; nothing inside
// construction reads it.
//
// Environment variables (a `.env` file is honoured via dotenvy):
// - SERVICEKIT_MOCK              build Mock instances ("1", "true", "yes", "on")
// - SERVICEKIT_BIN               merge default credentials into every build
// - SERVICEKIT_CREDENTIAL        section of the credentials file (default "default")
// - SERVICEKIT_CREDENTIALS_PATH  credentials file (default ~/.servicekit/credentials.json)

use crate::error::SettingsError;
use crate::registry::symbol::{Config, Symbol};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock};

pub const MOCK_VAR: &str = "SERVICEKIT_MOCK";
pub const BIN_VAR: &str = "SERVICEKIT_BIN";
pub const CREDENTIAL_VAR: &str = "SERVICEKIT_CREDENTIAL";
pub const CREDENTIALS_PATH_VAR: &str = "SERVICEKIT_CREDENTIALS_PATH";
pub const DEFAULT_SECTION: &str = "default";

/// Which variant the factory constructs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Real,
    Mock,
}

/// Default configuration values merged into builds in bin mode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    values: Config,
}

impl Credentials {
    pub fn new(values: Config) -> Self {
        Self { values }
    }

    /// Load one section of a JSON credentials file
    ///
    /// File format:
    ///     {
    ///       "default": { "api_key": "...", "region": "us-east" },
    ///       "staging": { "api_key": "..." }
    ///     }
    ///
    /// A missing file or a missing section yields empty credentials.
    ///
    /// # Errors
    /// - File exists but cannot be read
    /// - Invalid JSON
    /// - Top level or the section is not a JSON object
    pub fn load(path: &Path, section: &str) -> Result<Self, SettingsError> {
        if !path.exists() {
            tracing::debug!("No credentials file at {:?}", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let document: Value = serde_json::from_str(&content)?;

        let sections = document.as_object().ok_or_else(|| {
            SettingsError::Invalid(format!("Credentials file {:?} must contain a JSON object", path))
        })?;

        match sections.get(section) {
            None => {
                tracing::debug!("Credentials section '{}' not found in {:?}", section, path);
                Ok(Self::default())
            }
            Some(Value::Object(values)) => Ok(Self::new(
                values
                    .iter()
                    .map(|(k, v)| (Symbol::from(k.as_str()), v.clone()))
                    .collect(),
            )),
            Some(_) => Err(SettingsError::Invalid(format!(
                "Credentials section '{}' must be a JSON object",
                section
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<Symbol>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Everything the factory needs besides the service type and caller config
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    pub mode: Mode,
    /// Merge `credentials` into caller config before validation
    pub bin: bool,
    pub credentials: Arc<Credentials>,
}

impl BuildContext {
    pub fn real() -> Self {
        Self::default()
    }

    pub fn mock() -> Self {
        Self {
            mode: Mode::Mock,
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable bin mode with these default credentials
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.bin = true;
        self.credentials = Arc::new(credentials);
        self
    }

    pub fn is_mocking(&self) -> bool {
        self.mode == Mode::Mock
    }

    /// Load settings from the process environment (and `.env`)
    ///
    /// # Errors
    /// - Credentials file present but unreadable or malformed
    pub fn from_env() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_vars<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = if lookup(MOCK_VAR).as_deref().is_some_and(is_truthy) {
            Mode::Mock
        } else {
            Mode::Real
        };
        let bin = lookup(BIN_VAR).as_deref().is_some_and(is_truthy);

        let credentials = if bin {
            let section = lookup(CREDENTIAL_VAR).unwrap_or_else(|| DEFAULT_SECTION.to_string());
            match lookup(CREDENTIALS_PATH_VAR)
                .map(PathBuf::from)
                .or_else(default_credentials_path)
            {
                Some(path) => Credentials::load(&path, &section)?,
                None => {
                    tracing::warn!("No home directory; bin mode runs without default credentials");
                    Credentials::default()
                }
            }
        } else {
            Credentials::default()
        };

        tracing::debug!(
            "Build settings: mode={:?} bin={} credentials={}",
            mode,
            bin,
            credentials.len()
        );

        Ok(Self {
            mode,
            bin,
            credentials: Arc::new(credentials),
        })
    }
}

/// `~/.servicekit/credentials.json`
pub fn default_credentials_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".servicekit").join("credentials.json"))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn global_cell() -> &'static RwLock<BuildContext> {
    static GLOBAL: OnceLock<RwLock<BuildContext>> = OnceLock::new();
    GLOBAL.get_or_init(|| RwLock::new(BuildContext::default()))
}

/// Process-wide default context (Real mode, bin off until set)
pub fn global() -> BuildContext {
    global_cell()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Replace the process-wide default context
pub fn set_global(context: BuildContext) {
    *global_cell()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = context;
}

/// Flip the process-wide default between Real and Mock
pub fn set_mocking(mocking: bool) {
    let mut context = global_cell()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    context.mode = if mocking { Mode::Mock } else { Mode::Real };
}
