use std::io::ErrorKind;
use std::time::Duration;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use common::chain::FeePolicy;
use common::model::{Address, ProviderId, ValuePropId};
use common::poll::PollPolicies;
use common::session::{Session, SessionConfig, SessionStore, SessionStoreError};

pub const APP_NAME: &str = "hubstore";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const SESSION_FILE_NAME: &str = "session.json";
pub const CHALLENGE_FILE_NAME: &str = "challenge.txt";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Indexing backend, which also proxies the provider's transfer routes
    #[serde(default = "default_backend_url")]
    pub backend_url: Url,
    /// JSON-RPC endpoint of the ledger gateway
    #[serde(default = "default_rpc_url")]
    pub rpc_url: Url,
    /// Domain login challenges are scoped to
    #[serde(default = "default_domain")]
    pub domain: String,
    /// Origin URI login challenges are scoped to
    #[serde(default = "default_uri")]
    pub uri: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Account used for ledger writes and sign-in
    #[serde(default)]
    pub wallet: Option<Address>,
    /// Provider new buckets go to, unless given on the command line
    #[serde(default)]
    pub msp_id: Option<ProviderId>,
    /// Offer new buckets subscribe to, unless given on the command line
    #[serde(default)]
    pub value_prop_id: Option<ValuePropId>,
    /// Local lifetime of a session; unset means the backend decides
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: Option<u64>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Write a daily-rolling log file here as well
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub fees: FeePolicy,
    #[serde(default)]
    pub poll: PollPolicies,
}

fn default_backend_url() -> Url {
    Url::parse("http://localhost:8080").expect("hardcoded URL must parse")
}

fn default_rpc_url() -> Url {
    Url::parse("http://localhost:9944").expect("hardcoded URL must parse")
}

fn default_domain() -> String {
    "localhost".to_string()
}

fn default_uri() -> String {
    "http://localhost".to_string()
}

fn default_chain_id() -> u64 {
    1337
}

fn default_session_ttl_secs() -> Option<u64> {
    Some(60 * 60)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            rpc_url: default_rpc_url(),
            domain: default_domain(),
            uri: default_uri(),
            chain_id: default_chain_id(),
            wallet: None,
            msp_id: None,
            value_prop_id: None,
            session_ttl_secs: default_session_ttl_secs(),
            log_level: default_log_level(),
            log_dir: None,
            fees: FeePolicy::default(),
            poll: PollPolicies::default(),
        }
    }
}

impl AppConfig {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            domain: self.domain.clone(),
            uri: self.uri.clone(),
            chain_id: self.chain_id,
            ttl: self.session_ttl_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the state directory (~/.hubstore)
    pub hub_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Path to the persisted session
    pub session_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the state directory path (custom or default ~/.hubstore)
    pub fn hub_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let hub_dir = Self::hub_dir(custom_path)?;
        if hub_dir.join(CONFIG_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized);
        }
        fs::create_dir_all(&hub_dir)?;

        let config = config.unwrap_or_default();
        let config_path = hub_dir.join(CONFIG_FILE_NAME);
        fs::write(&config_path, toml::to_string_pretty(&config)?)?;

        Ok(Self {
            session_path: hub_dir.join(SESSION_FILE_NAME),
            hub_dir,
            config_path,
            config,
        })
    }

    /// Load existing state from the state directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let hub_dir = Self::hub_dir(custom_path)?;
        if !hub_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = hub_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }
        let config: AppConfig = toml::from_str(&fs::read_to_string(&config_path)?)?;

        Ok(Self {
            session_path: hub_dir.join(SESSION_FILE_NAME),
            hub_dir,
            config_path,
            config,
        })
    }

    /// Persist the current config back to `config.toml`
    pub fn save_config(&self) -> Result<(), StateError> {
        fs::write(&self.config_path, toml::to_string_pretty(&self.config)?)?;
        Ok(())
    }

    pub fn session_store(&self) -> FileSessionStore {
        FileSessionStore::new(self.session_path.clone())
    }

    /// Remember the last challenge so a later `auth login` can sign it
    pub fn save_challenge(&self, message: &str) -> Result<(), StateError> {
        fs::write(self.hub_dir.join(CHALLENGE_FILE_NAME), message)?;
        Ok(())
    }

    pub fn take_challenge(&self) -> Result<String, StateError> {
        let path = self.hub_dir.join(CHALLENGE_FILE_NAME);
        let message = match fs::read_to_string(&path) {
            Ok(message) => message,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StateError::NoChallenge),
            Err(e) => return Err(e.into()),
        };
        fs::remove_file(&path)?;
        Ok(message)
    }
}

/// Session mirrored to `session.json` so it outlives a single command
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, SessionStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| SessionStoreError::Format(e.to_string()))
    }

    fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        let raw = serde_json::to_string_pretty(session)
            .map_err(|e| SessionStoreError::Format(e.to_string()))?;
        write_private(&self.path, raw.as_bytes())?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Write a file only its owner can read; the session file holds a bearer token
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode only applies when the file is created
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    fs::write(path, contents)
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("hubstore directory not initialized. Run 'hub init' first")]
    NotInitialized,

    #[error("hubstore directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("no pending challenge. Run 'hub auth challenge' first")]
    NoChallenge,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn test_init_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hub");

        let config = AppConfig {
            wallet: Some(Address::from_bytes([1; 20])),
            ..AppConfig::default()
        };
        AppState::init(Some(path.clone()), Some(config.clone())).unwrap();

        let state = AppState::load(Some(path.clone())).unwrap();
        assert_eq!(state.config, config);
        assert!(matches!(
            AppState::init(Some(path), None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppState::load(Some(dir.path().join("missing"))),
            Err(StateError::NotInitialized)
        ));
        assert!(matches!(
            AppState::load(Some(dir.path().to_path_buf())),
            Err(StateError::MissingFile(_))
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            backend_url = "https://backend.example"
            chain_id = 55931

            [poll.readiness]
            interval_ms = 500
            max_attempts = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.backend_url.as_str(), "https://backend.example/");
        assert_eq!(config.chain_id, 55931);
        assert_eq!(config.poll.readiness.max_attempts, 10);
        assert_eq!(config.poll.deletion, PollPolicies::default().deletion);
        assert_eq!(config.fees, FeePolicy::default());
    }

    #[test]
    fn test_file_session_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join(SESSION_FILE_NAME));
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();

        let now = OffsetDateTime::now_utc().replace_nanosecond(0).unwrap();
        let session = Session {
            token: "jwt".into(),
            identity: Address::from_bytes([2; 20]),
            issued_at: now,
            expires_at: Some(now + Duration::from_secs(3600)),
        };
        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), Some(session));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SESSION_FILE_NAME);
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileSessionStore::new(path.clone());
        let issued_at = OffsetDateTime::now_utc();
        store
            .save(&Session {
                token: "secret".into(),
                identity: Address::from_bytes([1; 20]),
                issued_at,
                expires_at: None,
            })
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().unwrap().unwrap().token, "secret");
    }

    #[test]
    fn test_corrupt_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SESSION_FILE_NAME);
        fs::write(&path, "not json").unwrap();

        let store = FileSessionStore::new(path);
        assert!(matches!(store.load(), Err(SessionStoreError::Format(_))));
    }

    #[test]
    fn test_challenge_is_taken_once() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::init(Some(dir.path().join("hub")), None).unwrap();

        state.save_challenge("sign me").unwrap();
        assert_eq!(state.take_challenge().unwrap(), "sign me");
        assert!(matches!(state.take_challenge(), Err(StateError::NoChallenge)));
    }
}
