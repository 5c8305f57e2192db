use std::path::PathBuf;

use clap::Args;
use url::Url;

use common::model::{Address, ProviderId, ValuePropId};
use hubstore_cli::state::{AppConfig, AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Account used to sign in and to submit ledger writes
    #[arg(long)]
    pub wallet: Option<Address>,

    /// Indexing backend URL (defaults to http://localhost:8080)
    #[arg(long)]
    pub backend_url: Option<Url>,

    /// Ledger JSON-RPC URL (defaults to http://localhost:9944)
    #[arg(long)]
    pub rpc_url: Option<Url>,

    #[arg(long)]
    pub chain_id: Option<u64>,

    /// Domain sign-in challenges are scoped to
    #[arg(long)]
    pub domain: Option<String>,

    /// Origin URI sign-in challenges are scoped to
    #[arg(long)]
    pub uri: Option<String>,

    /// Default storage provider for new buckets
    #[arg(long)]
    pub msp_id: Option<ProviderId>,

    /// Default offer new buckets subscribe to
    #[arg(long)]
    pub value_prop_id: Option<ValuePropId>,

    /// Also write logs to a daily-rolling file in this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

impl Init {
    fn config(&self) -> AppConfig {
        let defaults = AppConfig::default();
        AppConfig {
            backend_url: self.backend_url.clone().unwrap_or(defaults.backend_url),
            rpc_url: self.rpc_url.clone().unwrap_or(defaults.rpc_url),
            domain: self.domain.clone().unwrap_or(defaults.domain),
            uri: self.uri.clone().unwrap_or(defaults.uri),
            chain_id: self.chain_id.unwrap_or(defaults.chain_id),
            wallet: self.wallet,
            msp_id: self.msp_id,
            value_prop_id: self.value_prop_id,
            log_dir: self.log_dir.clone(),
            ..defaults
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("State error: {0}")]
    State(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::init(ctx.config_path.clone(), Some(self.config()))?;

        let mut lines = vec![format!(
            "Initialized hubstore directory at {}",
            state.hub_dir.display()
        )];
        lines.push(format!("  backend: {}", state.config.backend_url));
        lines.push(format!("  rpc:     {}", state.config.rpc_url));
        match state.config.wallet {
            Some(wallet) => lines.push(format!("  wallet:  {}", wallet)),
            None => lines.push("  wallet:  none (read-only until one is configured)".to_string()),
        }
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::op::{Op, OpContext};

    #[tokio::test]
    async fn test_init_writes_flags_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hub");
        let init = Init {
            wallet: Some(Address::from_bytes([0xa1; 20])),
            backend_url: Some(Url::parse("https://backend.example").unwrap()),
            rpc_url: None,
            chain_id: Some(55931),
            domain: None,
            uri: None,
            msp_id: None,
            value_prop_id: Some(ValuePropId::from_bytes([7; 32])),
            log_dir: None,
        };

        let ctx = OpContext::new(Some(path.clone()), None, None);
        let output = init.execute(&ctx).await.unwrap();
        assert!(output.contains("wallet:  0xa1a1"));

        let config = AppState::load(Some(path)).unwrap().config;
        assert_eq!(config.wallet, Some(Address::from_bytes([0xa1; 20])));
        assert_eq!(config.chain_id, 55931);
        assert_eq!(config.backend_url.as_str(), "https://backend.example/");
        assert_eq!(config.rpc_url, AppConfig::default().rpc_url);
        assert_eq!(config.value_prop_id, Some(ValuePropId::from_bytes([7; 32])));

        assert!(matches!(
            init.execute(&ctx).await,
            Err(InitError::State(StateError::AlreadyInitialized))
        ));
    }
}
