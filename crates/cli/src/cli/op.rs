use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use url::Url;

use client::{ApiError, HttpAuth, HttpBackend, RpcChainClient};
use common::addressing::Blake3Addressing;
use common::chain::ChainError;
use common::context::{Collaborators, StorageContext};
use common::error::OperationError;
use common::model::Address;
use common::progress::Step;
use common::session::SessionManager;
use hubstore_cli::state::{AppState, StateError};

/// Resolve an endpoint.
///
/// Priority: explicit flag > config file.
pub fn resolve_url(explicit: Option<&Url>, configured: &Url) -> Url {
    explicit.cloned().unwrap_or_else(|| configured.clone())
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("ledger client error: {0}")]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Session(#[from] OperationError),
}

/// Loaded state plus a storage context wired to the real transports
#[derive(Debug, Clone)]
pub struct Connection {
    pub state: AppState,
    pub storage: StorageContext,
}

#[derive(Debug, Clone)]
pub struct OpContext {
    /// Optional custom state directory (defaults to ~/.hubstore)
    pub config_path: Option<PathBuf>,
    /// Backend URL given on the command line
    pub backend: Option<Url>,
    /// Ledger RPC URL given on the command line
    pub rpc: Option<Url>,
}

impl OpContext {
    pub fn new(config_path: Option<PathBuf>, backend: Option<Url>, rpc: Option<Url>) -> Self {
        Self {
            config_path,
            backend,
            rpc,
        }
    }

    pub fn state(&self) -> Result<AppState, StateError> {
        AppState::load(self.config_path.clone())
    }

    pub fn backend_url(&self, state: &AppState) -> Url {
        resolve_url(self.backend.as_ref(), &state.config.backend_url)
    }

    pub fn rpc_url(&self, state: &AppState) -> Url {
        resolve_url(self.rpc.as_ref(), &state.config.rpc_url)
    }

    /// Build the storage context for one command.
    ///
    /// A persisted session is restored first so authenticated reads
    ///  work without signing in again. Without a configured wallet the
    ///  context has no identity and every ledger write is refused.
    pub fn connect(&self) -> Result<Connection, ContextError> {
        let state = self.state()?;
        let config = &state.config;
        let backend_url = self.backend_url(&state);
        let rpc_url = self.rpc_url(&state);

        let session = Arc::new(SessionManager::new(
            Arc::new(HttpAuth::new(&backend_url)?),
            Some(Arc::new(state.session_store())),
            config.session_config(),
        ));
        session.restore()?;

        let backend = Arc::new(HttpBackend::new(&backend_url, session.clone())?);
        let sender = config.wallet.unwrap_or(Address::from_bytes([0; 20]));
        let chain = RpcChainClient::new(&rpc_url, sender)?;

        let storage = StorageContext::new(
            Collaborators {
                chain: Arc::new(chain),
                backend: backend.clone(),
                transfer: backend,
                addressing: Arc::new(Blake3Addressing),
            },
            session,
            config.fees,
            config.poll,
        );
        if let Some(wallet) = config.wallet {
            storage.connect_wallet(wallet);
        }
        tracing::debug!(%backend_url, %rpc_url, "storage context ready");

        Ok(Connection { state, storage })
    }
}

/// Echo each progress step to stderr until the operation drops its
///  publisher
pub fn print_progress<S: Step>(label: &'static str, mut rx: watch::Receiver<S>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let first = *rx.borrow_and_update();
        eprintln!("{}: {}", label, first);
        while rx.changed().await.is_ok() {
            let step = *rx.borrow_and_update();
            eprintln!("{}: {}", label, step);
        }
    })
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
