use clap::{Args, Subcommand};
use time::format_description::well_known::Rfc3339;

use common::backend::SignedChallenge;
use common::error::OperationError;
use common::model::Address;
use hubstore_cli::state::StateError;

use crate::cli::op::{ContextError, Op, OpContext};

crate::command_enum! {
    (Challenge, Challenge),
    (Login, Login),
    (Logout, Logout),
    (Whoami, Whoami),
}

pub type AuthCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Auth {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[async_trait::async_trait]
impl Op for Auth {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Operation(#[from] OperationError),
    #[error("no wallet configured. Pass --address or set `wallet` in config.toml")]
    NoWallet,
}

/// Request a sign-in challenge for the wallet to sign
#[derive(Args, Debug, Clone)]
pub struct Challenge {
    /// Account to sign in as (defaults to the configured wallet)
    #[arg(long)]
    pub address: Option<Address>,
}

#[async_trait::async_trait]
impl Op for Challenge {
    type Error = AuthError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let conn = ctx.connect()?;
        let identity = self
            .address
            .or(conn.state.config.wallet)
            .ok_or(AuthError::NoWallet)?;

        let challenge = conn.storage.session().begin_challenge(identity).await?;
        conn.state.save_challenge(&challenge.message)?;

        Ok(format!(
            "{}\n\nSign the message above with {} and run `hub auth login --signature <sig>`",
            challenge.message, identity
        ))
    }
}

/// Exchange the signed challenge for a session
#[derive(Args, Debug, Clone)]
pub struct Login {
    /// Wallet signature over the last challenge
    #[arg(long)]
    pub signature: String,
}

#[async_trait::async_trait]
impl Op for Login {
    type Error = AuthError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let conn = ctx.connect()?;
        let message = conn.state.take_challenge()?;

        let session = conn
            .storage
            .session()
            .complete_login(SignedChallenge {
                message,
                signature: self.signature.clone(),
            })
            .await?;

        Ok(match session.expires_at.and_then(|at| at.format(&Rfc3339).ok()) {
            Some(expires) => format!("Signed in as {} until {}", session.identity, expires),
            None => format!("Signed in as {}", session.identity),
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct Logout;

#[async_trait::async_trait]
impl Op for Logout {
    type Error = AuthError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let conn = ctx.connect()?;
        let had_session = conn.storage.session().current_session().is_some();
        conn.storage.disconnect();

        Ok(if had_session {
            "Signed out".to_string()
        } else {
            "No active session".to_string()
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct Whoami;

#[async_trait::async_trait]
impl Op for Whoami {
    type Error = AuthError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let conn = ctx.connect()?;
        let mut lines = Vec::new();

        match conn.state.config.wallet {
            Some(wallet) => lines.push(format!("wallet:  {}", wallet)),
            None => lines.push("wallet:  none".to_string()),
        }
        match conn.storage.session().current_session() {
            Some(session) => {
                lines.push(format!("session: {}", session.identity));
                if let Some(expires) = session.expires_at.and_then(|at| at.format(&Rfc3339).ok()) {
                    lines.push(format!("expires: {}", expires));
                }
            }
            None => lines.push("session: none".to_string()),
        }
        Ok(lines.join("\n"))
    }
}
