use clap::Args;

use common::backend::BackendApi;
use common::chain::ChainClient;

use crate::cli::op::OpContext;

#[derive(Args, Debug, Clone)]
pub struct Health;

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("Health check failed: {0}")]
    Failed(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Health {
    type Error = HealthError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let mut lines = Vec::new();

        // 1. Check state directory
        lines.push("Config:".to_string());
        let conn = match ctx.state() {
            Ok(state) => {
                lines.push(format!("  directory:   {}", state.hub_dir.display()));
                lines.push("  config.toml: OK".to_string());
                lines.push(format!(
                    "  session:     {}",
                    if state.session_path.exists() {
                        "persisted"
                    } else {
                        "none"
                    }
                ));
                match state.config.wallet {
                    Some(wallet) => lines.push(format!("  wallet:      {}", wallet)),
                    None => lines.push("  wallet:      none".to_string()),
                }
                ctx.connect().map_err(|e| HealthError::Failed(e.to_string()))?
            }
            Err(e) => {
                lines.push(format!("  error: {}", e));
                return Ok(lines.join("\n"));
            }
        };

        // 2. Check the indexing backend
        lines.push(String::new());
        lines.push(format!("Backend ({}):", ctx.backend_url(&conn.state)));
        match conn.storage.backend().health().await {
            Ok(status) => lines.push(format!("  health: {}", status)),
            Err(e) if e.is_auth() => lines.push("  health: OK (sign-in required)".to_string()),
            Err(e) => lines.push(format!("  health: NOT REACHABLE ({})", e)),
        }
        match conn.storage.backend().msp_info().await {
            Ok(info) => lines.push(format!(
                "  msp:    {} ({} peers)",
                info.msp_id,
                info.peer_ids().len()
            )),
            Err(e) => lines.push(format!("  msp:    UNAVAILABLE ({})", e)),
        }

        // 3. Check the ledger gateway
        lines.push(String::new());
        lines.push(format!("Ledger ({}):", ctx.rpc_url(&conn.state)));
        match conn.storage.chain().current_base_fee().await {
            Ok(base_fee) => lines.push(format!("  base fee: {}", base_fee)),
            Err(e) => lines.push(format!("  base fee: NOT REACHABLE ({})", e)),
        }

        Ok(lines.join("\n"))
    }
}
