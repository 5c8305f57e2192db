mod cli;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Auth, Bucket, File, Health, Init, Provider, Version};

use hubstore_cli::logging::init_logging;
use hubstore_cli::state::AppState;

command_enum! {
    (Init, Init),
    (Version, Version),
    (Health, Health),
    (Provider, Provider),
    (Auth, Auth),
    (Bucket, Bucket),
    (File, File),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Logging follows the loaded config; before `hub init` there is none
    let guards = match AppState::load(args.config_path.clone()) {
        Ok(state) => init_logging(&state.config),
        Err(_) => Vec::new(),
    };

    let ctx = cli::op::OpContext::new(args.config_path, args.backend, args.rpc);

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            1
        }
    };

    // flush the non-blocking writers before exiting
    drop(guards);
    std::process::exit(code);
}
