use clap::{Args, Subcommand};

pub mod delete;
pub mod download;
pub mod info;
pub mod ls;
pub mod upload;
pub mod wait_removed;

use crate::cli::op::Op;

crate::command_enum! {
    (Upload, upload::Upload),
    (Delete, delete::Delete),
    (Download, download::Download),
    (Info, info::Info),
    (Ls, ls::Ls),
    (WaitRemoved, wait_removed::WaitRemoved),
}

pub type FileCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct File {
    #[command(subcommand)]
    pub command: FileCommand,
}

#[async_trait::async_trait]
impl Op for File {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
