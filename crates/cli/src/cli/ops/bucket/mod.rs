use clap::{Args, Subcommand};

pub mod create;
pub mod delete;
pub mod list;
pub mod show;

use crate::cli::op::Op;

crate::command_enum! {
    (Create, create::Create),
    (Delete, delete::Delete),
    (List, list::List),
    (Show, show::Show),
}

// Rename the generated Command to BucketCommand for clarity
pub type BucketCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Bucket {
    #[command(subcommand)]
    pub command: BucketCommand,
}

#[async_trait::async_trait]
impl Op for Bucket {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

/// One bucket, the way every bucket command prints it
pub(crate) fn describe(bucket: &common::model::Bucket) -> String {
    format!(
        "{} {} [{}] msp={} files={} bytes={}",
        bucket.bucket_id,
        bucket.name,
        if bucket.is_private { "private" } else { "public" },
        bucket.msp_id,
        bucket.file_count,
        bucket.size_bytes
    )
}
