use clap::Parser;

use crate::cli::{SubCommandExtend, open_client};
use crate::config::Opts;
use crate::embedding::GridEmbedding;

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {}

impl SubCommandExtend for ListCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let client = open_client(opts, GridEmbedding::default()).await?;
        for name in client.collections().await? {
            let collection = client.collection(&name).await?;
            let count = collection.count().await?;
            match collection.dim().await? {
                Some(dim) => println!("{}\t{}\t{}", name, count, dim),
                None => println!("{}\t{}\t-", name, count),
            }
        }
        Ok(())
    }
}
