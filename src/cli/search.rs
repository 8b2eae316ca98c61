use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use crate::cli::{SubCommandExtend, open_client};
use crate::collection::{SearchQuery, SearchResult};
use crate::config::{EmbedOptions, Opts, SearchOptions, to_metadata};
use crate::embedding::{GridEmbedding, open_image};

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    pub embed: EmbedOptions,
    #[command(flatten)]
    pub search: SearchOptions,
    /// 集合名称
    pub collection: String,
    /// 被搜索的图片路径
    pub image: PathBuf,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for SearchCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let image = open_image(&self.image)?;

        let client = open_client(opts, GridEmbedding::new(self.embed.grid)).await?;
        let collection = client.collection(&self.collection).await?;

        let query = SearchQuery {
            count: self.search.count,
            threshold: self.search.threshold,
            filter: (!self.search.r#where.is_empty()).then(|| to_metadata(&self.search.r#where)),
        };
        let result = collection.find_similar_images(&image, &query).await?;

        print_result(&result, self)
    }
}

fn print_result(result: &SearchResult, opts: &SearchCommand) -> Result<()> {
    match opts.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?)
        }
        OutputFormat::Table => {
            for m in &result.matches {
                println!("{:.4}\t{}", m.score, m.path);
            }
        }
    }
    Ok(())
}

#[derive(ValueEnum, Debug, Clone)]
pub enum OutputFormat {
    Json,
    Table,
}
