use std::io::{Read, Write};

use clap::Parser;

use crate::cli::{SubCommandExtend, open_client};
use crate::config::Opts;
use crate::embedding::GridEmbedding;

#[derive(Parser, Debug, Clone)]
pub struct ResetCommand {
    /// 要删除的集合名称，不指定时删除所有集合
    pub collection: Option<String>,
    /// 跳过确认直接执行
    #[arg(short, long)]
    pub yes: bool,
}

impl SubCommandExtend for ResetCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let prompt = match &self.collection {
            Some(name) => format!("确认删除集合 {}？[y/N] ", name),
            None => "确认删除所有集合？[y/N] ".to_string(),
        };
        if !self.yes && !read_line(&prompt)?.eq_ignore_ascii_case("y") {
            return Ok(());
        }

        let client = open_client(opts, GridEmbedding::default()).await?;
        match &self.collection {
            Some(name) => client.drop_collection(name).await?,
            None => client.reset().await?,
        }
        Ok(())
    }
}

fn read_line(prompt: &str) -> anyhow::Result<String> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let v = std::io::stdin()
        .bytes()
        .take_while(|c| c.as_ref().ok() != Some(&b'\n'))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(String::from_utf8(v)?.trim().to_owned())
}
