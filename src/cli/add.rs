use std::path::{Path, PathBuf};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use regex::Regex;
use walkdir::WalkDir;

use crate::cli::{SubCommandExtend, open_client};
use crate::config::{EmbedOptions, Opts, parse_key_value, to_metadata};
use crate::embedding::GridEmbedding;
use crate::error::Error;

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    #[command(flatten)]
    pub embed: EmbedOptions,
    /// 集合名称，不存在时自动创建
    pub collection: String,
    /// 图片文件或所在目录
    pub path: PathBuf,
    /// 扫描的文件后缀名，多个后缀用逗号分隔
    #[arg(short, long, default_value = "jpg,jpeg,png,webp")]
    pub suffix: String,
    /// 附加到每张图片的元数据，格式为 key=value，可多次指定
    #[arg(short, long, value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub metadata: Vec<(String, String)>,
}

impl SubCommandExtend for AddCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let re_suf = format!("(?i)^({})$", self.suffix.replace(',', "|"));
        let re_suf = Regex::new(&re_suf).expect("failed to build regex");

        let client = open_client(opts, GridEmbedding::new(self.embed.grid)).await?;
        let collection = match client.collection(&self.collection).await {
            Ok(collection) => collection,
            Err(Error::CollectionNotFound(_)) => client.create_collection(&self.collection).await?,
            Err(e) => return Err(e.into()),
        };

        let files = scan_images(&self.path, &re_suf);
        let base = to_metadata(&self.metadata);

        let pb = ProgressBar::new(files.len() as u64).with_style(pb_style());
        let (mut added, mut skipped, mut failed) = (0, 0, 0);
        for file in files {
            let mut metadata = base.clone();
            if let Some(ext) = file.extension() {
                metadata.insert("extension".to_string(), ext.to_string_lossy().into_owned().into());
            }
            match collection.add_image(&file, metadata).await {
                Ok(_) => added += 1,
                Err(Error::DuplicatePath(_)) => {
                    skipped += 1;
                    pb.println(format!("[SKIP] {}", file.display()));
                }
                Err(e) => {
                    failed += 1;
                    pb.println(format!("[ERR] {}: {}", file.display(), e));
                }
            }
            pb.inc(1);
        }
        pb.finish_with_message("图片添加完成");

        info!("共添加 {} 张图片，跳过 {} 张，失败 {} 张", added, skipped, failed);
        Ok(())
    }
}

/// 扫描目录下后缀匹配的图片，单个文件直接返回
fn scan_images(path: &Path, re_suf: &Regex) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    let mut files = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| re_suf.is_match(&ext.to_string_lossy())))
        .collect::<Vec<_>>();
    // 固定入库顺序，保证 ID 可复现
    files.sort();
    files
}

fn pb_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        .unwrap()
        .progress_chars("#>-")
}
