use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use clap::{Parser, Subcommand};
use directories::ProjectDirs;

use crate::cli::*;
use crate::collection::Metadata;

static DATA_DIR: LazyLock<PathBuf> = LazyLock::new(|| {
    let proj_dirs = ProjectDirs::from("", "", "imvdb").expect("failed to get project dir");
    proj_dirs.data_dir().to_path_buf()
});

static DEFAULT_DB: LazyLock<PathBuf> = LazyLock::new(|| DATA_DIR.join("imvdb.db3"));

fn default_db_path() -> &'static str {
    DEFAULT_DB.to_str().unwrap()
}

#[derive(Parser, Debug, Clone)]
pub struct EmbedOptions {
    /// 内置网格嵌入模型的边长，向量维度为其平方
    #[arg(short, long, value_name = "N", default_value_t = 16)]
    pub grid: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// 显示的结果数量
    #[arg(short = 'n', long, value_name = "COUNT", default_value_t = 5)]
    pub count: usize,
    /// 最低相似度，范围从 -1 到 1，低于该值的结果不显示
    #[arg(short, long, value_name = "SCORE")]
    pub threshold: Option<f32>,
    /// 元数据等值过滤，格式为 key=value，可多次指定
    #[arg(short = 'w', long = "where", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub r#where: Vec<(String, String)>,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "imvdb", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// 数据库文件路径
    #[arg(short, long, value_name = "FILE", default_value = default_db_path())]
    pub db: PathBuf,
    /// 使用内存数据库，退出后数据丢失
    #[arg(long)]
    pub in_memory: bool,
}

impl Opts {
    /// 数据库文件路径，内存模式下为 None
    pub fn db_path(&self) -> Option<&Path> {
        if self.in_memory { None } else { Some(self.db.as_path()) }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 添加图片到集合
    Add(AddCommand),
    /// 从集合中搜索相似图片
    Search(SearchCommand),
    /// 列出所有集合
    List(ListCommand),
    /// 删除集合，或重置整个数据库
    Reset(ResetCommand),
    /// 启动 HTTP 搜索服务
    Server(ServerCommand),
}

/// 解析 key=value 形式的参数
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("无效的键值对: {}", s)),
    }
}

/// 把 key=value 参数列表转换为元数据，值一律视为字符串
pub fn to_metadata(pairs: &[(String, String)]) -> Metadata {
    pairs.iter().map(|(key, value)| (key.clone(), value.clone().into())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value("a=1"), Ok(("a".to_string(), "1".to_string())));
        assert_eq!(parse_key_value("a=b=c"), Ok(("a".to_string(), "b=c".to_string())));
        assert_eq!(parse_key_value("a="), Ok(("a".to_string(), "".to_string())));
        assert!(parse_key_value("=1").is_err());
        assert!(parse_key_value("abc").is_err());
    }

    #[test]
    fn test_to_metadata() {
        let pairs = vec![("kind".to_string(), "fruit".to_string())];
        let metadata = to_metadata(&pairs);
        assert_eq!(metadata.get("kind"), Some(&"fruit".into()));
    }
}
