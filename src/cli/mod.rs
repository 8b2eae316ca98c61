mod add;
mod list;
mod reset;
mod search;
pub mod server;

pub use add::*;
pub use list::*;
pub use reset::*;
pub use search::*;
pub use server::*;

use crate::client::{Client, ClientBuilder};
use crate::config::Opts;
use crate::embedding::GridEmbedding;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> impl std::future::Future<Output = anyhow::Result<()>> + Send;
}

/// 按全局参数打开客户端，文件模式下自动创建父目录
pub(crate) async fn open_client(opts: &Opts, model: GridEmbedding) -> anyhow::Result<Client> {
    let mut builder = ClientBuilder::new(model);
    if let Some(path) = opts.db_path() {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        builder = builder.path(path);
    }
    Ok(builder.open().await?)
}
