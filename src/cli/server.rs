use clap::Parser;
use log::info;
use rand::distr::{Alphanumeric, SampleString};
use tokio::net::TcpListener;

use crate::cli::{SubCommandExtend, open_client};
use crate::config::{EmbedOptions, Opts};
use crate::embedding::GridEmbedding;
use crate::server;

#[derive(Parser, Debug, Clone)]
pub struct ServerCommand {
    #[command(flatten)]
    pub embed: EmbedOptions,
    /// 监听地址
    #[arg(long, default_value = "127.0.0.1:8000")]
    pub addr: String,
    /// 请求验证 token，不填则随机生成
    #[arg(long, default_value_t = String::new())]
    pub token: String,
}

impl SubCommandExtend for ServerCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let client = open_client(opts, GridEmbedding::new(self.embed.grid)).await?;

        let mut token = self.token.clone();
        if token.is_empty() {
            token = Alphanumeric.sample_string(&mut rand::rng(), 32);
            info!("鉴权 token: {}", token);
        }

        // 创建应用状态
        let state = server::AppState::new(client, token);

        // 创建应用
        let app = server::create_app(state);

        // 启动服务器
        info!("服务器启动：http://{}", &self.addr);
        let listener = TcpListener::bind(&self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
