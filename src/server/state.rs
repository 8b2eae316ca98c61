use std::sync::Arc;

use crate::client::Client;

/// 应用状态
pub struct AppState {
    /// 数据库客户端
    pub client: Client,
    /// 鉴权 token
    pub token: String,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(client: Client, token: String) -> Arc<Self> {
        Arc::new(AppState { client, token })
    }
}
