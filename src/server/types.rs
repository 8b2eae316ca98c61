use serde::{Deserialize, Serialize};

use crate::collection::Metadata;

/// 创建集合请求
#[derive(Debug, Deserialize)]
pub struct CreateCollectionRequest {
    /// 集合名称
    pub name: String,
}

/// 添加图片请求
#[derive(Debug, Deserialize)]
pub struct AddImageRequest {
    /// 集合名称
    pub collection: String,
    /// 图片文件名，集合内唯一
    pub file: String,
    /// base64 编码的图片内容
    pub image_base64: String,
    /// 图片元数据
    #[serde(default)]
    pub metadata: Metadata,
}

/// 相似搜索请求
#[derive(Debug, Deserialize)]
pub struct FindSimilarRequest {
    /// 集合名称
    pub collection: String,
    /// base64 编码的查询图片
    pub image_base64: String,
    /// 返回的最大结果数量
    #[serde(rename = "top_N", default = "default_top_n")]
    pub top_n: usize,
    /// 最低相似度，不传则不过滤
    pub threshold: Option<f32>,
    /// 元数据等值过滤
    pub r#where: Option<Metadata>,
}

fn default_top_n() -> usize {
    5
}

/// 通用消息响应
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// 添加图片响应
#[derive(Debug, Serialize)]
pub struct AddImageResponse {
    pub message: String,
    /// 图片 ID
    pub id: i64,
}

/// 集合列表响应
#[derive(Debug, Serialize)]
pub struct CollectionsResponse {
    pub collections: Vec<String>,
}

/// 相似搜索响应，按相似度降序排列的平行数组
#[derive(Debug, Serialize)]
pub struct FindSimilarResponse {
    /// 通过过滤的图片总数，不受 top_N 截断影响
    pub n_findings: usize,
    /// 相似度
    pub scores: Vec<f32>,
    /// 图片文件名
    pub files: Vec<String>,
    /// base64 编码的图片内容
    pub base64: Vec<String>,
    /// 图片元数据
    pub metadata: Vec<Metadata>,
}
