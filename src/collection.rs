use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use log::debug;
use serde::Serialize;

use crate::db::{self, Database, crud};
use crate::embedding::{self, EmbeddingModel};
use crate::error::{Error, Result, is_unique_violation};
use crate::similarity::cosine_similarity;

/// 图片元数据，任意 JSON 键值对
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// 全量扫描的分页大小
const SCAN_PAGE: usize = 1000;

/// 相似搜索参数
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// 返回的最大结果数量
    pub count: usize,
    /// 最低相似度，低于该值的图片被过滤
    pub threshold: Option<f32>,
    /// 元数据等值过滤，所有键值都匹配的图片才参与排名
    pub filter: Option<Metadata>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self { count: 5, threshold: None, filter: None }
    }
}

/// 单条搜索结果
#[derive(Debug, Clone, Serialize)]
pub struct Match {
    /// 图片 ID
    pub id: i64,
    /// 图片路径
    pub path: String,
    /// 与查询图片的余弦相似度
    pub score: f32,
    /// 图片元数据
    pub metadata: Metadata,
}

/// 搜索结果
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// 通过过滤的图片总数，不受 count 截断影响
    pub n_findings: usize,
    /// 按相似度降序排列的前 count 条结果
    pub matches: Vec<Match>,
}

/// 图片集合，集合内所有向量的维度一致
#[derive(Clone)]
pub struct Collection {
    id: i64,
    name: String,
    db: Database,
    model: Arc<dyn EmbeddingModel>,
}

impl Collection {
    pub(crate) fn new(id: i64, name: String, db: Database, model: Arc<dyn EmbeddingModel>) -> Self {
        Self { id, name, db, model }
    }

    /// 集合名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 集合维度，由第一次写入的向量决定，尚未写入时为 None
    pub async fn dim(&self) -> Result<Option<usize>> {
        let dim = crud::get_collection_dim(&self.db, self.id).await?;
        Ok(dim.map(|dim| dim as usize))
    }

    /// 集合中的图片数量
    pub async fn count(&self) -> Result<u64> {
        Ok(crud::get_count(&self.db, self.id).await?)
    }

    /// 添加磁盘上的图片，返回图片 ID
    ///
    /// 同一路径只能添加一次，向量维度与集合不一致时拒绝写入
    pub async fn add_image(&self, path: impl AsRef<Path>, metadata: Metadata) -> Result<i64> {
        let path = path.as_ref();
        let (data, image) = embedding::read_image(path)?;
        self.add_decoded(&path.to_string_lossy(), &data, &image, &metadata).await
    }

    /// 添加内存中的图片，path 仅作为展示和去重用的标识
    pub async fn add_image_bytes(&self, path: &str, data: &[u8], metadata: Metadata) -> Result<i64> {
        let image = embedding::decode_image(data)?;
        self.add_decoded(path, data, &image, &metadata).await
    }

    async fn add_decoded(
        &self,
        path: &str,
        data: &[u8],
        image: &DynamicImage,
        metadata: &Metadata,
    ) -> Result<i64> {
        let vector = self.model.embed(image).map_err(Error::Provider)?;
        let blob = db::encode_vector(&vector);
        let metadata = serde_json::to_string(metadata)
            .map_err(|e| Error::Corrupt(format!("元数据无法序列化: {e}")))?;

        // 维度检查和写入必须在同一个事务里，避免首次写入时记错维度
        let mut tx = self.db.begin().await?;
        match crud::get_collection_dim(&mut *tx, self.id).await? {
            Some(dim) if dim as usize != vector.len() => {
                return Err(Error::DimensionMismatch { expected: dim as usize, actual: vector.len() });
            }
            Some(_) => {}
            None => crud::set_collection_dim(&mut *tx, self.id, Some(vector.len() as i64)).await?,
        }
        let id =
            crud::add_image(&mut *tx, self.id, path, data, &blob, &metadata).await.map_err(|e| {
                if is_unique_violation(&e) {
                    Error::DuplicatePath(path.to_string())
                } else {
                    e.into()
                }
            })?;
        tx.commit().await?;

        debug!("添加图片 {} => {}#{}", path, self.name, id);
        Ok(id)
    }

    /// 在集合内搜索与给定图片最相似的图片
    ///
    /// 空集合返回空结果，查询向量维度与集合不一致时报错
    pub async fn find_similar_images(
        &self,
        image: &DynamicImage,
        query: &SearchQuery,
    ) -> Result<SearchResult> {
        if query.count == 0 {
            return Err(Error::Input("结果数量必须大于 0".to_string()));
        }

        let Some(dim) = crud::get_collection_dim(&self.db, self.id).await? else {
            return Ok(SearchResult { n_findings: 0, matches: vec![] });
        };
        let target = self.model.embed(image).map_err(Error::Provider)?;
        if target.len() != dim as usize {
            return Err(Error::DimensionMismatch { expected: dim as usize, actual: target.len() });
        }

        // 全量扫描打分，集合规模预期在万级以内
        let mut scored = vec![];
        let mut offset = 0;
        loop {
            let records = crud::get_vectors(&self.db, self.id, SCAN_PAGE, offset).await?;
            let page = records.len();
            for record in records {
                if let Some(filter) = &query.filter {
                    let metadata = parse_metadata(&record.metadata)?;
                    if !matches_filter(&metadata, filter) {
                        continue;
                    }
                }
                let vector = db::decode_vector(&record.vector)?;
                let score = cosine_similarity(&target, &vector)?;
                if query.threshold.is_some_and(|threshold| score < threshold) {
                    continue;
                }
                scored.push((record.id, score));
            }
            if page < SCAN_PAGE {
                break;
            }
            offset += page;
        }

        let n_findings = scored.len();
        // 相似度相同时按插入顺序排列
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(query.count);

        let mut matches = Vec::with_capacity(scored.len());
        for (id, score) in scored {
            let record = crud::get_image(&self.db, self.id, id).await?;
            matches.push(Match {
                id,
                path: record.path,
                score,
                metadata: parse_metadata(&record.metadata)?,
            });
        }

        Ok(SearchResult { n_findings, matches })
    }

    /// 获取图片的原始内容
    pub async fn get_image(&self, id: i64) -> Result<Vec<u8>> {
        Ok(crud::get_image_content(&self.db, self.id, id).await?)
    }
}

fn parse_metadata(data: &str) -> Result<Metadata> {
    serde_json::from_str(data).map_err(|e| Error::Corrupt(format!("元数据无法解析: {e}")))
}

/// filter 中的所有键值都出现在 metadata 中才算命中
fn matches_filter(metadata: &Metadata, filter: &Metadata) -> bool {
    filter.iter().all(|(key, value)| metadata.get(key) == Some(value))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn metadata(value: serde_json::Value) -> Metadata {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_matches_filter() {
        let m = metadata(json!({"kind": "fruit", "color": "red", "size": 3}));
        assert!(matches_filter(&m, &metadata(json!({}))));
        assert!(matches_filter(&m, &metadata(json!({"kind": "fruit"}))));
        assert!(matches_filter(&m, &metadata(json!({"kind": "fruit", "size": 3}))));
        assert!(!matches_filter(&m, &metadata(json!({"kind": "veggie"}))));
        assert!(!matches_filter(&m, &metadata(json!({"weight": 5}))));
        // 类型不同不算相等
        assert!(!matches_filter(&m, &metadata(json!({"size": "3"}))));
    }

    #[test]
    fn test_parse_metadata() {
        assert!(parse_metadata(r#"{"a": 1}"#).is_ok());
        assert!(matches!(parse_metadata("not json"), Err(Error::Corrupt(_))));
    }
}
