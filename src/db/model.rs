use sqlx::FromRow;

/// 集合注册记录，维度走 crud::get_collection_dim 单独查询
#[derive(Debug, Clone, FromRow)]
pub struct CollectionRecord {
    /// 集合 ID，图片表名由此派生
    pub id: i64,
    /// 集合名称
    pub name: String,
}

/// 图片记录，不含向量和原始内容
#[derive(Debug, Clone, FromRow)]
pub struct ImageRecord {
    /// 图片路径
    pub path: String,
    /// 元数据 JSON 文本
    pub metadata: String,
}

/// 相似度扫描用的向量记录
#[derive(Debug, Clone, FromRow)]
pub struct VectorRecord {
    /// 图片 ID
    pub id: i64,
    /// 小端 f32 编码的向量
    pub vector: Vec<u8>,
    /// 元数据 JSON 文本
    pub metadata: String,
}
