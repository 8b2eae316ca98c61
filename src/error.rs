use std::result;

/// 嵌入模型返回的错误类型，具体实现可以使用任意错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = result::Result<T, E>;

/// 库内所有操作的统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 输入不合法：图片无法读取、无法解码，或查询参数越界
    #[error("无效的输入: {0}")]
    Input(String),

    /// 嵌入模型计算失败
    #[error("嵌入模型错误: {0}")]
    Provider(#[source] BoxError),

    /// 向量维度与集合记录的维度不一致
    #[error("向量维度不匹配: 期望 {expected} 维，实际 {actual} 维")]
    DimensionMismatch { expected: usize, actual: usize },

    /// 底层数据库错误
    #[error("数据库错误: {0}")]
    Store(#[from] sqlx::Error),

    /// 数据库中的记录无法解析
    #[error("数据损坏: {0}")]
    Corrupt(String),

    /// 同名集合已存在
    #[error("集合已存在: {0}")]
    DuplicateName(String),

    /// 集合内已存在相同路径的图片
    #[error("图片已存在: {0}")]
    DuplicatePath(String),

    /// 集合不存在
    #[error("集合不存在: {0}")]
    CollectionNotFound(String),
}

/// 判断是否为 SQLite 的唯一约束冲突，调用方据此映射为重名错误
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(e) => e.is_unique_violation(),
        _ => false,
    }
}
