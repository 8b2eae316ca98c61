use sqlx::{Executor, Result, Sqlite, SqlitePool};

use super::{CollectionRecord, ImageRecord, VectorRecord};

/// 图片表名，由集合 ID 派生，不拼接用户输入
pub fn image_table(collection_id: i64) -> String {
    format!("image_{collection_id}")
}

/// 注册集合
pub async fn create_collection<'c, E>(executor: E, name: &str) -> Result<i64>
where
    E: Executor<'c, Database = Sqlite>,
{
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO collection (name)
        VALUES (?)
        RETURNING id
        "#,
    )
    .bind(name)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

/// 建立集合的图片表
pub async fn create_image_table<'c, E>(executor: E, collection_id: i64) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id       INTEGER PRIMARY KEY AUTOINCREMENT,
            path     TEXT NOT NULL UNIQUE,
            image    BLOB NOT NULL,
            vector   BLOB NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{{}}'
        )
        "#,
        image_table(collection_id)
    );
    sqlx::query(&sql).execute(executor).await?;
    Ok(())
}

/// 按名称查询集合
pub async fn get_collection(executor: &SqlitePool, name: &str) -> Result<Option<CollectionRecord>> {
    sqlx::query_as(
        r#"
        SELECT id, name FROM collection WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(executor)
    .await
}

/// 按注册顺序列出所有集合
pub async fn get_collections(executor: &SqlitePool) -> Result<Vec<CollectionRecord>> {
    sqlx::query_as(
        r#"
        SELECT id, name FROM collection ORDER BY id ASC
        "#,
    )
    .fetch_all(executor)
    .await
}

/// 查询集合当前记录的维度，尚未写入过向量时为 None
pub async fn get_collection_dim<'c, E>(executor: E, collection_id: i64) -> Result<Option<i64>>
where
    E: Executor<'c, Database = Sqlite>,
{
    let dim: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT dim FROM collection WHERE id = ?
        "#,
    )
    .bind(collection_id)
    .fetch_one(executor)
    .await?;

    Ok(dim)
}

/// 更新集合维度，传 None 表示清空
pub async fn set_collection_dim<'c, E>(executor: E, collection_id: i64, dim: Option<i64>) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE collection SET dim = ? WHERE id = ?
        "#,
    )
    .bind(dim)
    .bind(collection_id)
    .execute(executor)
    .await?;

    Ok(())
}

/// 删除集合注册记录
pub async fn delete_collection<'c, E>(executor: E, collection_id: i64) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(
        r#"
        DELETE FROM collection WHERE id = ?
        "#,
    )
    .bind(collection_id)
    .execute(executor)
    .await?;

    Ok(())
}

/// 删除集合的图片表
pub async fn drop_image_table<'c, E>(executor: E, collection_id: i64) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    let sql = format!("DROP TABLE IF EXISTS {}", image_table(collection_id));
    sqlx::query(&sql).execute(executor).await?;
    Ok(())
}

/// 清空集合的图片表
pub async fn clear_image_table<'c, E>(executor: E, collection_id: i64) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    let sql = format!("DELETE FROM {}", image_table(collection_id));
    sqlx::query(&sql).execute(executor).await?;
    Ok(())
}

/// 添加图片记录
pub async fn add_image<'c, E>(
    executor: E,
    collection_id: i64,
    path: &str,
    image: &[u8],
    vector: &[u8],
    metadata: &str,
) -> Result<i64>
where
    E: Executor<'c, Database = Sqlite>,
{
    let sql = format!(
        r#"
        INSERT INTO {} (path, image, vector, metadata)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
        image_table(collection_id)
    );
    let id: i64 = sqlx::query_scalar(&sql)
        .bind(path)
        .bind(image)
        .bind(vector)
        .bind(metadata)
        .fetch_one(executor)
        .await?;

    Ok(id)
}

/// 分页获取向量记录，供全量扫描使用
pub async fn get_vectors(
    executor: &SqlitePool,
    collection_id: i64,
    limit: usize,
    offset: usize,
) -> Result<Vec<VectorRecord>> {
    let limit = limit as i64;
    let offset = offset as i64;
    let sql = format!(
        r#"
        SELECT id, vector, metadata FROM {}
        ORDER BY id ASC LIMIT ? OFFSET ?
        "#,
        image_table(collection_id)
    );
    sqlx::query_as(&sql).bind(limit).bind(offset).fetch_all(executor).await
}

/// 获取图片记录
pub async fn get_image(executor: &SqlitePool, collection_id: i64, id: i64) -> Result<ImageRecord> {
    let sql = format!(
        r#"
        SELECT path, metadata FROM {} WHERE id = ?
        "#,
        image_table(collection_id)
    );
    sqlx::query_as(&sql).bind(id).fetch_one(executor).await
}

/// 获取图片原始内容
pub async fn get_image_content(executor: &SqlitePool, collection_id: i64, id: i64) -> Result<Vec<u8>> {
    let sql = format!(
        r#"
        SELECT image FROM {} WHERE id = ?
        "#,
        image_table(collection_id)
    );
    sqlx::query_scalar(&sql).bind(id).fetch_one(executor).await
}

/// 查询集合中的图片数量
pub async fn get_count(executor: &SqlitePool, collection_id: i64) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM {}", image_table(collection_id));
    let count: i64 = sqlx::query_scalar(&sql).fetch_one(executor).await?;
    Ok(count as u64)
}

/// 回收删除后的空间，不能在事务内执行
pub async fn vacuum(executor: &SqlitePool) -> Result<()> {
    sqlx::query("VACUUM").execute(executor).await?;
    Ok(())
}
