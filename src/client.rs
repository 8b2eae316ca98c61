use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use log::info;
use regex::Regex;

use crate::collection::Collection;
use crate::db::{Database, crud, init_db};
use crate::embedding::EmbeddingModel;
use crate::error::{Error, Result, is_unique_violation};

/// 合法的集合名：字母或下划线开头，后续为字母数字下划线
static VALID_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Za-z_][A-Za-z0-9_]*$").expect("failed to build regex"));

/// 数据库客户端构造器
pub struct ClientBuilder {
    model: Arc<dyn EmbeddingModel>,
    path: Option<PathBuf>,
}

impl ClientBuilder {
    /// 使用指定的嵌入模型构造客户端，默认使用内存数据库
    pub fn new(model: impl EmbeddingModel + 'static) -> Self {
        Self { model: Arc::new(model), path: None }
    }

    /// 持久化到指定的数据库文件
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    pub async fn open(self) -> Result<Client> {
        let db = init_db(self.path.as_deref()).await?;
        Ok(Client { db, model: self.model })
    }
}

/// 图片向量数据库客户端
///
/// 一个客户端对应一个 SQLite 数据库和一个嵌入模型，
/// 由客户端打开的所有集合共享两者
#[derive(Clone)]
pub struct Client {
    db: Database,
    model: Arc<dyn EmbeddingModel>,
}

impl Client {
    /// 创建集合，同名集合已存在时报错
    pub async fn create_collection(&self, name: &str) -> Result<Collection> {
        check_name(name)?;

        let mut tx = self.db.begin().await?;
        let id = crud::create_collection(&mut *tx, name).await.map_err(|e| {
            if is_unique_violation(&e) { Error::DuplicateName(name.to_string()) } else { e.into() }
        })?;
        crud::create_image_table(&mut *tx, id).await?;
        tx.commit().await?;

        info!("创建集合 {} (id={})", name, id);
        Ok(Collection::new(id, name.to_string(), self.db.clone(), self.model.clone()))
    }

    /// 打开已存在的集合
    pub async fn collection(&self, name: &str) -> Result<Collection> {
        let record = crud::get_collection(&self.db, name)
            .await?
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))?;
        Ok(Collection::new(record.id, record.name, self.db.clone(), self.model.clone()))
    }

    /// 列出所有集合名称
    pub async fn collections(&self) -> Result<Vec<String>> {
        let records = crud::get_collections(&self.db).await?;
        Ok(records.into_iter().map(|record| record.name).collect())
    }

    /// 清空集合中的所有图片，集合本身保留，维度重新由下一次写入决定
    pub async fn reset_collection(&self, name: &str) -> Result<()> {
        let record = crud::get_collection(&self.db, name)
            .await?
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))?;

        let mut tx = self.db.begin().await?;
        crud::clear_image_table(&mut *tx, record.id).await?;
        crud::set_collection_dim(&mut *tx, record.id, None).await?;
        tx.commit().await?;

        info!("清空集合 {}", name);
        Ok(())
    }

    /// 删除集合及其所有图片
    pub async fn drop_collection(&self, name: &str) -> Result<()> {
        let record = crud::get_collection(&self.db, name)
            .await?
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))?;

        let mut tx = self.db.begin().await?;
        crud::drop_image_table(&mut *tx, record.id).await?;
        crud::delete_collection(&mut *tx, record.id).await?;
        tx.commit().await?;
        crud::vacuum(&self.db).await?;

        info!("删除集合 {}", name);
        Ok(())
    }

    /// 删除数据库中的所有集合
    pub async fn reset(&self) -> Result<()> {
        let records = crud::get_collections(&self.db).await?;

        let mut tx = self.db.begin().await?;
        for record in &records {
            crud::drop_image_table(&mut *tx, record.id).await?;
            crud::delete_collection(&mut *tx, record.id).await?;
        }
        tx.commit().await?;
        crud::vacuum(&self.db).await?;

        info!("重置数据库，删除 {} 个集合", records.len());
        Ok(())
    }

    /// 关闭数据库连接，等待进行中的操作结束
    pub async fn close(&self) {
        self.db.close().await;
    }
}

fn check_name(name: &str) -> Result<()> {
    if VALID_NAME.is_match(name) {
        Ok(())
    } else {
        Err(Error::Input(format!("无效的集合名: {name:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_name() {
        assert!(check_name("fruits").is_ok());
        assert!(check_name("_private").is_ok());
        assert!(check_name("van_gogh_2").is_ok());
        assert!(check_name("").is_err());
        assert!(check_name("1fruits").is_err());
        assert!(check_name("fruits; DROP TABLE collection").is_err());
        assert!(check_name("水果").is_err());
    }
}
