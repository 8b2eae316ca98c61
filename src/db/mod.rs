use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use log::info;
use sqlx::{SqlitePool, sqlite::*};

use crate::error::{Error, Result};

pub mod crud;
pub mod model;

pub use model::*;

pub type Database = SqlitePool;

/// 初始化数据库连接，不指定文件时使用内存数据库
pub async fn init_db(filename: Option<&Path>) -> Result<Database, sqlx::Error> {
    let pool = match filename {
        Some(filename) => {
            info!("初始化数据库连接: {}", filename.display());
            let options = SqliteConnectOptions::new()
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .filename(filename)
                .create_if_missing(true);
            SqlitePool::connect_with(options).await?
        }
        None => {
            info!("初始化内存数据库");
            // 内存库的生命周期跟随连接，必须固定在唯一一条连接上
            let options = SqliteConnectOptions::new().in_memory(true);
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        }
    };

    info!("检查数据库迁移");
    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}

/// 把向量编码为小端 f32 字节串，每个分量占 4 字节
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut buf = vec![0u8; vector.len() * 4];
    LittleEndian::write_f32_into(vector, &mut buf);
    buf
}

/// 从字节串还原向量
pub fn decode_vector(data: &[u8]) -> Result<Vec<f32>> {
    if data.len() % 4 != 0 {
        return Err(Error::Corrupt(format!("向量字节数 {} 不是 4 的倍数", data.len())));
    }
    let mut vector = vec![0f32; data.len() / 4];
    LittleEndian::read_f32_into(data, &mut vector);
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_roundtrip() {
        let vector = vec![0.0, 1.0, -0.5, 3.75, f32::MIN_POSITIVE];
        assert_eq!(decode_vector(&encode_vector(&vector)).unwrap(), vector);
    }

    #[test]
    fn test_vector_empty() {
        assert_eq!(encode_vector(&[]).len(), 0);
        assert_eq!(decode_vector(&[]).unwrap(), Vec::<f32>::new());
    }

    #[test]
    fn test_vector_corrupt() {
        assert!(matches!(decode_vector(&[1, 2, 3]), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_vector_layout() {
        // 1.0f32 的小端字节表示
        assert_eq!(encode_vector(&[1.0]), vec![0x00, 0x00, 0x80, 0x3f]);
    }
}
