use std::fs;
use std::path::Path;

use image::DynamicImage;
use image::imageops::FilterType;

use crate::error::{BoxError, Error, Result};

/// 嵌入模型接口，负责把图片映射为定长向量
///
/// 同一个实例对同一张图片必须返回相同的向量，且向量长度保持不变，
/// 集合的维度由第一次写入的向量决定
pub trait EmbeddingModel: Send + Sync {
    /// 计算图片的嵌入向量
    fn embed(&self, image: &DynamicImage) -> Result<Vec<f32>, BoxError>;
}

/// 内置的参考模型：把图片缩放为 N×N 灰度网格，按行展开为 N² 维向量
///
/// 不依赖外部模型文件，结果确定，适合做测试基线和小规模相册去重
#[derive(Debug, Clone, Copy)]
pub struct GridEmbedding {
    /// 网格边长
    grid: u32,
}

impl GridEmbedding {
    pub fn new(grid: u32) -> Self {
        Self { grid }
    }
}

impl Default for GridEmbedding {
    fn default() -> Self {
        Self::new(16)
    }
}

impl EmbeddingModel for GridEmbedding {
    fn embed(&self, image: &DynamicImage) -> Result<Vec<f32>, BoxError> {
        if self.grid == 0 {
            return Err("网格边长必须大于 0".into());
        }
        let small = image.resize_exact(self.grid, self.grid, FilterType::Triangle).into_luma8();
        Ok(small.pixels().map(|p| p.0[0] as f32 / 255.0).collect())
    }
}

/// 读取并解码磁盘上的图片，同时返回原始内容
pub fn read_image(path: impl AsRef<Path>) -> Result<(Vec<u8>, DynamicImage)> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| Error::Input(format!("无法读取 {}: {e}", path.display())))?;
    let image = decode_image(&data)?;
    Ok((data, image))
}

/// 解码内存中的图片
pub fn decode_image(data: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(data).map_err(|e| Error::Input(format!("无法解码图片: {e}")))
}

/// 读取并解码磁盘上的图片
pub fn open_image(path: impl AsRef<Path>) -> Result<DynamicImage> {
    Ok(read_image(path)?.1)
}
