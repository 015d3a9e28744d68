use std::path::Path;

use crate::error::{Error, Result};
use crate::mesh::Mesh;

/// 网格文件格式 trait
/// 不同文件格式需要实现这个 trait
pub trait MeshFormat: Send + Sync {
    /// 获取支持的文件扩展名（不含点号），例如: "stl"
    fn supported_extensions(&self) -> Vec<&'static str>;

    /// 检查文件扩展名是否被支持
    fn supports(&self, extension: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }

    /// 从文件读取网格
    fn read_from_file(&self, path: &Path) -> Result<Mesh>;

    /// 把网格写入文件；只读格式保持默认实现
    fn write_to_file(&self, _mesh: &Mesh, _path: &Path) -> Result<()> {
        Err(Error::UnsupportedOperation {
            format: self.name(),
            operation: "写入",
        })
    }

    /// 获取格式名称（用于日志和错误信息）
    fn name(&self) -> &'static str;
}
