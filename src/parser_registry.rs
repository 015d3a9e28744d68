use std::path::Path;

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::utils::parser::MeshFormat;

/// 格式注册表
/// 管理所有可用的网格格式，并根据文件扩展名匹配对应的读写器
pub struct FormatRegistry {
    formats: Vec<Box<dyn MeshFormat>>,
}

impl FormatRegistry {
    /// 创建新的注册表，自动注册所有可用的格式
    pub fn new() -> Self {
        let formats = crate::parsers::get_all_formats();
        Self { formats }
    }

    /// 根据文件扩展名查找匹配的格式
    /// extension: 文件扩展名（不含点号），例如 "stl"
    pub fn find_format(&self, extension: &str) -> Option<&dyn MeshFormat> {
        self.formats
            .iter()
            .find(|format| format.supports(extension))
            .map(|f| f.as_ref())
    }

    /// 根据文件路径查找匹配的格式
    pub fn find_format_for_file(&self, path: &Path) -> Option<&dyn MeshFormat> {
        let extension = path.extension().and_then(|ext| ext.to_str())?;
        self.find_format(extension)
    }

    /// 获取所有支持的扩展名列表
    pub fn supported_extensions(&self) -> Vec<String> {
        let mut extensions = Vec::new();
        for format in &self.formats {
            extensions.extend(
                format
                    .supported_extensions()
                    .iter()
                    .map(|s| s.to_lowercase()),
            );
        }
        extensions.sort();
        extensions.dedup();
        extensions
    }

    /// 按扩展名读取网格文件
    pub fn read_mesh(&self, path: &Path) -> Result<Mesh> {
        if !path.exists() {
            return Err(Error::InputNotFound(path.to_path_buf()));
        }
        let format = self
            .find_format_for_file(path)
            .ok_or_else(|| Error::UnsupportedFormat {
                path: path.to_path_buf(),
            })?;

        let mesh = format.read_from_file(path)?;
        log::info!(
            "[{}] 读取 {}: {} 个顶点，{} 个面片",
            format.name(),
            path.display(),
            mesh.vertex_count(),
            mesh.faces.len()
        );
        Ok(mesh)
    }

    /// 按扩展名写出网格文件
    pub fn write_mesh(&self, mesh: &Mesh, path: &Path) -> Result<()> {
        let format = self
            .find_format_for_file(path)
            .ok_or_else(|| Error::UnsupportedFormat {
                path: path.to_path_buf(),
            })?;
        format.write_to_file(mesh, path)?;
        log::info!("[{}] 网格已写入 {}", format.name(), path.display());
        Ok(())
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}
