use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 默认网格边长（网格坐标系单位）
pub const DEFAULT_GRID_SIZE: f64 = 0.3;
/// 默认每轴节点数
pub const DEFAULT_GRID_ELEMENTS: usize = 64;

/// 体素化参数
///
/// 可以直接构造，也可以从 JSON 文件加载，缺省的字段使用默认值:
///
/// ```json
/// { "signed_df": false, "reuse_transform": true, "grid_elements": 64 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxeliseOptions {
    /// 有符号距离场（内部为负）；为 false 时只计算无符号距离
    pub signed_df: bool,
    /// 把输入包围盒中心移到原点
    pub center: bool,
    /// 输入坐标的缩放系数，例如 mm -> m 为 0.001
    pub scale_input: f64,
    /// 复用网格上已存储的变换和网格布局
    pub reuse_transform: bool,
    /// 网格边长
    pub size: f64,
    /// 每个轴上的节点数
    pub grid_elements: usize,
    /// 写入的数组名；为 None 时按调用角色取默认名
    pub array_name: Option<String>,
    /// 缩放、居中之后额外叠加的平移
    pub move_input: Option<[f64; 3]>,
}

impl Default for VoxeliseOptions {
    fn default() -> Self {
        Self {
            signed_df: true,
            center: false,
            scale_input: 1.0,
            reuse_transform: false,
            size: DEFAULT_GRID_SIZE,
            grid_elements: DEFAULT_GRID_ELEMENTS,
            array_name: None,
            move_input: None,
        }
    }
}

impl VoxeliseOptions {
    /// 从 JSON 文件加载参数
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::InputNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let options: VoxeliseOptions = serde_json::from_str(&text)?;
        options.validate()?;
        Ok(options)
    }

    /// 检查参数取值
    pub fn validate(&self) -> Result<()> {
        if !self.scale_input.is_finite() || self.scale_input <= 0.0 {
            return Err(Error::InvalidOption(format!(
                "scale_input 必须为正数，得到 {}",
                self.scale_input
            )));
        }
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(Error::InvalidOption(format!("size 必须为正数，得到 {}", self.size)));
        }
        if self.grid_elements < 2 {
            return Err(Error::InvalidOption(format!(
                "grid_elements 至少为 2，得到 {}",
                self.grid_elements
            )));
        }
        if matches!(&self.array_name, Some(name) if name.is_empty()) {
            return Err(Error::InvalidOption("array_name 不能为空".to_string()));
        }
        Ok(())
    }

    pub fn signed_df(mut self, signed_df: bool) -> Self {
        self.signed_df = signed_df;
        self
    }

    pub fn center(mut self, center: bool) -> Self {
        self.center = center;
        self
    }

    pub fn scale_input(mut self, scale_input: f64) -> Self {
        self.scale_input = scale_input;
        self
    }

    pub fn reuse_transform(mut self, reuse_transform: bool) -> Self {
        self.reuse_transform = reuse_transform;
        self
    }

    pub fn size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn grid_elements(mut self, grid_elements: usize) -> Self {
        self.grid_elements = grid_elements;
        self
    }

    pub fn array_name(mut self, array_name: impl Into<String>) -> Self {
        self.array_name = Some(array_name.into());
        self
    }

    pub fn move_input(mut self, offset: [f64; 3]) -> Self {
        self.move_input = Some(offset);
        self
    }
}
