//! 网格数组的存取

use std::path::Path;

use crate::error::{Error, Result};
use crate::voxel_grid::{CellArray, Grid};
use crate::{ESTIMATED_DISPLACEMENT, INTRAOPERATIVE_SURFACE, PREOPERATIVE_SURFACE};

/// 创建指定边长和每轴节点数的空网格
pub fn create_grid(size: f64, grid_elements: usize) -> Result<Grid> {
    Grid::new(size, grid_elements)
}

/// 把数组写入网格，`name` 为 None 时使用 `estimatedDisplacement`
///
/// 同名数组直接覆盖（与体素化写文件时的冲突检查不同）。
pub fn save_displacement_array_in_grid(
    array: CellArray,
    grid: &mut Grid,
    name: Option<&str>,
) -> Result<()> {
    let name = name.unwrap_or(ESTIMATED_DISPLACEMENT);
    grid.insert_array(name, array)?;
    log::debug!("数组 '{}' 已写入网格", name);
    Ok(())
}

/// 取出网格中的命名数组，不存在时返回 `ArrayNotFound`
pub fn extract_array_from_grid<'g>(grid: &'g Grid, name: &str) -> Result<&'g CellArray> {
    grid.array(name).ok_or_else(|| Error::ArrayNotFound {
        name: name.to_string(),
    })
}

/// 读取网格文件并取出指定数组
///
/// 文件不存在时返回 `InputNotFound`，数组不存在时返回 `ArrayNotFound`。
pub fn extract_array_from_grid_file(path: impl AsRef<Path>, name: &str) -> Result<CellArray> {
    let mut grid = Grid::load(path)?;
    grid.remove_array(name).ok_or_else(|| Error::ArrayNotFound {
        name: name.to_string(),
    })
}

/// 取出 V2SNet 的两个输入: (术前表面, 术中表面)
pub fn extract_surfaces_for_v2snet(grid: &Grid) -> Result<(&CellArray, &CellArray)> {
    let preop = extract_array_from_grid(grid, PREOPERATIVE_SURFACE)?;
    let intraop = extract_array_from_grid(grid, INTRAOPERATIVE_SURFACE)?;
    Ok((preop, intraop))
}
