//! 体素化: 网格/点云 -> 网格上的距离场数组

use std::borrow::Cow;
use std::path::Path;

use crate::config::VoxeliseOptions;
use crate::distance::distance_field;
use crate::error::{Error, Result};
use crate::geometry::Point3D;
use crate::mesh::Mesh;
use crate::parser_registry::FormatRegistry;
use crate::transform::GridTransform;
use crate::voxel_grid::{CellArray, Grid};
use crate::{INTRAOPERATIVE_SURFACE, PREOPERATIVE_SURFACE};

/// 体素化的输入
#[derive(Debug, Clone, Copy)]
pub enum MeshSource<'a> {
    /// 网格文件，按扩展名选择读取器
    File(&'a Path),
    /// 原始点云（无面片）
    Points(&'a [Point3D]),
    Mesh(&'a Mesh),
}

impl MeshSource<'_> {
    /// 取得网格: 文件按扩展名读取，内存中的网格直接借用
    pub fn load(&self) -> Result<Cow<'_, Mesh>> {
        match *self {
            MeshSource::File(path) => FormatRegistry::new().read_mesh(path).map(Cow::Owned),
            MeshSource::Points(points) => Ok(Cow::Owned(Mesh::from_points(points.to_vec()))),
            MeshSource::Mesh(mesh) => Ok(Cow::Borrowed(mesh)),
        }
    }
}

/// 体素化的输出网格
#[derive(Debug)]
pub enum GridTarget<'a> {
    /// 新建网格
    New,
    /// 网格文件: 存在则读取，计算完成后写回
    File(&'a Path),
    /// 内存中的网格，修改后返回
    Grid(Grid),
}

/// 一次体素化调用的角色，决定默认数组名
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceRole {
    /// 第一次调用，计算并存储变换
    Preoperative,
    /// 复用已有变换的后续调用
    Intraoperative,
}

impl SurfaceRole {
    /// 由 `reuse_transform` 决定调用角色
    pub fn for_call(reuse_transform: bool) -> Self {
        if reuse_transform {
            SurfaceRole::Intraoperative
        } else {
            SurfaceRole::Preoperative
        }
    }

    /// 该角色写入的默认数组名
    pub fn default_array_name(self) -> &'static str {
        match self {
            SurfaceRole::Preoperative => PREOPERATIVE_SURFACE,
            SurfaceRole::Intraoperative => INTRAOPERATIVE_SURFACE,
        }
    }
}

/// 点云版本的数组名，例如 "intraoperativeSurface" -> "point_intraoperativeSurface"
///
/// 只有调用方显式使用时才生效，不会根据输入是否有面片自动推断。
pub fn point_array_name(name: &str) -> String {
    format!("point_{}", name)
}

fn resolve_array_name(options: &VoxeliseOptions) -> String {
    options.array_name.clone().unwrap_or_else(|| {
        SurfaceRole::for_call(options.reuse_transform)
            .default_array_name()
            .to_string()
    })
}

/// 体素化入口
///
/// - `reuse_transform = false`: 从输入计算新变换并存到网格上。网格已有变换时返回
///   `TransformAlreadySet`；空网格按 `size`/`grid_elements` 重建，已有数组的网格沿用其布局
/// - `reuse_transform = true`: 复用网格上已存储的变换和布局，只新增一个数组
///
/// 输出为网格文件时，如果文件中已有同名数组则返回 `WriteConflict`，
/// 内存中的网格则直接覆盖同名数组。已有的数组总是保留。
pub fn voxelise(
    input: MeshSource<'_>,
    output: GridTarget<'_>,
    options: &VoxeliseOptions,
) -> Result<Grid> {
    options.validate()?;
    let array_name = resolve_array_name(options);

    let (mut grid, save_path) = match output {
        GridTarget::New => (Grid::new(options.size, options.grid_elements)?, None),
        GridTarget::File(path) if path.exists() => {
            let grid = Grid::load(path)?;
            if grid.contains_array(&array_name) {
                return Err(Error::WriteConflict {
                    path: path.to_path_buf(),
                    name: array_name,
                });
            }
            (grid, Some(path))
        }
        GridTarget::File(path) => (Grid::new(options.size, options.grid_elements)?, Some(path)),
        GridTarget::Grid(grid) => (grid, None),
    };

    let mesh = input.load()?;
    voxelise_into(&mut grid, &mesh, options)?;

    if let Some(path) = save_path {
        grid.save(path)?;
    }
    Ok(grid)
}

/// 把 `mesh` 体素化到 `grid` 中，返回写入的数组名
pub fn voxelise_into(grid: &mut Grid, mesh: &Mesh, options: &VoxeliseOptions) -> Result<String> {
    options.validate()?;
    if mesh.vertices.is_empty() {
        return Err(Error::EmptyMesh);
    }
    mesh.validate()?;
    let array_name = resolve_array_name(options);

    let transform = if options.reuse_transform {
        let transform = *grid.transform().ok_or(Error::MissingTransform)?;
        if grid.shape() != [options.grid_elements; 3] || grid.size() != options.size {
            log::warn!(
                "复用变换时忽略 size={} / grid_elements={}，沿用网格的 size={} / shape={:?}",
                options.size,
                options.grid_elements,
                grid.size(),
                grid.shape()
            );
        }
        transform
    } else {
        if grid.has_transform() {
            return Err(Error::TransformAlreadySet);
        }
        let transform =
            GridTransform::fit(mesh, options.center, options.scale_input, options.move_input)?;
        if grid.array_names().next().is_none() {
            *grid = Grid::new(options.size, options.grid_elements)?;
        } else if grid.shape() != [options.grid_elements; 3] || grid.size() != options.size {
            log::warn!(
                "网格已有数组，沿用其 size={} / shape={:?}",
                grid.size(),
                grid.shape()
            );
        }
        grid.set_transform(transform)?;
        transform
    };

    let local = mesh.transformed(&transform);
    if let Some(bounds) = local.bounds() {
        let half = grid.size() / 2.0;
        let outside =
            bounds.min.iter().any(|&c| c < -half) || bounds.max.iter().any(|&c| c > half);
        if outside {
            log::warn!(
                "输入在网格坐标系中的范围 {:?} - {:?} 超出网格 [-{}, {}]",
                bounds.min,
                bounds.max,
                half,
                half
            );
        }
    }

    let values = distance_field(grid, &local, options.signed_df);
    let negative = values.iter().filter(|&&v| v < 0.0).count();

    if grid.contains_array(&array_name) {
        log::info!("覆盖网格中已有的数组 '{}'", array_name);
    }
    grid.insert_array(&array_name, CellArray::from_scalars(values))?;

    log::info!(
        "体素化完成: 数组 '{}'，{} 个顶点 / {} 个面片，{} 个节点为负值",
        array_name,
        mesh.vertex_count(),
        mesh.faces.len(),
        negative
    );
    Ok(array_name)
}
