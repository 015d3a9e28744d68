//! 网格体素化与形变工具
//!
//! 把三角网格（或点云）体素化为规则网格上的距离场，
//! 在术前/术中两次调用之间复用同一个刚体变换，
//! 并把网格上的位移场回写到原始网格顶点上。

pub mod arrays;
pub mod config;
pub mod displacement;
pub mod distance;
pub mod error;
pub mod geometry;
pub mod grid_file;
pub mod mesh;
pub mod parser_registry;
pub mod parsers;
mod performance;
pub mod transform;
pub mod utils;
pub mod voxel_grid;
pub mod voxelise;

#[cfg(test)]
mod test_support;

pub use arrays::{
    create_grid, extract_array_from_grid, extract_array_from_grid_file,
    extract_surfaces_for_v2snet, save_displacement_array_in_grid,
};
pub use config::VoxeliseOptions;
pub use displacement::{GridSource, apply_displacement_to_mesh};
pub use error::{Error, Result};
pub use geometry::{Point3D, Vector3D};
pub use mesh::Mesh;
pub use parser_registry::FormatRegistry;
pub use transform::GridTransform;
pub use voxel_grid::{CellArray, Grid};
pub use voxelise::{
    GridTarget, MeshSource, SurfaceRole, point_array_name, voxelise, voxelise_into,
};

/// 术前表面距离场的保留数组名
pub const PREOPERATIVE_SURFACE: &str = "preoperativeSurface";
/// 术中表面距离场的保留数组名
pub const INTRAOPERATIVE_SURFACE: &str = "intraoperativeSurface";
/// 位移场的保留数组名（3 分量）
pub const ESTIMATED_DISPLACEMENT: &str = "estimatedDisplacement";
