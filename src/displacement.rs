//! 把网格上的位移场作用到网格顶点上（非刚性形变）

use std::path::Path;

use crate::ESTIMATED_DISPLACEMENT;
use crate::error::{Error, Result};
use crate::geometry::{Point3D, Vector3D};
use crate::mesh::Mesh;
use crate::parser_registry::FormatRegistry;
use crate::voxel_grid::{CellArray, Grid};
use crate::voxelise::MeshSource;

/// 位移场来源
#[derive(Debug, Clone, Copy)]
pub enum GridSource<'a> {
    File(&'a Path),
    Grid(&'a Grid),
}

/// 对 `input_mesh` 的每个顶点施加 `estimatedDisplacement` 位移，返回新网格
///
/// ## 流程
/// 1. 用网格存储的变换把顶点映射到网格坐标系
/// 2. 在顶点所在单元的 8 个节点之间三线性插值位移（网格外的点取最近的边界位置）
/// 3. 叠加位移后用逆变换映射回原始坐标系
///
/// `save_mesh` 不为 None 时按扩展名写出形变后的网格。原网格不被修改。
pub fn apply_displacement_to_mesh(
    input_mesh: MeshSource<'_>,
    displacement_source: GridSource<'_>,
    save_mesh: Option<&Path>,
) -> Result<Mesh> {
    let loaded;
    let grid = match displacement_source {
        GridSource::File(path) => {
            loaded = Grid::load(path)?;
            &loaded
        }
        GridSource::Grid(grid) => grid,
    };

    let displacement = grid
        .array(ESTIMATED_DISPLACEMENT)
        .ok_or_else(|| Error::ArrayNotFound {
            name: ESTIMATED_DISPLACEMENT.to_string(),
        })?;
    if displacement.components() != 3 {
        return Err(Error::ComponentMismatch {
            name: ESTIMATED_DISPLACEMENT.to_string(),
            expected: 3,
            got: displacement.components(),
        });
    }
    let transform = grid.transform().ok_or(Error::MissingTransform)?;

    let mesh = input_mesh.load()?;
    let vertices = mesh
        .vertices
        .iter()
        .map(|p| {
            let local = transform.apply(p);
            let moved = local + interpolate_vector(grid, displacement, &local);
            transform.invert(&moved)
        })
        .collect();
    let deformed = Mesh::new(vertices, mesh.faces.clone());

    log::info!("位移场已作用到 {} 个顶点", deformed.vertex_count());

    if let Some(path) = save_mesh {
        FormatRegistry::new().write_mesh(&deformed, path)?;
    }
    Ok(deformed)
}

/// 三线性插值 3 分量数组在 `p`（网格坐标系）处的值
pub fn interpolate_vector(grid: &Grid, array: &CellArray, p: &Point3D) -> Vector3D {
    let shape = grid.shape();
    let origin = grid.origin();
    let spacing = grid.spacing();

    // 每个轴上: 单元起点索引 + 单元内的比例
    let mut base = [0usize; 3];
    let mut frac = [0f64; 3];
    for axis in 0..3 {
        let last = (shape[axis] - 1) as f64;
        let f = ((p[axis] - origin[axis]) / spacing[axis]).clamp(0.0, last);
        let i = (f.floor() as usize).min(shape[axis] - 2);
        base[axis] = i;
        frac[axis] = f - i as f64;
    }

    let mut result = Vector3D::zeros();
    for corner in 0..8 {
        let offset = [corner & 1, (corner >> 1) & 1, (corner >> 2) & 1];
        let mut weight = 1.0;
        for axis in 0..3 {
            weight *= if offset[axis] == 1 {
                frac[axis]
            } else {
                1.0 - frac[axis]
            };
        }
        if weight == 0.0 {
            continue;
        }
        let idx = grid.index(
            base[0] + offset[0],
            base[1] + offset[1],
            base[2] + offset[2],
        );
        result += array.vector(idx) * weight;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VoxeliseOptions;
    use crate::test_support::temp_dir;
    use crate::transform::GridTransform;
    use crate::voxelise::{GridTarget, voxelise};

    fn preop_grid(mesh: &Mesh) -> Grid {
        let options = VoxeliseOptions::default()
            .center(true)
            .scale_input(0.001)
            .grid_elements(16);
        voxelise(MeshSource::Mesh(mesh), GridTarget::New, &options).unwrap()
    }

    fn field(grid: &Grid, f: impl Fn(Point3D) -> [f64; 3]) -> CellArray {
        let vectors: Vec<[f64; 3]> = (0..grid.point_count())
            .map(|i| f(grid.node_position_at(i)))
            .collect();
        CellArray::from_vectors(&vectors)
    }

    #[test]
    fn constant_field_translates_mesh() {
        let mesh = Mesh::cube(Point3D::new(100.0, 50.0, -20.0), 60.0);
        let mut grid = preop_grid(&mesh);
        let shift = field(&grid, |_| [0.01, 0.0, -0.005]);
        grid.insert_array(ESTIMATED_DISPLACEMENT, shift).unwrap();

        let deformed =
            apply_displacement_to_mesh(MeshSource::Mesh(&mesh), GridSource::Grid(&grid), None)
                .unwrap();

        assert_eq!(deformed.vertex_count(), mesh.vertex_count());
        assert_eq!(deformed.faces, mesh.faces);
        // 网格坐标系中 0.01 对应原始坐标 10mm
        let mean = deformed.mean_position().unwrap();
        assert!((mean - Point3D::new(110.0, 50.0, -25.0)).norm() < 1e-6);
        // 原网格不变
        assert_eq!(mesh.mean_position().unwrap(), Point3D::new(100.0, 50.0, -20.0));
    }

    #[test]
    fn linear_field_is_reproduced_exactly() {
        let mut grid = Grid::new(2.0, 5).unwrap();
        grid.set_transform(GridTransform::identity()).unwrap();
        let linear = field(&grid, |p| [0.1 * p.x, 0.2 * p.y, -0.1 * p.z]);

        let p = Point3D::new(0.3, -0.7, 0.55);
        let d = interpolate_vector(&grid, &linear, &p);
        assert!((d - Vector3D::new(0.03, -0.14, -0.055)).norm() < 1e-12);

        // 网格外的点取边界上的值
        let outside = interpolate_vector(&grid, &linear, &Point3D::new(5.0, 0.0, 0.0));
        assert!((outside - Vector3D::new(0.1, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn errors_for_missing_pieces() {
        let mesh = Mesh::cube(Point3D::origin(), 1.0);

        // 没有位移数组
        let grid = preop_grid(&mesh);
        assert!(matches!(
            apply_displacement_to_mesh(MeshSource::Mesh(&mesh), GridSource::Grid(&grid), None),
            Err(Error::ArrayNotFound { .. })
        ));

        // 有位移数组但没有变换
        let mut bare = Grid::new(0.3, 4).unwrap();
        bare.insert_array(ESTIMATED_DISPLACEMENT, field(&bare, |_| [0.0; 3])).unwrap();
        assert!(matches!(
            apply_displacement_to_mesh(MeshSource::Mesh(&mesh), GridSource::Grid(&bare), None),
            Err(Error::MissingTransform)
        ));

        // 标量数组不能当位移
        let mut scalar = preop_grid(&mesh);
        scalar
            .insert_array(ESTIMATED_DISPLACEMENT, CellArray::from_scalars(vec![0.0; 16 * 16 * 16]))
            .unwrap();
        assert!(matches!(
            apply_displacement_to_mesh(MeshSource::Mesh(&mesh), GridSource::Grid(&scalar), None),
            Err(Error::ComponentMismatch { .. })
        ));

        let missing = temp_dir("displacement").join("missing.vgrid");
        assert!(matches!(
            apply_displacement_to_mesh(MeshSource::Mesh(&mesh), GridSource::File(&missing), None),
            Err(Error::InputNotFound(_))
        ));
    }

    #[test]
    fn grid_file_source_and_saved_mesh() {
        let mesh = Mesh::cube(Point3D::new(100.0, 50.0, -20.0), 60.0);
        let mut grid = preop_grid(&mesh);
        grid.insert_array(ESTIMATED_DISPLACEMENT, field(&grid, |_| [0.0, 0.002, 0.0]))
            .unwrap();

        let dir = temp_dir("displacement");
        let grid_path = dir.join("displacement.vgrid");
        grid.save(&grid_path).unwrap();
        let out = dir.join("deformed.obj");

        let deformed = apply_displacement_to_mesh(
            MeshSource::Mesh(&mesh),
            GridSource::File(&grid_path),
            Some(&out),
        )
        .unwrap();

        let mean = deformed.mean_position().unwrap();
        assert!((mean - Point3D::new(100.0, 52.0, -20.0)).norm() < 1e-6);

        let written = FormatRegistry::new().read_mesh(&out).unwrap();
        assert_eq!(written.vertex_count(), 8);
        assert_eq!(written.faces, mesh.faces);
    }
}
