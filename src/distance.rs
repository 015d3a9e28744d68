//! 网格节点上的距离场计算
//!
//! - 有面片: 到最近三角形的距离，符号由三个坐标轴方向的射线奇偶性投票决定
//!   （两票及以上判为内部，取负）
//! - 无面片（点云）: 到最近点的距离，无符号

use std::collections::HashMap;

use rayon::prelude::*;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::geometry::{Point3D, closest_point_on_triangle, ray_axis_triangle};
use crate::mesh::Mesh;
use crate::performance::StageTimer;
use crate::voxel_grid::Grid;

struct TriangleEntry {
    vertices: [Point3D; 3],
}

impl RTreeObject for TriangleEntry {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        let [a, b, c] = &self.vertices;
        let min = a.inf(b).inf(c);
        let max = a.sup(b).sup(c);
        AABB::from_corners([min.x, min.y, min.z], [max.x, max.y, max.z])
    }
}

impl PointDistance for TriangleEntry {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let p = Point3D::from(*point);
        let [a, b, c] = &self.vertices;
        (closest_point_on_triangle(&p, a, b, c) - p).norm_squared()
    }
}

/// 计算网格每个节点到 `mesh` 的距离，`mesh` 必须已经在网格坐标系中
///
/// 返回值按节点顺序排列，长度为 `grid.point_count()`。
pub fn distance_field(grid: &Grid, mesh: &Mesh, signed: bool) -> Vec<f64> {
    let timer = StageTimer::start("距离场");
    let total = grid.point_count();

    let mut values: Vec<f64> = if mesh.has_faces() {
        let tree = RTree::bulk_load(
            mesh.triangles()
                .map(|vertices| TriangleEntry { vertices })
                .collect(),
        );
        (0..total)
            .into_par_iter()
            .map(|idx| {
                let p = grid.node_position_at(idx);
                tree.nearest_neighbor(&[p.x, p.y, p.z])
                    .map(|t| t.distance_2(&[p.x, p.y, p.z]).sqrt())
                    .unwrap_or(f64::MAX)
            })
            .collect()
    } else {
        let tree = RTree::bulk_load(mesh.vertices.iter().map(|p| [p.x, p.y, p.z]).collect());
        (0..total)
            .into_par_iter()
            .map(|idx| {
                let p = grid.node_position_at(idx);
                let q = [p.x, p.y, p.z];
                tree.nearest_neighbor(&q)
                    .map(|n| n.distance_2(&q).sqrt())
                    .unwrap_or(f64::MAX)
            })
            .collect()
    };

    if signed {
        if mesh.has_faces() {
            let inside = inside_mask(grid, mesh);
            for (v, &is_inside) in values.iter_mut().zip(&inside) {
                if is_inside {
                    *v = -*v;
                }
            }
            let inside_count = inside.iter().filter(|&&b| b).count();
            log::info!(
                "距离场: {} 个节点在内部，{} 个在外部",
                inside_count,
                total - inside_count
            );
        } else {
            log::warn!("输入没有面片，无法计算有符号距离，退化为到点集的无符号距离");
        }
    }

    timer.finish();
    values
}

/// 三个坐标轴方向射线奇偶性的多数投票
fn inside_mask(grid: &Grid, mesh: &Mesh) -> Vec<bool> {
    let triangles: Vec<[Point3D; 3]> = mesh.triangles().collect();
    let mut votes = vec![0u8; grid.point_count()];

    for axis in 0..3 {
        for idx in axis_inside_nodes(grid, &triangles, axis) {
            votes[idx] += 1;
        }
    }

    votes.into_iter().map(|v| v >= 2).collect()
}

/// 沿 `axis` 方向对每条节点线做射线求交，返回判为内部的节点索引
fn axis_inside_nodes(grid: &Grid, triangles: &[[Point3D; 3]], axis: usize) -> Vec<usize> {
    let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
    let shape = grid.shape();
    let origin = grid.origin();
    let spacing = grid.spacing();

    // 两个方向用不同的扰动，避免射线正好穿过三角形的公共边或对角线
    let eps_u = spacing[u] * 1.3e-4;
    let eps_v = spacing[v] * 0.7e-4;

    let bin = spacing[u].max(spacing[v]) * 5.0;
    let bin_of = |value: f64, base: f64| ((value - base) / bin).floor() as i64;

    let (nu, nv, na) = (shape[u], shape[v], shape[axis]);

    // 只有穿过节点的射线会被查询，三角形只登记到网格范围内的格子
    let last_u = bin_of(origin[u] + (nu - 1) as f64 * spacing[u] + eps_u, origin[u]);
    let last_v = bin_of(origin[v] + (nv - 1) as f64 * spacing[v] + eps_v, origin[v]);

    let mut bins: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (ti, tri) in triangles.iter().enumerate() {
        let (mut umin, mut umax) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut vmin, mut vmax) = (f64::INFINITY, f64::NEG_INFINITY);
        for p in tri {
            umin = umin.min(p[u]);
            umax = umax.max(p[u]);
            vmin = vmin.min(p[v]);
            vmax = vmax.max(p[v]);
        }
        let (bu0, bu1) = (bin_of(umin, origin[u]).max(0), bin_of(umax, origin[u]).min(last_u));
        let (bv0, bv1) = (bin_of(vmin, origin[v]).max(0), bin_of(vmax, origin[v]).min(last_v));
        for bu in bu0..=bu1 {
            for bv in bv0..=bv1 {
                bins.entry((bu, bv)).or_default().push(ti);
            }
        }
    }

    let dedup_tol = spacing[axis] * 1e-6;

    (0..nu * nv)
        .into_par_iter()
        .flat_map_iter(|line| {
            let (iu, iv) = (line % nu, line / nu);
            let u0 = origin[u] + iu as f64 * spacing[u] + eps_u;
            let v0 = origin[v] + iv as f64 * spacing[v] + eps_v;

            let mut hits: Vec<f64> = bins
                .get(&(bin_of(u0, origin[u]), bin_of(v0, origin[v])))
                .map(|list| {
                    list.iter()
                        .filter_map(|&ti| ray_axis_triangle(&triangles[ti], axis, u0, v0))
                        .collect()
                })
                .unwrap_or_default();
            hits.sort_by(|a, b| a.total_cmp(b));
            hits.dedup_by(|a, b| (*a - *b).abs() < dedup_tol);

            let mut inside_nodes = Vec::new();
            let mut hi = 0;
            let mut inside = false;
            for ia in 0..na {
                let x = origin[axis] + ia as f64 * spacing[axis];
                while hi < hits.len() && hits[hi] < x {
                    inside = !inside;
                    hi += 1;
                }
                if inside {
                    let mut ijk = [0usize; 3];
                    ijk[axis] = ia;
                    ijk[u] = iu;
                    ijk[v] = iv;
                    inside_nodes.push(grid.index(ijk[0], ijk[1], ijk[2]));
                }
            }
            inside_nodes
        })
        .collect()
}
