use crate::geometry::{Bounds, Point3D, Vector3D};
use crate::transform::GridTransform;

/// 三角网格；没有面片时即为点云
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point3D>,
    /// 每个面片是三个顶点索引
    pub faces: Vec<[usize; 3]>,
}

impl Mesh {
    pub fn new(vertices: Vec<Point3D>, faces: Vec<[usize; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// 由原始点云构造（无面片）
    pub fn from_points(points: impl Into<Vec<Point3D>>) -> Self {
        Self {
            vertices: points.into(),
            faces: Vec::new(),
        }
    }

    /// 轴对齐立方体，中心 `center`、半边长 `half`，12 个法向朝外的三角形
    pub fn cube(center: Point3D, half: f64) -> Self {
        let h = half;
        let corners = [
            [-h, -h, -h],
            [h, -h, -h],
            [h, h, -h],
            [-h, h, -h],
            [-h, -h, h],
            [h, -h, h],
            [h, h, h],
            [-h, h, h],
        ];
        let vertices = corners
            .iter()
            .map(|&c| center + Vector3D::from(c))
            .collect();
        let faces = vec![
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [2, 3, 7],
            [2, 7, 6],
            [1, 2, 6],
            [1, 6, 5],
            [0, 4, 7],
            [0, 7, 3],
        ];
        Self { vertices, faces }
    }

    /// 是否有面片（没有即为点云）
    pub fn has_faces(&self) -> bool {
        !self.faces.is_empty()
    }

    /// 顶点数
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// 顶点的包围盒，空网格返回 None
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.vertices)
    }

    /// 所有顶点的平均位置
    pub fn mean_position(&self) -> Option<Point3D> {
        if self.vertices.is_empty() {
            return None;
        }
        let sum = self
            .vertices
            .iter()
            .fold(Vector3D::zeros(), |acc, p| acc + p.coords);
        Some(Point3D::from(sum / self.vertices.len() as f64))
    }

    /// 按面片取出三角形的三个顶点坐标
    pub fn triangles(&self) -> impl Iterator<Item = [Point3D; 3]> + '_ {
        self.faces
            .iter()
            .map(|f| [self.vertices[f[0]], self.vertices[f[1]], self.vertices[f[2]]])
    }

    /// 检查面片索引是否越界
    pub fn validate(&self) -> crate::Result<()> {
        let n = self.vertices.len();
        if let Some(face) = self.faces.iter().find(|f| f.iter().any(|&i| i >= n)) {
            return Err(crate::Error::Parse(format!(
                "面片 {:?} 引用了不存在的顶点（共 {} 个顶点）",
                face, n
            )));
        }
        Ok(())
    }

    /// 返回变换到网格坐标系后的新网格，原网格不变
    pub fn transformed(&self, transform: &GridTransform) -> Mesh {
        Mesh {
            vertices: self
                .vertices
                .iter()
                .map(|p| transform.apply(p))
                .collect(),
            faces: self.faces.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_bounds() {
        let mesh = Mesh::from_points(vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(2.0, 4.0, 6.0),
        ]);
        assert!(!mesh.has_faces());
        assert_eq!(mesh.mean_position(), Some(Point3D::new(1.0, 2.0, 3.0)));
        let b = mesh.bounds().unwrap();
        assert_eq!(b.max, Point3D::new(2.0, 4.0, 6.0));
        assert_eq!(Mesh::default().mean_position(), None);
    }

    #[test]
    fn cube_is_closed_and_outward() {
        let cube = Mesh::cube(Point3D::new(1.0, 2.0, 3.0), 0.5);
        assert_eq!(cube.vertex_count(), 8);
        assert_eq!(cube.faces.len(), 12);
        assert_eq!(cube.mean_position(), Some(Point3D::new(1.0, 2.0, 3.0)));

        // 每个面片的法向都背离中心
        let center = Point3D::new(1.0, 2.0, 3.0);
        for [a, b, c] in cube.triangles() {
            let normal = (b - a).cross(&(c - a));
            let centroid = Point3D::from((a.coords + b.coords + c.coords) / 3.0);
            assert!(normal.dot(&(centroid - center)) > 0.0);
        }
    }

    #[test]
    fn validate_rejects_bad_index() {
        let mesh = Mesh::new(vec![Point3D::origin(); 3], vec![[0, 1, 3]]);
        assert!(mesh.validate().is_err());
        let mesh = Mesh::new(vec![Point3D::origin(); 3], vec![[0, 1, 2]]);
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.triangles().count(), 1);
    }
}
