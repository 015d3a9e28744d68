use crate::error::{Error, Result};
use crate::geometry::{Point3D, Vector3D};
use crate::transform::GridTransform;

/// 网格上的一个命名数组，每个网格节点对应一个元组（标量为 1 个分量，向量为 3 个）
#[derive(Debug, Clone, PartialEq)]
pub struct CellArray {
    components: usize,
    /// 按节点顺序平铺存储: index = node * components + c
    values: Vec<f64>,
}

impl CellArray {
    /// 由平铺数据构造，`values` 的长度必须是 `components` 的整数倍
    pub fn new(components: usize, values: Vec<f64>) -> Result<Self> {
        if components == 0 || values.len() % components != 0 {
            return Err(Error::ComponentMismatch {
                name: String::new(),
                expected: components,
                got: values.len(),
            });
        }
        Ok(Self { components, values })
    }

    /// 标量数组（1 个分量）
    pub fn from_scalars(values: Vec<f64>) -> Self {
        Self {
            components: 1,
            values,
        }
    }

    /// 向量数组（3 个分量）
    pub fn from_vectors(vectors: &[[f64; 3]]) -> Self {
        Self {
            components: 3,
            values: vectors.iter().flatten().copied().collect(),
        }
    }

    /// 每个元组的分量数
    pub fn components(&self) -> usize {
        self.components
    }

    /// 元组个数（即节点个数）
    pub fn len(&self) -> usize {
        self.values.len() / self.components
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 平铺的原始数据
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// 第 index 个节点的元组
    pub fn tuple(&self, index: usize) -> &[f64] {
        let start = index * self.components;
        &self.values[start..start + self.components]
    }

    /// 3 分量数组的第 index 个向量
    pub fn vector(&self, index: usize) -> Vector3D {
        let t = self.tuple(index);
        Vector3D::new(t[0], t[1], t[2])
    }
}

/// 体素网格
///
/// 三维规则网格，每个轴上 `grid_elements` 个节点，覆盖网格坐标系中的
/// `[-size/2, size/2]^3`。节点按 x 变化最快、y 其次、z 最慢的顺序存储，
/// 索引计算: index = k * nx * ny + j * nx + i
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// 每个轴的节点数 [nx, ny, nz]
    shape: [usize; 3],
    size: f64,
    /// 一旦设置就不再改变
    transform: Option<GridTransform>,
    /// 按插入顺序保存
    arrays: Vec<(String, CellArray)>,
}

impl Grid {
    /// 创建空网格（无数组、无变换）
    pub fn new(size: f64, grid_elements: usize) -> Result<Self> {
        if !size.is_finite() || size <= 0.0 {
            return Err(Error::InvalidGrid(format!("size 必须为正数，得到 {}", size)));
        }
        if grid_elements < 2 {
            return Err(Error::InvalidGrid(format!(
                "grid_elements 至少为 2，得到 {}",
                grid_elements
            )));
        }
        if checked_point_count([grid_elements; 3]).is_none() {
            return Err(Error::InvalidGrid(format!(
                "grid_elements {} 过大，节点数溢出",
                grid_elements
            )));
        }

        Ok(Grid {
            shape: [grid_elements; 3],
            size,
            transform: None,
            arrays: Vec::new(),
        })
    }

    pub(crate) fn from_parts(
        shape: [usize; 3],
        size: f64,
        transform: Option<GridTransform>,
    ) -> Result<Self> {
        let valid_shape = shape.iter().all(|&n| n >= 2) && checked_point_count(shape).is_some();
        if !valid_shape || !size.is_finite() || size <= 0.0 {
            return Err(Error::InvalidGrid(format!(
                "shape {:?} / size {} 无效",
                shape, size
            )));
        }
        Ok(Grid {
            shape,
            size,
            transform,
            arrays: Vec::new(),
        })
    }

    /// 每个轴的节点数
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// 网格边长（网格坐标系单位）
    pub fn size(&self) -> f64 {
        self.size
    }

    /// 每个轴上的单元数，比节点数少 1
    pub fn cell_dims(&self) -> [usize; 3] {
        self.shape.map(|n| n - 1)
    }

    /// 节点总数，也是每个数组的元组数
    pub fn point_count(&self) -> usize {
        self.shape[0] * self.shape[1] * self.shape[2]
    }

    /// 单元总数
    pub fn cell_count(&self) -> usize {
        self.cell_dims().iter().product()
    }

    /// 每个轴上的节点间距
    pub fn spacing(&self) -> Vector3D {
        Vector3D::new(
            self.size / (self.shape[0] - 1) as f64,
            self.size / (self.shape[1] - 1) as f64,
            self.size / (self.shape[2] - 1) as f64,
        )
    }

    /// 第一个节点 (0, 0, 0) 的位置
    pub fn origin(&self) -> Point3D {
        let half = self.size / 2.0;
        Point3D::new(-half, -half, -half)
    }

    /// 节点 (i, j, k) 在数组中的位置
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        k * self.shape[0] * self.shape[1] + j * self.shape[0] + i
    }

    /// 节点 (i, j, k) 在网格坐标系中的位置
    pub fn node_position(&self, i: usize, j: usize, k: usize) -> Point3D {
        let o = self.origin();
        let s = self.spacing();
        Point3D::new(
            o.x + i as f64 * s.x,
            o.y + j as f64 * s.y,
            o.z + k as f64 * s.z,
        )
    }

    /// 按数组位置取节点坐标
    pub fn node_position_at(&self, index: usize) -> Point3D {
        let [nx, ny, _] = self.shape;
        self.node_position(index % nx, (index / nx) % ny, index / (nx * ny))
    }

    /// 第一次体素化时存储的变换
    pub fn transform(&self) -> Option<&GridTransform> {
        self.transform.as_ref()
    }

    pub fn has_transform(&self) -> bool {
        self.transform.is_some()
    }

    pub(crate) fn set_transform(&mut self, transform: GridTransform) -> Result<()> {
        if self.transform.is_some() {
            return Err(Error::TransformAlreadySet);
        }
        self.transform = Some(transform);
        Ok(())
    }

    /// 按名称查找数组
    pub fn array(&self, name: &str) -> Option<&CellArray> {
        self.arrays
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a)
    }

    pub fn contains_array(&self, name: &str) -> bool {
        self.array(name).is_some()
    }

    /// 数组名，按写入顺序
    pub fn array_names(&self) -> impl Iterator<Item = &str> {
        self.arrays.iter().map(|(n, _)| n.as_str())
    }

    pub fn arrays(&self) -> impl Iterator<Item = (&str, &CellArray)> {
        self.arrays.iter().map(|(n, a)| (n.as_str(), a))
    }

    /// 写入数组；同名数组被覆盖并保留原来的位置
    pub fn insert_array(&mut self, name: &str, array: CellArray) -> Result<()> {
        if array.len() != self.point_count() {
            return Err(Error::ShapeMismatch {
                expected: self.point_count(),
                got: array.len(),
            });
        }

        match self.arrays.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = array,
            None => self.arrays.push((name.to_string(), array)),
        }
        Ok(())
    }

    /// 取出并删除数组
    pub fn remove_array(&mut self, name: &str) -> Option<CellArray> {
        let pos = self.arrays.iter().position(|(n, _)| n == name)?;
        Some(self.arrays.remove(pos).1)
    }

    /// 两个网格的节点布局与变换是否一致
    pub fn same_frame(&self, other: &Grid) -> bool {
        self.shape == other.shape && self.size == other.size && self.transform == other.transform
    }
}

/// 节点总数，溢出时返回 None
fn checked_point_count(shape: [usize; 3]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &n| acc.checked_mul(n))
}
