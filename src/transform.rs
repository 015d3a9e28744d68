use nalgebra::{Similarity3, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::{Point3D, Vector3D};
use crate::mesh::Mesh;

/// 把原始网格坐标映射到体素网格坐标系的相似变换（刚体 + 均匀缩放）
///
/// 第一次（术前）体素化时计算并挂在网格上，之后的术中调用通过
/// `reuse_transform` 复用，保证两次数据落在同一个体素坐标系中。
/// 映射关系: `p' = s * R * p + t`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridTransform {
    similarity: Similarity3<f64>,
}

impl GridTransform {
    pub fn identity() -> Self {
        Self {
            similarity: Similarity3::identity(),
        }
    }

    pub fn from_similarity(similarity: Similarity3<f64>) -> Self {
        Self { similarity }
    }

    /// 从输入网格计算变换: 先按 `scale` 缩放，`center` 为真时把包围盒中心移到原点，
    /// 最后叠加 `offset` 平移
    pub fn fit(mesh: &Mesh, center: bool, scale: f64, offset: Option<[f64; 3]>) -> Result<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::InvalidOption(format!(
                "scale_input 必须为正数，得到 {}",
                scale
            )));
        }

        let pivot = if center {
            mesh.bounds()
                .map(|b| b.center().coords)
                .ok_or(Error::EmptyMesh)?
        } else {
            Vector3D::zeros()
        };
        let offset = offset.map(Vector3D::from).unwrap_or_else(Vector3D::zeros);

        // s * (p - c) + m
        let translation = Translation3::from(offset - pivot * scale);
        Ok(Self {
            similarity: Similarity3::from_parts(translation, UnitQuaternion::identity(), scale),
        })
    }

    /// 原始坐标 -> 网格坐标
    pub fn apply(&self, p: &Point3D) -> Point3D {
        self.similarity.transform_point(p)
    }

    /// 网格坐标 -> 原始坐标
    pub fn invert(&self, p: &Point3D) -> Point3D {
        self.similarity.inverse_transform_point(p)
    }

    pub fn scale(&self) -> f64 {
        self.similarity.scaling()
    }

    pub fn similarity(&self) -> &Similarity3<f64> {
        &self.similarity
    }
}
