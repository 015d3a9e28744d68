use nalgebra::{Point3, Vector3};

/// 3D 点
pub type Point3D = Point3<f64>;

/// 3D 向量
pub type Vector3D = Vector3<f64>;

/// 轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3D,
    pub max: Point3D,
}

impl Bounds {
    /// 计算点集的包围盒，空点集返回 None
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3D>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = Bounds {
            min: first,
            max: first,
        };
        for p in iter {
            bounds.min = bounds.min.inf(p);
            bounds.max = bounds.max.sup(p);
        }
        Some(bounds)
    }

    pub fn center(&self) -> Point3D {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn extent(&self) -> Vector3D {
        self.max - self.min
    }
}

/// 三角形上距 p 最近的点
/// Ericson, "Real-Time Collision Detection" 5.1.5
pub fn closest_point_on_triangle(p: &Point3D, a: &Point3D, b: &Point3D, c: &Point3D) -> Point3D {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

/// 沿坐标轴 `axis` 方向的射线与三角形求交
///
/// 射线在另外两个坐标轴上的位置为 (u0, v0)，其中 u、v 按 (axis+1)%3、(axis+2)%3 取。
/// 返回交点在 `axis` 上的坐标。
pub fn ray_axis_triangle(
    tri: &[Point3D; 3],
    axis: usize,
    u0: f64,
    v0: f64,
) -> Option<f64> {
    let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
    let [a, b, c] = tri;

    let d = (b[u] - a[u]) * (c[v] - a[v]) - (b[v] - a[v]) * (c[u] - a[u]);
    if d.abs() < 1e-15 {
        return None;
    }
    let inv_d = 1.0 / d;

    let s = ((u0 - a[u]) * (c[v] - a[v]) - (v0 - a[v]) * (c[u] - a[u])) * inv_d;
    if !(0.0..=1.0).contains(&s) {
        return None;
    }
    let t = ((b[u] - a[u]) * (v0 - a[v]) - (b[v] - a[v]) * (u0 - a[u])) * inv_d;
    if t < 0.0 || s + t > 1.0 {
        return None;
    }

    Some(a[axis] * (1.0 - s - t) + b[axis] * s + c[axis] * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri() -> [Point3D; 3] {
        [
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(1.0, 0.0, 0.0),
            Point3D::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn closest_point_regions() {
        let [a, b, c] = tri();
        // 面内部
        let p = closest_point_on_triangle(&Point3D::new(0.2, 0.2, 3.0), &a, &b, &c);
        assert!((p - Point3D::new(0.2, 0.2, 0.0)).norm() < 1e-12);
        // 顶点
        let p = closest_point_on_triangle(&Point3D::new(-1.0, -1.0, 0.0), &a, &b, &c);
        assert_eq!(p, a);
        // 斜边
        let p = closest_point_on_triangle(&Point3D::new(1.0, 1.0, 0.0), &a, &b, &c);
        assert!((p - Point3D::new(0.5, 0.5, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn z_ray_hits_triangle() {
        let t = tri();
        assert_eq!(ray_axis_triangle(&t, 2, 0.25, 0.25), Some(0.0));
        assert_eq!(ray_axis_triangle(&t, 2, 0.75, 0.75), None);
        // 射线平行于三角形平面
        assert_eq!(ray_axis_triangle(&t, 0, 0.1, 0.0), None);
    }

    #[test]
    fn bounds_center() {
        let pts = [Point3D::new(-1.0, 2.0, 0.0), Point3D::new(3.0, 4.0, 10.0)];
        let b = Bounds::from_points(&pts).unwrap();
        assert_eq!(b.center(), Point3D::new(1.0, 3.0, 5.0));
        assert!(Bounds::from_points(&[]).is_none());
    }
}
