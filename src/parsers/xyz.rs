use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::geometry::Point3D;
use crate::mesh::Mesh;
use crate::utils::parser::MeshFormat;

/// 点云文本格式: 每行 "x y z"，空白分隔，`#` 开头为注释
pub struct XyzFormat;

impl XyzFormat {
    pub fn new() -> Self {
        XyzFormat
    }
}

impl MeshFormat for XyzFormat {
    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["xyz", "txt"]
    }

    fn name(&self) -> &'static str {
        "XYZ point cloud"
    }

    fn read_from_file(&self, path: &Path) -> Result<Mesh> {
        let reader = BufReader::new(File::open(path)?);
        let mut points = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let coords: Vec<f64> = line
                .split_whitespace()
                .map(|s| s.parse::<f64>())
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| {
                    Error::Parse(format!("{} 第 {} 行: {}", path.display(), line_no + 1, e))
                })?;

            // 多余的列（法向、颜色等）忽略
            if coords.len() < 3 {
                return Err(Error::Parse(format!(
                    "{} 第 {} 行: 需要 3 个坐标，得到 {} 个",
                    path.display(),
                    line_no + 1,
                    coords.len()
                )));
            }
            points.push(Point3D::new(coords[0], coords[1], coords[2]));
        }

        Ok(Mesh::from_points(points))
    }

    fn write_to_file(&self, mesh: &Mesh, path: &Path) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        for p in &mesh.vertices {
            writeln!(w, "{} {} {}", p.x, p.y, p.z)?;
        }
        w.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_dir;

    fn temp_path(name: &str) -> std::path::PathBuf {
        temp_dir("xyz").join(name)
    }

    #[test]
    fn reads_rows_and_skips_comments() {
        let path = temp_path("cloud.xyz");
        std::fs::write(&path, "# header\n1 2 3\n\n  4.5\t-6 7e-1  \n8 9 10 0.5\n").unwrap();

        let mesh = XyzFormat::new().read_from_file(&path).unwrap();
        assert!(!mesh.has_faces());
        assert_eq!(
            mesh.vertices,
            vec![
                Point3D::new(1.0, 2.0, 3.0),
                Point3D::new(4.5, -6.0, 0.7),
                Point3D::new(8.0, 9.0, 10.0),
            ]
        );
    }

    #[test]
    fn short_row_is_an_error() {
        let path = temp_path("short.xyz");
        std::fs::write(&path, "1 2\n").unwrap();
        assert!(matches!(
            XyzFormat::new().read_from_file(&path),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn write_then_read() {
        let path = temp_path("written.xyz");
        let mesh = Mesh::from_points(vec![Point3D::new(0.125, -2.0, 1e-3)]);
        XyzFormat::new().write_to_file(&mesh, &path).unwrap();
        assert_eq!(XyzFormat::new().read_from_file(&path).unwrap(), mesh);
    }
}
