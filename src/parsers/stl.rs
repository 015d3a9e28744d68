use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::geometry::Point3D;
use crate::mesh::Mesh;
use crate::utils::parser::MeshFormat;

/// STL 格式（读取二进制/ASCII，写出二进制）
pub struct StlFormat;

impl StlFormat {
    pub fn new() -> Self {
        StlFormat
    }
}

impl MeshFormat for StlFormat {
    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["stl"]
    }

    fn name(&self) -> &'static str {
        "STL"
    }

    fn read_from_file(&self, path: &Path) -> Result<Mesh> {
        let mut file = File::open(path)?;
        // read_stl 会合并重复顶点，得到带索引的网格
        let stl = stl_io::read_stl(&mut file)
            .map_err(|e| Error::Parse(format!("{}: {}", path.display(), e)))?;

        let vertices = stl
            .vertices
            .iter()
            .map(|v| Point3D::new(v[0] as f64, v[1] as f64, v[2] as f64))
            .collect();
        let faces = stl.faces.iter().map(|f| f.vertices).collect();

        let mesh = Mesh::new(vertices, faces);
        mesh.validate()?;
        Ok(mesh)
    }

    fn write_to_file(&self, mesh: &Mesh, path: &Path) -> Result<()> {
        if !mesh.has_faces() {
            return Err(Error::UnsupportedOperation {
                format: self.name(),
                operation: "写入没有面片的点云",
            });
        }

        let to_f32 = |p: &Point3D| [p.x as f32, p.y as f32, p.z as f32];
        let triangles: Vec<stl_io::Triangle> = mesh
            .triangles()
            .map(|[a, b, c]| {
                let n = (b - a).cross(&(c - a));
                let n = if n.norm() > 0.0 { n.normalize() } else { n };
                stl_io::Triangle {
                    normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                    vertices: [
                        stl_io::Vertex::new(to_f32(&a)),
                        stl_io::Vertex::new(to_f32(&b)),
                        stl_io::Vertex::new(to_f32(&c)),
                    ],
                }
            })
            .collect();

        let mut writer = BufWriter::new(File::create(path)?);
        stl_io::write_stl(&mut writer, triangles.iter())?;
        writer.flush()?;
        Ok(())
    }
}
