use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::utils::parser::MeshFormat;

/// legacy VTK POLYDATA (ASCII)，只支持写出
pub struct VtkFormat;

impl VtkFormat {
    pub fn new() -> Self {
        VtkFormat
    }
}

impl MeshFormat for VtkFormat {
    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["vtk"]
    }

    fn name(&self) -> &'static str {
        "VTK legacy"
    }

    fn read_from_file(&self, _path: &Path) -> Result<Mesh> {
        Err(Error::UnsupportedOperation {
            format: self.name(),
            operation: "读取",
        })
    }

    fn write_to_file(&self, mesh: &Mesh, path: &Path) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        writeln!(w, "# vtk DataFile Version 3.0")?;
        writeln!(w, "mesh-voxelise mesh")?;
        writeln!(w, "ASCII")?;
        writeln!(w, "DATASET POLYDATA")?;
        writeln!(w, "POINTS {} double", mesh.vertex_count())?;
        for p in &mesh.vertices {
            writeln!(w, "{} {} {}", p.x, p.y, p.z)?;
        }

        if mesh.has_faces() {
            writeln!(w, "POLYGONS {} {}", mesh.faces.len(), mesh.faces.len() * 4)?;
            for f in &mesh.faces {
                writeln!(w, "3 {} {} {}", f[0], f[1], f[2])?;
            }
        } else {
            // 点云写成顶点单元，便于直接显示
            let n = mesh.vertex_count();
            writeln!(w, "VERTICES {} {}", n, n * 2)?;
            for i in 0..n {
                writeln!(w, "1 {}", i)?;
            }
        }

        w.flush()?;
        Ok(())
    }
}
