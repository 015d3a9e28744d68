use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::geometry::Point3D;
use crate::mesh::Mesh;
use crate::utils::parser::MeshFormat;

/// Wavefront OBJ，只处理 `v` 和 `f`
///
/// 多边形面片按扇形三角化；`f 1/2/3` 形式只取顶点索引；负索引相对于当前顶点数。
pub struct ObjFormat;

impl ObjFormat {
    pub fn new() -> Self {
        ObjFormat
    }
}

fn parse_index(token: &str, vertex_count: usize) -> Result<usize> {
    let raw = token.split('/').next().unwrap_or(token);
    let index: i64 = raw
        .parse()
        .map_err(|_| Error::Parse(format!("无效的面片索引 '{}'", token)))?;

    let resolved = match index {
        i if i > 0 => i - 1,
        i if i < 0 => vertex_count as i64 + i,
        _ => -1,
    };
    if resolved < 0 || resolved as usize >= vertex_count {
        return Err(Error::Parse(format!("面片索引 {} 越界", index)));
    }
    Ok(resolved as usize)
}

impl MeshFormat for ObjFormat {
    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["obj"]
    }

    fn name(&self) -> &'static str {
        "OBJ"
    }

    fn read_from_file(&self, path: &Path) -> Result<Mesh> {
        let reader = BufReader::new(File::open(path)?);
        let mut vertices = Vec::new();
        let mut faces = Vec::new();

        for line in reader.lines() {
            let line = line?;
            let mut parts = line.split_whitespace();
            match parts.next() {
                Some("v") => {
                    let coords: Vec<f64> = parts
                        .take(3)
                        .map(|s| s.parse::<f64>())
                        .collect::<std::result::Result<_, _>>()
                        .map_err(|e| Error::Parse(format!("顶点行 '{}': {}", line, e)))?;
                    if coords.len() != 3 {
                        return Err(Error::Parse(format!("顶点行 '{}' 坐标不足", line)));
                    }
                    vertices.push(Point3D::new(coords[0], coords[1], coords[2]));
                }
                Some("f") => {
                    let indices = parts
                        .map(|t| parse_index(t, vertices.len()))
                        .collect::<Result<Vec<_>>>()?;
                    if indices.len() < 3 {
                        return Err(Error::Parse(format!("面片 '{}' 少于 3 个顶点", line)));
                    }
                    for i in 1..indices.len() - 1 {
                        faces.push([indices[0], indices[i], indices[i + 1]]);
                    }
                }
                // 法向、纹理坐标、分组等忽略
                _ => {}
            }
        }

        Ok(Mesh::new(vertices, faces))
    }

    fn write_to_file(&self, mesh: &Mesh, path: &Path) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        for p in &mesh.vertices {
            writeln!(w, "v {} {} {}", p.x, p.y, p.z)?;
        }
        for f in &mesh.faces {
            writeln!(w, "f {} {} {}", f[0] + 1, f[1] + 1, f[2] + 1)?;
        }
        w.flush()?;
        Ok(())
    }
}
