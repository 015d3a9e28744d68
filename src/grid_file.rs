//! 网格文件的读写
//!
//! 文件布局:
//! - 8 字节魔数 `VXGRID01`
//! - u64 小端: JSON 头长度
//! - JSON 头: shape、size、变换、数组描述（按插入顺序）
//! - gzip 压缩的数据段: 每个数组的 f64 小端值依次排列

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::performance::StageTimer;
use crate::transform::GridTransform;
use crate::voxel_grid::{CellArray, Grid};

const MAGIC: &[u8; 8] = b"VXGRID01";
/// JSON 头的长度上限，超过视为文件损坏
const MAX_HEADER_LEN: u64 = 16 * 1024 * 1024;

#[derive(Serialize, Deserialize)]
struct GridHeader {
    shape: [usize; 3],
    size: f64,
    transform: Option<GridTransform>,
    arrays: Vec<ArrayDescriptor>,
}

#[derive(Serialize, Deserialize)]
struct ArrayDescriptor {
    name: String,
    components: usize,
    /// f64 值的个数（元组数 * 分量数）
    values: usize,
}

impl Grid {
    /// 把网格（包括所有数组和变换）写入文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let timer = StageTimer::start("保存网格");

        let header = GridHeader {
            shape: self.shape(),
            size: self.size(),
            transform: self.transform().copied(),
            arrays: self
                .arrays()
                .map(|(name, a)| ArrayDescriptor {
                    name: name.to_string(),
                    components: a.components(),
                    values: a.values().len(),
                })
                .collect(),
        };
        let header_bytes = serde_json::to_vec(&header)?;

        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(MAGIC)?;
        writer.write_u64::<LittleEndian>(header_bytes.len() as u64)?;
        writer.write_all(&header_bytes)?;

        let mut encoder = GzEncoder::new(writer, Compression::default());
        for (_, array) in self.arrays() {
            for &value in array.values() {
                encoder.write_f64::<LittleEndian>(value)?;
            }
        }
        encoder.finish()?.flush()?;

        log::info!(
            "网格已保存到 {}（{} 个数组）",
            path.display(),
            header.arrays.len()
        );
        timer.finish();
        Ok(())
    }

    /// 从文件读取网格
    pub fn load(path: impl AsRef<Path>) -> Result<Grid> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::InputNotFound(path.to_path_buf()));
        }
        let timer = StageTimer::start("读取网格");

        let mut reader = BufReader::new(File::open(path)?);

        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic).map_err(truncated)?;
        if &magic != MAGIC {
            return Err(Error::InvalidGridFile(format!(
                "{} 不是网格文件",
                path.display()
            )));
        }

        let header_len = reader.read_u64::<LittleEndian>().map_err(truncated)?;
        if header_len > MAX_HEADER_LEN {
            return Err(Error::InvalidGridFile(format!(
                "头长度 {} 超出上限",
                header_len
            )));
        }
        let mut header_bytes = vec![0u8; header_len as usize];
        reader.read_exact(&mut header_bytes).map_err(truncated)?;
        let header: GridHeader = serde_json::from_slice(&header_bytes)?;

        let mut grid = Grid::from_parts(header.shape, header.size, header.transform)
            .map_err(|e| Error::InvalidGridFile(e.to_string()))?;

        let mut decoder = GzDecoder::new(reader);
        for descriptor in header.arrays {
            // 头中的长度必须与网格一致，否则不按它分配内存
            let expected = grid.point_count().checked_mul(descriptor.components);
            if descriptor.components == 0 || expected != Some(descriptor.values) {
                return Err(Error::InvalidGridFile(format!(
                    "数组 '{}' 的长度 {}（{} 分量）与网格节点数 {} 不符",
                    descriptor.name,
                    descriptor.values,
                    descriptor.components,
                    grid.point_count()
                )));
            }
            let values = read_values(&mut decoder, descriptor.values)?;
            let array = CellArray::new(descriptor.components, values).map_err(|_| {
                Error::InvalidGridFile(format!("数组 '{}' 的分量数无效", descriptor.name))
            })?;
            grid.insert_array(&descriptor.name, array)?;
        }

        log::info!(
            "已读取网格 {}: shape {:?}，{} 个数组",
            path.display(),
            grid.shape(),
            grid.array_names().count()
        );
        timer.finish();
        Ok(grid)
    }

    /// 导出为 legacy VTK (ASCII, STRUCTURED_POINTS)，供外部可视化工具查看
    ///
    /// 只写不读。导出的坐标是网格坐标系。
    pub fn export_vtk(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut w = BufWriter::new(File::create(path.as_ref())?);
        let [nx, ny, nz] = self.shape();
        let origin = self.origin();
        let spacing = self.spacing();

        writeln!(w, "# vtk DataFile Version 3.0")?;
        writeln!(w, "mesh-voxelise grid")?;
        writeln!(w, "ASCII")?;
        writeln!(w, "DATASET STRUCTURED_POINTS")?;
        writeln!(w, "DIMENSIONS {} {} {}", nx, ny, nz)?;
        writeln!(w, "ORIGIN {} {} {}", origin.x, origin.y, origin.z)?;
        writeln!(w, "SPACING {} {} {}", spacing.x, spacing.y, spacing.z)?;
        writeln!(w, "POINT_DATA {}", self.point_count())?;

        for (name, array) in self.arrays() {
            let name = name.replace(char::is_whitespace, "_");
            if array.components() == 3 {
                writeln!(w, "VECTORS {} double", name)?;
            } else {
                writeln!(w, "SCALARS {} double {}", name, array.components())?;
                writeln!(w, "LOOKUP_TABLE default")?;
            }
            for chunk in array.values().chunks(array.components()) {
                let line: Vec<String> = chunk.iter().map(|v| v.to_string()).collect();
                writeln!(w, "{}", line.join(" "))?;
            }
        }

        w.flush()?;
        Ok(())
    }
}

/// 分块读取 `count` 个 f64，数据段不足时尽早报错
fn read_values(reader: &mut impl Read, count: usize) -> Result<Vec<f64>> {
    const CHUNK: usize = 1 << 16;
    let mut values = Vec::with_capacity(count.min(CHUNK));
    let mut buf = vec![0f64; count.min(CHUNK)];
    let mut remaining = count;
    while remaining > 0 {
        let n = remaining.min(CHUNK);
        reader
            .read_f64_into::<LittleEndian>(&mut buf[..n])
            .map_err(truncated)?;
        values.extend_from_slice(&buf[..n]);
        remaining -= n;
    }
    Ok(values)
}

fn truncated(e: std::io::Error) -> Error {
    if e.kind() == ErrorKind::UnexpectedEof {
        Error::InvalidGridFile("文件被截断".to_string())
    } else {
        Error::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point3D;
    use crate::mesh::Mesh;
    use crate::test_support::temp_dir;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        temp_dir("grid_file").join(name)
    }

    /// 只写魔数和头，数据段为空
    fn write_header_only(path: &Path, header: &GridHeader) {
        let json = serde_json::to_vec(header).unwrap();
        let mut bytes = MAGIC.to_vec();
        bytes.write_u64::<LittleEndian>(json.len() as u64).unwrap();
        bytes.extend_from_slice(&json);
        let mut encoder = GzEncoder::new(bytes, Compression::default());
        encoder.write_all(&[]).unwrap();
        std::fs::write(path, encoder.finish().unwrap()).unwrap();
    }

    fn descriptor(values: usize, components: usize) -> ArrayDescriptor {
        ArrayDescriptor {
            name: "d".to_string(),
            components,
            values,
        }
    }

    #[test]
    fn load_rejects_inconsistent_header() {
        let path = temp_path("corrupt_header.vgrid");

        // 长度远超节点数时不能按头分配内存
        let header = GridHeader {
            shape: [4, 4, 4],
            size: 1.0,
            transform: None,
            arrays: vec![descriptor(usize::MAX, 1)],
        };
        write_header_only(&path, &header);
        assert!(matches!(Grid::load(&path), Err(Error::InvalidGridFile(_))));

        // 节点数溢出
        let header = GridHeader {
            shape: [1 << 32, 1 << 32, 4],
            size: 1.0,
            transform: None,
            arrays: vec![],
        };
        write_header_only(&path, &header);
        assert!(matches!(Grid::load(&path), Err(Error::InvalidGridFile(_))));

        // 分量数为 0
        let header = GridHeader {
            shape: [2, 2, 2],
            size: 1.0,
            transform: None,
            arrays: vec![descriptor(0, 0)],
        };
        write_header_only(&path, &header);
        assert!(matches!(Grid::load(&path), Err(Error::InvalidGridFile(_))));

        // 头一致但数据段缺失
        let header = GridHeader {
            shape: [2, 2, 2],
            size: 1.0,
            transform: None,
            arrays: vec![descriptor(24, 3)],
        };
        write_header_only(&path, &header);
        assert!(matches!(Grid::load(&path), Err(Error::InvalidGridFile(_))));
    }

    #[test]
    fn save_and_load_preserves_everything() {
        let mut grid = Grid::new(0.5, 4).unwrap();
        let mesh = Mesh::from_points(vec![Point3D::new(1.0, 2.0, 3.0)]);
        grid.set_transform(GridTransform::fit(&mesh, true, 0.01, None).unwrap())
            .unwrap();
        let scalars: Vec<f64> = (0..64).map(|i| i as f64 * 0.5 - 3.0).collect();
        let vectors: Vec<[f64; 3]> = (0..64).map(|i| [i as f64, -(i as f64), 0.25]).collect();
        grid.insert_array("b", CellArray::from_scalars(scalars)).unwrap();
        grid.insert_array("a", CellArray::from_vectors(&vectors)).unwrap();

        let path = temp_path("roundtrip.vgrid");
        grid.save(&path).unwrap();
        let loaded = Grid::load(&path).unwrap();

        assert_eq!(loaded, grid);
        let names: Vec<_> = loaded.array_names().collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn load_missing_file() {
        let path = temp_path("does_not_exist.vgrid");
        assert!(matches!(Grid::load(&path), Err(Error::InputNotFound(_))));
    }

    #[test]
    fn load_rejects_foreign_file() {
        let path = temp_path("foreign.vgrid");
        std::fs::write(&path, b"solid cube\nendsolid\n").unwrap();
        assert!(matches!(Grid::load(&path), Err(Error::InvalidGridFile(_))));

        std::fs::write(&path, b"VXG").unwrap();
        assert!(matches!(Grid::load(&path), Err(Error::InvalidGridFile(_))));
    }

    #[test]
    fn export_vtk_writes_point_data() {
        let mut grid = Grid::new(1.0, 2).unwrap();
        grid.insert_array("d", CellArray::from_vectors(&[[0.0, 1.0, 2.0]; 8]))
            .unwrap();
        let path = temp_path("grid.vtk");
        grid.export_vtk(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("DIMENSIONS 2 2 2"));
        assert!(text.contains("POINT_DATA 8"));
        assert!(text.contains("VECTORS d double"));
        assert_eq!(text.matches("0 1 2").count(), 8);
    }
}
