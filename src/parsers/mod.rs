mod obj;
mod stl;
mod vtk;
mod xyz;

pub use obj::ObjFormat;
pub use stl::StlFormat;
pub use vtk::VtkFormat;
pub use xyz::XyzFormat;

/// 获取所有可用的网格格式
pub fn get_all_formats() -> Vec<Box<dyn crate::utils::parser::MeshFormat>> {
    vec![
        Box::new(StlFormat::new()),
        Box::new(XyzFormat::new()),
        Box::new(ObjFormat::new()),
        Box::new(VtkFormat::new()),
    ]
}
