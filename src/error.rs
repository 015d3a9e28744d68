use std::path::PathBuf;

/// 体素化与形变流程中的所有错误
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 引用的网格/网格文件/位移文件不存在
    #[error("文件不存在: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("网格中不存在数组 '{name}'")]
    ArrayNotFound { name: String },

    /// 磁盘上的网格文件已包含同名数组，拒绝静默覆盖
    #[error("网格文件 {} 已包含数组 '{name}'，请先删除旧文件", .path.display())]
    WriteConflict { path: PathBuf, name: String },

    #[error("网格没有存储变换（该网格未经过体素化）")]
    MissingTransform,

    /// 网格的变换只能设置一次；非复用的体素化不能作用于已有变换的网格
    #[error("网格已存储变换，请使用 reuse_transform 或写入新的网格")]
    TransformAlreadySet,

    #[error("数据量不匹配: 网格需要 {expected} 个元素，但提供了 {got} 个")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("数组 '{name}' 分量数不匹配: 需要 {expected}，实际 {got}")]
    ComponentMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("无效的网格参数: {0}")]
    InvalidGrid(String),

    #[error("无效的体素化参数: {0}")]
    InvalidOption(String),

    #[error("输入网格没有顶点")]
    EmptyMesh,

    #[error("不支持的文件格式: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("{format} 不支持{operation}")]
    UnsupportedOperation {
        format: &'static str,
        operation: &'static str,
    },

    #[error("解析失败: {0}")]
    Parse(String),

    #[error("无效的网格文件: {0}")]
    InvalidGridFile(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
