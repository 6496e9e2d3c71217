use thiserror::Error;

/// 几何构造与转换中唯一的错误类型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// 参数非法（形状不匹配、角度数为零等）
    #[error("无效参数: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, GeometryError>;

/// 构造 InvalidArgument 的便捷函数
pub(crate) fn invalid(message: impl Into<String>) -> GeometryError {
    GeometryError::InvalidArgument(message.into())
}
