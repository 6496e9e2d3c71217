//! 锥束CT投影几何
//!
//! 参数化锥束几何、逐角度向量几何，以及与外部投影库描述符之间的无损转换。
//! 坐标顺序为 (z, y, x)，z 为旋转轴；外部描述符使用 (x, y, z)。

pub mod astra;
pub mod error;
pub mod geometry;
pub mod io;
pub mod utils;

pub use astra::{AnyGeometry, AstraProjGeom, from_astra_geometry};
pub use error::{GeometryError, Result};
pub use geometry::{
    Angles, ConeGeometry, ConeVectorGeometry, DetectorShape, DetectorSize, EPSILON,
    ProjectionGeometry, cone,
};
