// geometry/mod.rs
// 导出投影几何相关模块
pub mod cone;
pub mod cone_vec;
pub mod shape;
pub mod transform;
pub mod vectors;

use crate::astra::AstraProjGeom;
use crate::error::Result;
use nalgebra::Vector3;

pub use cone::{ConeBuilder, ConeGeometry, cone};
pub use cone_vec::ConeVectorGeometry;
pub use shape::{Angles, DetectorShape, DetectorSize};

/// 几何比较使用的容差
pub const EPSILON: f64 = 1e-8;

/// 带容差的标量比较，数值较大时按相对误差比较
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON * (1.0 + a.abs().max(b.abs()))
}

pub fn approx_eq_vec(a: &Vector3<f64>, b: &Vector3<f64>) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| approx_eq(*x, *y))
}

/// 投影几何的公共接口
pub trait ProjectionGeometry {
    /// 探测器像素数
    fn shape(&self) -> DetectorShape;

    /// 投影角度数
    fn num_angles(&self) -> usize;

    /// 转换为外部投影库的描述符
    fn to_astra(&self) -> AstraProjGeom;

    /// 转换为逐角度的向量几何
    fn to_vector(&self) -> Result<ConeVectorGeometry>;
}
