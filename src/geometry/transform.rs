use nalgebra::{Matrix3, Rotation3, Unit, Vector3};

/// 变换矩阵工厂，提供几何转换需要的旋转矩阵
pub struct TransformFactory;

impl TransformFactory {
    /// 创建绕任意轴旋转的变换矩阵
    pub fn rotation(axis: &Vector3<f64>, angle_rad: f64) -> Matrix3<f64> {
        let axis_unit = Unit::new_normalize(*axis);
        Rotation3::from_axis_angle(&axis_unit, angle_rad).into_inner()
    }

    /// 创建绕Z轴（xyz顺序下的旋转轴）旋转的变换矩阵
    pub fn rotation_z(angle_rad: f64) -> Matrix3<f64> {
        Self::rotation(&Vector3::z(), angle_rad)
    }
}

/// (z, y, x) <-> (x, y, z)，两个方向是同一个操作
pub fn reverse_axes(v: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(v.z, v.y, v.x)
}

/// 对一组向量统一做坐标旋转
pub fn rotate_all(vectors: &[Vector3<f64>], rotation: &Matrix3<f64>) -> Vec<Vector3<f64>> {
    vectors.iter().map(|v| rotation * v).collect()
}
