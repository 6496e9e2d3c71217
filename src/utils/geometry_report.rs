use crate::astra::AnyGeometry;
use crate::geometry::{ConeVectorGeometry, ProjectionGeometry};
use nalgebra::{Vector2, Vector3};

/// 几何的一行摘要，用于日志
pub fn summary(geometry: &AnyGeometry) -> String {
    let g = geometry.as_projection();
    let kind = g.to_astra().type_name();
    format!(
        "{} 几何: {} 个角度, 探测器 {}",
        kind,
        g.num_angles(),
        g.shape()
    )
}

/// 向量几何的逐角度明细：探测器尺寸与光源位置
pub fn detector_table(geometry: &ConeVectorGeometry) -> String {
    let sizes = geometry.get_size();
    let sources = geometry.get_source_positions();
    let mut out = String::from("角度 | 探测器尺寸 (高, 宽) | 光源 (z, y, x)\n");
    for (i, (size, src)) in sizes.iter().zip(&sources).enumerate() {
        out.push_str(&format!(
            "{:>4} | {} | ({:.4}, {:.4}, {:.4})\n",
            i, size, src.x, src.y, src.z
        ));
    }
    out
}

/// 投影结果表格
pub fn projection_table(point: &Vector3<f64>, projected: &[Vector2<f64>]) -> String {
    let mut out = format!("点 ({}, {}, {}) 的投影 (v, u):\n", point.x, point.y, point.z);
    for (i, p) in projected.iter().enumerate() {
        out.push_str(&format!("{:>4} | ({:.6}, {:.6})\n", i, p.x, p.y));
    }
    out
}
