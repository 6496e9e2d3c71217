use crate::astra::{AnyGeometry, ConeVecDescriptor};
use crate::geometry::{
    Angles, ConeGeometry, ConeVectorGeometry, DetectorShape, DetectorSize, ProjectionGeometry,
};
use log::info;
use nalgebra::Vector3;

/// 几何类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeometryType {
    #[default]
    Cone,
    ConeVec,
}

impl GeometryType {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "cone" => Ok(GeometryType::Cone),
            "cone_vec" => Ok(GeometryType::ConeVec),
            _ => Err(format!("未知的几何类型: {}", s)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GeometryType::Cone => "cone",
            GeometryType::ConeVec => "cone_vec",
        }
    }
}

/// 🔥 **纯数据结构** - 所有可通过TOML配置的几何参数
#[derive(Debug, Clone)]
pub struct GeometrySettings {
    // ===== 🔥 **几何定义** =====
    /// 几何类型："cone" 或 "cone_vec"
    pub geometry_type: GeometryType,
    /// 投影角度（个数或弧度数组）
    pub angles: Angles,
    /// 探测器物理尺寸（高, 宽）
    pub size: DetectorSize,
    /// 探测器像素数（行, 列）
    pub shape: DetectorShape,
    /// 原点到光源的距离
    pub source_distance: f64,
    /// 原点到探测器的距离
    pub detector_distance: f64,
    /// cone_vec 的逐角度向量，外部库布局 (x, y, z)
    pub vectors: Vec<[f64; 12]>,

    // ===== 🔥 **输出设置** =====
    /// 转换为向量几何后再输出
    pub to_vector: bool,
    /// 导出描述符的路径（.json 为JSON，其余为TOML）
    pub export: Option<String>,
    /// 要投影的点，格式为"z,y,x"
    pub points: Vec<String>,
}

impl Default for GeometrySettings {
    fn default() -> Self {
        Self {
            geometry_type: GeometryType::Cone,
            angles: Angles::Count(1),
            size: DetectorSize::from(std::f64::consts::SQRT_2),
            shape: DetectorShape::new(1, 1),
            source_distance: 2.0 * std::f64::consts::SQRT_2,
            detector_distance: 0.0,
            vectors: Vec::new(),
            to_vector: false,
            export: None,
            points: Vec::new(),
        }
    }
}

impl GeometrySettings {
    /// 按配置构造几何
    pub fn build_geometry(&self) -> Result<AnyGeometry, String> {
        let geometry = match self.geometry_type {
            GeometryType::Cone => ConeGeometry::new(
                self.angles.clone(),
                self.size,
                self.shape,
                self.detector_distance,
                self.source_distance,
            )
            .map(AnyGeometry::Cone),
            GeometryType::ConeVec => ConeVectorGeometry::from_astra(&ConeVecDescriptor {
                detector_row_count: self.shape.rows,
                detector_col_count: self.shape.cols,
                vectors: self.vectors.clone(),
            })
            .map(AnyGeometry::ConeVec),
        }
        .map_err(|e| format!("构造几何失败: {}", e))?;

        if self.to_vector {
            let vector = geometry
                .as_projection()
                .to_vector()
                .map_err(|e| format!("转换为向量几何失败: {}", e))?;
            info!("已转换为向量几何，共 {} 个角度", vector.num_angles());
            return Ok(AnyGeometry::ConeVec(vector));
        }
        Ok(geometry)
    }

    /// 解析所有待投影点
    pub fn parse_points(&self) -> Result<Vec<Vector3<f64>>, String> {
        self.points
            .iter()
            .map(|p| parse_vec3(p).map_err(|e| format!("无效的投影点 '{}': {}", p, e)))
            .collect()
    }
}

/// 辅助函数用于解析逗号分隔的浮点数
pub fn parse_vec3(s: &str) -> Result<Vector3<f64>, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err("需要3个逗号分隔的值".to_string());
    }
    let mut xyz = [0.0; 3];
    for (slot, part) in xyz.iter_mut().zip(&parts) {
        *slot = part
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("无效数字 '{}': {}", part, e))?;
    }
    Ok(Vector3::from(xyz))
}
