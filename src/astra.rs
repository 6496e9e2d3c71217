//! 外部投影库的几何描述符
//!
//! 字段名与外部库的字典键一致（`DetectorRowCount` 等），坐标顺序为 (x, y, z)。

use crate::error::{Result, invalid};
use crate::geometry::cone::ConeGeometry;
use crate::geometry::cone_vec::ConeVectorGeometry;
use crate::geometry::transform::{TransformFactory, rotate_all};
use crate::geometry::{DetectorShape, ProjectionGeometry};
use log::debug;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 参数化锥束描述符
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConeDescriptor {
    pub detector_spacing_x: f64,
    pub detector_spacing_y: f64,
    pub detector_row_count: usize,
    pub detector_col_count: usize,
    pub projection_angles: Vec<f64>,
    pub distance_origin_source: f64,
    pub distance_origin_detector: f64,
}

/// 向量锥束描述符，每行12个数：光源、探测器中心、u、v
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConeVecDescriptor {
    pub detector_row_count: usize,
    pub detector_col_count: usize,
    pub vectors: Vec<[f64; 12]>,
}

/// 外部库的投影几何字典，按 `type` 区分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AstraProjGeom {
    #[serde(rename = "cone")]
    Cone(ConeDescriptor),
    #[serde(rename = "cone_vec")]
    ConeVec(ConeVecDescriptor),
}

impl AstraProjGeom {
    pub fn type_name(&self) -> &'static str {
        match self {
            AstraProjGeom::Cone(_) => "cone",
            AstraProjGeom::ConeVec(_) => "cone_vec",
        }
    }

    pub fn shape(&self) -> DetectorShape {
        match self {
            AstraProjGeom::Cone(d) => DetectorShape::new(d.detector_row_count, d.detector_col_count),
            AstraProjGeom::ConeVec(d) => {
                DetectorShape::new(d.detector_row_count, d.detector_col_count)
            }
        }
    }

    /// 参数描述符展开为逐角度向量描述符；已经是向量形式时原样返回
    pub fn to_vec(&self) -> AstraProjGeom {
        let AstraProjGeom::Cone(d) = self else {
            return self.clone();
        };

        // θ = 0 时光源位于 −y，探测器位于 +y，u 沿 x，v 沿 z
        let base = [
            Vector3::new(0.0, -d.distance_origin_source, 0.0),
            Vector3::new(0.0, d.distance_origin_detector, 0.0),
            Vector3::new(d.detector_spacing_x, 0.0, 0.0),
        ];
        let v = Vector3::new(0.0, 0.0, d.detector_spacing_y);

        let vectors = d
            .projection_angles
            .iter()
            .map(|&angle| {
                let rotated = rotate_all(&base, &TransformFactory::rotation_z(angle));
                let mut row = [0.0; 12];
                for (k, part) in rotated.iter().chain(std::iter::once(&v)).enumerate() {
                    row[3 * k..3 * k + 3].copy_from_slice(part.as_slice());
                }
                row
            })
            .collect::<Vec<_>>();

        debug!("cone 描述符展开为 {} 行 cone_vec 向量", vectors.len());
        AstraProjGeom::ConeVec(ConeVecDescriptor {
            detector_row_count: d.detector_row_count,
            detector_col_count: d.detector_col_count,
            vectors,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| invalid(format!("序列化JSON失败: {}", e)))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| invalid(format!("解析JSON描述符失败: {}", e)))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| invalid(format!("序列化TOML失败: {}", e)))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| invalid(format!("解析TOML描述符失败: {}", e)))
    }
}

/// 从描述符还原出的任意投影几何
#[derive(Debug, Clone, PartialEq)]
pub enum AnyGeometry {
    Cone(ConeGeometry),
    ConeVec(ConeVectorGeometry),
}

impl AnyGeometry {
    pub fn as_projection(&self) -> &dyn ProjectionGeometry {
        match self {
            AnyGeometry::Cone(g) => g,
            AnyGeometry::ConeVec(g) => g,
        }
    }
}

impl fmt::Display for AnyGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyGeometry::Cone(g) => fmt::Display::fmt(g, f),
            AnyGeometry::ConeVec(g) => fmt::Display::fmt(g, f),
        }
    }
}

/// 按描述符类型还原几何
pub fn from_astra_geometry(geom: &AstraProjGeom) -> Result<AnyGeometry> {
    match geom {
        AstraProjGeom::Cone(d) => ConeGeometry::from_astra(d).map(AnyGeometry::Cone),
        AstraProjGeom::ConeVec(d) => ConeVectorGeometry::from_astra(d).map(AnyGeometry::ConeVec),
    }
}
