use crate::astra::{AstraProjGeom, ConeDescriptor};
use crate::error::{Result, invalid};
use crate::geometry::cone_vec::ConeVectorGeometry;
use crate::geometry::shape::{Angles, DetectorShape, DetectorSize};
use crate::geometry::{ProjectionGeometry, approx_eq};
use log::debug;
use std::fmt;

/// 参数化的锥束几何：所有角度共享同一组距离和探测器参数，
/// 光源与探测器绕 z 轴旋转
#[derive(Debug, Clone)]
pub struct ConeGeometry {
    angles: Vec<f64>,
    size: DetectorSize,
    shape: DetectorShape,
    detector_distance: f64,
    source_distance: f64,
}

impl ConeGeometry {
    pub fn new(
        angles: impl Into<Angles>,
        size: impl Into<DetectorSize>,
        shape: impl Into<DetectorShape>,
        detector_distance: f64,
        source_distance: f64,
    ) -> Result<Self> {
        let angles = angles.into().resolve()?;
        let size = size.into().validate()?;
        let shape = shape.into().validate()?;

        if !detector_distance.is_finite() {
            return Err(invalid(format!(
                "探测器距离必须为有限值，得到 {}",
                detector_distance
            )));
        }
        if !(source_distance.is_finite() && source_distance > 0.0) {
            return Err(invalid(format!(
                "光源距离必须为有限正数，得到 {}",
                source_distance
            )));
        }

        Ok(Self {
            angles,
            size,
            shape,
            detector_distance,
            source_distance,
        })
    }

    /// 由外部描述符还原
    pub fn from_astra(desc: &ConeDescriptor) -> Result<Self> {
        let shape = DetectorShape::new(desc.detector_row_count, desc.detector_col_count).validate()?;
        let (rows, cols) = shape.as_f64();
        let size = DetectorSize::new(
            desc.detector_spacing_y * rows,
            desc.detector_spacing_x * cols,
        );
        Self::new(
            desc.projection_angles.clone(),
            size,
            shape,
            desc.distance_origin_detector,
            desc.distance_origin_source,
        )
    }

    pub fn angles(&self) -> &[f64] {
        &self.angles
    }

    pub fn size(&self) -> DetectorSize {
        self.size
    }

    pub fn detector_distance(&self) -> f64 {
        self.detector_distance
    }

    pub fn source_distance(&self) -> f64 {
        self.source_distance
    }

    /// 改变像素数，保持物理尺寸不变（像素间距随之改变）
    pub fn reshape(&self, shape: impl Into<DetectorShape>) -> Result<Self> {
        let shape = shape.into().validate()?;
        debug!("锥束几何重设探测器形状: {} -> {}", self.shape, shape);
        Ok(Self {
            shape,
            ..self.clone()
        })
    }

    /// 替换投影角度
    pub fn with_angles(&self, angles: impl Into<Angles>) -> Result<Self> {
        let angles = angles.into().resolve()?;
        Ok(Self {
            angles,
            ..self.clone()
        })
    }
}

impl ProjectionGeometry for ConeGeometry {
    fn shape(&self) -> DetectorShape {
        self.shape
    }

    fn num_angles(&self) -> usize {
        self.angles.len()
    }

    fn to_astra(&self) -> AstraProjGeom {
        let (spacing_y, spacing_x) = self.size.pixel_spacing(self.shape);
        AstraProjGeom::Cone(ConeDescriptor {
            detector_spacing_x: spacing_x,
            detector_spacing_y: spacing_y,
            detector_row_count: self.shape.rows,
            detector_col_count: self.shape.cols,
            projection_angles: self.angles.clone(),
            distance_origin_source: self.source_distance,
            distance_origin_detector: self.detector_distance,
        })
    }

    fn to_vector(&self) -> Result<ConeVectorGeometry> {
        match self.to_astra().to_vec() {
            AstraProjGeom::ConeVec(desc) => ConeVectorGeometry::from_astra(&desc),
            AstraProjGeom::Cone(_) => Err(invalid("向量化转换没有产生 cone_vec 描述符")),
        }
    }
}

impl PartialEq for ConeGeometry {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape
            && self.angles.len() == other.angles.len()
            && self
                .angles
                .iter()
                .zip(&other.angles)
                .all(|(a, b)| approx_eq(*a, *b))
            && approx_eq(self.size.height, other.size.height)
            && approx_eq(self.size.width, other.size.width)
            && approx_eq(self.detector_distance, other.detector_distance)
            && approx_eq(self.source_distance, other.source_distance)
    }
}

impl fmt::Display for ConeGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ConeGeometry(")?;
        writeln!(f, "    angles={} 个,", self.angles.len())?;
        writeln!(f, "    size={},", self.size)?;
        writeln!(f, "    shape={},", self.shape)?;
        writeln!(f, "    detector_distance={},", self.detector_distance)?;
        writeln!(f, "    source_distance={}", self.source_distance)?;
        write!(f, ")")
    }
}

/// 锥束几何构造器，各参数带默认值
#[derive(Debug, Clone)]
pub struct ConeBuilder {
    angles: Angles,
    size: DetectorSize,
    shape: DetectorShape,
    detector_distance: f64,
    source_distance: f64,
}

impl Default for ConeBuilder {
    fn default() -> Self {
        Self {
            angles: Angles::Count(1),
            size: DetectorSize::from(std::f64::consts::SQRT_2),
            shape: DetectorShape::new(1, 1),
            detector_distance: 0.0,
            source_distance: 2.0 * std::f64::consts::SQRT_2,
        }
    }
}

impl ConeBuilder {
    pub fn angles(mut self, angles: impl Into<Angles>) -> Self {
        self.angles = angles.into();
        self
    }

    pub fn size(mut self, size: impl Into<DetectorSize>) -> Self {
        self.size = size.into();
        self
    }

    pub fn shape(mut self, shape: impl Into<DetectorShape>) -> Self {
        self.shape = shape.into();
        self
    }

    pub fn detector_distance(mut self, distance: f64) -> Self {
        self.detector_distance = distance;
        self
    }

    pub fn source_distance(mut self, distance: f64) -> Self {
        self.source_distance = distance;
        self
    }

    pub fn build(self) -> Result<ConeGeometry> {
        ConeGeometry::new(
            self.angles,
            self.size,
            self.shape,
            self.detector_distance,
            self.source_distance,
        )
    }
}

/// 以默认参数开始构造锥束几何
pub fn cone() -> ConeBuilder {
    ConeBuilder::default()
}
