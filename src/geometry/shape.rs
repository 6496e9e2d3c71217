use crate::error::{Result, invalid};
use std::f64::consts::PI;
use std::fmt;

/// 探测器像素数（行数, 列数）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorShape {
    pub rows: usize,
    pub cols: usize,
}

impl DetectorShape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// 检查两个方向的像素数都为正
    pub fn validate(self) -> Result<Self> {
        if self.rows == 0 || self.cols == 0 {
            return Err(invalid(format!(
                "探测器形状必须为正，得到 ({}, {})",
                self.rows, self.cols
            )));
        }
        Ok(self)
    }

    pub fn as_f64(self) -> (f64, f64) {
        (self.rows as f64, self.cols as f64)
    }
}

impl From<usize> for DetectorShape {
    fn from(n: usize) -> Self {
        Self::new(n, n)
    }
}

impl From<(usize, usize)> for DetectorShape {
    fn from((rows, cols): (usize, usize)) -> Self {
        Self::new(rows, cols)
    }
}

impl From<[usize; 2]> for DetectorShape {
    fn from([rows, cols]: [usize; 2]) -> Self {
        Self::new(rows, cols)
    }
}

impl fmt::Display for DetectorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.rows, self.cols)
    }
}

/// 探测器物理尺寸（高, 宽）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorSize {
    pub height: f64,
    pub width: f64,
}

impl DetectorSize {
    pub fn new(height: f64, width: f64) -> Self {
        Self { height, width }
    }

    pub fn validate(self) -> Result<Self> {
        let ok = |x: f64| x.is_finite() && x > 0.0;
        if !ok(self.height) || !ok(self.width) {
            return Err(invalid(format!(
                "探测器尺寸必须为有限正数，得到 ({}, {})",
                self.height, self.width
            )));
        }
        Ok(self)
    }

    /// 像素间距 = 尺寸 / 形状，返回 (行方向, 列方向)
    pub fn pixel_spacing(self, shape: DetectorShape) -> (f64, f64) {
        let (rows, cols) = shape.as_f64();
        (self.height / rows, self.width / cols)
    }
}

impl From<f64> for DetectorSize {
    fn from(s: f64) -> Self {
        Self::new(s, s)
    }
}

impl From<(f64, f64)> for DetectorSize {
    fn from((height, width): (f64, f64)) -> Self {
        Self::new(height, width)
    }
}

impl From<[f64; 2]> for DetectorSize {
    fn from([height, width]: [f64; 2]) -> Self {
        Self::new(height, width)
    }
}

impl fmt::Display for DetectorSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.height, self.width)
    }
}

/// 投影角度：给定个数时在 [0, 2π) 上均匀分布，或者直接给出角度数组（弧度）
#[derive(Debug, Clone, PartialEq)]
pub enum Angles {
    Count(usize),
    Values(Vec<f64>),
}

impl Angles {
    /// 展开为具体的角度数组，并检查数量与数值
    pub fn resolve(&self) -> Result<Vec<f64>> {
        let angles = match self {
            Angles::Count(n) => {
                let step = 2.0 * PI / *n as f64;
                (0..*n).map(|i| i as f64 * step).collect::<Vec<_>>()
            }
            Angles::Values(values) => values.clone(),
        };
        if angles.is_empty() {
            return Err(invalid("投影角度数必须大于0"));
        }
        if let Some(bad) = angles.iter().find(|a| !a.is_finite()) {
            return Err(invalid(format!("投影角度必须为有限值，得到 {}", bad)));
        }
        Ok(angles)
    }
}

impl Default for Angles {
    fn default() -> Self {
        Angles::Count(1)
    }
}

impl From<usize> for Angles {
    fn from(n: usize) -> Self {
        Angles::Count(n)
    }
}

impl From<Vec<f64>> for Angles {
    fn from(values: Vec<f64>) -> Self {
        Angles::Values(values)
    }
}

impl From<&[f64]> for Angles {
    fn from(values: &[f64]) -> Self {
        Angles::Values(values.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_shape_is_square() {
        assert_eq!(DetectorShape::from(7_usize), DetectorShape::new(7, 7));
        assert!(DetectorShape::from(0_usize).validate().is_err());
        assert!(DetectorShape::from((3_usize, 0_usize)).validate().is_err());
    }

    #[test]
    fn count_expands_without_endpoint() {
        let angles = Angles::Count(4).resolve().unwrap();
        assert_eq!(angles.len(), 4);
        assert!((angles[1] - PI / 2.0).abs() < 1e-12);
        assert!((angles[3] - 1.5 * PI).abs() < 1e-12);
    }

    #[test]
    fn empty_angles_rejected() {
        assert!(Angles::Count(0).resolve().is_err());
        assert!(Angles::Values(vec![]).resolve().is_err());
        assert!(Angles::Values(vec![0.0, f64::NAN]).resolve().is_err());
    }

    #[test]
    fn spacing_is_size_over_shape() {
        let size = DetectorSize::new(30.0, 80.0);
        let (sv, su) = size.pixel_spacing(DetectorShape::new(10, 40));
        assert_eq!((sv, su), (3.0, 2.0));
        assert!(DetectorSize::new(-1.0, 1.0).validate().is_err());
    }
}
