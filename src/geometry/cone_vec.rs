use crate::astra::{AstraProjGeom, ConeVecDescriptor};
use crate::error::{Result, invalid};
use crate::geometry::shape::{DetectorShape, DetectorSize};
use crate::geometry::transform::reverse_axes;
use crate::geometry::vectors::{check_finite_rows, check_same_rows, check_vectors};
use crate::geometry::{ProjectionGeometry, approx_eq_vec};
use log::debug;
use nalgebra::{DMatrix, Matrix2, Vector2, Vector3};
use rayon::prelude::*;
use std::fmt;

/// 光线与探测器平面近乎平行时的判定阈值（相对于 |n|·|d|，与单位无关）
const PARALLEL_EPS: f64 = 1e-12;

/// 逐角度的锥束向量几何
///
/// 每个角度包含四个三维向量，坐标顺序为 (z, y, x)：
/// - 光源位置
/// - 探测器中心
/// - 探测器行方向 `v`（相邻两行像素之间的位移）
/// - 探测器列方向 `u`（相邻两列像素之间的位移）
///
/// 构造后不可变，`reshape` / `take_angles` 返回新的实例。
#[derive(Debug, Clone)]
pub struct ConeVectorGeometry {
    shape: DetectorShape,
    source_positions: Vec<Vector3<f64>>,
    detector_positions: Vec<Vector3<f64>>,
    detector_vs: Vec<Vector3<f64>>,
    detector_us: Vec<Vector3<f64>>,
}

impl ConeVectorGeometry {
    /// 由四个 N×3 矩阵构造，列数必须为3、行数一致且为正
    pub fn new(
        shape: impl Into<DetectorShape>,
        source_positions: &DMatrix<f64>,
        detector_positions: &DMatrix<f64>,
        detector_vs: &DMatrix<f64>,
        detector_us: &DMatrix<f64>,
    ) -> Result<Self> {
        Self::from_rows(
            shape,
            check_vectors("source_positions", source_positions)?,
            check_vectors("detector_positions", detector_positions)?,
            check_vectors("detector_vs", detector_vs)?,
            check_vectors("detector_us", detector_us)?,
        )
    }

    /// 由逐行向量构造
    pub fn from_rows(
        shape: impl Into<DetectorShape>,
        source_positions: Vec<Vector3<f64>>,
        detector_positions: Vec<Vector3<f64>>,
        detector_vs: Vec<Vector3<f64>>,
        detector_us: Vec<Vector3<f64>>,
    ) -> Result<Self> {
        let shape = shape.into().validate()?;
        let rows = check_same_rows(&[
            ("source_positions", source_positions.len()),
            ("detector_positions", detector_positions.len()),
            ("detector_vs", detector_vs.len()),
            ("detector_us", detector_us.len()),
        ])?;
        if rows == 0 {
            return Err(invalid("投影角度数必须大于0"));
        }
        check_finite_rows("source_positions", &source_positions)?;
        check_finite_rows("detector_positions", &detector_positions)?;
        check_finite_rows("detector_vs", &detector_vs)?;
        check_finite_rows("detector_us", &detector_us)?;

        Ok(Self {
            shape,
            source_positions,
            detector_positions,
            detector_vs,
            detector_us,
        })
    }

    /// 由外部 cone_vec 描述符还原，轴顺序 (x, y, z) -> (z, y, x)
    pub fn from_astra(desc: &ConeVecDescriptor) -> Result<Self> {
        let row = |r: &[f64; 12], k: usize| reverse_axes(&Vector3::new(r[k], r[k + 1], r[k + 2]));

        let source_positions = desc.vectors.iter().map(|r| row(r, 0)).collect();
        let detector_positions = desc.vectors.iter().map(|r| row(r, 3)).collect();
        let detector_us = desc.vectors.iter().map(|r| row(r, 6)).collect();
        let detector_vs = desc.vectors.iter().map(|r| row(r, 9)).collect();

        Self::from_rows(
            DetectorShape::new(desc.detector_row_count, desc.detector_col_count),
            source_positions,
            detector_positions,
            detector_vs,
            detector_us,
        )
    }

    pub fn source_positions(&self) -> &[Vector3<f64>] {
        &self.source_positions
    }

    pub fn detector_positions(&self) -> &[Vector3<f64>] {
        &self.detector_positions
    }

    pub fn detector_vs(&self) -> &[Vector3<f64>] {
        &self.detector_vs
    }

    pub fn detector_us(&self) -> &[Vector3<f64>] {
        &self.detector_us
    }

    /// 光源位置的拷贝，N×3
    pub fn get_source_positions(&self) -> Vec<Vector3<f64>> {
        self.source_positions.clone()
    }

    /// 每个角度下探测器的物理尺寸：(|v|·行数, |u|·列数)
    pub fn get_size(&self) -> Vec<DetectorSize> {
        let (rows, cols) = self.shape.as_f64();
        self.detector_vs
            .iter()
            .zip(&self.detector_us)
            .map(|(v, u)| DetectorSize::new(v.norm() * rows, u.norm() * cols))
            .collect()
    }

    /// 探测器四个角点，结果为 4 × 角度数 × 3
    ///
    /// 顺序：c−v−u, c−v+u, c+v+u, c+v−u
    pub fn get_corners(&self) -> [Vec<Vector3<f64>>; 4] {
        let (rows, cols) = self.shape.as_f64();
        let half = |i: usize| {
            (
                self.detector_vs[i] * rows / 2.0,
                self.detector_us[i] * cols / 2.0,
            )
        };
        let corner = |sv: f64, su: f64| {
            (0..self.num_angles())
                .map(|i| {
                    let (v, u) = half(i);
                    self.detector_positions[i] + v * sv + u * su
                })
                .collect::<Vec<_>>()
        };
        [
            corner(-1.0, -1.0),
            corner(-1.0, 1.0),
            corner(1.0, 1.0),
            corner(1.0, -1.0),
        ]
    }

    /// 把一个三维点投影到每个角度的探测器上
    ///
    /// 返回每个角度的 (v, u) 坐标，以像素为单位、以探测器中心为原点。
    pub fn project_point(&self, point: &Vector3<f64>) -> Result<Vec<Vector2<f64>>> {
        (0..self.num_angles())
            .map(|i| self.project_on_angle(i, point))
            .collect()
    }

    /// 批量投影，按点并行，结果顺序与输入一致
    pub fn project_points(&self, points: &[Vector3<f64>]) -> Result<Vec<Vec<Vector2<f64>>>> {
        debug!(
            "投影 {} 个点到 {} 个角度",
            points.len(),
            self.num_angles()
        );
        points
            .par_iter()
            .map(|p| self.project_point(p))
            .collect()
    }

    fn project_on_angle(&self, i: usize, point: &Vector3<f64>) -> Result<Vector2<f64>> {
        let src = self.source_positions[i];
        let det = self.detector_positions[i];
        let v = self.detector_vs[i];
        let u = self.detector_us[i];

        // 光线 src + t·(point − src) 与探测器平面求交
        let normal = v.cross(&u);
        let direction = point - src;
        if direction.norm() == 0.0 {
            return Err(invalid(format!(
                "第 {} 个角度下投影点与光源重合，无法投影",
                i
            )));
        }
        let denom = normal.dot(&direction);
        if denom.abs() <= PARALLEL_EPS * normal.norm() * direction.norm() {
            return Err(invalid(format!(
                "第 {} 个角度下光线与探测器平面平行，无法投影",
                i
            )));
        }
        let t = normal.dot(&(det - src)) / denom;
        let offset = src + direction * t - det;

        // 在 (v, u) 基下求解 2×2 线性方程组
        let gram = Matrix2::new(v.dot(&v), v.dot(&u), u.dot(&v), u.dot(&u));
        let rhs = Vector2::new(v.dot(&offset), u.dot(&offset));
        gram.lu()
            .solve(&rhs)
            .ok_or_else(|| invalid(format!("第 {} 个角度的探测器基向量退化", i)))
    }

    /// 更换像素数，像素向量不变，因此物理尺寸按比例变化
    pub fn reshape(&self, shape: impl Into<DetectorShape>) -> Result<Self> {
        let shape = shape.into().validate()?;
        debug!("向量几何重设探测器形状: {} -> {}", self.shape, shape);
        Ok(Self {
            shape,
            ..self.clone()
        })
    }

    /// 按索引选取（或重排）角度，得到新的几何
    pub fn take_angles(&self, indices: &[usize]) -> Result<Self> {
        if indices.is_empty() {
            return Err(invalid("至少需要选取一个角度"));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.num_angles()) {
            return Err(invalid(format!(
                "角度索引 {} 超出范围 (共 {} 个角度)",
                bad,
                self.num_angles()
            )));
        }
        let pick = |src: &[Vector3<f64>]| indices.iter().map(|&i| src[i]).collect::<Vec<_>>();
        Self::from_rows(
            self.shape,
            pick(&self.source_positions),
            pick(&self.detector_positions),
            pick(&self.detector_vs),
            pick(&self.detector_us),
        )
    }
}

impl ProjectionGeometry for ConeVectorGeometry {
    fn shape(&self) -> DetectorShape {
        self.shape
    }

    fn num_angles(&self) -> usize {
        self.source_positions.len()
    }

    fn to_astra(&self) -> AstraProjGeom {
        let vectors = (0..self.num_angles())
            .map(|i| {
                let mut row = [0.0; 12];
                let parts = [
                    self.source_positions[i],
                    self.detector_positions[i],
                    self.detector_us[i],
                    self.detector_vs[i],
                ];
                for (k, part) in parts.iter().enumerate() {
                    let xyz = reverse_axes(part);
                    row[3 * k..3 * k + 3].copy_from_slice(xyz.as_slice());
                }
                row
            })
            .collect();

        AstraProjGeom::ConeVec(ConeVecDescriptor {
            detector_row_count: self.shape.rows,
            detector_col_count: self.shape.cols,
            vectors,
        })
    }

    fn to_vector(&self) -> Result<ConeVectorGeometry> {
        Ok(self.clone())
    }
}

impl PartialEq for ConeVectorGeometry {
    fn eq(&self, other: &Self) -> bool {
        let same = |a: &[Vector3<f64>], b: &[Vector3<f64>]| {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| approx_eq_vec(x, y))
        };
        self.shape == other.shape
            && same(&self.source_positions, &other.source_positions)
            && same(&self.detector_positions, &other.detector_positions)
            && same(&self.detector_vs, &other.detector_vs)
            && same(&self.detector_us, &other.detector_us)
    }
}

impl fmt::Display for ConeVectorGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt_rows = |rows: &[Vector3<f64>]| {
            rows.iter()
                .map(|r| format!("[{:.4}, {:.4}, {:.4}]", r.x, r.y, r.z))
                .collect::<Vec<_>>()
                .join(", ")
        };
        writeln!(f, "ConeVectorGeometry(")?;
        writeln!(f, "    shape={},", self.shape)?;
        writeln!(f, "    source_positions=[{}],", fmt_rows(&self.source_positions))?;
        writeln!(f, "    detector_positions=[{}],", fmt_rows(&self.detector_positions))?;
        writeln!(f, "    detector_vs=[{}],", fmt_rows(&self.detector_vs))?;
        writeln!(f, "    detector_us=[{}]", fmt_rows(&self.detector_us))?;
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::cone;
    use crate::geometry::vectors::reshape_rows;

    fn arange(n: usize, cols: usize) -> DMatrix<f64> {
        DMatrix::from_row_slice(n, cols, &(0..n * cols).map(|x| x as f64).collect::<Vec<_>>())
    }

    #[test]
    fn construction_validates_shapes() {
        let vectors = arange(10, 3);
        let pg = ConeVectorGeometry::new(1_usize, &vectors, &vectors, &vectors, &vectors).unwrap();
        assert_eq!(pg.num_angles(), 10);
        assert!(!pg.to_string().is_empty());

        assert!(ConeVectorGeometry::new(0_usize, &vectors, &vectors, &vectors, &vectors).is_err());

        let vecs = arange(10, 2);
        assert!(ConeVectorGeometry::new(1_usize, &vecs, &vecs, &vecs, &vecs).is_err());
        assert!(ConeVectorGeometry::new(1_usize, &vectors, &vectors, &vectors, &vecs).is_err());

        let short = arange(4, 3);
        assert!(ConeVectorGeometry::new(1_usize, &vectors, &short, &vectors, &vectors).is_err());
        let empty = DMatrix::<f64>::zeros(0, 3);
        assert!(ConeVectorGeometry::new(1_usize, &empty, &empty, &empty, &empty).is_err());
    }

    #[test]
    fn flat_vectors_reduce_to_rows() {
        let v = reshape_rows(&[0.0, 0.0, 1.0]).unwrap();
        assert!(ConeVectorGeometry::new(1_usize, &v, &v, &v, &v).is_ok());
    }

    #[test]
    fn project_point_with_detector_spacing() {
        let pg = cone()
            .angles(1_usize)
            .size((30.0, 80.0))
            .shape(DetectorShape::new(10, 40))
            .source_distance(10.0)
            .build()
            .unwrap()
            .to_vector()
            .unwrap();

        let origin = pg.project_point(&Vector3::zeros()).unwrap();
        assert!(origin[0].abs().sum() < 1e-9);
        let p = pg.project_point(&Vector3::new(3.0, 0.0, 0.0)).unwrap();
        assert!((p[0] - Vector2::new(1.0, 0.0)).abs().sum() < 1e-9);
        let p = pg.project_point(&Vector3::new(0.0, 0.0, 2.0)).unwrap();
        assert!((p[0] - Vector2::new(0.0, 1.0)).abs().sum() < 1e-9);

        // 分辨率提高十倍，投影坐标按比例放大
        let pg = pg.reshape(DetectorShape::new(100, 400)).unwrap();
        let fine = cone()
            .size((30.0, 80.0))
            .shape(DetectorShape::new(100, 400))
            .source_distance(10.0)
            .build()
            .unwrap()
            .to_vector()
            .unwrap();
        assert_ne!(pg, fine);
        let p = fine.project_point(&Vector3::new(0.3, 0.0, 0.0)).unwrap();
        assert!((p[0] - Vector2::new(1.0, 0.0)).abs().sum() < 1e-9);
        let p = fine.project_point(&Vector3::new(0.0, 0.0, 0.2)).unwrap();
        assert!((p[0] - Vector2::new(0.0, 1.0)).abs().sum() < 1e-9);
    }

    #[test]
    fn magnification_off_detector_plane() {
        // 光源在 y=-10，探测器在 y=+10，位于原点的点放大两倍
        let pg = cone()
            .shape(DetectorShape::new(10, 10))
            .size(10.0)
            .source_distance(10.0)
            .detector_distance(10.0)
            .build()
            .unwrap()
            .to_vector()
            .unwrap();
        let p = pg.project_point(&Vector3::new(1.0, 0.0, 0.0)).unwrap();
        assert!((p[0] - Vector2::new(2.0, 0.0)).abs().sum() < 1e-9);
    }

    #[test]
    fn parallel_ray_is_rejected() {
        let pg = cone().source_distance(1.0).build().unwrap().to_vector().unwrap();
        // 与光源同一 y 平面上的点，光线平行于探测器
        let src = pg.source_positions()[0];
        let p = src + Vector3::new(1.0, 0.0, 0.0);
        assert!(pg.project_point(&p).is_err());
    }

    #[test]
    fn batch_projection_keeps_order() {
        let pg = cone().angles(3_usize).build().unwrap().to_vector().unwrap();
        let points = vec![Vector3::new(0.1, 0.0, 0.0), Vector3::new(0.0, 0.2, 0.3)];
        let batch = pg.project_points(&points).unwrap();
        assert_eq!(batch.len(), 2);
        for (p, projected) in points.iter().zip(&batch) {
            assert_eq!(projected, &pg.project_point(p).unwrap());
        }
    }

    #[test]
    fn size_scales_with_reshape() {
        let pg = cone().angles(5_usize).size((1.0, 1.0)).build().unwrap().to_vector().unwrap();
        for s in pg.get_size() {
            assert!((s.height - 1.0).abs() + (s.width - 1.0).abs() < 1e-8);
        }
        let pg2 = pg.reshape(DetectorShape::new(3, 7)).unwrap();
        for s in pg2.get_size() {
            assert!((s.height - 3.0).abs() + (s.width - 7.0).abs() < 1e-8);
        }
    }

    #[test]
    fn corners_shape_and_extent() {
        let pg = cone().angles(5_usize).size((1.0, 1.0)).build().unwrap().to_vector().unwrap();
        let corners = pg.get_corners();
        assert_eq!(corners.len(), 4);
        assert!(corners.iter().all(|c| c.len() == 5));
        // 对角线长度为 √2
        let diag = (corners[2][0] - corners[0][0]).norm();
        assert!((diag - std::f64::consts::SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn micrometre_pitch_projects_origin() {
        let pg = cone()
            .size(1e-3)
            .shape(DetectorShape::new(1000, 1000))
            .source_distance(0.01)
            .build()
            .unwrap()
            .to_vector()
            .unwrap();
        let origin = pg.project_point(&Vector3::zeros()).unwrap();
        assert!(origin[0].abs().sum() < 1e-9);
        // 探测器过原点，平面内的点按像素间距 1e-6 换算
        let p = pg.project_point(&Vector3::new(5e-6, 0.0, 2e-6)).unwrap();
        assert!((p[0] - Vector2::new(5.0, 2.0)).abs().sum() < 1e-6);
    }

    #[test]
    fn point_at_source_is_rejected() {
        let pg = cone().build().unwrap().to_vector().unwrap();
        let src = pg.source_positions()[0];
        assert!(pg.project_point(&src).is_err());
    }

    #[test]
    fn non_finite_rows_are_rejected() {
        let ok = vec![Vector3::new(0.0, 0.0, 1.0)];
        let bad = vec![Vector3::new(f64::NAN, 0.0, 1.0)];
        assert!(ConeVectorGeometry::from_rows(1_usize, bad.clone(), ok.clone(), ok.clone(), ok.clone()).is_err());
        let inf = vec![Vector3::new(0.0, f64::INFINITY, 1.0)];
        assert!(ConeVectorGeometry::from_rows(1_usize, ok.clone(), ok.clone(), ok.clone(), inf).is_err());

        let mut row = [0.0, -2.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        row[4] = f64::NAN;
        let desc = ConeVecDescriptor {
            detector_row_count: 1,
            detector_col_count: 1,
            vectors: vec![row],
        };
        assert!(ConeVectorGeometry::from_astra(&desc).is_err());
    }

    #[test]
    fn take_angles_selects_rows() {
        let pg = cone().angles(4_usize).build().unwrap().to_vector().unwrap();
        let sub = pg.take_angles(&[3, 1]).unwrap();
        assert_eq!(sub.num_angles(), 2);
        assert_eq!(sub.source_positions()[0], pg.source_positions()[3]);
        assert!(pg.take_angles(&[]).is_err());
        assert!(pg.take_angles(&[4]).is_err());
    }
}
