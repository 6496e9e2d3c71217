use crate::error::{Result, invalid};
use nalgebra::{DMatrix, Vector3};

/// 校验一个向量数组是否为 N×3，并拆成逐行的三维向量
pub fn check_vectors(name: &str, m: &DMatrix<f64>) -> Result<Vec<Vector3<f64>>> {
    if m.ncols() != 3 {
        return Err(invalid(format!(
            "{} 必须有3列，得到 {}×{}",
            name,
            m.nrows(),
            m.ncols()
        )));
    }
    if m.nrows() == 0 {
        return Err(invalid(format!("{} 至少需要一行", name)));
    }
    if let Some(bad) = m.iter().find(|x| !x.is_finite()) {
        return Err(invalid(format!("{} 含有非有限值 {}", name, bad)));
    }
    Ok(m.row_iter()
        .map(|row| Vector3::new(row[0], row[1], row[2]))
        .collect())
}

/// 逐行向量中不允许出现 NaN / 无穷
pub fn check_finite_rows(name: &str, rows: &[Vector3<f64>]) -> Result<()> {
    if let Some((i, row)) = rows
        .iter()
        .enumerate()
        .find(|(_, r)| r.iter().any(|x| !x.is_finite()))
    {
        return Err(invalid(format!(
            "{} 第 {} 行含有非有限值 ({}, {}, {})",
            name, i, row.x, row.y, row.z
        )));
    }
    Ok(())
}

/// 要求所有数组行数一致
pub fn check_same_rows(arrays: &[(&str, usize)]) -> Result<usize> {
    let Some(&(first_name, rows)) = arrays.first() else {
        return Err(invalid("没有提供向量数组"));
    };
    for &(name, n) in &arrays[1..] {
        if n != rows {
            return Err(invalid(format!(
                "{} 有 {} 行，而 {} 有 {} 行",
                name, n, first_name, rows
            )));
        }
    }
    Ok(rows)
}

/// 把长度为 3 的倍数的一维数组整理成 N×3 矩阵
pub fn reshape_rows(flat: &[f64]) -> Result<DMatrix<f64>> {
    if flat.is_empty() || flat.len() % 3 != 0 {
        return Err(invalid(format!(
            "长度为 {} 的数组无法整理成 N×3",
            flat.len()
        )));
    }
    Ok(DMatrix::from_row_slice(flat.len() / 3, 3, flat))
}

/// 逐行向量 -> N×3 矩阵
pub fn rows_to_matrix(rows: &[Vector3<f64>]) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), 3, |i, j| rows[i][j])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_column_count_rejected() {
        let m = DMatrix::from_row_slice(10, 2, &(0..20).map(f64::from).collect::<Vec<_>>());
        assert!(check_vectors("source", &m).is_err());
    }

    #[test]
    fn flat_array_reduces_to_rows() {
        let m = reshape_rows(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!((m.nrows(), m.ncols()), (2, 3));
        let rows = check_vectors("v", &m).unwrap();
        assert_eq!(rows[1], Vector3::new(4.0, 5.0, 6.0));
        assert!(reshape_rows(&[1.0, 2.0]).is_err());
        assert_eq!(rows_to_matrix(&rows), m);
    }

    #[test]
    fn finite_rows_only() {
        let rows = [Vector3::new(1.0, 2.0, 3.0), Vector3::new(0.0, f64::NEG_INFINITY, 0.0)];
        assert!(check_finite_rows("v", &rows[..1]).is_ok());
        assert!(check_finite_rows("v", &rows).is_err());
    }

    #[test]
    fn row_counts_must_match() {
        assert_eq!(check_same_rows(&[("a", 3), ("b", 3)]), Ok(3));
        assert!(check_same_rows(&[("a", 3), ("b", 2)]).is_err());
    }
}
