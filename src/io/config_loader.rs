use crate::geometry::{Angles, DetectorShape, DetectorSize};
use crate::io::geometry_settings::{GeometrySettings, GeometryType};
use log::warn;
use std::path::Path;
use toml::Value;

/// TOML配置管理器 - 统一处理几何配置的读写
pub struct TomlConfigLoader;

impl TomlConfigLoader {
    /// 从TOML文件加载完整配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<GeometrySettings, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("读取配置文件失败: {}", e))?;

        Self::load_from_content(&content)
    }

    /// 从TOML内容字符串加载配置
    pub fn load_from_content(content: &str) -> Result<GeometrySettings, String> {
        let toml_value: Value =
            toml::from_str(content).map_err(|e| format!("解析TOML失败: {}", e))?;

        Self::parse_toml_to_settings(toml_value)
    }

    /// 保存配置到TOML文件
    pub fn save_to_file<P: AsRef<Path>>(
        settings: &GeometrySettings,
        path: P,
    ) -> Result<(), String> {
        let toml_content = Self::settings_to_toml(settings);
        std::fs::write(path, toml_content).map_err(|e| format!("写入配置文件失败: {}", e))
    }

    /// 生成示例配置文件
    pub fn create_example_config<P: AsRef<Path>>(path: P) -> Result<(), String> {
        let settings = GeometrySettings {
            angles: Angles::Count(180),
            size: DetectorSize::new(30.0, 80.0),
            shape: DetectorShape::new(10, 40),
            source_distance: 10.0,
            to_vector: true,
            points: vec!["0,0,0".to_string(), "3,0,0".to_string()],
            ..Default::default()
        };

        Self::save_to_file(&settings, path).map_err(|e| format!("创建示例配置失败: {}", e))
    }

    // ===== TOML -> GeometrySettings 转换 =====

    fn parse_toml_to_settings(toml: Value) -> Result<GeometrySettings, String> {
        let mut settings = GeometrySettings::default();

        // [geometry] 部分
        if let Some(geometry) = toml.get("geometry").and_then(|v| v.as_table()) {
            Self::parse_geometry_section(&mut settings, geometry)?;
        } else {
            warn!("配置中没有 [geometry] 部分，使用默认锥束几何");
        }

        // [output] 部分
        if let Some(output) = toml.get("output").and_then(|v| v.as_table()) {
            Self::parse_output_section(&mut settings, output)?;
        }

        Ok(settings)
    }

    // ===== 各个section的解析方法 =====

    fn parse_geometry_section(
        settings: &mut GeometrySettings,
        geometry: &toml::Table,
    ) -> Result<(), String> {
        if let Some(kind) = geometry.get("type").and_then(|v| v.as_str()) {
            settings.geometry_type = GeometryType::parse(kind)?;
        }
        if let Some(angles) = geometry.get("angles") {
            settings.angles = Self::parse_angles(angles)?;
        }
        if let Some(size) = geometry.get("size") {
            let (height, width) = Self::parse_pair(size, "size", Self::as_number)?;
            settings.size = DetectorSize::new(height, width);
        }
        if let Some(shape) = geometry.get("shape") {
            let (rows, cols) = Self::parse_pair(shape, "shape", |v| v.as_integer())?;
            settings.shape = DetectorShape::new(
                Self::to_count("shape", rows)?,
                Self::to_count("shape", cols)?,
            );
        }
        if let Some(d) = geometry.get("source_distance").and_then(Self::as_number) {
            settings.source_distance = d;
        }
        if let Some(d) = geometry.get("detector_distance").and_then(Self::as_number) {
            settings.detector_distance = d;
        }
        if let Some(vectors) = geometry.get("vectors").and_then(|v| v.as_array()) {
            settings.vectors = vectors
                .iter()
                .enumerate()
                .map(|(i, row)| Self::parse_vector_row(i, row))
                .collect::<Result<_, _>>()?;
        }
        Ok(())
    }

    fn parse_output_section(
        settings: &mut GeometrySettings,
        output: &toml::Table,
    ) -> Result<(), String> {
        if let Some(to_vector) = output.get("to_vector").and_then(|v| v.as_bool()) {
            settings.to_vector = to_vector;
        }
        if let Some(export) = output.get("export").and_then(|v| v.as_str()) {
            settings.export = Some(export.to_string());
        }
        if let Some(points) = output.get("points").and_then(|v| v.as_array()) {
            settings.points = points
                .iter()
                .map(|p| {
                    p.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| format!("投影点必须是\"z,y,x\"字符串，得到 {}", p))
                })
                .collect::<Result<_, _>>()?;
        }
        Ok(())
    }

    // ===== 数值辅助 =====

    /// 整数与浮点数都接受
    fn as_number(v: &Value) -> Option<f64> {
        v.as_float().or_else(|| v.as_integer().map(|i| i as f64))
    }

    fn to_count(name: &str, n: i64) -> Result<usize, String> {
        usize::try_from(n).map_err(|_| format!("{} 不能为负: {}", name, n))
    }

    fn parse_angles(value: &Value) -> Result<Angles, String> {
        if let Some(count) = value.as_integer() {
            return Ok(Angles::Count(Self::to_count("angles", count)?));
        }
        let Some(array) = value.as_array() else {
            return Err(format!("angles 必须是整数或数组，得到 {}", value));
        };
        array
            .iter()
            .map(|a| Self::as_number(a).ok_or_else(|| format!("无效的角度值: {}", a)))
            .collect::<Result<Vec<_>, _>>()
            .map(Angles::Values)
    }

    /// 标量视为两个方向相同，数组必须恰好两个元素
    fn parse_pair<T: Copy>(
        value: &Value,
        name: &str,
        get: impl Fn(&Value) -> Option<T>,
    ) -> Result<(T, T), String> {
        if let Some(x) = get(value) {
            return Ok((x, x));
        }
        match value.as_array().map(|a| a.as_slice()) {
            Some([a, b]) => match (get(a), get(b)) {
                (Some(a), Some(b)) => Ok((a, b)),
                _ => Err(format!("{} 的元素类型不正确: {}", name, value)),
            },
            _ => Err(format!("{} 必须是标量或两个元素的数组，得到 {}", name, value)),
        }
    }

    fn parse_vector_row(index: usize, row: &Value) -> Result<[f64; 12], String> {
        let values = row
            .as_array()
            .ok_or_else(|| format!("vectors 第 {} 行不是数组", index))?;
        if values.len() != 12 {
            return Err(format!(
                "vectors 第 {} 行需要12个数，得到 {}",
                index,
                values.len()
            ));
        }
        let mut out = [0.0; 12];
        for (slot, v) in out.iter_mut().zip(values) {
            *slot = Self::as_number(v)
                .ok_or_else(|| format!("vectors 第 {} 行含有非数值: {}", index, v))?;
        }
        Ok(out)
    }

    // ===== GeometrySettings -> TOML 转换 =====

    fn settings_to_toml(settings: &GeometrySettings) -> String {
        let mut content = String::new();

        // 文件头注释
        content.push_str("# 🔥 锥束几何配置文件\n");
        content.push_str("# 坐标顺序为 (z, y, x)，z 为旋转轴\n\n");

        // [geometry] 部分
        content.push_str("[geometry]\n");
        content.push_str(&format!(
            "type = \"{}\"\n",
            settings.geometry_type.as_str()
        ));
        match &settings.angles {
            Angles::Count(n) => content.push_str(&format!("angles = {}\n", n)),
            Angles::Values(values) => {
                content.push_str(&format!("angles = {}\n", Self::float_array(values)))
            }
        }
        content.push_str(&format!(
            "size = [{:?}, {:?}]\n",
            settings.size.height, settings.size.width
        ));
        content.push_str(&format!(
            "shape = [{}, {}]\n",
            settings.shape.rows, settings.shape.cols
        ));
        content.push_str(&format!(
            "source_distance = {:?}\n",
            settings.source_distance
        ));
        content.push_str(&format!(
            "detector_distance = {:?}\n",
            settings.detector_distance
        ));
        if settings.vectors.is_empty() {
            content.push_str("# vectors = [[sx, sy, sz, dx, dy, dz, ux, uy, uz, vx, vy, vz]]  # 仅用于 cone_vec\n");
        } else {
            content.push_str("vectors = [\n");
            for row in &settings.vectors {
                content.push_str(&format!("    {},\n", Self::float_array(row)));
            }
            content.push_str("]\n");
        }
        content.push('\n');

        // [output] 部分
        content.push_str("[output]\n");
        content.push_str(&format!("to_vector = {}\n", settings.to_vector));
        if let Some(export) = &settings.export {
            content.push_str(&format!("export = {}\n", Self::quote(export)));
        } else {
            content.push_str("# export = \"geometry.json\"  # 可选：导出描述符\n");
        }
        let points = settings
            .points
            .iter()
            .map(|p| Self::quote(p))
            .collect::<Vec<_>>()
            .join(", ");
        content.push_str(&format!("points = [{}]\n", points));

        content
    }

    /// 按TOML规则转义字符串
    fn quote(s: &str) -> String {
        Value::String(s.to_string()).to_string()
    }

    /// `{:?}` 保证浮点数总带小数点，TOML 才会把它读成浮点
    fn float_array(values: &[f64]) -> String {
        let items = values
            .iter()
            .map(|v| format!("{:?}", v))
            .collect::<Vec<_>>()
            .join(", ");
        format!("[{}]", items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cone_section() {
        let settings = TomlConfigLoader::load_from_content(
            r#"
            [geometry]
            type = "cone"
            angles = 5
            size = [30.0, 80]
            shape = [10, 40]
            source_distance = 10

            [output]
            to_vector = true
            points = ["0,0,0", "3,0,0"]
            "#,
        )
        .unwrap();
        assert_eq!(settings.angles, Angles::Count(5));
        assert_eq!(settings.size, DetectorSize::new(30.0, 80.0));
        assert_eq!(settings.shape, DetectorShape::new(10, 40));
        assert_eq!(settings.source_distance, 10.0);
        assert!(settings.to_vector);
        assert_eq!(settings.parse_points().unwrap().len(), 2);
    }

    #[test]
    fn scalar_size_and_shape() {
        let settings = TomlConfigLoader::load_from_content(
            "[geometry]\nsize = 2.0\nshape = 4\nangles = [0.0, 1.5]\n",
        )
        .unwrap();
        assert_eq!(settings.size, DetectorSize::new(2.0, 2.0));
        assert_eq!(settings.shape, DetectorShape::new(4, 4));
        assert_eq!(settings.angles, Angles::Values(vec![0.0, 1.5]));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(TomlConfigLoader::load_from_content("[geometry]\ntype = \"parallel\"\n").is_err());
        assert!(TomlConfigLoader::load_from_content("[geometry]\nshape = [1, 2, 3]\n").is_err());
        assert!(TomlConfigLoader::load_from_content("[geometry]\nshape = -1\n").is_err());
        assert!(TomlConfigLoader::load_from_content("[geometry]\nvectors = [[1.0, 2.0]]\n").is_err());
        assert!(TomlConfigLoader::load_from_content("not toml ===").is_err());
    }

    #[test]
    fn negative_angles_name_the_field() {
        let err = TomlConfigLoader::load_from_content("[geometry]\nangles = -3\n").unwrap_err();
        assert!(err.contains("angles"));
        let err = TomlConfigLoader::load_from_content("[geometry]\nshape = [2, -1]\n").unwrap_err();
        assert!(err.contains("shape"));
    }

    #[test]
    fn paths_with_backslashes_survive_saving() {
        let settings = GeometrySettings {
            export: Some(r"C:\out\geometry.json".to_string()),
            points: vec!["1,2,3".to_string(), "a\"b".to_string()],
            ..Default::default()
        };
        let text = TomlConfigLoader::settings_to_toml(&settings);
        let loaded = TomlConfigLoader::load_from_content(&text).unwrap();
        assert_eq!(loaded.export.as_deref(), Some(r"C:\out\geometry.json"));
        assert_eq!(loaded.points, settings.points);
    }

    #[test]
    fn saved_settings_load_back() {
        let settings = GeometrySettings {
            geometry_type: GeometryType::ConeVec,
            shape: DetectorShape::new(3, 5),
            vectors: vec![[0.0, -2.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]],
            export: Some("out.json".to_string()),
            points: vec!["1,2,3".to_string()],
            ..Default::default()
        };
        let text = TomlConfigLoader::settings_to_toml(&settings);
        let loaded = TomlConfigLoader::load_from_content(&text).unwrap();
        assert_eq!(loaded.geometry_type, GeometryType::ConeVec);
        assert_eq!(loaded.vectors, settings.vectors);
        assert_eq!(loaded.export.as_deref(), Some("out.json"));
        assert_eq!(loaded.points, settings.points);
        assert!(loaded.build_geometry().is_ok());
    }
}
