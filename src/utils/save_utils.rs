use crate::astra::AstraProjGeom;
use log::info;
use std::path::Path;

/// 描述符输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    Json,
    Toml,
}

impl DescriptorFormat {
    /// 按扩展名判断：`.json` 为JSON，其余一律TOML
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DescriptorFormat::Json,
            _ => DescriptorFormat::Toml,
        }
    }
}

/// 把描述符渲染成文本
///
/// TOML 输出带生成时间的注释头，JSON 没有注释语法，只输出数据。
pub fn render_descriptor(geom: &AstraProjGeom, format: DescriptorFormat) -> Result<String, String> {
    match format {
        DescriptorFormat::Json => geom.to_json().map_err(|e| e.to_string()),
        DescriptorFormat::Toml => {
            let body = geom.to_toml().map_err(|e| e.to_string())?;
            Ok(format!(
                "# {} 投影几何描述符\n# 生成时间: {}\n\n{}",
                geom.type_name(),
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                body
            ))
        }
    }
}

/// 保存描述符到文件
///
/// # 参数
/// * `geom` - 外部库描述符
/// * `path` - 输出路径，扩展名决定格式
pub fn save_descriptor<P: AsRef<Path>>(geom: &AstraProjGeom, path: P) -> Result<(), String> {
    let path = path.as_ref();
    let format = DescriptorFormat::from_path(path);
    let content = render_descriptor(geom, format)?;
    std::fs::write(path, content)
        .map_err(|e| format!("保存描述符到 {} 时出错: {}", path.display(), e))?;
    info!("描述符已保存到 {} ({:?})", path.display(), format);
    Ok(())
}

/// 从文件读取描述符，格式同样按扩展名判断
pub fn load_descriptor<P: AsRef<Path>>(path: P) -> Result<AstraProjGeom, String> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("读取描述符 {} 失败: {}", path.display(), e))?;
    let parsed = match DescriptorFormat::from_path(path) {
        DescriptorFormat::Json => AstraProjGeom::from_json(&content),
        DescriptorFormat::Toml => AstraProjGeom::from_toml(&content),
    };
    parsed.map_err(|e| e.to_string())
}
