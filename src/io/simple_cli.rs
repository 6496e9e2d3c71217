use crate::io::config_loader::TomlConfigLoader;
use crate::io::geometry_settings::GeometrySettings;
use clap::Parser;
use log::info;

/// 🔥 **极简CLI** - 配置文件驱动，命令行可覆盖输出选项
#[derive(Parser, Debug)]
#[command(name = "tomogeom")]
#[command(about = "📐 锥束CT几何转换与点投影工具")]
pub struct SimpleCli {
    /// 📁 配置文件路径（TOML格式）
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// 🔁 转换为逐角度向量几何
    #[arg(long)]
    pub to_vector: bool,

    /// 🎯 要投影的点 "z,y,x"，可重复
    #[arg(short, long, value_name = "POINT", allow_hyphen_values = true)]
    pub project: Vec<String>,

    /// 💾 导出外部库描述符（.json 为JSON，其余为TOML）
    #[arg(short, long, value_name = "FILE")]
    pub export: Option<String>,

    /// 📋 使用示例配置（创建并加载）
    #[arg(long)]
    pub use_example_config: bool,
}

impl SimpleCli {
    /// 🔥 **处理CLI参数并返回GeometrySettings**
    pub fn process() -> Result<GeometrySettings, String> {
        Self::parse().into_settings()
    }

    /// 读取配置，再用命令行参数覆盖
    pub fn into_settings(self) -> Result<GeometrySettings, String> {
        let mut settings = if self.use_example_config {
            let example_path = "example_geometry.toml";
            TomlConfigLoader::create_example_config(example_path)?;
            info!("✅ 已创建示例配置: {}", example_path);
            TomlConfigLoader::load_from_file(example_path)
                .map_err(|e| format!("加载示例配置失败: {}", e))?
        } else if let Some(config_path) = &self.config {
            info!("📁 加载配置文件: {}", config_path);
            TomlConfigLoader::load_from_file(config_path)
                .map_err(|e| format!("配置文件加载失败: {}", e))?
        } else {
            info!("💡 使用默认几何设置");
            GeometrySettings::default()
        };

        if self.to_vector {
            settings.to_vector = true;
        }
        if self.export.is_some() {
            settings.export = self.export;
        }
        settings.points.extend(self.project);
        Ok(settings)
    }
}
