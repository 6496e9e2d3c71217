use log::{info, warn};
use std::time::Instant;

use tomogeom::ProjectionGeometry;
use tomogeom::astra::AnyGeometry;
use tomogeom::io::simple_cli::SimpleCli;
use tomogeom::utils::geometry_report::{detector_table, projection_table, summary};
use tomogeom::utils::save_utils::save_descriptor;

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let start_time = Instant::now();

    // --- 读取配置 ---
    let settings = SimpleCli::process()?;
    let points = settings.parse_points()?;

    // --- 构造几何 ---
    let geometry = settings.build_geometry()?;
    info!("{}", summary(&geometry));
    println!("{}", geometry);

    if let AnyGeometry::ConeVec(vector) = &geometry {
        print!("{}", detector_table(vector));
    }

    // --- 投影点 ---
    if !points.is_empty() {
        let vector = match &geometry {
            AnyGeometry::ConeVec(v) => v.clone(),
            AnyGeometry::Cone(c) => {
                warn!("投影需要向量几何，先做转换");
                c.to_vector().map_err(|e| e.to_string())?
            }
        };
        let projected = vector
            .project_points(&points)
            .map_err(|e| format!("投影失败: {}", e))?;
        for (point, result) in points.iter().zip(&projected) {
            print!("{}", projection_table(point, result));
        }
    }

    // --- 导出描述符 ---
    if let Some(export) = &settings.export {
        save_descriptor(&geometry.as_projection().to_astra(), export)?;
    }

    info!("总耗时: {:?}", start_time.elapsed());
    Ok(())
}
