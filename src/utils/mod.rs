// utils/mod.rs
// 导出输出与报告相关工具函数
pub mod geometry_report;
pub mod save_utils;
