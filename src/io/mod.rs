// io/mod.rs
// 导出配置读写与命令行相关模块
pub mod config_loader;
pub mod geometry_settings;
pub mod simple_cli;
