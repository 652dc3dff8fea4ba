//! 日志模块 - 控制台输出加滚动文件日志

use crate::config::LogConfig;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

/// 获取日志目录路径（位于应用配置目录下）
pub fn log_dir() -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join("schemasync"))
        .unwrap_or_else(|| PathBuf::from(".schemasync"))
}

/// 初始化日志系统
///
/// 控制台始终输出；文件日志按天滚动，由 LogConfig 开关控制。
/// 返回的 guard 在进程结束前必须存活，否则缓冲日志会丢失。
pub fn init(config: &LogConfig, log_dir: &Path, verbose: bool) -> Option<WorkerGuard> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        config.tracing_level()
    };

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(level.into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let (file_layer, guard) = if config.enabled {
        let _ = std::fs::create_dir_all(log_dir);
        let appender = tracing_appender::rolling::daily(log_dir, "schemasync.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer);

    let _ = tracing::subscriber::set_global_default(subscriber);

    guard
}
