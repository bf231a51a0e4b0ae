//! 命令行设置
//!
//! 设置文件为 JSON，默认位于 `<配置目录>/western-chess/settings.json`。
//! 文件不存在或无效时使用默认设置。

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// 对应的 tracing 过滤指令
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// 命令行设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliSettings {
    /// 开局局面（FEN），为空时使用标准初始局面
    pub start_fen: Option<String>,
    /// 使用 Unicode 棋子符号
    pub unicode_pieces: bool,
    /// 显示横线和纵线标签
    pub show_coordinates: bool,
    /// 日志级别（RUST_LOG 优先）
    pub log_level: LogLevel,
    /// 升变时自动选择后，不再询问
    pub auto_queen: bool,
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            start_fen: None,
            unicode_pieces: false,
            show_coordinates: true,
            log_level: LogLevel::default(),
            auto_queen: false,
        }
    }
}

impl CliSettings {
    /// 默认设置文件路径
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("western-chess");
            path.push("settings.json");
            path
        })
    }

    /// 从默认路径加载设置
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            tracing::warn!("无法获取配置目录，使用默认设置");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// 从指定路径加载设置，失败时回退到默认设置
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("设置文件不存在，使用默认设置");
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => {
                    tracing::info!("已加载设置: {:?}", path);
                    settings
                }
                Err(e) => {
                    tracing::warn!("设置文件格式无效: {}，使用默认设置", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("无法读取设置文件: {}，使用默认设置", e);
                Self::default()
            }
        }
    }

    /// 保存设置到指定路径
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("无法创建配置目录: {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self).context("序列化设置失败")?;
        std::fs::write(path, content).with_context(|| format!("写入设置失败: {:?}", path))?;

        tracing::info!("设置已保存: {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = CliSettings::load_from(&dir.path().join("settings.json"));
        assert_eq!(settings, CliSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = CliSettings {
            start_fen: Some("4k3/8/8/8/8/8/8/4K3 w - - 0 1".to_string()),
            unicode_pieces: true,
            show_coordinates: false,
            log_level: LogLevel::Debug,
            auto_queen: true,
        };
        settings.save_to(&path).unwrap();

        assert_eq!(CliSettings::load_from(&path), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "auto_queen": true, "log_level": "info" }"#).unwrap();

        let settings = CliSettings::load_from(&path);
        assert!(settings.auto_queen);
        assert_eq!(settings.log_level, LogLevel::Info);
        assert!(settings.show_coordinates);
        assert_eq!(settings.start_fen, None);
    }

    #[test]
    fn test_invalid_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();

        assert_eq!(CliSettings::load_from(&path), CliSettings::default());
    }

    #[test]
    fn test_log_level_directive() {
        assert_eq!(LogLevel::default().directive(), "warn");
        assert_eq!(LogLevel::Trace.directive(), "trace");
    }
}
