use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub walls: WallConfig,
    #[serde(default)]
    pub levels: LevelConfig,
    #[serde(default)]
    pub site: SiteConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `FLOORPLAN_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("FLOORPLAN_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 交互容差与历史记录设置，单位均为平面单位。
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EditorConfig {
    #[serde(default = "EditorConfig::default_snap_tolerance")]
    pub snap_tolerance: f64,
    #[serde(default = "EditorConfig::default_opening_tolerance")]
    pub opening_tolerance: f64,
    #[serde(default = "EditorConfig::default_coincidence_tolerance")]
    pub coincidence_tolerance: f64,
    /// 撤销栈上限，0 表示不限制。
    #[serde(default)]
    pub history_limit: usize,
}

impl EditorConfig {
    fn default_snap_tolerance() -> f64 {
        15.0
    }

    fn default_opening_tolerance() -> f64 {
        20.0
    }

    fn default_coincidence_tolerance() -> f64 {
        1.0
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_tolerance: Self::default_snap_tolerance(),
            opening_tolerance: Self::default_opening_tolerance(),
            coincidence_tolerance: Self::default_coincidence_tolerance(),
            history_limit: 0,
        }
    }
}

/// 新建墙体的默认属性。
#[derive(Debug, Clone, Deserialize)]
pub struct WallConfig {
    #[serde(default = "WallConfig::default_thickness")]
    pub thickness: f64,
    #[serde(default = "WallConfig::default_height")]
    pub height: f64,
    #[serde(default = "WallConfig::default_color")]
    pub color: String,
}

impl WallConfig {
    fn default_thickness() -> f64 {
        10.0
    }

    fn default_height() -> f64 {
        100.0
    }

    fn default_color() -> String {
        "#9ca3af".to_string()
    }
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            thickness: Self::default_thickness(),
            height: Self::default_height(),
            color: Self::default_color(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LevelConfig {
    #[serde(default = "LevelConfig::default_height")]
    pub height: f64,
}

impl LevelConfig {
    fn default_height() -> f64 {
        100.0
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            height: Self::default_height(),
        }
    }
}

/// 启动时的场地尺寸，宽深都给出时才会生效。
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub depth: Option<f64>,
}

impl SiteConfig {
    pub fn dimensions(&self) -> Option<(f64, f64)> {
        self.width.zip(self.depth)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
