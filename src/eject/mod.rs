//! Theme eject command / 主题导出命令
//!
//! Copies the theme in use into the project so it can be customized.
//! Steps are not rolled back on failure (a partial copy is left in place).

pub mod deps;
pub mod theme;

use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{load_config, ConfigError, PACKAGE_FILE};

/// Temporary clone directory (relative to project root) / 临时克隆目录
pub const GIT_TMP_DIR: &str = ".saber/theme-tmp";

#[derive(Debug, Error)]
pub enum EjectError {
    #[error("No theme specified in config.")]
    NoTheme,
    #[error("The path {0} already exists. Please specify a different one using \"--path\".")]
    DestinationExists(String),
    #[error("Theme \"{0}\" could not be found in your node_modules.")]
    ThemeNotFound(String),
    #[error("The theme has no git repository specified within its package.json.")]
    NoRepository,
    #[error("Failed to download theme from {url}: {message}")]
    Git { url: String, message: String },
    #[error("Failed to install dependencies: {0}")]
    Install(String),
    #[error("{path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid package.json {path:?}: {source}")]
    Package {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub(crate) fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> EjectError + '_ {
    move |source| EjectError::Io { path: path.to_path_buf(), source }
}

/// Eject options / 导出选项
#[derive(Debug, Clone)]
pub struct EjectOptions {
    /// Project root / 项目根目录
    pub cwd: PathBuf,
    /// Pull from the theme's git repository instead of node_modules / 从 Git 拉取
    pub git: bool,
    /// Merge the theme's dependencies into the project / 合并主题依赖
    pub merge_dependencies: bool,
    /// Install after merging dependencies / 合并后安装依赖
    pub install: bool,
    /// Destination, relative to the project root / 导出目录
    pub path: String,
}

impl EjectOptions {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            git: false,
            merge_dependencies: true,
            install: true,
            path: "./theme".to_string(),
        }
    }
}

/// Result of a successful eject / 导出结果
#[derive(Debug, Clone)]
pub struct EjectReport {
    pub theme_path: PathBuf,
    pub destination: PathBuf,
    /// Value to put into the `theme` config field / 新的 theme 配置值
    pub theme_config: String,
}

/// Run the eject command / 执行导出
pub fn eject(options: &EjectOptions) -> Result<EjectReport, EjectError> {
    let cwd = &options.cwd;
    let config = load_config(cwd)?;
    let theme_name = config.theme.ok_or(EjectError::NoTheme)?;

    let destination = cwd.join(&options.path);
    if destination.exists() {
        return Err(EjectError::DestinationExists(options.path.clone()));
    }

    let theme_path = theme::resolve_theme(&theme_name, cwd)
        .ok_or_else(|| EjectError::ThemeNotFound(theme_name.clone()))?;
    let theme_package = read_package(&theme_path.join(PACKAGE_FILE))?;

    if options.git {
        let repository = theme::Repository::from_package(&theme_package).ok_or(EjectError::NoRepository)?;
        theme::download_from_git(&repository, &cwd.join(GIT_TMP_DIR), &destination)?;
        tracing::info!("Downloaded theme source via Git.");
    } else {
        let copied = theme::copy_theme(&theme_path, &destination)?;
        tracing::info!("Copied theme from node_modules ({} files).", copied);
    }

    if options.merge_dependencies {
        deps::merge_dependencies(&cwd.join(PACKAGE_FILE), &theme_package)?;
        if options.install {
            deps::install_dependencies(cwd)?;
        }
        tracing::info!("Merged theme dependencies.");
    }

    let relative = pathdiff(&destination, cwd);
    let theme_config = format!("./{}", relative.trim_start_matches("./"));
    tracing::info!("Please change \"theme\" in your Saber config to \"{}\".", theme_config);

    Ok(EjectReport {
        theme_path,
        destination,
        theme_config,
    })
}

/// Read a package.json, missing file reads as `{}` / 读取 package.json
pub fn read_package(path: &Path) -> Result<Value, EjectError> {
    if !path.exists() {
        return Ok(Value::Object(Default::default()));
    }
    let data = std::fs::read_to_string(path).map_err(io_error(path))?;
    serde_json::from_str(&data).map_err(|source| EjectError::Package { path: path.to_path_buf(), source })
}

/// Destination relative to the project root, using `/` separators / 相对路径
fn pathdiff(path: &Path, base: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
