//! Site configuration module / 站点配置模块
//!
//! Loads `saber-config.json`, falling back to the `saber` field of `package.json`.
//! All fields are optional and merged over defaults / 所有字段可选，缺省时使用默认值

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::search::SearchOptions;

/// Config file names, in lookup order / 配置文件名（按查找顺序）
pub const CONFIG_FILE: &str = "saber-config.json";
pub const PACKAGE_FILE: &str = "package.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Site configuration / 站点配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteConfig {
    /// Theme package name or local path / 主题包名或本地路径
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Locale path -> locale config / 多语言配置
    pub locales: BTreeMap<String, LocaleConfig>,
    /// Build configuration / 构建配置
    pub build: BuildConfig,
    /// Plugin configuration / 插件配置
    pub plugins: PluginsConfig,
    /// Markdown configuration / Markdown 配置
    pub markdown: MarkdownConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Build configuration / 构建配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfig {
    /// Public URL the site is served under / 站点公开URL前缀
    pub public_url: String,
    /// Output directory (relative to site root) / 输出目录
    pub out_dir: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            public_url: "/".to_string(),
            out_dir: "public".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    /// Search plugin options, absent means the plugin is disabled / 搜索插件配置
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchOptions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkdownConfig {
    pub inject_markdown_headings: bool,
}

impl SiteConfig {
    /// Configured locale paths / 已配置的语言路径
    pub fn locale_paths(&self) -> Vec<String> {
        self.locales.keys().cloned().collect()
    }

    /// Resolve a path inside the output directory / 解析输出目录下的路径
    pub fn resolve_out_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.build.out_dir)
    }
}

/// Load site configuration from a site root / 从站点根目录加载配置
///
/// Returns defaults when neither config file exists / 配置文件都不存在时返回默认配置
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let config_path = root.join(CONFIG_FILE);
    if config_path.exists() {
        let config = read_json(&config_path)?;
        tracing::info!("Loaded configuration from {:?}", config_path);
        return Ok(config);
    }

    let package_path = root.join(PACKAGE_FILE);
    if package_path.exists() {
        let package: serde_json::Value = read_json(&package_path)?;
        if let Some(saber) = package.get("saber") {
            let config = serde_json::from_value(saber.clone())
                .map_err(|source| ConfigError::Parse { path: package_path.clone(), source })?;
            tracing::info!("Loaded configuration from \"saber\" field of {:?}", package_path);
            return Ok(config);
        }
    }

    tracing::debug!("No config file found in {:?}, using defaults", root);
    Ok(SiteConfig::default())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    serde_json::from_str(&content)
        .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::AdapterKind;

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert!(config.theme.is_none());
        assert_eq!(config.build.out_dir, "public");
        assert_eq!(config.build.public_url, "/");
        assert!(config.plugins.search.is_none());
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{
                "theme": "minimal",
                "locales": { "/zh/": { "lang": "zh" } },
                "build": { "outDir": "dist" },
                "plugins": { "search": { "index": ["title", "content"], "adapter": "algolia", "algoliaId": "APP" } }
            }"#,
        )
        .unwrap();

        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.theme.as_deref(), Some("minimal"));
        assert_eq!(config.locale_paths(), vec!["/zh/".to_string()]);
        assert_eq!(config.build.out_dir, "dist");
        assert_eq!(config.build.public_url, "/");

        let search = config.plugins.search.unwrap();
        assert_eq!(search.index, vec!["title", "content"]);
        assert_eq!(search.adapter, AdapterKind::Algolia);
        assert_eq!(search.algolia_id.as_deref(), Some("APP"));
    }

    #[test]
    fn test_load_from_package_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PACKAGE_FILE),
            r#"{ "name": "site", "saber": { "theme": "./theme" } }"#,
        )
        .unwrap();

        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.theme.as_deref(), Some("./theme"));
    }

    #[test]
    fn test_invalid_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        assert!(matches!(load_config(dir.path()), Err(ConfigError::Parse { .. })));
    }
}
