//! Site model shared by plugins / 插件共享的站点模型
//!
//! Pages are produced by the site pipeline and are read-only to plugins.
//! Rendering full page content is an external capability (`ContentRenderer`).

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::config::SiteConfig;

/// Generated page / 生成的页面
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    /// Unique key within a locale / 语言内唯一
    pub permalink: String,
    #[serde(default)]
    pub draft: bool,
    /// Page type, pages without one are not searchable / 页面类型
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub page_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    /// Front matter attributes / 页面属性
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl Page {
    pub fn new(permalink: impl Into<String>) -> Self {
        Self {
            permalink: permalink.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, page_type: &str) -> Self {
        self.page_type = Some(page_type.to_string());
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_excerpt(mut self, excerpt: &str) -> Self {
        self.excerpt = Some(excerpt.to_string());
        self
    }

    pub fn with_attribute(mut self, name: &str, value: Value) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }

    pub fn draft(mut self) -> Self {
        self.draft = true;
        self
    }

    /// Own property of the page, empty values count as absent / 页面自身属性
    pub fn property(&self, name: &str) -> Option<String> {
        let value = match name {
            "permalink" => Some(self.permalink.clone()),
            "title" => self.title.clone(),
            "excerpt" => self.excerpt.clone(),
            "type" => self.page_type.clone(),
            _ => None,
        };
        value.filter(|v| !v.is_empty())
    }

    /// Attribute value as text / 属性值（文本形式）
    pub fn attribute(&self, name: &str) -> Option<String> {
        match self.attributes.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Property with attribute fallback / 先取自身属性，再回退到 attributes
    pub fn field(&self, name: &str) -> Option<String> {
        self.property(name).or_else(|| self.attribute(name))
    }
}

/// Full content rendering capability / 页面内容渲染能力
#[async_trait]
pub trait ContentRenderer: Send + Sync {
    /// Render the page content to HTML / 渲染页面内容
    async fn render_page_content(&self, permalink: &str) -> Result<String>;
}

/// Site snapshot handed to plugin hooks / 传递给插件钩子的站点快照
#[derive(Clone)]
pub struct Site {
    pub config: SiteConfig,
    pub pages: Vec<Page>,
    pub renderer: Arc<dyn ContentRenderer>,
    /// Development mode / 开发模式
    pub dev: bool,
    /// Site root directory / 站点根目录
    pub root: std::path::PathBuf,
}

impl Site {
    pub fn out_dir(&self) -> std::path::PathBuf {
        self.config.resolve_out_dir(&self.root)
    }
}

/// Page entry of a pages manifest, with pre-rendered content / 页面清单条目
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestPage {
    #[serde(flatten)]
    pub page: Page,
    #[serde(default)]
    pub content: Option<String>,
}

/// Pages loaded from a JSON manifest produced by the site pipeline / 从 JSON 页面清单加载的页面
pub struct ManifestSite {
    pages: Vec<Page>,
    contents: HashMap<String, String>,
}

impl ManifestSite {
    pub fn from_entries(entries: Vec<ManifestPage>) -> Self {
        let mut pages = Vec::with_capacity(entries.len());
        let mut contents = HashMap::new();
        for entry in entries {
            if let Some(content) = entry.content {
                contents.insert(entry.page.permalink.clone(), content);
            }
            pages.push(entry.page);
        }
        Self { pages, contents }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read pages manifest {:?}: {}", path, e))?;
        let entries: Vec<ManifestPage> = serde_json::from_str(&data)
            .map_err(|e| anyhow!("Failed to parse pages manifest {:?}: {}", path, e))?;
        tracing::info!("Loaded {} pages from {:?}", entries.len(), path);
        Ok(Self::from_entries(entries))
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }
}

#[async_trait]
impl ContentRenderer for ManifestSite {
    async fn render_page_content(&self, permalink: &str) -> Result<String> {
        Ok(self.contents.get(permalink).cloned().unwrap_or_default())
    }
}

/// Detects rewrites of a pages manifest (modification time + size) / 页面清单变更检测
pub struct ManifestWatcher {
    path: PathBuf,
    stamp: Option<(SystemTime, u64)>,
}

impl ManifestWatcher {
    /// The current state of the file counts as seen / 当前状态视为已读取
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stamp = file_stamp(&path);
        Self { path, stamp }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the manifest changed since the last poll and is readable / 自上次检查后是否变化
    pub fn poll(&mut self) -> bool {
        let current = file_stamp(&self.path);
        if current == self.stamp {
            return false;
        }
        self.stamp = current;
        // 文件被删除时等待重新生成
        current.is_some()
    }
}

fn file_stamp(path: &Path) -> Option<(SystemTime, u64)> {
    let meta = std::fs::metadata(path).ok()?;
    Some((meta.modified().ok()?, meta.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_fallback() {
        let page = Page::new("/a")
            .with_title("")
            .with_attribute("title", json!("From attrs"))
            .with_attribute("tags", json!(["x", "y"]))
            .with_attribute("empty", Value::Null);

        assert_eq!(page.field("permalink").as_deref(), Some("/a"));
        assert_eq!(page.field("title").as_deref(), Some("From attrs"));
        assert_eq!(page.field("tags").as_deref(), Some(r#"["x","y"]"#));
        assert_eq!(page.field("empty"), None);
        assert_eq!(page.field("excerpt"), None);
    }

    #[test]
    fn test_manifest_page_parsing() {
        let entries: Vec<ManifestPage> = serde_json::from_str(
            r#"[{ "permalink": "/a", "type": "post", "title": "A", "content": "<p>a</p>" },
                { "permalink": "/b", "draft": true }]"#,
        )
        .unwrap();
        let site = ManifestSite::from_entries(entries);

        assert_eq!(site.pages().len(), 2);
        assert_eq!(site.pages()[0].page_type.as_deref(), Some("post"));
        assert!(site.pages()[1].draft);
    }

    #[tokio::test]
    async fn test_manifest_renderer() {
        let site = ManifestSite::from_entries(vec![ManifestPage {
            page: Page::new("/a"),
            content: Some("<p>body</p>".to_string()),
        }]);
        assert_eq!(site.render_page_content("/a").await.unwrap(), "<p>body</p>");
        assert_eq!(site.render_page_content("/missing").await.unwrap(), "");
    }

    #[test]
    fn test_manifest_watcher() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages.json");
        std::fs::write(&path, "[]").unwrap();

        let mut watcher = ManifestWatcher::new(&path);
        assert!(!watcher.poll());

        std::fs::write(&path, r#"[{ "permalink": "/a" }]"#).unwrap();
        assert!(watcher.poll());
        assert!(!watcher.poll());

        // 同样大小，仅修改时间变化
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + std::time::Duration::from_secs(60)).unwrap();
        drop(file);
        assert!(watcher.poll());

        std::fs::remove_file(&path).unwrap();
        assert!(!watcher.poll());
        std::fs::write(&path, "[]").unwrap();
        assert!(watcher.poll());
    }
}
