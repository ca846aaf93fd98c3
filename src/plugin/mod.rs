//! Plugin lifecycle hooks / 插件生命周期钩子
//!
//! Each lifecycle phase has its own typed payload:
//! - `on_create_pages`: site snapshot after pages are created (dev rebuilds)
//! - `after_generate`: site snapshot after static files are generated
//! - `on_create_server`: dev server router
//! - `chain_bundle`: compile-time constants injected into the browser bundle

pub mod manager;

use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::site::Site;

pub use manager::PluginManager;

/// Site plugin interface / 站点插件接口
#[async_trait]
pub trait SitePlugin: Send + Sync {
    /// Plugin name / 插件名称
    fn name(&self) -> &str;

    /// Pages were (re)created / 页面创建完成
    async fn on_create_pages(&self, _site: &Site) -> Result<()> {
        Ok(())
    }

    /// Static output was generated / 静态文件生成完成
    async fn after_generate(&self, _site: &Site) -> Result<()> {
        Ok(())
    }

    /// Extend the dev server routes / 扩展开发服务器路由
    fn on_create_server(&self, _site: &Site, router: Router) -> Router {
        router
    }

    /// Inject bundle constants / 注入打包常量
    fn chain_bundle(&self, _constants: &mut BundleConstants) {}
}

/// Compile-time constants for the browser bundle / 浏览器打包常量
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BundleConstants(BTreeMap<String, Value>);

impl BundleConstants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}
