use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;

use super::{BundleConstants, SitePlugin};
use crate::site::Site;

pub type PluginBox = Arc<dyn SitePlugin>;

/// Plugin manager (dispatches lifecycle phases to registered plugins) / 插件管理器
///
/// Plugins run in registration order; a failing hook aborts the phase.
#[derive(Clone, Default)]
pub struct PluginManager {
    plugins: Vec<PluginBox>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register plugin / 注册插件
    pub fn register(&mut self, plugin: PluginBox) {
        tracing::info!("Plugin registered: {}", plugin.name());
        self.plugins.push(plugin);
    }

    /// Registered plugin names / 已注册插件名称
    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    pub async fn on_create_pages(&self, site: &Site) -> Result<()> {
        for plugin in &self.plugins {
            plugin
                .on_create_pages(site)
                .await
                .with_context(|| format!("{}: onCreatePages failed", plugin.name()))?;
        }
        Ok(())
    }

    pub async fn after_generate(&self, site: &Site) -> Result<()> {
        for plugin in &self.plugins {
            plugin
                .after_generate(site)
                .await
                .with_context(|| format!("{}: afterGenerate failed", plugin.name()))?;
        }
        Ok(())
    }

    /// Let every plugin extend the dev server router / 构建开发服务器路由
    pub fn create_server(&self, site: &Site, router: Router) -> Router {
        self.plugins
            .iter()
            .fold(router, |router, plugin| plugin.on_create_server(site, router))
    }

    /// Collect bundle constants from every plugin / 收集打包常量
    pub fn chain_bundle(&self) -> BundleConstants {
        let mut constants = BundleConstants::new();
        for plugin in &self.plugins {
            plugin.chain_bundle(&mut constants);
        }
        constants
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    use crate::config::SiteConfig;
    use crate::site::ManifestSite;

    struct Recorder {
        name: &'static str,
        calls: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl SitePlugin for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        async fn on_create_pages(&self, _site: &Site) -> Result<()> {
            self.calls.lock().push(format!("{}:pages", self.name));
            if self.fail {
                anyhow::bail!("boom");
            }
            Ok(())
        }

        fn chain_bundle(&self, constants: &mut BundleConstants) {
            constants.insert(self.name, json!(true));
        }
    }

    fn site() -> Site {
        Site {
            config: SiteConfig::default(),
            pages: Vec::new(),
            renderer: Arc::new(ManifestSite::from_entries(Vec::new())),
            dev: true,
            root: std::path::PathBuf::from("."),
        }
    }

    #[tokio::test]
    async fn test_dispatch_in_registration_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut manager = PluginManager::new();
        manager.register(Arc::new(Recorder { name: "a", calls: calls.clone(), fail: false }));
        manager.register(Arc::new(Recorder { name: "b", calls: calls.clone(), fail: false }));

        manager.on_create_pages(&site()).await.unwrap();
        assert_eq!(*calls.lock(), vec!["a:pages", "b:pages"]);
        assert_eq!(manager.plugin_names(), vec!["a", "b"]);

        let constants = manager.chain_bundle();
        assert_eq!(constants.get("a"), Some(&json!(true)));
        assert_eq!(constants.get("b"), Some(&json!(true)));
        // 默认实现不做任何事
        manager.after_generate(&site()).await.unwrap();
    }

    #[tokio::test]
    async fn test_failing_hook_aborts_phase() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut manager = PluginManager::new();
        manager.register(Arc::new(Recorder { name: "a", calls: calls.clone(), fail: true }));
        manager.register(Arc::new(Recorder { name: "b", calls: calls.clone(), fail: false }));

        let err = manager.on_create_pages(&site()).await.unwrap_err();
        assert!(format!("{:#}", err).contains("boom"));
        assert_eq!(*calls.lock(), vec!["a:pages"]);
    }
}
