pub mod config;
pub mod eject;
pub mod markdown;
pub mod plugin;
pub mod search;
pub mod site;
pub mod utils;

use std::sync::Arc;

use config::SiteConfig;
use plugin::PluginManager;
use search::SearchPlugin;

// Register every plugin enabled by the site config / 按站点配置注册插件
pub fn register_plugins(config: &SiteConfig) -> PluginManager {
    let mut manager = PluginManager::new();
    if let Some(options) = &config.plugins.search {
        manager.register(Arc::new(SearchPlugin::new(options.clone())));
    }
    manager
}
