//! Search plugin - builds and publishes the search index / 搜索插件
//!
//! Development: rebuild on every page creation, serve the in-memory database.
//! Production: build once after generation, then write JSON or push to the hosted index.

use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use parking_lot::RwLock;
use std::sync::Arc;

use super::algolia::AlgoliaClient;
use super::builder::build_database;
use super::error::SearchError;
use super::publish::{push_remote, write_local};
use super::schema::{AdapterKind, Database, SearchOptions, SharedDatabase};
use super::server;
use crate::plugin::{BundleConstants, SitePlugin};
use crate::site::Site;

pub const PLUGIN_NAME: &str = "local-search";

/// Bundle constant holding the client-safe options / 客户端配置常量名
pub const OPTIONS_CONSTANT: &str = "__SABER_SEARCH_OPTIONS__";

/// Search plugin instance, owns its database / 搜索插件实例（持有自己的数据库）
pub struct SearchPlugin {
    options: SearchOptions,
    db: SharedDatabase,
    /// Hosted service address override (proxies, tests) / 托管服务地址覆盖
    algolia_host: Option<String>,
}

impl SearchPlugin {
    pub fn new(options: SearchOptions) -> Self {
        Self {
            options,
            db: Arc::new(RwLock::new(Database::new())),
            algolia_host: None,
        }
    }

    pub fn with_algolia_host(mut self, host: &str) -> Self {
        self.algolia_host = Some(host.to_string());
        self
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Handle to the current database / 当前数据库句柄
    pub fn database(&self) -> SharedDatabase {
        self.db.clone()
    }

    async fn generate(&self, site: &Site) -> Result<Database, SearchError> {
        build_database(
            &site.pages,
            &self.options.index,
            &site.config.locale_paths(),
            site.renderer.as_ref(),
        )
        .await
    }

    fn admin_client(&self) -> Result<AlgoliaClient, SearchError> {
        let app_id = self
            .options
            .algolia_id
            .as_deref()
            .ok_or(SearchError::MissingOption("algoliaId"))?;
        let admin_key = self
            .options
            .algolia_admin_key
            .as_deref()
            .ok_or(SearchError::MissingOption("algoliaAdminKey"))?;
        let client = AlgoliaClient::new(app_id, admin_key);
        Ok(match &self.algolia_host {
            Some(host) => client.with_host(host),
            None => client,
        })
    }
}

#[async_trait]
impl SitePlugin for SearchPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    async fn on_create_pages(&self, site: &Site) -> Result<()> {
        if !site.dev {
            return Ok(());
        }

        let db = self.generate(site).await?;
        // 整体替换，读取方不会看到半成品
        *self.db.write() = db;
        tracing::info!("Search database rebuilt");
        Ok(())
    }

    async fn after_generate(&self, site: &Site) -> Result<()> {
        if site.dev {
            return Ok(());
        }

        let db = self.generate(site).await?;
        match self.options.adapter {
            AdapterKind::Local | AdapterKind::Custom => {
                write_local(&db, &site.out_dir()).await?;
            }
            AdapterKind::Algolia => {
                let client = self.admin_client()?;
                push_remote(&db, &client).await?;
            }
        }
        *self.db.write() = db;
        Ok(())
    }

    fn on_create_server(&self, site: &Site, router: Router) -> Router {
        if site.dev && self.options.adapter.publishes_locally() {
            router.merge(server::routes(self.db.clone()))
        } else {
            router
        }
    }

    fn chain_bundle(&self, constants: &mut BundleConstants) {
        match serde_json::to_value(self.options.client_options()) {
            Ok(value) => constants.insert(OPTIONS_CONSTANT, value),
            Err(e) => tracing::warn!("Failed to serialize search options: {}", e),
        }
    }
}
