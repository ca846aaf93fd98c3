//! Search module - index building, publishing and querying / 搜索模块
//!
//! Build side / 构建端:
//! - builder: projects pages into per-locale index records
//! - publish: writes the local JSON artifacts or pushes to a hosted index
//! - server: serves the in-memory database in development mode
//! - plugin: wires the above into the site lifecycle
//!
//! Query side / 查询端:
//! - client: lazily fetches one locale's index and answers queries
//! - engine: fuzzy matcher used for local queries
//! - debounce: leading + trailing debounce for keystroke-driven queries

pub mod algolia;
pub mod builder;
pub mod client;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod plugin;
pub mod publish;
pub mod schema;
pub mod server;

pub use algolia::AlgoliaClient;
pub use builder::build_database;
pub use client::{SearchClient, SearchDelegate, SearchStrategy};
pub use debounce::Debounced;
pub use engine::FuzzySearch;
pub use error::SearchError;
pub use plugin::SearchPlugin;
pub use schema::{AdapterKind, ClientOptions, Database, IndexRecord, SearchOptions, SharedDatabase};

/// Remote index name used by the hosted adapter / 托管搜索服务使用的索引名
pub const REMOTE_INDEX: &str = "pages";

/// URL path prefix of published index artifacts / 索引文件的URL前缀
pub const SEARCH_PATH: &str = "_saber/search";
