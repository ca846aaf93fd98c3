//! Index builder - projects pages into per-locale index records / 索引构建
//!
//! Every locale and every content render runs concurrently; output keeps the
//! page iteration order so the published artifact is reproducible.

use futures::future::try_join_all;

use super::error::SearchError;
use super::schema::{Database, IndexRecord};
use crate::site::{ContentRenderer, Page};
use crate::utils::{locale_key, matched_locale_path, normalize_locale_path};

/// Field rendered through the content renderer / 通过渲染器获取的字段
const CONTENT_FIELD: &str = "content";

/// Build the search database for all locales / 为所有语言构建搜索数据库
pub async fn build_database(
    pages: &[Page],
    fields: &[String],
    locale_paths: &[String],
    renderer: &dyn ContentRenderer,
) -> Result<Database, SearchError> {
    let mut all_locale_paths = vec!["/".to_string()];
    for path in locale_paths {
        let path = normalize_locale_path(path);
        if !all_locale_paths.contains(&path) {
            all_locale_paths.push(path);
        }
    }

    let results = try_join_all(
        all_locale_paths
            .iter()
            .map(|locale_path| build_locale(pages, fields, locale_path, &all_locale_paths, renderer)),
    )
    .await?;

    let mut db = Database::new();
    for (locale_path, records) in all_locale_paths.iter().zip(results) {
        let locale = locale_key(locale_path);
        tracing::debug!("Search index for locale {}: {} records", locale, records.len());
        db.insert(locale, records);
    }

    Ok(db)
}

/// Records of a single locale / 单个语言的索引记录
async fn build_locale(
    pages: &[Page],
    fields: &[String],
    locale_path: &str,
    all_locale_paths: &[String],
    renderer: &dyn ContentRenderer,
) -> Result<Vec<IndexRecord>, SearchError> {
    let visible = pages.iter().filter(|page| {
        !page.draft
            && page.page_type.as_deref().is_some_and(|t| !t.is_empty())
            && matched_locale_path(&page.permalink, all_locale_paths) == locale_path
    });

    try_join_all(visible.map(|page| project_page(page, fields, renderer))).await
}

/// Project the configured fields off a page / 提取页面的索引字段
async fn project_page(
    page: &Page,
    fields: &[String],
    renderer: &dyn ContentRenderer,
) -> Result<IndexRecord, SearchError> {
    let mut record = IndexRecord::new();

    for field in fields {
        if field == CONTENT_FIELD {
            let content = renderer
                .render_page_content(&page.permalink)
                .await
                .map_err(|e| SearchError::Render {
                    permalink: page.permalink.clone(),
                    message: format!("{:#}", e),
                })?;
            record.insert(CONTENT_FIELD, content);
        } else if let Some(value) = page.field(field) {
            record.insert(field.as_str(), value);
        }
    }

    Ok(record)
}
