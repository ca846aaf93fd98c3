//! Fuzzy search engine - in-memory approximate matching over index records / 模糊搜索引擎
//!
//! A record matches when the query's characters appear in order inside one of
//! its searched fields. Scores (lower is better) / 分数（越小越靠前）:
//! - exact field match: 1
//! - multi-char query: 2 + distance between first and last matched char
//! - single-char query: 2 + position of the match

use serde_json::Value;
use std::borrow::Cow;

use super::schema::IndexRecord;

/// Fuzzy search over a fixed set of records / 固定记录集上的模糊搜索
#[derive(Debug, Clone)]
pub struct FuzzySearch {
    /// Searched records / 被搜索的记录
    haystack: Vec<IndexRecord>,
    /// Searched fields, in priority order / 搜索字段（按优先级）
    keys: Vec<String>,
    /// Sort results by score / 按分数排序
    sort: bool,
    case_sensitive: bool,
}

impl FuzzySearch {
    pub fn new(haystack: Vec<IndexRecord>, keys: Vec<String>) -> Self {
        Self {
            haystack,
            keys,
            sort: false,
            case_sensitive: false,
        }
    }

    pub fn sorted(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    pub fn case_sensitive(mut self, enabled: bool) -> Self {
        self.case_sensitive = enabled;
        self
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.haystack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.haystack.is_empty()
    }

    /// Search records (empty query returns everything) / 搜索（空查询返回全部）
    pub fn search(&self, query: &str) -> Vec<IndexRecord> {
        if query.is_empty() {
            return self.haystack.clone();
        }

        let mut results: Vec<(usize, &IndexRecord)> = Vec::new();
        for item in &self.haystack {
            // 取第一个匹配的字段
            let score = self.keys.iter().find_map(|key| {
                let value = item.value(key)?;
                is_match(&value_text(value), query, self.case_sensitive)
            });
            if let Some(score) = score {
                results.push((score, item));
            }
        }

        if self.sort {
            // 稳定排序，同分保持原顺序
            results.sort_by_key(|(score, _)| *score);
        }

        results.into_iter().map(|(_, item)| item.clone()).collect()
    }
}

fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}

/// Score of a single value, None when it does not match / 单个值的匹配分数
pub fn is_match(item: &str, query: &str, case_sensitive: bool) -> Option<usize> {
    let (item, query) = if case_sensitive {
        (item.to_string(), query.to_string())
    } else {
        (item.to_lowercase(), query.to_lowercase())
    };

    let item_chars: Vec<char> = item.chars().collect();
    let query_chars: Vec<char> = query.chars().collect();

    let indexes = nearest_indexes_for(&item_chars, &query_chars)?;

    if item == query {
        return Some(1);
    }

    if indexes.len() > 1 {
        return Some(2 + (indexes[indexes.len() - 1] - indexes[0]));
    }

    Some(2 + indexes[0])
}

/// Tightest run of query chars inside item / 查询字符在文本中最紧凑的匹配位置
fn nearest_indexes_for(item: &[char], query: &[char]) -> Option<Vec<usize>> {
    let first = *query.first()?;
    let mut best: Option<Vec<usize>> = None;

    for start in item.iter().enumerate().filter(|(_, c)| **c == first).map(|(i, _)| i) {
        let Some(run) = follow_run(item, query, start) else {
            continue;
        };

        let better = match &best {
            None => true,
            Some(current) if run.len() == 1 => run[0] < current[0],
            Some(current) => span(&run) < span(current),
        };
        if better {
            best = Some(run);
        }
    }

    best
}

/// Greedy in-order match starting at `start` / 从 start 开始的顺序匹配
fn follow_run(item: &[char], query: &[char], start: usize) -> Option<Vec<usize>> {
    let mut indexes = vec![start];
    let mut position = start + 1;

    for letter in &query[1..] {
        let offset = item.get(position..)?.iter().position(|c| c == letter)?;
        let index = position + offset;
        indexes.push(index);
        position = index + 1;
    }

    Some(indexes)
}

fn span(indexes: &[usize]) -> usize {
    indexes[indexes.len() - 1] - indexes[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, excerpt: &str) -> IndexRecord {
        let mut record = IndexRecord::new();
        record.insert("title", title);
        record.insert("excerpt", excerpt);
        record
    }

    fn titles(records: &[IndexRecord]) -> Vec<&str> {
        records.iter().map(|r| r.get("title").unwrap()).collect()
    }

    #[test]
    fn test_is_match() {
        assert_eq!(is_match("test", "test", false), Some(1));
        assert_eq!(is_match("Test", "test", false), Some(1));
        assert_eq!(is_match("Test", "test", true), None);
        // t..e..s 跨度 2
        assert_eq!(is_match("testing", "tes", false), Some(4));
        assert_eq!(is_match("hello", "l", false), Some(4));
        assert_eq!(is_match("hello", "hlo", false), Some(6));
        assert_eq!(is_match("hello", "ol", false), None);
        assert_eq!(is_match("", "a", false), None);
    }

    #[test]
    fn test_nearest_run_is_chosen() {
        // "a_b" 在开头跨度 2，后面的 "ab" 跨度 1
        let item: Vec<char> = "a_b ab".chars().collect();
        let query: Vec<char> = "ab".chars().collect();
        assert_eq!(nearest_indexes_for(&item, &query), Some(vec![4, 5]));
    }

    #[test]
    fn test_search_sorted_by_score() {
        let engine = FuzzySearch::new(
            vec![
                record("Getting started with Rust", ""),
                record("Rust", ""),
                record("Release notes", "we now support rust"),
                record("Python", "snakes"),
            ],
            vec!["title".to_string(), "excerpt".to_string()],
        )
        .sorted(true);

        let results = engine.search("rust");
        assert_eq!(titles(&results), vec!["Rust", "Getting started with Rust", "Release notes"]);
    }

    #[test]
    fn test_unsorted_keeps_order() {
        let engine = FuzzySearch::new(
            vec![record("abc rust", ""), record("rust", "")],
            vec!["title".to_string()],
        );
        assert_eq!(titles(&engine.search("rust")), vec!["abc rust", "rust"]);
    }

    #[test]
    fn test_empty_query_returns_all() {
        let engine = FuzzySearch::new(vec![record("a", ""), record("b", "")], vec!["title".to_string()]);
        assert_eq!(engine.search("").len(), 2);
    }

    #[test]
    fn test_unicode_fields() {
        let engine = FuzzySearch::new(vec![record("中文搜索测试", "")], vec!["title".to_string()]).sorted(true);
        assert_eq!(engine.search("搜测").len(), 1);
        assert!(engine.search("测搜").is_empty());
    }
}
