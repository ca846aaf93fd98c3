/// Path and text utility functions / 路径与文本工具函数

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->|<[^>]*>").unwrap());
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap());

/// Normalize a locale path / 规范化语言路径
/// 1. Ensure path starts with / / 确保以 / 开头
/// 2. Ensure path ends with / / 确保以 / 结尾
/// 3. Collapse duplicate / / 合并重复的 /
pub fn normalize_locale_path(path: &str) -> String {
    let parts: Vec<&str> = path
        .split('/')
        .filter(|p| !p.is_empty() && *p != ".")
        .collect();

    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", parts.join("/"))
    }
}

/// Find the locale path a permalink belongs to (longest prefix wins) / 查找页面所属的语言路径
///
/// Returns "/" when no configured locale path matches / 无匹配时返回 "/"
pub fn matched_locale_path<'a, I>(permalink: &str, locale_paths: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    let mut best_match: Option<String> = None;

    for locale_path in locale_paths {
        let locale = normalize_locale_path(locale_path);
        if locale == "/" {
            continue;
        }

        let matched = permalink.starts_with(&locale) || permalink == locale.trim_end_matches('/');
        if matched && best_match.as_ref().map(|m| m.len()).unwrap_or(0) < locale.len() {
            best_match = Some(locale);
        }
    }

    best_match.unwrap_or_else(|| "/".to_string())
}

/// Locale path -> locale key used in file names and URLs / 语言路径转换为索引键
/// "/" -> "default", "/zh/" -> "zh"
pub fn locale_key(locale_path: &str) -> String {
    let trimmed = locale_path.trim_matches('/');
    if trimmed.is_empty() {
        "default".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Strip HTML markup and return the trimmed text content / 去除HTML标签，返回纯文本
pub fn strip_tags(html: &str) -> String {
    let text = TAG_RE.replace_all(html, "");
    decode_entities(&text).trim().to_string()
}

/// Decode common HTML entities / 解码常见HTML实体
pub fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    "copy" => Some('©'),
                    "hellip" => Some('…'),
                    "mdash" => Some('—'),
                    "ndash" => Some('–'),
                    _ => None,
                }
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
