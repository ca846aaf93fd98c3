//! Markdown headings extraction / Markdown 标题提取
//!
//! Collects `{text, slug}` for every heading of a document into
//! `MarkdownEnv::markdown_headings`.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{CoreRule, MarkdownEnv, Token, TokenKind};

/// Slug generation function / 锚点生成函数
pub type Slugify = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Extracted heading / 提取出的标题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub text: String,
    pub slug: String,
}

impl Heading {
    pub fn new(text: &str, slug: &str) -> Self {
        Self {
            text: text.to_string(),
            slug: slug.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct HeadingsOptions {
    /// Extract headings unless a document opts out / 默认是否提取标题
    pub inject_markdown_headings: bool,
    pub slugify: Slugify,
}

impl Default for HeadingsOptions {
    fn default() -> Self {
        Self {
            inject_markdown_headings: false,
            slugify: Arc::new(slugify),
        }
    }
}

/// Headings core rule / 标题提取规则
pub struct MarkdownHeadings {
    options: HeadingsOptions,
}

impl MarkdownHeadings {
    pub fn new(options: HeadingsOptions) -> Self {
        Self { options }
    }

    /// Per-document override wins over the global option / 单文档设置优先
    fn enabled(&self, env: &MarkdownEnv) -> bool {
        env.inject_markdown_headings
            .unwrap_or(self.options.inject_markdown_headings)
    }
}

impl CoreRule for MarkdownHeadings {
    fn name(&self) -> &str {
        "md_headings"
    }

    fn run(&self, tokens: &mut Vec<Token>, env: &mut MarkdownEnv) {
        let headings = if self.enabled(env) {
            extract_headings(tokens, self.options.slugify.as_ref())
        } else {
            Vec::new()
        };
        env.markdown_headings = Some(headings);
    }
}

/// Collect headings from a token stream / 从词法单元流中收集标题
pub fn extract_headings(tokens: &[Token], slugify: &(dyn Fn(&str) -> String + Send + Sync)) -> Vec<Heading> {
    tokens
        .windows(2)
        .filter(|pair| pair[1].kind == TokenKind::HeadingClose && pair[0].kind == TokenKind::Inline)
        .map(|pair| {
            let heading = &pair[0];
            // 标题内含链接时取链接文本
            let text = match heading.children.first() {
                Some(first) if first.kind == TokenKind::LinkOpen => heading
                    .children
                    .get(1)
                    .map(|t| t.content.clone())
                    .unwrap_or_default(),
                _ => heading.content.clone(),
            };
            let slug = slugify(&text);
            Heading { text, slug }
        })
        .collect()
}

/// Default slugify: transliterate, drop unsafe chars, dash-join, lowercase / 默认锚点生成
pub fn slugify(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for c in text.chars() {
        let mapped = transliterate(c);
        for m in mapped.chars() {
            let m = if m == '-' { ' ' } else { m };
            if is_slug_char(m) {
                cleaned.push(m);
            }
        }
    }

    let mut slug = String::with_capacity(cleaned.len());
    let mut in_separator = false;
    for c in cleaned.trim().chars() {
        if c.is_whitespace() {
            in_separator = true;
            continue;
        }
        if in_separator {
            slug.push('-');
            in_separator = false;
        }
        slug.push(c);
    }

    slug.to_lowercase()
}

fn is_slug_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace() || "_$*+~.()'\"!:@".contains(c)
}

/// 常用字符转写
fn transliterate(c: char) -> String {
    let s = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => "a",
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' => "A",
        'ç' | 'ć' | 'č' => "c",
        'Ç' | 'Ć' | 'Č' => "C",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => "e",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ę' | 'Ě' => "E",
        'ì' | 'í' | 'î' | 'ï' | 'ī' => "i",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' => "I",
        'ñ' | 'ń' | 'ň' => "n",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => "o",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' => "O",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' => "u",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' => "U",
        'ý' | 'ÿ' => "y",
        'Ý' | 'Ÿ' => "Y",
        'ś' | 'š' => "s",
        'Ś' | 'Š' => "S",
        'ź' | 'ż' | 'ž' => "z",
        'Ź' | 'Ż' | 'Ž' => "Z",
        'ł' => "l",
        'Ł' => "L",
        'ß' => "ss",
        'æ' => "ae",
        'Æ' => "AE",
        'œ' => "oe",
        'Œ' => "OE",
        '&' => "and",
        '|' => "or",
        '<' => "less",
        '>' => "greater",
        '%' => "percent",
        '$' => "dollar",
        '€' => "euro",
        '£' => "pound",
        '¥' => "yen",
        '©' => "(c)",
        '®' => "(r)",
        '™' => "tm",
        _ => return c.to_string(),
    };
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::Markdown;

    fn markdown(options: HeadingsOptions) -> Markdown {
        let mut md = Markdown::new();
        md.push_rule(Box::new(MarkdownHeadings::new(options)));
        md
    }

    fn enabled() -> HeadingsOptions {
        HeadingsOptions {
            inject_markdown_headings: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_extract_headings() {
        let mut env = MarkdownEnv::default();
        markdown(enabled()).parse("# Intro\n\ntext\n\n## Getting Started\n", &mut env);

        assert_eq!(
            env.markdown_headings.unwrap(),
            vec![Heading::new("Intro", "intro"), Heading::new("Getting Started", "getting-started")]
        );
    }

    #[test]
    fn test_heading_with_link_uses_link_text() {
        let mut env = MarkdownEnv::default();
        markdown(enabled()).parse("## [API Reference](/api)", &mut env);
        assert_eq!(env.markdown_headings.unwrap(), vec![Heading::new("API Reference", "api-reference")]);
    }

    #[test]
    fn test_disabled_by_default() {
        let mut env = MarkdownEnv::default();
        markdown(HeadingsOptions::default()).parse("# Intro", &mut env);
        assert_eq!(env.markdown_headings, Some(Vec::new()));
    }

    #[test]
    fn test_document_override() {
        // 文档开启，全局关闭
        let mut env = MarkdownEnv { inject_markdown_headings: Some(true), ..Default::default() };
        markdown(HeadingsOptions::default()).parse("# Intro", &mut env);
        assert_eq!(env.markdown_headings.unwrap().len(), 1);

        // 文档关闭，全局开启
        let mut env = MarkdownEnv { inject_markdown_headings: Some(false), ..Default::default() };
        markdown(enabled()).parse("# Intro", &mut env);
        assert_eq!(env.markdown_headings, Some(Vec::new()));
    }

    #[test]
    fn test_custom_slugify() {
        let options = HeadingsOptions {
            inject_markdown_headings: true,
            slugify: Arc::new(|text: &str| text.replace(' ', "_").to_uppercase()),
        };
        let mut env = MarkdownEnv::default();
        markdown(options).parse("### Hello World", &mut env);
        assert_eq!(env.markdown_headings.unwrap(), vec![Heading::new("Hello World", "HELLO_WORLD")]);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Getting Started"), "getting-started");
        assert_eq!(slugify("  Hello,   World! "), "hello-world!");
        assert_eq!(slugify("Tom & Jerry"), "tom-and-jerry");
        assert_eq!(slugify("Crème Brûlée"), "creme-brulee");
        assert_eq!(slugify("a - b -- c"), "a-b-c");
        assert_eq!(slugify("中文标题"), "");
    }
}
