//! Markdown processing - token stream + core rules / Markdown 处理
//!
//! The lexer produces a flat block-level token stream with inline children,
//! then every registered core rule runs over it in registration order.

pub mod headings;
pub mod lexer;

use serde::Serialize;

pub use headings::{slugify, Heading, HeadingsOptions, MarkdownHeadings, Slugify};

/// Token kind / 词法单元类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    HeadingOpen,
    HeadingClose,
    ParagraphOpen,
    ParagraphClose,
    Fence,
    Inline,
    Text,
    LinkOpen,
    LinkClose,
}

/// Markdown token / Markdown 词法单元
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// HTML tag, e.g. "h2" / 对应的 HTML 标签
    pub tag: String,
    pub content: String,
    pub attrs: Vec<(String, String)>,
    /// Inline children (only for `Inline`) / 行内子节点
    pub children: Vec<Token>,
}

impl Token {
    pub fn new(kind: TokenKind, tag: &str) -> Self {
        Self {
            kind,
            tag: tag.to_string(),
            content: String::new(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

/// Per-document environment / 单文档环境
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownEnv {
    /// Per-document override of heading extraction / 单文档覆盖标题提取开关
    pub inject_markdown_headings: Option<bool>,
    /// Extracted headings / 提取出的标题
    pub markdown_headings: Option<Vec<Heading>>,
}

/// Core rule run after tokenizing / 词法分析后执行的核心规则
pub trait CoreRule: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, tokens: &mut Vec<Token>, env: &mut MarkdownEnv);
}

/// Markdown processor / Markdown 处理器
#[derive(Default)]
pub struct Markdown {
    rules: Vec<Box<dyn CoreRule>>,
}

impl Markdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a core rule / 追加核心规则
    pub fn push_rule(&mut self, rule: Box<dyn CoreRule>) -> &mut Self {
        tracing::debug!("Markdown core rule registered: {}", rule.name());
        self.rules.push(rule);
        self
    }

    /// Tokenize a document and run every core rule / 解析文档并执行核心规则
    pub fn parse(&self, src: &str, env: &mut MarkdownEnv) -> Vec<Token> {
        let mut tokens = lexer::tokenize(src);
        for rule in &self.rules {
            rule.run(&mut tokens, env);
        }
        tokens
    }
}
