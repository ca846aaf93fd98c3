//! Minimal block lexer / 简易块级词法分析
//!
//! Recognizes ATX headings, fenced code and paragraphs. Inline content is split
//! into text and link tokens only.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Token, TokenKind};

static ATX_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}(#{1,6})(?:[ \t]+(.*?))?[ \t]*$").unwrap());
static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})").unwrap());
static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\[([^\]]*)\]\(([^)\s]*)(?:\s+"[^"]*")?\)"#).unwrap());

/// Tokenize a markdown document / 对 Markdown 文档进行词法分析
pub fn tokenize(src: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut fence: Option<(String, Vec<&str>)> = None;

    for line in src.lines() {
        if let Some((marker, body)) = fence.as_mut() {
            if closes_fence(line, marker) {
                tokens.push(Token::new(TokenKind::Fence, "code").with_content(body.join("\n")));
                fence = None;
            } else {
                body.push(line);
            }
            continue;
        }

        if let Some(caps) = FENCE.captures(line) {
            flush_paragraph(&mut tokens, &mut paragraph);
            fence = Some((caps[1].to_string(), Vec::new()));
            continue;
        }

        if let Some(caps) = ATX_HEADING.captures(line) {
            flush_paragraph(&mut tokens, &mut paragraph);
            let tag = format!("h{}", caps[1].len());
            let content = strip_closing_sequence(caps.get(2).map(|m| m.as_str()).unwrap_or(""));

            tokens.push(Token::new(TokenKind::HeadingOpen, &tag));
            tokens.push(inline(content));
            tokens.push(Token::new(TokenKind::HeadingClose, &tag));
            continue;
        }

        if line.trim().is_empty() {
            flush_paragraph(&mut tokens, &mut paragraph);
        } else {
            paragraph.push(line.trim());
        }
    }

    // 未闭合的代码块延续到文档末尾
    if let Some((_, body)) = fence {
        tokens.push(Token::new(TokenKind::Fence, "code").with_content(body.join("\n")));
    }
    flush_paragraph(&mut tokens, &mut paragraph);

    tokens
}

fn flush_paragraph(tokens: &mut Vec<Token>, paragraph: &mut Vec<&str>) {
    if paragraph.is_empty() {
        return;
    }
    tokens.push(Token::new(TokenKind::ParagraphOpen, "p"));
    tokens.push(inline(&paragraph.join("\n")));
    tokens.push(Token::new(TokenKind::ParagraphClose, "p"));
    paragraph.clear();
}

/// Closing fence: same char, at least as long, nothing else / 代码块结束标记
fn closes_fence(line: &str, marker: &str) -> bool {
    let trimmed = line.trim();
    let Some(fence_char) = marker.chars().next() else {
        return false;
    };
    let run = trimmed.chars().take_while(|c| *c == fence_char).count();
    run >= marker.len() && run == trimmed.chars().count()
}

/// "Title ##" -> "Title", "##" -> "" / 去除结尾的 # 序列
fn strip_closing_sequence(content: &str) -> &str {
    let trimmed = content.trim_end_matches('#');
    if trimmed.is_empty() {
        ""
    } else if trimmed.len() < content.len() && (trimmed.ends_with(' ') || trimmed.ends_with('\t')) {
        trimmed.trim_end()
    } else {
        content
    }
}

/// Inline token with text/link children / 行内词法单元
fn inline(content: &str) -> Token {
    let mut children = Vec::new();
    let mut last = 0;

    for caps in LINK.captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            children.push(Token::new(TokenKind::Text, "").with_content(&content[last..whole.start()]));
        }

        let mut open = Token::new(TokenKind::LinkOpen, "a");
        open.attrs.push(("href".to_string(), caps[2].to_string()));
        children.push(open);
        children.push(Token::new(TokenKind::Text, "").with_content(&caps[1]));
        children.push(Token::new(TokenKind::LinkClose, "a"));
        last = whole.end();
    }

    if last < content.len() {
        children.push(Token::new(TokenKind::Text, "").with_content(&content[last..]));
    }

    let mut token = Token::new(TokenKind::Inline, "").with_content(content);
    token.children = children;
    token
}
