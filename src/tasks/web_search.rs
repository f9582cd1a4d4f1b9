//! Web 搜索任务：DuckDuckGo HTML 端点，返回带来源链接的编号结果列表
//!
//! 结果标题 / 摘要经 html2text 转为纯文本（解码全部实体）；DuckDuckGo 的跳转链接（/l/?uddg=）还原为真实 URL。

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use html2text::render::TrivialDecorator;
use regex::Regex;
use reqwest::{Client, Url};

use super::Resolver;
use crate::config::WebSearchSection;
use crate::core::TaskError;

pub const NAME: &str = "Web Search";

pub const DESCRIPTION: &str = "Search the web and return a concise set of relevant results and source links. \
    Designed to extract and surface factual snippets, authoritative references, and URLs that support user queries. \
    Input: user information request or question. Output: a ranked list of short snippets with source URLs. \
    Edge cases: ambiguous queries, requests for personal data or paid content.";

const NO_RESULTS: &str = "No results found for your query.";

/// 足够宽，片段不会被折行
const RENDER_WIDTH: usize = 10_000;

static TITLE_RE: OnceLock<Regex> = OnceLock::new();
static SNIPPET_RE: OnceLock<Regex> = OnceLock::new();

fn title_re() -> &'static Regex {
    TITLE_RE.get_or_init(|| {
        Regex::new(r#"(?s)<a[^>]*class="result__a"[^>]*href="([^"]+)"[^>]*>(.*?)</a>"#).unwrap()
    })
}

fn snippet_re() -> &'static Regex {
    SNIPPET_RE.get_or_init(|| {
        Regex::new(r#"(?s)class="result__snippet"[^>]*>(.*?)</a>"#).unwrap()
    })
}

/// 单条搜索结果
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// 简易去除 HTML 标签（html2text 失败时的回退）
fn strip_html_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// HTML 片段转单行纯文本：html2text 解码全部实体，TrivialDecorator 不加任何强调标记
fn fragment_text(html: &str) -> String {
    let text = match html2text::from_read_with_decorator(
        html.as_bytes(),
        RENDER_WIDTH,
        TrivialDecorator::new(),
    ) {
        Ok(text) if !text.trim().is_empty() => text,
        _ => strip_html_tags(html),
    };
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 还原 DuckDuckGo 跳转链接；普通链接原样返回
fn resolve_href(href: &str) -> String {
    // 属性值里的 &amp; 等实体先解码
    let href = fragment_text(href);
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href
    };
    Url::parse(&absolute)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or(absolute)
}

/// 从结果页 HTML 中解析前 max 条结果；每条的摘要只在该条与下一条标题之间查找
pub fn parse_results(html: &str, max: usize) -> Vec<SearchHit> {
    let titles: Vec<_> = title_re().captures_iter(html).collect();
    let mut hits = Vec::new();
    for (i, cap) in titles.iter().enumerate().take(max) {
        let Some(whole) = cap.get(0) else { continue };
        let end = titles
            .get(i + 1)
            .and_then(|c| c.get(0))
            .map(|m| m.start())
            .unwrap_or(html.len());
        let snippet = snippet_re()
            .captures(&html[whole.end()..end])
            .map(|c| fragment_text(&c[1]))
            .unwrap_or_default();
        let title = fragment_text(&cap[2]);
        hits.push(SearchHit {
            title: if title.is_empty() { "No title".into() } else { title },
            url: resolve_href(&cap[1]),
            snippet,
        });
    }
    hits
}

/// 格式化为编号列表；摘要超过 snippet_chars 个字符时截断并追加 ...
pub fn format_results(hits: &[SearchHit], snippet_chars: usize) -> String {
    if hits.is_empty() {
        return NO_RESULTS.to_string();
    }
    let items: Vec<String> = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            let mut snippet: String = hit.snippet.chars().take(snippet_chars).collect();
            if hit.snippet.chars().count() > snippet_chars {
                snippet.push_str("...");
            }
            format!("{}. {}\n   URL: {}\n   {}", i + 1, hit.title, hit.url, snippet)
        })
        .collect();
    format!("Here are some relevant links:\n\n{}", items.join("\n\n"))
}

/// Web 搜索解析器
pub struct WebSearchResolver {
    client: Client,
    endpoint: String,
    max_results: usize,
    snippet_chars: usize,
}

impl WebSearchResolver {
    pub fn new(section: &WebSearchSection) -> Result<Self, TaskError> {
        const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
        let client = Client::builder()
            .timeout(Duration::from_secs(section.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            endpoint: section.endpoint.clone(),
            max_results: section.max_results,
            snippet_chars: section.snippet_chars,
        })
    }
}

#[async_trait]
impl Resolver<String> for WebSearchResolver {
    async fn resolve(&self, query: &str) -> Result<String, TaskError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(TaskError::InvalidInput("empty search query".into()));
        }
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await?
            .error_for_status()?;
        let html = resp.text().await?;
        let hits = parse_results(&html, self.max_results);
        tracing::debug!(hits = hits.len(), "web search");
        Ok(format_results(&hits, self.snippet_chars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<div class="result results_links">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fdoc.rust-lang.org%2Fbook%2F&amp;rut=abc">The Rust <b>Book</b></a>
  </h2>
  <a class="result__snippet" href="//duckduckgo.com/l/?uddg=x">Learn <b>Rust</b> from the official book.</a>
</div>
<div class="result results_links">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="https://crates.io/">crates.io</a>
  </h2>
</div>
<div class="result results_links">
  <a rel="nofollow" class="result__a" href="https://example.com/3">Third</a>
  <a class="result__snippet" href="https://example.com/3">Third snippet</a>
</div>
"#;

    #[test]
    fn test_parse_results() {
        let hits = parse_results(PAGE, 5);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].title, "The Rust Book");
        assert_eq!(hits[0].url, "https://doc.rust-lang.org/book/");
        assert_eq!(hits[0].snippet, "Learn Rust from the official book.");
        // 第二条没有摘要，不能借用第三条的
        assert_eq!(hits[1].url, "https://crates.io/");
        assert_eq!(hits[1].snippet, "");
        assert_eq!(hits[2].snippet, "Third snippet");
    }

    #[test]
    fn test_fragment_text_decodes_entities() {
        assert_eq!(fragment_text("Tom &amp; <b>Jerry</b>&#x27;s  \n show"), "Tom & Jerry's show");
        assert_eq!(
            fragment_text("It&#8217;s fast &hellip; &mdash; caf&eacute; &#233;"),
            "It\u{2019}s fast \u{2026} \u{2014} caf\u{e9} \u{e9}"
        );
        // 强调标签不留下 markdown 标记
        assert_eq!(fragment_text("<b>bold</b> and <em>em</em>"), "bold and em");
    }

    #[test]
    fn test_href_entities_decoded() {
        let html = r#"<a class="result__a" href="https://a.com/?x=1&amp;y=2">A</a>"#;
        let hits = parse_results(html, 5);
        assert_eq!(hits[0].url, "https://a.com/?x=1&y=2");
        assert_eq!(resolve_href("https://b.org/p"), "https://b.org/p");
    }

    #[test]
    fn test_parse_respects_max() {
        assert_eq!(parse_results(PAGE, 1).len(), 1);
        assert!(parse_results("<html></html>", 5).is_empty());
    }

    #[test]
    fn test_format_results() {
        let hits = vec![SearchHit {
            title: "T".into(),
            url: "https://a.b/".into(),
            snippet: "x".repeat(160),
        }];
        let out = format_results(&hits, 150);
        assert!(out.starts_with("Here are some relevant links:\n\n1. T\n   URL: https://a.b/\n   "));
        assert!(out.ends_with(&format!("{}...", "x".repeat(150))));
        assert_eq!(format_results(&[], 150), NO_RESULTS);
    }
}
