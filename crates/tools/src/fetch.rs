//! `fetch`: retrieve a URL and return its content as text.
//!
//! HTML pages are reduced to readable text: scripts and styles are dropped,
//! headings, links and emphasis become lightweight Markdown, every other tag
//! is stripped. The result is truncated to `max_length` characters.

use async_trait::async_trait;
use deskmind_core::error::ToolError;
use deskmind_core::tool::Tool;
use regex_lite::Regex;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::required_str;

const DEFAULT_MAX_LENGTH: usize = 5000;

pub struct FetchTool {
    client: reqwest::Client,
    timeout: Duration,
}

impl FetchTool {
    pub fn new(timeout: Duration) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("deskmind/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "fetch".into(),
                reason: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client, timeout })
    }

    fn failed(&self, reason: String) -> ToolError {
        ToolError::ExecutionFailed {
            tool_name: self.name().into(),
            reason,
        }
    }
}

#[async_trait]
impl Tool for FetchTool {
    fn name(&self) -> &str {
        "fetch"
    }

    fn description(&self) -> &str {
        "Fetch a URL from the internet and return its content as text. \
         HTML is converted to simplified Markdown."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The http:// or https:// URL to fetch"
                },
                "max_length": {
                    "type": "integer",
                    "description": "Maximum number of characters to return (default 5000)",
                    "default": DEFAULT_MAX_LENGTH
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let url = required_str(&arguments, "url")?;

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ToolError::InvalidArguments(
                "URL must start with http:// or https://".into(),
            ));
        }

        let max_length = match arguments.get("max_length") {
            None | Some(Value::Null) => DEFAULT_MAX_LENGTH,
            Some(v) => v
                .as_u64()
                .filter(|n| *n > 0)
                .map(|n| n as usize)
                .ok_or_else(|| {
                    ToolError::InvalidArguments("'max_length' must be a positive integer".into())
                })?,
        };

        debug!(url, max_length, "Fetching URL");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ToolError::Timeout {
                    tool_name: self.name().into(),
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                self.failed(format!("Request to {url} failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.failed(format!("{url} returned HTTP {}", status.as_u16())));
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("text/html"));

        let body = response
            .text()
            .await
            .map_err(|e| self.failed(format!("Failed to read body of {url}: {e}")))?;

        let text = if is_html || looks_like_html(&body) {
            html_to_markdown(&body)
        } else {
            body
        };

        let total_chars = text.chars().count();
        let truncated = total_chars > max_length;
        let content: String = text.chars().take(max_length).collect();

        Ok(serde_json::json!({
            "url": url,
            "status": status.as_u16(),
            "content": content,
            "truncated": truncated,
        }))
    }
}

fn looks_like_html(body: &str) -> bool {
    let head: String = body.trim_start().chars().take(64).collect::<String>().to_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// Apply one regex replacement; patterns are constant, a bad one is a no-op.
fn replace_all(input: &str, pattern: &str, replacement: &str) -> String {
    match Regex::new(pattern) {
        Ok(re) => re.replace_all(input, replacement).into_owned(),
        Err(_) => input.to_string(),
    }
}

/// Reduce an HTML document to readable Markdown-ish text.
pub fn html_to_markdown(html: &str) -> String {
    let mut result = replace_all(html, r"(?is)<script[^>]*>.*?</script>", "");
    result = replace_all(&result, r"(?is)<style[^>]*>.*?</style>", "");
    result = replace_all(&result, r"(?s)<!--.*?-->", "");

    for level in (1..=6).rev() {
        let pattern = format!(r"(?is)<h{level}[^>]*>(.*?)</h{level}>");
        let replacement = format!("\n{} $1\n", "#".repeat(level));
        result = replace_all(&result, &pattern, &replacement);
    }

    result = replace_all(&result, r"(?is)<p[^>]*>(.*?)</p>", "$1\n\n");
    result = replace_all(
        &result,
        r#"(?is)<a[^>]*href\s*=\s*['"]([^'"]*)['"][^>]*>(.*?)</a>"#,
        "[$2]($1)",
    );
    result = replace_all(&result, r"(?is)<(?:b|strong)[^>]*>(.*?)</(?:b|strong)>", "**$1**");
    result = replace_all(&result, r"(?is)<(?:i|em)[^>]*>(.*?)</(?:i|em)>", "*$1*");
    result = replace_all(&result, r"(?is)<li[^>]*>", "\n- ");
    result = replace_all(&result, r"(?i)<br\s*/?>", "\n");
    result = replace_all(&result, r"<[^>]+>", "");

    result = result
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    result = replace_all(&result, r"[ \t]+\n", "\n");
    result = replace_all(&result, r"\n\s*\n\s*\n+", "\n\n");
    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tool() -> FetchTool {
        FetchTool::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn html_is_reduced_to_text() {
        let html = r#"<html><head><style>body{}</style><script>alert(1)</script></head>
<body><h1>Title</h1><p>Hello <b>world</b> &amp; <a href="https://x.dev">link</a></p></body></html>"#;
        let text = html_to_markdown(html);
        assert!(text.contains("# Title"));
        assert!(text.contains("Hello **world** & [link](https://x.dev)"));
        assert!(!text.contains("alert"));
        assert!(!text.contains("body{}"));
        assert!(!text.contains('<'));
    }

    #[tokio::test]
    async fn rejects_non_http_urls() {
        let err = tool().execute(json!({"url": "file:///etc/passwd"})).await.unwrap_err();
        assert!(err.is_argument_error());
    }

    #[tokio::test]
    async fn missing_url_is_argument_error() {
        let err = tool().execute(json!({})).await.unwrap_err();
        assert!(err.is_argument_error());
    }

    #[tokio::test]
    async fn fetches_html_and_truncates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .set_body_string("<html><body><p>abcdefghij</p></body></html>"),
            )
            .mount(&server)
            .await;

        let result = tool()
            .execute(json!({"url": format!("{}/page", server.uri()), "max_length": 4}))
            .await
            .unwrap();

        assert_eq!(result["content"], "abcd");
        assert_eq!(result["truncated"], true);
        assert_eq!(result["status"], 200);
    }

    #[tokio::test]
    async fn plain_text_passes_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notes.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/plain")
                    .set_body_string("a < b"),
            )
            .mount(&server)
            .await;

        let result = tool()
            .execute(json!({"url": format!("{}/notes.txt", server.uri())}))
            .await
            .unwrap();
        assert_eq!(result["content"], "a < b");
        assert_eq!(result["truncated"], false);
    }

    #[tokio::test]
    async fn http_error_status_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = tool()
            .execute(json!({"url": format!("{}/missing", server.uri())}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
        assert!(err.to_string().contains("404"));
    }
}
