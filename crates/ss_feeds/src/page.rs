use std::time::Duration;
use reqwest::Client;
use scraper::{Html, Selector};
use ss_core::{Error, Result};
use tracing::debug;
use url::Url;
use crate::fetcher::USER_AGENT;

pub const PAGE_TIMEOUT_SECS: u64 = 10;

/// Downloads article pages and keeps the readable paragraph text.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(PAGE_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }

    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let url = Url::parse(url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Extraction(format!("Unsupported URL scheme: {}", url.scheme())));
        }

        let html = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let text = extract_paragraphs(&html)?;
        if text.is_empty() {
            return Err(Error::Extraction(format!("No paragraph text at {}", url)));
        }
        debug!("Extracted {} characters from {}", text.len(), url);
        Ok(text)
    }
}

/// Text of every `<p>` element, trimmed, one per line. Empty paragraphs are skipped.
pub fn extract_paragraphs(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("p")
        .map_err(|e| Error::Extraction(format!("Invalid selector: {}", e)))?;
    Ok(document
        .select(&selector)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn;
    use axum::{http::StatusCode, response::Html as HtmlResponse, routing::get, Router};

    const PAGE: &str = r#"<html><head><title>Typhoon</title><script>var p = "<p>no</p>";</script></head>
<body><nav>Home | News</nav>
<p>  Typhoon Kristine made landfall in Isabela. </p>
<div><p>Signal no. 4 was raised over <a href="/cagayan">Cagayan</a>.</p></div>
<p>   </p>
</body></html>"#;

    #[test]
    fn test_extract_paragraphs() {
        assert_eq!(
            extract_paragraphs(PAGE).unwrap(),
            "Typhoon Kristine made landfall in Isabela.\nSignal no. 4 was raised over Cagayan."
        );
        assert_eq!(extract_paragraphs("<div>no paragraphs</div>").unwrap(), "");
    }

    #[tokio::test]
    async fn test_fetch_text() {
        let app = Router::new()
            .route("/article", get(|| async { HtmlResponse(PAGE) }))
            .route("/empty", get(|| async { HtmlResponse("<div>Subscribe</div>") }))
            .route("/gone", get(|| async { StatusCode::NOT_FOUND }));
        let base = spawn(app).await;
        let pages = PageFetcher::new().unwrap();

        let text = pages.fetch_text(&format!("{}/article", base)).await.unwrap();
        assert!(text.starts_with("Typhoon Kristine"));

        assert!(matches!(
            pages.fetch_text(&format!("{}/empty", base)).await,
            Err(Error::Extraction(_))
        ));
        assert!(matches!(pages.fetch_text(&format!("{}/gone", base)).await, Err(Error::Http(_))));
    }

    #[tokio::test]
    async fn test_malformed_urls() {
        let pages = PageFetcher::new().unwrap();
        assert!(matches!(pages.fetch_text("not a url").await, Err(Error::InvalidUrl(_))));
        assert!(matches!(pages.fetch_text("ftp://example.ph/a").await, Err(Error::Extraction(_))));
    }
}
