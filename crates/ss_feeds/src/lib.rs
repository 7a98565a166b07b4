pub mod aggregator;
pub mod catalog;
pub mod cli;
pub mod fetcher;
pub mod logging;
pub mod page;
pub mod ranker;

pub use aggregator::Aggregator;
pub use catalog::{Source, SourceCatalog};
pub use cli::{handle_command, NewsArgs, NewsCommands};
pub use fetcher::FeedFetcher;
pub use logging::{init_logging, Logger};
pub use page::PageFetcher;
pub use ranker::EmbeddingRanker;

pub mod prelude {
    pub use super::{Aggregator, EmbeddingRanker, FeedFetcher, PageFetcher, Source, SourceCatalog};
    pub use ss_core::{Article, Error, Result};
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::{http::header::CONTENT_TYPE, routing::get, routing::MethodRouter};

    pub use ss_core::test_utils::spawn;

    #[derive(Clone)]
    pub struct Item {
        title: String,
        link: String,
        description: String,
    }

    impl Item {
        pub fn new(title: &str, link: &str, description: &str) -> Self {
            Self {
                title: title.to_string(),
                link: link.to_string(),
                description: description.to_string(),
            }
        }
    }

    pub fn rss(items: &[Item]) -> String {
        let items: String = items
            .iter()
            .map(|item| {
                format!(
                    "<item><title>{}</title><link>{}</link><description><![CDATA[{}]]></description>\
                     <pubDate>Thu, 24 Oct 2024 08:00:00 +0800</pubDate></item>",
                    item.title, item.link, item.description
                )
            })
            .collect();
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <rss version=\"2.0\"><channel><title>Test feed</title><link>http://localhost</link>\
             <description>Test</description>{}</channel></rss>",
            items
        )
    }

    pub fn feed_route(xml: String) -> MethodRouter {
        get(move || {
            let xml = xml.clone();
            async move { ([(CONTENT_TYPE, "application/rss+xml")], xml) }
        })
    }
}
