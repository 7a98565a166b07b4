use clap::{Args, Subcommand};
use ss_core::{Article, Result};
use crate::aggregator::{self, Aggregator};
use crate::ranker;

#[derive(Args, Debug)]
pub struct NewsArgs {
    #[command(subcommand)]
    pub command: NewsCommands,
}

#[derive(Subcommand, Debug)]
pub enum NewsCommands {
    /// Latest headlines from one outlet
    Source {
        /// Outlet name as listed by `sources` (e.g. "GMA")
        source: String,
        /// Only keep headlines mentioning this word
        #[arg(short, long)]
        keyword: Option<String>,
    },
    /// Headlines from one outlet ranked against a query
    Search {
        source: String,
        query: String,
        #[arg(short, long, default_value_t = ranker::DEFAULT_THRESHOLD)]
        threshold: f32,
    },
    /// Headlines across every outlet, optionally ranked against a query
    Latest {
        query: Option<String>,
        #[arg(short, long, default_value_t = aggregator::DEFAULT_THRESHOLD)]
        threshold: f32,
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

pub async fn handle_command(args: NewsArgs, aggregator: &Aggregator) -> Result<()> {
    let fetcher = aggregator.fetcher();
    let articles = match args.command {
        NewsCommands::Source { source, keyword } => {
            warn_unknown(aggregator, &source);
            match keyword {
                Some(keyword) => fetcher.fetch_matching(&source, &keyword).await,
                None => fetcher.fetch(&source).await,
            }
        }
        NewsCommands::Search { source, query, threshold } => {
            warn_unknown(aggregator, &source);
            let articles = fetcher.fetch(&source).await;
            aggregator.ranker().rank(articles, &query, threshold).await?
        }
        NewsCommands::Latest { query, threshold, limit } => {
            aggregator
                .collect_limited(query.as_deref(), threshold, limit)
                .await
        }
    };
    print_articles(&articles);
    Ok(())
}

fn warn_unknown(aggregator: &Aggregator, source: &str) {
    let catalog = aggregator.fetcher().catalog();
    if !catalog.contains(source) {
        eprintln!("Unknown source '{}'. Available: {}", source, catalog.names().join(", "));
    }
}

pub fn print_articles(articles: &[Article]) {
    if articles.is_empty() {
        println!("No articles found");
        return;
    }
    for article in articles {
        println!("{}", format_article(article));
    }
    println!("{} articles", articles.len());
}

pub fn format_article(article: &Article) -> String {
    let mut line = format!("📰 [{}] {}", article.source, article.title);
    if let Some(score) = article.similarity {
        line.push_str(&format!(" ({:.2})", score));
    }
    if let Some(published) = article.published_at {
        line.push_str(&format!("\n   🕒 {}", published.format("%Y-%m-%d %H:%M UTC")));
    }
    if !article.link.is_empty() {
        line.push_str(&format!("\n   🔗 {}", article.link));
    }
    line
}
