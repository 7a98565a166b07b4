use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single feed entry as the assistant sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub source: String,
    pub title: String,
    pub summary: String,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
}

impl Article {
    /// Two articles are the same story iff both title and link match.
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.title, &self.link)
    }

    /// Text used when embedding the article for ranking.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.title, self.summary)
    }
}

/// A slice of a document stored in a vector collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub position: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, link: &str) -> Article {
        Article {
            source: "GMA".to_string(),
            title: title.to_string(),
            summary: "Signal no. 3 raised".to_string(),
            link: link.to_string(),
            published_at: None,
            similarity: None,
        }
    }

    #[test]
    fn test_dedup_key_uses_title_and_link() {
        let a = article("Typhoon hits Luzon", "https://example.ph/a");
        let b = article("Typhoon hits Luzon", "https://example.ph/a");
        let c = article("Typhoon hits Luzon", "https://example.ph/b");
        assert_eq!(a.dedup_key(), b.dedup_key());
        assert_ne!(a.dedup_key(), c.dedup_key());

        // Plain concatenation would make these equal
        let d = article("A", "Bx");
        let e = article("AB", "x");
        assert_ne!(d.dedup_key(), e.dedup_key());
    }

    #[test]
    fn test_similarity_is_skipped_when_absent() {
        let json = serde_json::to_value(article("t", "l")).unwrap();
        assert!(json.get("similarity").is_none());
    }
}
