//! DuckDuckGo Instant Answer Client
//!
//! `GET {base}/?q=...&format=json` returns an abstract, a list of direct
//! results and a tree of related topics. All three are flattened into hits.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{SearchClient, SearchHit, UserLocation};
use crate::error::{Result, ToolError};

pub const DEFAULT_BASE_URL: &str = "https://api.duckduckgo.com";

#[derive(Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default)]
    results: Vec<Topic>,
    #[serde(default)]
    related_topics: Vec<Topic>,
}

/// Either a leaf result or a named group of further topics
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Topic {
    #[serde(default)]
    text: String,
    #[serde(default, rename = "FirstURL")]
    first_url: String,
    #[serde(default)]
    topics: Vec<Topic>,
}

pub struct DuckDuckGoClient {
    client: Client,
    base_url: String,
}

impl DuckDuckGoClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("agent-devui/0.1")
            .build()
            .map_err(|e| ToolError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

fn topic_hit(topic: &Topic) -> Option<SearchHit> {
    if topic.first_url.is_empty() || topic.text.is_empty() {
        return None;
    }

    // Text reads "Title - description"; keep the first part as the title
    let (title, snippet) = match topic.text.split_once(" - ") {
        Some((title, rest)) => (title.trim(), rest.trim()),
        None => (topic.text.trim(), topic.text.trim()),
    };

    Some(SearchHit {
        title: title.to_string(),
        url: topic.first_url.clone(),
        snippet: snippet.to_string(),
    })
}

fn flatten<'a>(topics: &'a [Topic], out: &mut Vec<&'a Topic>) {
    for topic in topics {
        if topic.topics.is_empty() {
            out.push(topic);
        } else {
            flatten(&topic.topics, out);
        }
    }
}

fn hits_from(answer: &InstantAnswer, limit: usize) -> Vec<SearchHit> {
    let mut hits = Vec::new();

    if !answer.abstract_text.is_empty() && !answer.abstract_url.is_empty() {
        hits.push(SearchHit {
            title: if answer.heading.is_empty() {
                answer.abstract_url.clone()
            } else {
                answer.heading.clone()
            },
            url: answer.abstract_url.clone(),
            snippet: answer.abstract_text.clone(),
        });
    }

    let mut topics = Vec::new();
    flatten(&answer.results, &mut topics);
    flatten(&answer.related_topics, &mut topics);

    for hit in topics.into_iter().filter_map(topic_hit) {
        if !hits.iter().any(|h: &SearchHit| h.url == hit.url) {
            hits.push(hit);
        }
    }

    hits.truncate(limit);
    hits
}

#[async_trait]
impl SearchClient for DuckDuckGoClient {
    async fn search(&self, query: &str, location: &UserLocation, limit: usize) -> Result<Vec<SearchHit>> {
        let url = format!("{}/", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
                ("kl", location.region()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        // An empty body means no instant answer for the query
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let answer: InstantAnswer = serde_json::from_str(&body)?;
        Ok(hits_from(&answer, limit))
    }

    fn name(&self) -> &str {
        "DuckDuckGo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "Heading": "Rust (programming language)",
        "AbstractText": "Rust is a general-purpose programming language.",
        "AbstractURL": "https://en.wikipedia.org/wiki/Rust_(programming_language)",
        "Results": [
            {"Text": "Official site - Rust Programming Language", "FirstURL": "https://www.rust-lang.org/"}
        ],
        "RelatedTopics": [
            {"Text": "Cargo - The Rust package manager", "FirstURL": "https://doc.rust-lang.org/cargo/"},
            {"Name": "See also", "Topics": [
                {"Text": "Ferris - Unofficial mascot", "FirstURL": "https://rustacean.net/"},
                {"Text": "Duplicate", "FirstURL": "https://www.rust-lang.org/"}
            ]}
        ]
    }"#;

    #[test]
    fn test_flattens_abstract_results_and_topics() {
        let answer: InstantAnswer = serde_json::from_str(BODY).unwrap();
        let hits = hits_from(&answer, 10);

        assert_eq!(hits.len(), 4);
        assert_eq!(hits[0].title, "Rust (programming language)");
        assert_eq!(hits[1].title, "Official site");
        assert_eq!(hits[1].snippet, "Rust Programming Language");
        assert_eq!(hits[3].url, "https://rustacean.net/");
    }

    #[test]
    fn test_limit() {
        let answer: InstantAnswer = serde_json::from_str(BODY).unwrap();
        assert_eq!(hits_from(&answer, 2).len(), 2);
    }

    #[test]
    fn test_empty_answer() {
        let answer = InstantAnswer::default();
        assert!(hits_from(&answer, 5).is_empty());
    }
}
