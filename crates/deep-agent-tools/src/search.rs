//! tavily_search tool: web search via the Tavily API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{Tool, ToolContext, ToolOutput};

const TAVILY_URL: &str = "https://api.tavily.com/search";

pub struct TavilySearchTool;

#[derive(Deserialize)]
struct Params {
    query: String,
    #[serde(default)]
    max_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
    #[serde(default)]
    answer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

fn format_results(response: &TavilyResponse) -> String {
    let mut sections = Vec::new();
    if let Some(answer) = &response.answer {
        if !answer.is_empty() {
            sections.push(format!("Answer: {answer}"));
        }
    }
    for (i, r) in response.results.iter().enumerate() {
        sections.push(format!(
            "{}. {}\n   {}\n   {}",
            i + 1,
            r.title,
            r.url,
            r.content
        ));
    }
    if sections.is_empty() {
        "No results found.".to_string()
    } else {
        sections.join("\n\n")
    }
}

#[async_trait]
impl Tool for TavilySearchTool {
    fn name(&self) -> &str {
        "tavily_search"
    }

    fn description(&self) -> &str {
        "Search the web for up-to-date information. Returns ranked results with title, URL, and content snippet."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return (default: 5)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        context: &ToolContext,
    ) -> anyhow::Result<ToolOutput> {
        let p: Params = serde_json::from_value(params)?;
        debug!(query = %p.query, "tavily_search");

        let Some(api_key) = context.config.tavily_api_key() else {
            return Ok(ToolOutput::error(
                "Search is not configured: set TAVILY_API_KEY",
            ));
        };

        let max_results = p
            .max_results
            .unwrap_or_else(|| context.config.search_max_results());

        let response = reqwest::Client::new()
            .post(TAVILY_URL)
            .json(&json!({
                "api_key": api_key,
                "query": p.query,
                "max_results": max_results,
                "include_answer": true,
            }))
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => return Ok(ToolOutput::error(format!("Search request failed: {e}"))),
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Ok(ToolOutput::error(format!(
                "Search API error {status}: {body}"
            )));
        }

        let parsed: TavilyResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => return Ok(ToolOutput::error(format!("Malformed search response: {e}"))),
        };

        Ok(ToolOutput::text(format_results(&parsed)))
    }
}
