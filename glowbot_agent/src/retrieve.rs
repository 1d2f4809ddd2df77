//! Retrieval step: knowledge-base search for a tool invocation.

use tracing::{error, info};

use glowbot_core::prompts::{NO_INFORMATION_PREFIX, SEARCH_ERROR_TEXT};
use glowbot_core::DocumentIndex;

/// Execute one retrieval tool call. The query may carry several
/// `;`-separated sub-queries; each gets its own search and its own output
/// block. Never raises past this boundary: backend failures come back as
/// the literal user-safe error string.
pub async fn run_search(index: &dyn DocumentIndex, raw_query: &str, top_k: usize) -> String {
    info!("Knowledge search for query: '{raw_query}'");

    let subqueries: Vec<&str> = raw_query
        .split(';')
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .collect();

    let mut blocks = Vec::with_capacity(subqueries.len());
    for subquery in subqueries {
        match index.search(subquery, top_k).await {
            Ok(docs) if docs.is_empty() => {
                blocks.push(format!("{NO_INFORMATION_PREFIX} {subquery}"));
            }
            Ok(docs) => {
                let text = docs
                    .iter()
                    .map(|doc| format!("[Source: {}]\n{}", doc.source, doc.content))
                    .collect::<Vec<_>>()
                    .join("\n\n");
                blocks.push(text);
            }
            Err(e) => {
                error!("Knowledge search failed for '{subquery}': {e}");
                return SEARCH_ERROR_TEXT.to_string();
            }
        }
    }

    blocks.join("\n\n")
}
