//! Best-effort fact extraction after a direct exchange.
//!
//! Learning never disturbs the conversation: extraction failures, the
//! "null" sentinel, and persistence failures all end the same way — quietly.

use chorus_llm::{GenerateRequest, TextProvider};
use chorus_store::LearningStore;
use tracing::debug;

use crate::prompts;

/// Extract one key fact from the exchange and persist it, if any.
pub(crate) async fn learn_from_exchange(
    text: &dyn TextProvider,
    learning: &dyn LearningStore,
    user_text: &str,
    assistant_text: &str,
) {
    let prompt = prompts::fact_extraction(user_text, assistant_text);
    let reply = match text.generate(GenerateRequest::new(prompt)).await {
        Ok(reply) => reply,
        Err(e) => {
            debug!(error = %e, "fact extraction failed, nothing learned");
            return;
        }
    };

    let fact = reply.trim();
    if fact.is_empty() || fact.eq_ignore_ascii_case("null") {
        return;
    }
    match learning.create(fact).await {
        Ok(record) => debug!(fact_id = %record.id, "learned fact from exchange"),
        Err(e) => debug!(error = %e, "fact persistence failed, nothing learned"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
