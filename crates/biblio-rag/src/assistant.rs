use anyhow::Result;
use tracing::debug;

use biblio_core::traits::CompletionClient;
use biblio_core::types::RetrievedChunk;

use crate::kb::KnowledgeBase;
use crate::prompt::build_prompt;

/// A completed question/answer turn: the model's reply plus the
/// passages it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub context: Vec<RetrievedChunk>,
}

/// Ties a knowledge base to a completion backend. Holds no per-question
/// state, so one assistant serves any number of sequential questions.
pub struct Assistant {
    kb: KnowledgeBase,
    llm: Box<dyn CompletionClient>,
    top_k: usize,
}

impl Assistant {
    pub fn new(kb: KnowledgeBase, llm: Box<dyn CompletionClient>, top_k: usize) -> Self {
        Self { kb, llm, top_k }
    }

    /// Retrieve grounding passages, build the prompt, ask the model.
    /// With an empty knowledge base the prompt states that nothing was
    /// found and the model answers from that.
    pub fn answer(&self, question: &str) -> Result<Answer> {
        let context = self.kb.retrieve(question, self.top_k)?;
        debug!(question, hits = context.len(), "retrieved grounding context");
        let prompt = build_prompt(question, &context);
        let text = self.llm.complete(&prompt)?;
        Ok(Answer { text, context })
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }
}
