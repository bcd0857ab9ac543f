//! Context assembly for retrieval-augmented prompts.

use crate::types::SourceMatch;

/// System message for grounded answering
pub const ANSWER_SYSTEM_MESSAGE: &str = "\
You are an expert AI assistant for supply chain intelligence.
Your role is to provide accurate, well-sourced answers to questions about supply chain operations,
procurement, logistics, and related topics.

Guidelines:
- Base your answers strictly on the provided sources
- Cite sources using [Source N] format
- If information is not in the sources, clearly state that
- Be concise but comprehensive
- Use domain-specific terminology appropriately
- Maintain professional standards and confidentiality";

/// Builds citation-labelled context blocks and grounded prompts
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextBuilder;

impl ContextBuilder {
    /// Format sources as numbered `[Source N: <label>]` blocks, numbering
    /// following the order of the slice
    pub fn context_block(sources: &[SourceMatch]) -> String {
        sources
            .iter()
            .enumerate()
            .map(|(i, source)| {
                format!("[Source {}: {}]\n{}\n", i + 1, source.source, source.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Build the grounded-answer prompt for a question and its sources
    pub fn answer_prompt(question: &str, sources: &[SourceMatch]) -> String {
        format!(
            "Context from documents:\n\n{}\n\nQuestion: {}\n\n\
             Please provide a detailed answer based on the context above. Include source citations.",
            Self::context_block(sources),
            question
        )
    }
}
