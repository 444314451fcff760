use biblio_core::types::RetrievedChunk;

/// Render the grounding prompt for one question.
///
/// Each chunk becomes a `Source:` block; blocks keep the order they were
/// given (the retriever's ranking) and are separated by blank lines. No
/// reordering, deduplication, or truncation happens here. With zero
/// chunks the context states that nothing was found, so the model is
/// still steered toward admitting absence instead of inventing.
pub fn build_prompt(question: &str, chunks: &[RetrievedChunk]) -> String {
    let context = if chunks.is_empty() {
        "No relevant information found.".to_string()
    } else {
        chunks
            .iter()
            .map(|c| format!("Source: {}\n{}", c.source, c.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    };
    format!(
        "You are a Library Management Assistant.\n\
         \n\
         Use ONLY the following library information to answer the question. \
         If the information is not in the provided context, say you don't have that information.\n\
         \n\
         Library Information:\n\
         {context}\n\
         \n\
         Question:\n\
         {question}\n\
         \n\
         Answer:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(score: f32, text: &str, source: &str) -> RetrievedChunk {
        RetrievedChunk { score, text: text.to_string(), source: source.to_string() }
    }

    #[test]
    fn prompt_matches_the_template_exactly() {
        let chunks = vec![chunk(0.9, "Library opens at 9am.", "rules.txt")];
        let prompt = build_prompt("When does the library open?", &chunks);

        assert_eq!(
            prompt,
            "You are a Library Management Assistant.\n\n\
             Use ONLY the following library information to answer the question. \
             If the information is not in the provided context, say you don't have that information.\n\n\
             Library Information:\n\
             Source: rules.txt\n\
             Library opens at 9am.\n\n\
             Question:\n\
             When does the library open?\n\n\
             Answer:"
        );
    }

    #[test]
    fn blocks_keep_retrieval_order_and_blank_line_separation() {
        let chunks = vec![
            chunk(0.9, "first passage", "a.txt"),
            chunk(0.5, "second passage", "b.pdf"),
        ];
        let prompt = build_prompt("q", &chunks);

        let first = prompt.find("Source: a.txt\nfirst passage").expect("first block");
        let second = prompt.find("Source: b.pdf\nsecond passage").expect("second block");
        assert!(first < second, "ranking order is preserved");
        assert!(prompt.contains("first passage\n\nSource: b.pdf"));
    }

    #[test]
    fn empty_context_states_that_nothing_was_found() {
        let prompt = build_prompt("Is anything known?", &[]);

        assert!(prompt.contains("No relevant information found."));
        assert!(prompt.contains("Is anything known?"));
    }

    #[test]
    fn scores_never_leak_into_the_prompt() {
        let chunks = vec![chunk(0.987_654, "text", "s.txt")];
        let prompt = build_prompt("q", &chunks);

        assert!(!prompt.contains("0.987"));
    }
}
