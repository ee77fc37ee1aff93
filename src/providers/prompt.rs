//! Prompt construction for answer synthesis

use crate::results::SearchHit;

/// Fixed system instruction sent with every completion
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that provides accurate, comprehensive answers based on the search results provided. Follow these guidelines:

1. Format your response in clean Markdown:
   - Use headers (##) for main sections
   - Use bullet points for lists
   - Use bold for emphasis
   - Include code blocks when relevant

2. Structure your response:
   - Start with a brief overview
   - Provide detailed explanations
   - Include relevant examples
   - End with a conclusion if appropriate

3. Source handling:
   - Cite sources naturally within the text
   - Mention source titles/URLs when introducing key information
   - Synthesize information from multiple sources
   - Highlight any conflicting information between sources

4. Quality guidelines:
   - Ensure accuracy and completeness
   - Be clear and concise
   - Maintain objectivity
   - Address all aspects of the query

Analyze the provided content thoroughly and create a well-structured response that effectively answers the query.";

/// Render one hit as a labeled block ending in the delimiter line
fn format_hit(hit: &SearchHit) -> String {
    format!(
        "Source: {}\n\nContent:\n{}\n\nURL: {}\n---\n",
        hit.label(),
        hit.content,
        hit.url
    )
}

/// Build the user message: the query followed by every hit in order
pub fn build_user_prompt(query: &str, hits: &[SearchHit]) -> String {
    let context = hits.iter().map(format_hit).collect::<Vec<_>>().join("\n");
    format!("Query: {}\n\nSearch Results:\n{}", query, context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_layout() {
        let hits = vec![
            SearchHit::new("https://a.example", "Alpha", "first"),
            SearchHit::new("https://b.example", "", "second"),
        ];
        let prompt = build_user_prompt("what is it", &hits);

        assert_eq!(
            prompt,
            "Query: what is it\n\nSearch Results:\n\
             Source: Alpha\n\nContent:\nfirst\n\nURL: https://a.example\n---\n\n\
             Source: https://b.example\n\nContent:\nsecond\n\nURL: https://b.example\n---\n"
        );
    }

    #[test]
    fn test_prompt_without_hits() {
        assert_eq!(build_user_prompt("q", &[]), "Query: q\n\nSearch Results:\n");
    }
}
