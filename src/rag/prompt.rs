//! Grounded prompt construction and response generation.

use super::generation::Generator;

/// Returned when retrieval found nothing to ground an answer on.
pub const NO_CONTEXT_MESSAGE: &str = "I don't have information about that in the resume. \
     Could you ask about experience, skills, or projects?";

/// Returned when the generation provider fails.
pub const GENERATION_FAILED_MESSAGE: &str = "There was an error generating the response.";

/// Assemble the instruction prompt for `query`, grounded in `context`.
pub fn build_prompt(subject: &str, query: &str, context: &[String]) -> String {
    let context_text = context.join("\n\n");

    format!(
        "You are a professional AI assistant representing {subject} based on their resume. \
You answer questions about their background, experience, and skills in a conversational \
manner, speaking on their behalf to a recruiter in the third person.

Key guidelines:
- Be professional but personable
- Refer to {subject} in the third person (e.g., \"They have experience with...\")
- Only discuss information provided in the resume context below
- Never invent facts, employers, dates, or skills that are not in the context
- If asked about something not in the resume, politely redirect to topics you can discuss
- Keep responses concise: 2-4 sentences
- Highlight specific achievements and technologies when relevant

Based on this resume information:

{context_text}

Question: {query}

Please provide a conversational, third-person response about {subject}."
    )
}

/// Answer `query` from `context`, never failing.
///
/// Empty context short-circuits to [`NO_CONTEXT_MESSAGE`] without calling the
/// generator; provider failures collapse to [`GENERATION_FAILED_MESSAGE`].
pub fn respond(generator: &dyn Generator, subject: &str, query: &str, context: &[String]) -> String {
    if context.is_empty() {
        return NO_CONTEXT_MESSAGE.to_string();
    }

    let prompt = build_prompt(subject, query, context);
    log::debug!("Prompt length: {} characters", prompt.len());
    log::info!("Generating response with {}", generator.model());

    match generator.generate_text(&prompt) {
        Ok(text) => {
            let text = text.trim().to_string();
            log::info!("Generated response: {} characters", text.len());
            text
        }
        Err(e) => {
            log::error!("Generation failed: {}", e);
            GENERATION_FAILED_MESSAGE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingGenerator, RecordingGenerator};

    #[test]
    fn test_build_prompt_contains_context_and_question() {
        let context = vec!["Rust, Go".to_string(), "Interned at Acme Corp.".to_string()];
        let prompt = build_prompt("Jane Doe", "What languages?", &context);

        assert!(prompt.contains("representing Jane Doe"));
        assert!(prompt.contains("Rust, Go\n\nInterned at Acme Corp."));
        assert!(prompt.contains("Question: What languages?"));
        assert!(prompt.contains("2-4 sentences"));
        assert!(prompt.contains("Never invent"));
    }

    #[test]
    fn test_empty_context_skips_generator() {
        let generator = RecordingGenerator::new("unused");
        let answer = respond(&generator, "Jane", "Anything?", &[]);
        assert_eq!(answer, NO_CONTEXT_MESSAGE);
        assert!(generator.prompts().is_empty());
    }

    #[test]
    fn test_response_is_trimmed() {
        let generator = RecordingGenerator::new("  She built the billing pipeline.\n");
        let answer = respond(&generator, "Jane", "Work?", &["Billing in Rust".to_string()]);
        assert_eq!(answer, "She built the billing pipeline.");
        assert_eq!(generator.prompts().len(), 1);
        assert!(generator.prompts()[0].contains("Billing in Rust"));
    }

    #[test]
    fn test_generation_failure_returns_fixed_message() {
        let answer = respond(&FailingGenerator, "Jane", "Work?", &["Billing".to_string()]);
        assert_eq!(answer, GENERATION_FAILED_MESSAGE);
    }
}
