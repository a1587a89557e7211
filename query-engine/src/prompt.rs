//! Prompt builder: wraps a question in the travel-expert instructions.

/// Instruction block placed before the question.
pub const PROMPT_PREAMBLE: &str = "You are an expert travel assistant. Please provide comprehensive, accurate, and well-structured information for the following travel-related question.";

/// Formatting instructions placed after the question.
pub const PROMPT_GUIDELINES: &str = "Please format your response in a clear, organized manner with:
- Bullet points for lists
- Clear sections if needed
- Specific details and requirements
- Any important tips or warnings

Keep the response informative but concise.";

/// Builds the prompt sent to the model. The question is embedded verbatim.
///
/// # Example
/// ```
/// # use query_engine::prompt::build_prompt;
/// let prompt = build_prompt("Best time to visit Japan?");
/// assert!(prompt.contains("Question: Best time to visit Japan?"));
/// ```
pub fn build_prompt(question: &str) -> String {
    format!("{PROMPT_PREAMBLE}\n\nQuestion: {question}\n\n{PROMPT_GUIDELINES}")
}
