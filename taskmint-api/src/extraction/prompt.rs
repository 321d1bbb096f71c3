//! Fixed instruction template for action-item extraction

/// Instructions sent with every transcript. The parser relies on the
/// output format described here.
pub const EXTRACTION_INSTRUCTIONS: &str = "\
You are an AI assistant that analyzes meeting transcripts and extracts actionable tasks.

For each task, you must:
1. Identify clear, specific action items
2. Assign a priority level (high, medium, or low) based on:
   - High: Critical blockers, deadlines within a week, P0 issues
   - Medium: Important but not urgent, standard work items
   - Low: Nice-to-haves, future considerations, backlog items
3. Extract team tags (e.g., Engineering, Marketing, QA, Design) from the context when they are clear
4. Keep each task concise and clear

Return the tasks as a JSON array with this exact format:
[
  {
    \"text\": \"Task description\",
    \"priority\": \"high\" | \"medium\" | \"low\",
    \"tags\": [\"Engineering\", \"Marketing\"]
  }
]

Only return the JSON array, no additional text.";

/// Single-message form: instructions followed by the transcript
pub fn build_prompt(transcript: &str) -> String {
    format!(
        "{}\n\nMeeting Transcript:\n{}",
        EXTRACTION_INSTRUCTIONS, transcript
    )
}
