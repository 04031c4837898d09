//! Prompt composition for meeting summaries.

use crate::transcript::Transcript;

/// Style rules sent as the first content part of every summarization call.
pub const SYSTEM_PROMPT: &str = "You are an expert meeting notes summarizer and business analyst. \
Your task is to create a comprehensive, well-structured summary that follows the user's specific requirements EXACTLY.

CRITICAL INSTRUCTIONS:
- ALWAYS follow the user's custom instructions precisely
- Use clear, professional formatting with proper headings and bullet points
- Extract and highlight the most important information from the transcript
- Organize information logically and chronologically when relevant
- Include key decisions, action items, deadlines, and responsibilities
- Summarize main discussion points, conclusions, and next steps
- Use business-appropriate language and tone
- Ensure the summary is actionable and easy to understand
- If the user asks for specific format (bullet points, executive summary, etc.), follow that format exactly
- Focus on substance over style - prioritize content that matches the user's requirements";

const TASK_LINE: &str = "TASK: Create a comprehensive summary that follows the custom instructions above EXACTLY. \
Ensure the summary is well-structured, professional, and addresses all requirements specified in the custom instructions.";

/// The two ordered content parts of a summarization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    pub system: String,
    pub user: String,
}

impl ComposedPrompt {
    /// Parts in the order the provider receives them.
    pub fn parts(&self) -> [&str; 2] {
        [&self.system, &self.user]
    }
}

/// Build the system and user prompts. The transcript is passed through untouched.
pub fn compose(transcript: &Transcript, custom_instruction: &str) -> ComposedPrompt {
    let user = format!(
        "CUSTOM INSTRUCTIONS: {}\n\nTRANSCRIPT:\n{}\n\n{}",
        custom_instruction,
        transcript.as_str(),
        TASK_LINE
    );

    ComposedPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}
