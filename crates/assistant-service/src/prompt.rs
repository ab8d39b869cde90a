//! Trigger detection and answer prompts.

use crate::registry::TranscriptLine;

/// The question following `trigger` at the start of `text`.
///
/// `trigger` must be lowercase; the match ignores ASCII case. Returns
/// `None` when the line does not start with the trigger or nothing but
/// whitespace follows it.
#[must_use]
pub fn extract_question<'a>(text: &'a str, trigger: &str) -> Option<&'a str> {
    let prefix = text.get(..trigger.len())?;
    if !prefix.eq_ignore_ascii_case(trigger) {
        return None;
    }

    let question = text.get(trigger.len()..)?.trim();
    (!question.is_empty()).then_some(question)
}

/// Render the transcript as `[speaker] text` lines.
#[must_use]
pub fn render_transcript(transcript: &[TranscriptLine]) -> String {
    transcript
        .iter()
        .map(|line| format!("[{}] {}", line.speaker, line.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt asking the agent to answer `question` from the transcript only.
#[must_use]
pub fn build_prompt(transcript: &[TranscriptLine], question: &str) -> String {
    format!(
        "MEETING TRANSCRIPT:\n{}\n\nQUESTION:\n{question}\n\nAnswer ONLY using the transcript.\nBe short and factual.",
        render_transcript(transcript)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIGGER: &str = "hey assistant";

    fn line(speaker: &str, text: &str) -> TranscriptLine {
        TranscriptLine {
            speaker: speaker.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_extract_question_case_insensitive() {
        assert_eq!(
            extract_question("Hey Assistant what did we decide?", TRIGGER),
            Some("what did we decide?")
        );
        assert_eq!(
            extract_question("HEY ASSISTANT   summarize", TRIGGER),
            Some("summarize")
        );
    }

    #[test]
    fn test_extract_question_requires_prefix() {
        assert_eq!(extract_question("so hey assistant what now", TRIGGER), None);
        assert_eq!(extract_question("hey", TRIGGER), None);
        assert_eq!(extract_question("", TRIGGER), None);
    }

    #[test]
    fn test_extract_question_requires_question() {
        assert_eq!(extract_question("hey assistant", TRIGGER), None);
        assert_eq!(extract_question("Hey assistant   ", TRIGGER), None);
    }

    #[test]
    fn test_extract_question_handles_multibyte_text() {
        // Byte 13 falls inside a multibyte character
        assert_eq!(extract_question("hey assistané", TRIGGER), None);
        assert_eq!(extract_question("héy assistant, hi", TRIGGER), None);
        assert_eq!(
            extract_question("hey assistant ¿qué pasó?", TRIGGER),
            Some("¿qué pasó?")
        );
    }

    #[test]
    fn test_render_transcript() {
        let transcript = vec![line("alice", "Ship on Friday"), line("bob", "Agreed")];
        assert_eq!(
            render_transcript(&transcript),
            "[alice] Ship on Friday\n[bob] Agreed"
        );
        assert_eq!(render_transcript(&[]), "");
    }

    #[test]
    fn test_build_prompt_layout() {
        let transcript = vec![
            line("alice", "Ship on Friday"),
            line("bob", "hey assistant when do we ship?"),
        ];

        let prompt = build_prompt(&transcript, "when do we ship?");

        assert_eq!(
            prompt,
            "MEETING TRANSCRIPT:\n\
             [alice] Ship on Friday\n\
             [bob] hey assistant when do we ship?\n\
             \n\
             QUESTION:\n\
             when do we ship?\n\
             \n\
             Answer ONLY using the transcript.\n\
             Be short and factual."
        );
    }
}
