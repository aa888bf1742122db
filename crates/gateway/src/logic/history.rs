use super::request::ConversationTurn;

/// Placed between the linearized history and the new prompt.
pub const HISTORY_SEPARATOR: &str = "\n\n---\n\n";

/// Flattens caller-supplied history and the new prompt into one context string.
///
/// Each turn renders as `role: content`, one per line, oldest first, then the
/// separator and the prompt. With no history the prompt is returned as is.
pub fn linearize_history(history: &[ConversationTurn], prompt: &str) -> String {
    if history.is_empty() {
        return prompt.to_string();
    }

    let mut context = history
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n");
    context.push_str(HISTORY_SEPARATOR);
    context.push_str(prompt);
    context
}
