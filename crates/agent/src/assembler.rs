//! Prompt assembly.
//!
//! The prompt sent to the model is always, in order:
//!
//! 1. **System** — exactly one directive
//! 2. **History** — the caller's window, untouched
//! 3. **User** — the current utterance, verbatim
//!
//! Nothing is reordered, deduplicated, trimmed, or rewritten.

use dfbridge_core::history::HistoryWindow;
use dfbridge_core::message::Turn;

/// Directive used when no override is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "Eres un asistente útil, claro y conciso. Responde en español neutro.";

/// Build the full message list for one completion call.
pub fn assemble_prompt(system_prompt: &str, history: &HistoryWindow, utterance: &str) -> Vec<Turn> {
    let mut prompt = Vec::with_capacity(history.len() + 2);
    prompt.push(Turn::system(system_prompt));
    prompt.extend_from_slice(history.turns());
    prompt.push(Turn::user(utterance));
    prompt
}
