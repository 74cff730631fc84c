//! The bounded window of prior turns carried across requests by the caller.
//!
//! The bridge never stores this window. It arrives inside the Dialogflow
//! context, grows by one user/assistant exchange, is cut back to
//! [`MAX_TURNS`], and leaves again in the response.

use serde::{Deserialize, Serialize};

use crate::message::Turn;

/// Maximum number of turns kept in the window (six exchanges).
pub const MAX_TURNS: usize = 12;

/// Ordered turns, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryWindow(Vec<Turn>);

impl HistoryWindow {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.0
    }

    /// Append one exchange and keep only the newest [`MAX_TURNS`] entries.
    pub fn push_exchange(self, user: Turn, assistant: Turn) -> Self {
        let mut turns = self.0;
        turns.reserve(2);
        turns.push(user);
        turns.push(assistant);
        Self(turns).truncate_to(MAX_TURNS)
    }

    /// Drop turns from the oldest end until at most `max` remain.
    pub fn truncate_to(self, max: usize) -> Self {
        let mut turns = self.0;
        if turns.len() > max {
            let excess = turns.len() - max;
            turns.drain(..excess);
        }
        Self(turns)
    }
}

impl From<Vec<Turn>> for HistoryWindow {
    fn from(turns: Vec<Turn>) -> Self {
        Self(turns)
    }
}

impl FromIterator<Turn> for HistoryWindow {
    fn from_iter<I: IntoIterator<Item = Turn>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alternating(n: usize) -> HistoryWindow {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Turn::user(format!("u{i}"))
                } else {
                    Turn::assistant(format!("a{i}"))
                }
            })
            .collect()
    }

    #[test]
    fn exchange_on_empty_window() {
        let window =
            HistoryWindow::new().push_exchange(Turn::user("Hola"), Turn::assistant("¡Hola!"));
        assert_eq!(
            window.turns(),
            &[Turn::user("Hola"), Turn::assistant("¡Hola!")]
        );
    }

    #[test]
    fn window_length_is_k_plus_two_capped() {
        for k in 0..=MAX_TURNS {
            let window = alternating(k).push_exchange(Turn::user("q"), Turn::assistant("r"));
            assert_eq!(window.len(), (k + 2).min(MAX_TURNS), "k = {k}");

            let tail = &window.turns()[window.len() - 2..];
            assert_eq!(tail, &[Turn::user("q"), Turn::assistant("r")]);
        }
    }

    #[test]
    fn full_window_drops_two_oldest() {
        let prior = alternating(MAX_TURNS);
        let window = prior
            .clone()
            .push_exchange(Turn::user("new"), Turn::assistant("reply"));

        assert_eq!(window.len(), MAX_TURNS);
        assert_eq!(window.turns()[0], prior.turns()[2]);
        assert_eq!(&window.turns()[..MAX_TURNS - 2], &prior.turns()[2..]);
    }

    #[test]
    fn truncating_short_window_is_noop() {
        let window = alternating(7);
        assert_eq!(window.clone().truncate_to(MAX_TURNS), window);
        assert_eq!(alternating(MAX_TURNS).truncate_to(MAX_TURNS).len(), MAX_TURNS);
    }

    #[test]
    fn oversized_caller_window_is_cut_from_the_front() {
        // A caller may hand back more than it was given.
        let window = alternating(20).push_exchange(Turn::user("q"), Turn::assistant("r"));
        assert_eq!(window.len(), MAX_TURNS);
        assert_eq!(window.turns()[0], Turn::user("u10"));
    }

    #[test]
    fn serializes_as_plain_array() {
        let json = serde_json::to_value(alternating(2)).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"role": "user", "content": "u0"},
                {"role": "assistant", "content": "a1"}
            ])
        );
    }
}
