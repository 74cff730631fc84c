//! The per-turn pipeline — the heart of dfbridge.
//!
//! Each webhook call runs the same finite sequence:
//!
//! 1. **Assemble** the prompt (system directive + prior window + utterance)
//! 2. **Complete** it through the configured provider (the only await)
//! 3. **Extend** the window with the new exchange and cut it to size
//!
//! The outcome is a value, not an exception: either the model replied and
//! the window moved forward, or the provider failed and only an apology
//! goes back.

pub mod assembler;
pub mod runner;

pub use assembler::{DEFAULT_SYSTEM_PROMPT, assemble_prompt};
pub use runner::{TurnOutcome, TurnRunner};
