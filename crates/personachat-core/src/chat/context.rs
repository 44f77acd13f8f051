//! Context window assembly.
//!
//! Builds the ordered role/content list submitted to the completion engine:
//! the global instruction, the persona instruction, then recent history.

use std::sync::Arc;

use personachat_types::chat::ChatMessage;
use personachat_types::llm::Message;
use personachat_types::persona::{Persona, PersonaConfig};

/// Default number of history turns per request.
pub const DEFAULT_CONTEXT_WINDOW: usize = 20;

/// Pure context builder. Holds the immutable persona table and window size.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    personas: Arc<PersonaConfig>,
    window: usize,
}

impl ContextAssembler {
    /// Create an assembler. A zero window is raised to one.
    pub fn new(personas: Arc<PersonaConfig>, window: usize) -> Self {
        Self {
            personas,
            window: window.max(1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn personas(&self) -> &PersonaConfig {
        &self.personas
    }

    /// Two synthesized system entries followed by at most `window` history
    /// turns. `history` must already be oldest-first; when it is longer than
    /// the window the oldest turns are dropped. Message content is never cut.
    pub fn assemble(&self, persona: Persona, history: &[ChatMessage]) -> Vec<Message> {
        let skip = history.len().saturating_sub(self.window);
        let recent = &history[skip..];

        let mut messages = Vec::with_capacity(recent.len() + 2);
        messages.push(Message::system(self.personas.global_instruction()));
        messages.push(Message::system(self.personas.instruction(persona)));
        messages.extend(recent.iter().map(ChatMessage::to_message));
        messages
    }
}
