//! Bot personas and their static instructions.
//!
//! The persona set is fixed at compile time. Instruction text is built once
//! at startup into a [`PersonaConfig`] and never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the fixed bot identities a user can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Persona {
    #[serde(rename = "Rainmaker")]
    Rainmaker,
    #[serde(rename = "Insight-Magus")]
    InsightMagus,
    #[serde(rename = "Voice Sculptor")]
    VoiceSculptor,
    #[serde(rename = "ROI Architect")]
    RoiArchitect,
}

impl Persona {
    /// All personas in tab order.
    pub const ALL: [Persona; 4] = [
        Persona::Rainmaker,
        Persona::InsightMagus,
        Persona::VoiceSculptor,
        Persona::RoiArchitect,
    ];

    /// Canonical bot id, used in session ids and storage paths.
    pub fn bot_id(&self) -> &'static str {
        match self {
            Persona::Rainmaker => "Rainmaker",
            Persona::InsightMagus => "Insight-Magus",
            Persona::VoiceSculptor => "Voice Sculptor",
            Persona::RoiArchitect => "ROI Architect",
        }
    }

    /// URL-friendly form of the bot id.
    pub fn slug(&self) -> &'static str {
        match self {
            Persona::Rainmaker => "rainmaker",
            Persona::InsightMagus => "insight-magus",
            Persona::VoiceSculptor => "voice-sculptor",
            Persona::RoiArchitect => "roi-architect",
        }
    }

    /// Built-in instruction text for this persona.
    pub fn default_instruction(&self) -> &'static str {
        match self {
            Persona::Rainmaker => {
                "🔹 You are in Rainmaker Mode (BizDev). Focus on clarity and strategic framing."
            }
            Persona::InsightMagus => {
                "🔹 You are in Insight-Magus Mode (Strategy). Analyze logic and emotional patterns."
            }
            Persona::VoiceSculptor => {
                "🔹 You are in Voice Sculptor Mode (Copy). Refine brand tone and resonance."
            }
            Persona::RoiArchitect => {
                "🔹 You are in ROI Architect Mode (Conversion). Prioritize proof layering and CTA."
            }
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.bot_id())
    }
}

impl FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Persona::ALL
            .into_iter()
            .find(|p| p.bot_id().eq_ignore_ascii_case(needle) || p.slug().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown bot: '{needle}'"))
    }
}

/// Environment variables whose values, joined by newlines, form the global
/// operating instruction.
pub const GLOBAL_INSTRUCTION_VARS: [&str; 4] = [
    "MATRIX_OS_CORE_MEMORY",
    "SYSTEM_PROMPT",
    "MATRIX_OSE_PROTOCOL",
    "ADDITIONAL_RULES",
];

/// Immutable instruction table: one global instruction plus one per persona.
#[derive(Debug, Clone)]
pub struct PersonaConfig {
    global_instruction: String,
    instructions: BTreeMap<Persona, String>,
}

impl PersonaConfig {
    /// Build the table from the built-in persona instructions, replacing any
    /// persona that has an entry in `overrides`.
    pub fn new(global_instruction: String, overrides: BTreeMap<Persona, String>) -> Self {
        let mut instructions: BTreeMap<Persona, String> = Persona::ALL
            .into_iter()
            .map(|p| (p, p.default_instruction().to_string()))
            .collect();
        instructions.extend(overrides);

        Self {
            global_instruction,
            instructions,
        }
    }

    /// Join the global instruction parts in order. Missing parts still
    /// contribute their (empty) line.
    pub fn join_global_parts<'a>(parts: impl IntoIterator<Item = Option<&'a str>>) -> String {
        parts
            .into_iter()
            .map(|p| p.unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn global_instruction(&self) -> &str {
        &self.global_instruction
    }

    pub fn instruction(&self, persona: Persona) -> &str {
        self.instructions
            .get(&persona)
            .map(String::as_str)
            .unwrap_or_else(|| persona.default_instruction())
    }
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self::new(String::new(), BTreeMap::new())
    }
}
