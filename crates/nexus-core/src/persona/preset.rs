//! Built-in persona presets.
//!
//! Provides the system-defined default personas that are available to all
//! users alongside any user-created entries.

use super::model::{Persona, PersonaSource};

/// Id of the persona every fallback resolves to.
pub const DEFAULT_PERSONA_ID: &str = "nexus";

fn preset(id: &str, name: &str, instruction: &str, welcome_message: &str) -> Persona {
    Persona {
        id: id.to_string(),
        name: name.to_string(),
        instruction: instruction.to_string(),
        welcome_message: welcome_message.to_string(),
        source: PersonaSource::System,
    }
}

/// Returns the built-in persona catalog.
pub fn default_presets() -> Vec<Persona> {
    vec![
        default_persona(),
        preset(
            "creative",
            "Creative Muse",
            "You are a Creative Muse, an AI specialized in brainstorming, writing, and artistic inspiration. Be imaginative, eloquent, and encouraging. Provide unique ideas and help users overcome creative blocks.",
            "Greetings! I am your Creative Muse. What wonders shall we imagine today?",
        ),
        preset(
            "technical",
            "Code Architect",
            "You are a Code Architect, a master of software engineering, algorithms, and system design. Provide clear, optimal, and well-explained code. Prioritize best practices, security, and performance. Explain complex technical concepts simply.",
            "Code Architect initialized. Provide the technical challenge.",
        ),
        preset(
            "business",
            "Strategic Analyst",
            "You are a Strategic Analyst AI. You are an expert in business strategy, market analysis, and financial planning. Provide data-driven insights, create professional reports, and help users make informed business decisions. Your tone is professional and insightful.",
            "Welcome. I am your Strategic Analyst. How can we optimize for success today?",
        ),
    ]
}

/// Returns the default persona, the fallback for unresolvable references.
pub fn default_persona() -> Persona {
    preset(
        DEFAULT_PERSONA_ID,
        "Nexus AI (Default)",
        "You are Nexus AI, a helpful and versatile symbiotic assistant. Be concise, knowledgeable, and friendly. Your goal is to provide accurate information and complete tasks efficiently.",
        "Hello! I am Nexus AI. How can I assist you today?",
    )
}
