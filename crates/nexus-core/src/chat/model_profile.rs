//! Simulated model profile catalog.
//!
//! The front-end presents a small set of named model profiles. Each profile
//! shares one underlying generative model and differs only in the instruction
//! suffix it appends to the session persona's system prompt.

/// A selectable model profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelProfile {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    instruction_suffix: Option<&'static str>,
}

pub const DEFAULT_MODEL_ID: &str = "flash";

const PROFILES: &[ModelProfile] = &[
    ModelProfile {
        id: "flash",
        name: "Nexus QLM - Flash",
        description: "Fast, for general tasks.",
        instruction_suffix: None,
    },
    ModelProfile {
        id: "pro",
        name: "Nexus QLM - Pro",
        description: "Advanced, for deep reasoning.",
        instruction_suffix: Some("Focus on providing deep, thoughtful, and well-structured answers."),
    },
    ModelProfile {
        id: "vision",
        name: "Nexus QLM - Vision",
        description: "Specialized, for image analysis.",
        instruction_suffix: Some(
            "You are a world-class expert at analyzing images with extreme detail. When an image is provided, describe it with a sharp eye for subtleties.",
        ),
    },
];

impl ModelProfile {
    /// All selectable profiles.
    pub fn all() -> &'static [ModelProfile] {
        PROFILES
    }

    /// Looks a profile up by id, falling back to the default profile.
    pub fn find(id: &str) -> &'static ModelProfile {
        PROFILES
            .iter()
            .find(|profile| profile.id == id)
            .unwrap_or(&PROFILES[0])
    }

    /// Composes the full system instruction for a persona under this profile.
    pub fn system_instruction(&self, persona_instruction: &str) -> String {
        match self.instruction_suffix {
            Some(suffix) => format!("{}\n{}", persona_instruction, suffix),
            None => persona_instruction.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_profile_falls_back_to_flash() {
        assert_eq!(ModelProfile::find("no-such-profile").id, DEFAULT_MODEL_ID);
    }

    #[test]
    fn pro_profile_appends_suffix() {
        let instruction = ModelProfile::find("pro").system_instruction("Be helpful.");
        assert!(instruction.starts_with("Be helpful.\n"));
        assert!(instruction.contains("well-structured"));
    }
}
