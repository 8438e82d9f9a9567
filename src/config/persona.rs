//! Persona handed to the remote model once per session.

use serde::Serialize;

/// Default system instruction: a patient technology helper for elderly people.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = concat!(
    "Você é um assistente de tecnologia extremamente paciente, amigável e ",
    "muito didático, especializado em ajudar idosos que têm dificuldade em ",
    "usar celulares e aplicativos. ",
    "Suas respostas devem ser dadas em passos curtos, usando linguagem simples ",
    "e evitando jargões técnicos. Lembre-se que o usuário é um idoso que ",
    "pode não saber termos como 'interface', 'widget', 'cache', 'app', 'download', ",
    "ou 'clicar' (prefira 'tocar' ou 'apertar'). ",
    "Responda com empatia e sempre pergunte se o usuário conseguiu realizar o passo antes de sugerir o próximo. ",
    "Seja breve nas respostas faladas."
);

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self { temperature: 0.4, top_p: 0.95, top_k: 64, max_output_tokens: 8192 }
    }
}

/// Immutable persona: instruction plus generation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Persona {
    instruction: String,
    generation: GenerationSettings,
}

impl Persona {
    pub fn new(instruction: impl Into<String>, generation: GenerationSettings) -> Self {
        Self { instruction: instruction.into(), generation }
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn generation(&self) -> &GenerationSettings {
        &self.generation
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_INSTRUCTION, GenerationSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_settings_wire_names() {
        let value = serde_json::to_value(GenerationSettings::default()).unwrap();
        assert_eq!(value["topP"], serde_json::json!(0.95f32));
        assert_eq!(value["topK"], 64);
        assert_eq!(value["maxOutputTokens"], 8192);
    }

    #[test]
    fn test_default_persona_mentions_short_spoken_answers() {
        let persona = Persona::default();
        assert!(persona.instruction().ends_with("Seja breve nas respostas faladas."));
        assert!(persona.instruction().contains("'tocar' ou 'apertar'"));
    }
}
