//! Prompt templates for text generation.
//!
//! Templates are parameterised by a [`LanguageProfile`]; the default profile
//! produces simplified Chinese sentences at HSK3-HSK4 level, pinyin with tone
//! marks, and English translations.

use core_runtime::config::LanguageProfile;

/// Whether a prompt is about a single word or a full sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Word,
    Sentence,
}

impl SourceKind {
    fn noun(&self) -> &'static str {
        match self {
            SourceKind::Word => "word",
            SourceKind::Sentence => "sentence",
        }
    }

    fn max_tokens(&self) -> u32 {
        match self {
            SourceKind::Word => 50,
            SourceKind::Sentence => 100,
        }
    }
}

/// One sentence already present in the row, listed as "do not repeat".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingSentence {
    pub text: String,
    /// The sentence the new one will replace
    pub is_target: bool,
}

/// A rendered prompt plus its sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    profile: LanguageProfile,
}

impl PromptBuilder {
    pub fn new(profile: LanguageProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &LanguageProfile {
        &self.profile
    }

    pub fn sentence(&self, word: &str, existing: &[ExistingSentence]) -> Prompt {
        let p = &self.profile;
        let mut user = format!(
            "Generate a natural-sounding sentence in {} ({} level) using the word \"{}\". \
             The sentence should be appropriate for a language learner studying at an intermediate level.",
            p.variety, p.learner_level, word
        );

        let listed: Vec<&ExistingSentence> = existing
            .iter()
            .filter(|sentence| !sentence.text.trim().is_empty())
            .collect();
        if !listed.is_empty() {
            user.push_str(
                "\nIMPORTANT: Create a sentence that is DIFFERENT from these existing sentences:\n",
            );
            for (i, sentence) in listed.iter().enumerate() {
                user.push_str(&format!("{}. {}", i + 1, sentence.text));
                if sentence.is_target {
                    user.push_str(" (current sentence to replace)");
                }
                user.push('\n');
            }
        }
        user.push_str(&format!(
            "\nOnly provide the sentence in {} characters, nothing else.",
            p.language
        ));

        Prompt {
            system: format!(
                "You are a {} language expert. Your responses should be in {} characters only. \
                 Always create unique, diverse examples when asked for multiple sentences.",
                p.language, p.variety
            ),
            user,
            temperature: 0.8,
            max_tokens: 100,
        }
    }

    pub fn transliteration(&self, text: &str, kind: SourceKind) -> Prompt {
        let p = &self.profile;
        Prompt {
            system: format!(
                "You are a {} language expert. Provide accurate {} transliterations {}.",
                p.language, p.transliteration, p.transliteration_style
            ),
            user: format!(
                "Provide the {} transliteration for this {} {}: \"{}\"\n\
                 Only provide the {} {}, nothing else.",
                p.transliteration,
                p.language,
                kind.noun(),
                text,
                p.transliteration,
                p.transliteration_style
            ),
            temperature: 0.3,
            max_tokens: kind.max_tokens(),
        }
    }

    pub fn translation(&self, text: &str, kind: SourceKind) -> Prompt {
        let p = &self.profile;
        let instruction = match kind {
            SourceKind::Word => format!(
                "Only provide the most accurate {} translation, nothing else.",
                p.learner_language
            ),
            SourceKind::Sentence => {
                format!("Only provide the {} translation, nothing else.", p.learner_language)
            }
        };
        Prompt {
            system: format!(
                "You are a translation expert. Provide accurate and natural-sounding translations from {} to {}.",
                p.language, p.learner_language
            ),
            user: format!(
                "Translate this {} {} to natural {}: \"{}\"\n{}",
                p.language,
                kind.noun(),
                p.learner_language,
                text,
                instruction
            ),
            temperature: 0.3,
            max_tokens: kind.max_tokens(),
        }
    }
}
