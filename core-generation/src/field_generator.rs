//! # Field Generator
//!
//! Produces the text and audio for a row's cells by calling the content
//! provider. A group is regenerated strictly in order: the primary value
//! first, then its transliteration, then its translation. Any failure stops
//! the group, and the caller writes nothing back.

use std::sync::Arc;

use bridge_traits::content::{ContentProvider, SpeechRequest, TextRequest, VoiceConfig};
use bytes::Bytes;
use core_runtime::config::{CoreConfig, LanguageProfile};
use core_table::{RowStore, TableError};
use tracing::{debug, instrument};

use crate::error::{GenerationError, Result};
use crate::groups::{ColumnRole, ExampleSlot, GroupName, SOURCE_COLUMN};
use crate::prompts::{ExistingSentence, Prompt, PromptBuilder, SourceKind};
use crate::text::clean_generated;

/// Values generated for one group, ready for write-back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupContent {
    pub primary: String,
    pub transliteration: String,
    pub translation: String,
}

/// Snapshot of the row values a generation reads.
///
/// Taken under a read lock and released before any provider call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowContext {
    pub word: String,
    /// Current example sentences, indexed by slot
    pub sentences: [String; 2],
}

impl RowContext {
    pub fn capture(store: &RowStore, row: usize) -> Result<Self> {
        if row >= store.row_count() {
            return Err(TableError::row_not_found(row, store.row_count()).into());
        }
        let sentence = |slot: ExampleSlot| store.cell_by_name(row, slot.sentence_column()).to_string();
        Ok(Self {
            word: store.cell_by_name(row, SOURCE_COLUMN).trim().to_string(),
            sentences: [sentence(ExampleSlot::First), sentence(ExampleSlot::Second)],
        })
    }

    pub fn sentence(&self, slot: ExampleSlot) -> &str {
        &self.sentences[usize::from(slot.number() - 1)]
    }

    /// Non-empty sentences in slot order, the one in `target` marked.
    pub fn existing_sentences(&self, target: ExampleSlot) -> Vec<ExistingSentence> {
        ExampleSlot::ALL
            .into_iter()
            .filter(|slot| !self.sentence(*slot).trim().is_empty())
            .map(|slot| ExistingSentence {
                text: self.sentence(slot).to_string(),
                is_target: slot == target,
            })
            .collect()
    }
}

pub struct FieldGenerator {
    provider: Arc<dyn ContentProvider>,
    prompts: PromptBuilder,
    text_model: String,
    voice: VoiceConfig,
}

impl FieldGenerator {
    pub fn new(
        provider: Arc<dyn ContentProvider>,
        language: LanguageProfile,
        text_model: impl Into<String>,
        voice: VoiceConfig,
    ) -> Self {
        Self {
            provider,
            prompts: PromptBuilder::new(language),
            text_model: text_model.into(),
            voice,
        }
    }

    pub fn from_config(provider: Arc<dyn ContentProvider>, config: &CoreConfig) -> Self {
        let mut voice = VoiceConfig::new(&config.provider.speech_model, &config.provider.voice);
        if let Some(instructions) = &config.provider.voice_instructions {
            voice = voice.with_instructions(instructions.clone());
        }
        Self::new(
            provider,
            config.language.clone(),
            &config.provider.text_model,
            voice,
        )
    }

    /// Voice used when a caller does not pick one.
    pub fn default_voice(&self) -> &VoiceConfig {
        &self.voice
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    /// Fails with `Configuration` before any request is attempted.
    pub fn ensure_configured(&self) -> Result<()> {
        if self.provider.is_configured() {
            Ok(())
        } else {
            Err(GenerationError::Configuration(
                "content provider has no API key".to_string(),
            ))
        }
    }

    pub async fn generate_sentence(
        &self,
        word: &str,
        existing: &[ExistingSentence],
    ) -> Result<String> {
        self.complete(self.prompts.sentence(word, existing)).await
    }

    pub async fn generate_transliteration(&self, text: &str, kind: SourceKind) -> Result<String> {
        self.complete(self.prompts.transliteration(text, kind)).await
    }

    pub async fn generate_translation(&self, text: &str, kind: SourceKind) -> Result<String> {
        self.complete(self.prompts.translation(text, kind)).await
    }

    #[instrument(skip(self, text, voice), fields(chars = text.chars().count(), voice = %voice.voice))]
    pub async fn generate_audio(&self, text: &str, voice: &VoiceConfig) -> Result<Bytes> {
        self.ensure_configured()?;
        let request = SpeechRequest {
            input: text.trim().to_string(),
            voice: voice.clone(),
        };
        let audio = self.provider.generate_speech(request).await?;
        debug!(size = audio.len(), "Speech synthesized");
        Ok(audio)
    }

    /// Generate every value of `group` for the row in `context`.
    ///
    /// Nothing after a failed step is requested.
    #[instrument(skip(self, context), fields(word = %context.word))]
    pub async fn regenerate_field_group(
        &self,
        context: &RowContext,
        group: GroupName,
    ) -> Result<GroupContent> {
        let (primary, kind) = match group.slot() {
            Some(slot) => {
                let existing = context.existing_sentences(slot);
                let sentence = self.generate_sentence(&context.word, &existing).await?;
                (sentence, SourceKind::Sentence)
            }
            None => (context.word.clone(), SourceKind::Word),
        };

        let transliteration = self.generate_transliteration(&primary, kind).await?;
        let translation = self.generate_translation(&primary, kind).await?;

        Ok(GroupContent {
            primary,
            transliteration,
            translation,
        })
    }

    async fn complete(&self, prompt: Prompt) -> Result<String> {
        self.ensure_configured()?;
        let request = TextRequest::new(&self.text_model, prompt.system, prompt.user)
            .with_temperature(prompt.temperature)
            .with_max_output_tokens(prompt.max_tokens);
        debug!(model = %self.text_model, temperature = prompt.temperature, "Requesting text");
        let raw = self.provider.generate_text(request).await?;
        Ok(clean_generated(&raw))
    }
}

/// Write a group's values into the store.
///
/// Destination columns missing from the sheet are skipped. Returns the
/// indices of the columns written.
pub fn apply_group_content(
    store: &mut RowStore,
    row: usize,
    group: GroupName,
    content: &GroupContent,
) -> Result<Vec<usize>> {
    if row >= store.row_count() {
        return Err(TableError::row_not_found(row, store.row_count()).into());
    }

    let mut written = Vec::new();
    for (role, name) in group.columns() {
        let value = match role {
            ColumnRole::Primary if group.generates_primary() => &content.primary,
            ColumnRole::Transliteration => &content.transliteration,
            ColumnRole::Translation => &content.translation,
            _ => continue,
        };
        if let Some(column) = store.resolve_column(name) {
            store.set_cell(row, column, value.as_str())?;
            written.push(column);
        }
    }
    Ok(written)
}
