//! Generation groups: which columns a regeneration reads and writes.

use core_table::columns::{
    PRONUNCIATION, SENTENCE_01_AUDIO, SENTENCE_01_EN, SENTENCE_01_PY, SENTENCE_01_ZH,
    SENTENCE_02_AUDIO, SENTENCE_02_EN, SENTENCE_02_PY, SENTENCE_02_ZH, TRANSLATION, WORD,
};
use serde::{Deserialize, Serialize};

/// Column whose text names generated audio files.
pub const LABEL_COLUMN: &str = PRONUNCIATION;

/// Column every group reads its source word from.
pub const SOURCE_COLUMN: &str = WORD;

/// A set of cells regenerated together from one source value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupName {
    FirstExample,
    SecondExample,
    WordInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    /// The example sentence itself, or the word for `WordInfo`
    Primary,
    Transliteration,
    Translation,
    Audio,
}

/// Which example sentence a single-row action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExampleSlot {
    First,
    Second,
}

impl ExampleSlot {
    pub const ALL: [ExampleSlot; 2] = [ExampleSlot::First, ExampleSlot::Second];

    /// 1-based number used in filenames and prompts.
    pub fn number(&self) -> u8 {
        match self {
            ExampleSlot::First => 1,
            ExampleSlot::Second => 2,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(ExampleSlot::First),
            2 => Some(ExampleSlot::Second),
            _ => None,
        }
    }

    pub fn group(&self) -> GroupName {
        match self {
            ExampleSlot::First => GroupName::FirstExample,
            ExampleSlot::Second => GroupName::SecondExample,
        }
    }

    pub fn sentence_column(&self) -> &'static str {
        self.group()
            .column(ColumnRole::Primary)
            .unwrap_or(SENTENCE_01_ZH)
    }

    pub fn audio_column(&self) -> &'static str {
        match self {
            ExampleSlot::First => SENTENCE_01_AUDIO,
            ExampleSlot::Second => SENTENCE_02_AUDIO,
        }
    }
}

impl GroupName {
    /// Ordered `(role, column)` pairs the group covers.
    pub fn columns(&self) -> &'static [(ColumnRole, &'static str)] {
        match self {
            GroupName::FirstExample => &[
                (ColumnRole::Primary, SENTENCE_01_ZH),
                (ColumnRole::Transliteration, SENTENCE_01_PY),
                (ColumnRole::Translation, SENTENCE_01_EN),
                (ColumnRole::Audio, SENTENCE_01_AUDIO),
            ],
            GroupName::SecondExample => &[
                (ColumnRole::Primary, SENTENCE_02_ZH),
                (ColumnRole::Transliteration, SENTENCE_02_PY),
                (ColumnRole::Translation, SENTENCE_02_EN),
                (ColumnRole::Audio, SENTENCE_02_AUDIO),
            ],
            GroupName::WordInfo => &[
                (ColumnRole::Primary, WORD),
                (ColumnRole::Transliteration, PRONUNCIATION),
                (ColumnRole::Translation, TRANSLATION),
            ],
        }
    }

    pub fn column(&self, role: ColumnRole) -> Option<&'static str> {
        self.columns()
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, column)| *column)
    }

    /// Whether the primary cell is generated (false for `WordInfo`, whose
    /// primary is the source word).
    pub fn generates_primary(&self) -> bool {
        !matches!(self, GroupName::WordInfo)
    }

    pub fn slot(&self) -> Option<ExampleSlot> {
        match self {
            GroupName::FirstExample => Some(ExampleSlot::First),
            GroupName::SecondExample => Some(ExampleSlot::Second),
            GroupName::WordInfo => None,
        }
    }
}

impl std::fmt::Display for GroupName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GroupName::FirstExample => "first example",
            GroupName::SecondExample => "second example",
            GroupName::WordInfo => "word info",
        };
        f.write_str(name)
    }
}
