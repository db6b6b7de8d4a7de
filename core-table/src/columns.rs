//! Column schema of a vocabulary sheet.
//!
//! Only the names below get an entry in the column index. Any other header
//! text is kept as an ordinary column and stays addressable by position.

use serde::{Deserialize, Serialize};

pub const WORD: &str = "Word";
pub const PRONUNCIATION: &str = "Pronunciation";
pub const TRANSLATION: &str = "Translation";
pub const SENTENCE_01_ZH: &str = "Sentence_01_zh";
pub const SENTENCE_01_PY: &str = "Sentence_01_py";
pub const SENTENCE_01_EN: &str = "Sentence_01_en";
pub const SENTENCE_02_ZH: &str = "Sentence_02_zh";
pub const SENTENCE_02_PY: &str = "Sentence_02_py";
pub const SENTENCE_02_EN: &str = "Sentence_02_en";
pub const HANZIS: &str = "Hanzis";
pub const SENTENCE_01_AUDIO: &str = "Sentence_01_audio";
pub const SENTENCE_02_AUDIO: &str = "Sentence_02_audio";

/// Columns the store recognises, in canonical order.
pub const EXPECTED_COLUMNS: [&str; 12] = [
    WORD,
    PRONUNCIATION,
    TRANSLATION,
    SENTENCE_01_ZH,
    SENTENCE_01_PY,
    SENTENCE_01_EN,
    SENTENCE_02_ZH,
    SENTENCE_02_PY,
    SENTENCE_02_EN,
    HANZIS,
    SENTENCE_01_AUDIO,
    SENTENCE_02_AUDIO,
];

/// A sheet without these cannot be loaded.
pub const MANDATORY_COLUMNS: [&str; 2] = [WORD, TRANSLATION];

/// Column groups a host shows or hides together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayGroup {
    Basic,
    FirstSentence,
    SecondSentence,
}

impl DisplayGroup {
    pub const ALL: [DisplayGroup; 3] = [
        DisplayGroup::Basic,
        DisplayGroup::FirstSentence,
        DisplayGroup::SecondSentence,
    ];

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            DisplayGroup::Basic => &[WORD, PRONUNCIATION, TRANSLATION, HANZIS],
            DisplayGroup::FirstSentence => {
                &[SENTENCE_01_ZH, SENTENCE_01_PY, SENTENCE_01_EN, SENTENCE_01_AUDIO]
            }
            DisplayGroup::SecondSentence => {
                &[SENTENCE_02_ZH, SENTENCE_02_PY, SENTENCE_02_EN, SENTENCE_02_AUDIO]
            }
        }
    }

    /// Group a recognised column belongs to.
    pub fn of(column: &str) -> Option<DisplayGroup> {
        Self::ALL
            .into_iter()
            .find(|group| group.columns().contains(&column))
    }
}

pub fn is_expected(name: &str) -> bool {
    EXPECTED_COLUMNS.contains(&name)
}
