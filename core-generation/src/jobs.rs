//! Batch and single-row content jobs.
//!
//! Each job combines the [`FieldGenerator`], the shared [`RowStore`] and the
//! [`BatchOrchestrator`]. Row values are snapshotted under a read lock and
//! results written back under a write lock; no lock is held while a provider
//! request is in flight.

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::content::VoiceConfig;
use core_runtime::config::AudioConfig;
use core_table::{RowStore, SoundMarker, TableError};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::audio::{make_audio_filename, AudioAssetManager};
use crate::batch::{BatchOrchestrator, BatchResult, ProgressObserver, RowOutcome, RowTask};
use crate::error::{GenerationError, Result};
use crate::field_generator::{apply_group_content, FieldGenerator, RowContext};
use crate::groups::{ExampleSlot, GroupName, LABEL_COLUMN};

pub type SharedRowStore = Arc<RwLock<RowStore>>;
pub type SharedAssets = Arc<Mutex<AudioAssetManager>>;

pub const PHASE_CREATE_SENTENCES: &str = "Creating example sentences";
pub const PHASE_WORD_INFO: &str = "Regenerating word information";
pub const PHASE_AUDIO: &str = "Generating audio";

/// Phases of a full regeneration, in run order.
pub const REGENERATE_ALL_PHASES: [(&str, GroupName); 3] = [
    ("Step 1/3: Regenerating word information", GroupName::WordInfo),
    ("Step 2/3: Regenerating first sentences", GroupName::FirstExample),
    ("Step 3/3: Regenerating second sentences", GroupName::SecondExample),
];

/// Result of one pass of a multi-pass job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassResult {
    pub phase: String,
    pub result: BatchResult,
}

// ============================================================================
// Row tasks
// ============================================================================

/// Regenerates one generation group of a row.
pub struct FieldGroupTask {
    store: SharedRowStore,
    generator: Arc<FieldGenerator>,
    observer: Arc<dyn ProgressObserver>,
    group: GroupName,
}

#[async_trait]
impl RowTask for FieldGroupTask {
    async fn run(&self, row: usize) -> Result<RowOutcome> {
        let context = {
            let store = self.store.read().await;
            RowContext::capture(&store, row)?
        };
        if context.word.is_empty() {
            debug!(row, group = %self.group, "Empty word, nothing to generate");
            return Ok(RowOutcome::Unchanged);
        }

        let content = self
            .generator
            .regenerate_field_group(&context, self.group)
            .await?;

        let written = {
            let mut store = self.store.write().await;
            apply_group_content(&mut store, row, self.group, &content)?
        };
        self.observer.on_cells_updated(row, &written);
        Ok(RowOutcome::Updated(written))
    }
}

/// Runs every subtask on the row, even after one fails.
///
/// The row fails with the first error seen.
pub struct CompositeTask {
    tasks: Vec<Box<dyn RowTask>>,
}

#[async_trait]
impl RowTask for CompositeTask {
    async fn run(&self, row: usize) -> Result<RowOutcome> {
        let mut written = Vec::new();
        let mut first_error = None;

        for task in &self.tasks {
            match task.run(row).await {
                Ok(RowOutcome::Updated(columns)) => written.extend(columns),
                Ok(RowOutcome::Unchanged) => {}
                Err(error) => {
                    first_error.get_or_insert(error);
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None if written.is_empty() => Ok(RowOutcome::Unchanged),
            None => Ok(RowOutcome::Updated(written)),
        }
    }
}

/// Synthesizes speech for a row's example sentences.
pub struct AudioSlotTask {
    store: SharedRowStore,
    generator: Arc<FieldGenerator>,
    assets: SharedAssets,
    observer: Arc<dyn ProgressObserver>,
    voice: VoiceConfig,
    filename_prefix: Option<String>,
    slots: Vec<ExampleSlot>,
    /// Overwrite the asset the cell already points at instead of adding one
    reuse_existing: bool,
    /// Fail instead of skipping when the sentence is empty
    require_sentence: bool,
}

struct SlotSnapshot {
    slot: ExampleSlot,
    sentence: String,
    audio_column: usize,
    current_marker: Option<SoundMarker>,
}

impl AudioSlotTask {
    fn snapshot(&self, store: &RowStore, row: usize) -> Result<(String, Vec<SlotSnapshot>)> {
        if row >= store.row_count() {
            return Err(TableError::row_not_found(row, store.row_count()).into());
        }
        let label = store.cell_by_name(row, LABEL_COLUMN).trim().to_string();

        let mut slots = Vec::with_capacity(self.slots.len());
        for &slot in &self.slots {
            let audio_column = store.require_column(slot.audio_column())?;
            let sentence = store.cell_by_name(row, slot.sentence_column()).trim().to_string();
            if sentence.is_empty() {
                if self.require_sentence {
                    return Err(GenerationError::NotFound(format!(
                        "sentence in {} for row {}",
                        slot.sentence_column(),
                        row
                    )));
                }
                continue;
            }
            slots.push(SlotSnapshot {
                slot,
                sentence,
                audio_column,
                current_marker: SoundMarker::parse(store.get_cell(row, audio_column)),
            });
        }
        Ok((label, slots))
    }

    async fn choose_filename(&self, label: &str, snapshot: &SlotSnapshot) -> (String, bool) {
        if self.reuse_existing {
            if let Some(marker) = &snapshot.current_marker {
                if self.assets.lock().await.contains(marker.filename()) {
                    return (marker.filename().to_string(), true);
                }
            }
        }
        let filename = make_audio_filename(
            self.filename_prefix.as_deref(),
            label,
            snapshot.slot.number(),
            &mut rand::thread_rng(),
        );
        (filename, false)
    }
}

#[async_trait]
impl RowTask for AudioSlotTask {
    async fn run(&self, row: usize) -> Result<RowOutcome> {
        let (label, slots) = {
            let store = self.store.read().await;
            self.snapshot(&store, row)?
        };
        if slots.is_empty() {
            return Ok(RowOutcome::Unchanged);
        }

        let mut written = Vec::new();
        for snapshot in slots {
            let audio = self
                .generator
                .generate_audio(&snapshot.sentence, &self.voice)
                .await?;

            let (filename, reused) = self.choose_filename(&label, &snapshot).await;
            {
                let mut assets = self.assets.lock().await;
                if reused {
                    assets.replace(&filename, audio)?;
                } else {
                    assets.store(filename.clone(), audio);
                }
            }

            let marker = SoundMarker::new(filename.clone())
                .ok_or_else(|| GenerationError::Archive(format!("invalid filename {}", filename)))?;
            {
                let mut store = self.store.write().await;
                store.set_cell(row, snapshot.audio_column, marker.to_string())?;
            }
            self.observer
                .on_cells_updated(row, &[snapshot.audio_column]);
            written.push(snapshot.audio_column);
        }
        Ok(RowOutcome::Updated(written))
    }
}

// ============================================================================
// Jobs
// ============================================================================

/// Entry points for every generation action.
pub struct ContentJobs {
    store: SharedRowStore,
    generator: Arc<FieldGenerator>,
    orchestrator: BatchOrchestrator,
    assets: SharedAssets,
    audio: AudioConfig,
}

impl ContentJobs {
    pub fn new(
        store: SharedRowStore,
        generator: Arc<FieldGenerator>,
        orchestrator: BatchOrchestrator,
        assets: SharedAssets,
        audio: AudioConfig,
    ) -> Self {
        Self {
            store,
            generator,
            orchestrator,
            assets,
            audio,
        }
    }

    fn group_task(&self, group: GroupName) -> FieldGroupTask {
        FieldGroupTask {
            store: Arc::clone(&self.store),
            generator: Arc::clone(&self.generator),
            observer: self.orchestrator.observer(),
            group,
        }
    }

    fn audio_task(&self, slots: Vec<ExampleSlot>, voice: VoiceConfig) -> AudioSlotTask {
        AudioSlotTask {
            store: Arc::clone(&self.store),
            generator: Arc::clone(&self.generator),
            assets: Arc::clone(&self.assets),
            observer: self.orchestrator.observer(),
            voice,
            filename_prefix: self.audio.filename_prefix.clone(),
            slots,
            reuse_existing: false,
            require_sentence: false,
        }
    }

    /// First then second example sentence for each row. The second runs even
    /// when the first failed.
    #[instrument(skip(self, rows, cancellation_token), fields(rows = rows.len()))]
    pub async fn create_sentences(
        &self,
        rows: &[usize],
        cancellation_token: CancellationToken,
    ) -> Result<BatchResult> {
        self.generator.ensure_configured()?;
        let task = CompositeTask {
            tasks: vec![
                Box::new(self.group_task(GroupName::FirstExample)),
                Box::new(self.group_task(GroupName::SecondExample)),
            ],
        };
        self.orchestrator
            .run_batch(rows, &task, PHASE_CREATE_SENTENCES, cancellation_token)
            .await
    }

    #[instrument(skip(self, rows, cancellation_token), fields(rows = rows.len()))]
    pub async fn regenerate_word_info(
        &self,
        rows: &[usize],
        cancellation_token: CancellationToken,
    ) -> Result<BatchResult> {
        self.generator.ensure_configured()?;
        let task = self.group_task(GroupName::WordInfo);
        self.orchestrator
            .run_batch(rows, &task, PHASE_WORD_INFO, cancellation_token)
            .await
    }

    /// Word info, then first sentences, then second sentences, each a full
    /// pass over `rows`. Stops after a cancelled pass.
    #[instrument(skip(self, rows, cancellation_token), fields(rows = rows.len()))]
    pub async fn regenerate_all_content(
        &self,
        rows: &[usize],
        cancellation_token: CancellationToken,
    ) -> Result<Vec<PassResult>> {
        self.generator.ensure_configured()?;
        let session = self.orchestrator.begin(cancellation_token)?;

        let mut passes = Vec::with_capacity(REGENERATE_ALL_PHASES.len());
        for (phase, group) in REGENERATE_ALL_PHASES {
            let task = self.group_task(group);
            let result = session.run_pass(rows, &task, phase).await;
            let cancelled = result.cancelled;
            passes.push(PassResult {
                phase: phase.to_string(),
                result,
            });
            if cancelled {
                break;
            }
        }

        info!(job_id = session.job_id(), passes = passes.len(), "Content regeneration finished");
        Ok(passes)
    }

    /// Speech for every non-empty example sentence of `rows`.
    ///
    /// Fails with `NotFound` before touching any row when the sheet lacks a
    /// sentence, audio or label column.
    #[instrument(skip(self, rows, voice, cancellation_token), fields(rows = rows.len()))]
    pub async fn generate_audio_files(
        &self,
        rows: &[usize],
        voice: VoiceConfig,
        cancellation_token: CancellationToken,
    ) -> Result<BatchResult> {
        self.generator.ensure_configured()?;
        {
            let store = self.store.read().await;
            require_audio_columns(&store, &ExampleSlot::ALL)?;
        }
        let task = self.audio_task(ExampleSlot::ALL.to_vec(), voice);
        self.orchestrator
            .run_batch(rows, &task, PHASE_AUDIO, cancellation_token)
            .await
    }

    /// Regenerate one example sentence with its transliteration and
    /// translation.
    pub async fn regenerate_sentence(&self, row: usize, slot: ExampleSlot) -> Result<RowOutcome> {
        self.generator.ensure_configured()?;
        let task = self.group_task(slot.group());
        self.orchestrator.run_single(row, &task).await
    }

    /// Regenerate the word's transliteration and translation.
    pub async fn regenerate_word(&self, row: usize) -> Result<RowOutcome> {
        self.generator.ensure_configured()?;
        let task = self.group_task(GroupName::WordInfo);
        self.orchestrator.run_single(row, &task).await
    }

    /// Re-synthesize one sentence's audio. An asset already referenced by the
    /// cell is overwritten in place, keeping its filename.
    pub async fn regenerate_audio(
        &self,
        row: usize,
        slot: ExampleSlot,
        voice: VoiceConfig,
    ) -> Result<RowOutcome> {
        self.generator.ensure_configured()?;
        {
            let store = self.store.read().await;
            require_audio_columns(&store, &[slot])?;
        }
        let mut task = self.audio_task(vec![slot], voice);
        task.reuse_existing = true;
        task.require_sentence = true;
        self.orchestrator.run_single(row, &task).await
    }
}

fn require_audio_columns(store: &RowStore, slots: &[ExampleSlot]) -> Result<()> {
    let mut required: Vec<&str> = Vec::new();
    for slot in slots {
        required.push(slot.sentence_column());
    }
    for slot in slots {
        required.push(slot.audio_column());
    }
    required.push(LABEL_COLUMN);

    let missing: Vec<&str> = required
        .into_iter()
        .filter(|name| store.resolve_column(name).is_none())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(GenerationError::NotFound(format!(
            "required columns {}",
            missing.join(", ")
        )))
    }
}
