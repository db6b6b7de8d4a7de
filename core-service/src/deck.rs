//! Deck service: the single entry point a host UI talks to.

use std::sync::Arc;

use bridge_traits::content::{ContentProvider, VoiceConfig};
use bytes::Bytes;
use core_generation::{
    AudioAssetManager, BatchOrchestrator, BatchResult, ContentJobs, EventBusProgress,
    ExampleSlot, FieldGenerator, PassResult, RowOutcome, SharedAssets, SharedRowStore,
};
use core_runtime::config::{AudioConfig, CoreConfig};
use core_runtime::events::{CoreEvent, EventBus, EventStream, TableEvent};
use core_table::{RowFilter, RowStore};
use provider_openai::OpenAiClient;
use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::error::{CoreError, Result};

/// A finished audio archive, named for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioExport {
    pub filename: String,
    pub bytes: Bytes,
}

/// The loaded sheet, if any. Actions hold a read lock for their whole run so
/// the sheet they write to cannot be swapped underneath them.
type SheetSlot = RwLock<Option<SharedRowStore>>;

pub struct DeckService {
    store: SheetSlot,
    generator: Arc<FieldGenerator>,
    orchestrator: BatchOrchestrator,
    assets: SharedAssets,
    event_bus: EventBus,
    audio: AudioConfig,
    /// Parent of every batch's token; cancelling it stops the running batch
    cancel_root: Mutex<CancellationToken>,
}

impl DeckService {
    /// Build a service that talks to the OpenAI API through the configured
    /// HTTP client.
    pub fn new(config: CoreConfig) -> Self {
        let client = OpenAiClient::from_config(Arc::clone(&config.http_client), &config.provider);
        Self::with_provider(config, Arc::new(client))
    }

    /// Build a service over any content provider.
    pub fn with_provider(config: CoreConfig, provider: Arc<dyn ContentProvider>) -> Self {
        let event_bus = EventBus::default();
        let generator = Arc::new(FieldGenerator::from_config(provider, &config));
        let orchestrator = BatchOrchestrator::new(Arc::new(EventBusProgress::new(event_bus.clone())));

        Self {
            store: RwLock::new(None),
            generator,
            orchestrator,
            assets: Arc::new(Mutex::new(AudioAssetManager::new())),
            event_bus,
            audio: config.audio,
            cancel_root: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_configured()
    }

    pub fn is_batch_running(&self) -> bool {
        self.orchestrator.is_busy()
    }

    // ------------------------------------------------------------------
    // Sheet
    // ------------------------------------------------------------------

    /// Replace the current sheet with `values` (row 0 is the header).
    ///
    /// On a schema error the previous sheet stays loaded. Audio assets from
    /// the previous sheet are dropped.
    ///
    /// # Errors
    ///
    /// `BatchInProgress` while a batch or single-row action is running; the
    /// current sheet and its assets are left as they are.
    #[instrument(skip(self, values), fields(rows = values.len()))]
    pub async fn load_values(&self, values: Vec<Vec<String>>) -> Result<()> {
        let _claim = self.orchestrator.claim()?;
        let store = RowStore::from_values(values)?;
        let (rows, columns) = (store.row_count(), store.column_count());

        *self.store.write().await = Some(Arc::new(RwLock::new(store)));
        self.assets.lock().await.clear();

        info!(rows, columns, "Sheet loaded");
        self.emit(TableEvent::Loaded { rows, columns });
        Ok(())
    }

    pub async fn is_loaded(&self) -> bool {
        self.store.read().await.is_some()
    }

    /// Full 2-D contents for writing back to the sheet, header first.
    pub async fn values(&self) -> Result<Vec<Vec<String>>> {
        let store = self.current_store().await?;
        let values = store.read().await.to_values();
        Ok(values)
    }

    pub async fn header(&self) -> Result<Vec<String>> {
        let store = self.current_store().await?;
        let header = store.read().await.header().to_vec();
        Ok(header)
    }

    pub async fn resolve_column(&self, name: &str) -> Result<Option<usize>> {
        let store = self.current_store().await?;
        let column = store.read().await.resolve_column(name);
        Ok(column)
    }

    pub async fn get_cell(&self, row: usize, column: usize) -> Result<String> {
        let store = self.current_store().await?;
        let value = store.read().await.get_cell(row, column).to_string();
        Ok(value)
    }

    /// Manual cell edit.
    pub async fn set_cell(&self, row: usize, column: usize, value: impl Into<String>) -> Result<()> {
        let store = self.current_store().await?;
        store.write().await.set_cell(row, column, value)?;
        self.emit(TableEvent::CellsUpdated {
            row,
            columns: vec![column],
        });
        Ok(())
    }

    /// Data rows matching `filter`, in sheet order.
    pub async fn visible_rows(&self, filter: &RowFilter) -> Result<Vec<usize>> {
        let store = self.current_store().await?;
        Ok(Self::filtered_rows(&store, filter).await)
    }

    /// Forget the sheet and every generated asset.
    ///
    /// A running batch is cancelled and allowed to finish its current row
    /// before anything is cleared.
    pub async fn sign_out(&self) {
        self.cancel_batch().await;
        let _claim = self.orchestrator.claim_when_idle().await;
        *self.store.write().await = None;
        self.assets.lock().await.clear();
        info!("Signed out, sheet cleared");
        self.emit(TableEvent::Cleared);
    }

    // ------------------------------------------------------------------
    // Single-row actions
    // ------------------------------------------------------------------

    pub async fn regenerate_sentence(&self, row: usize, slot: ExampleSlot) -> Result<RowOutcome> {
        let (_sheet, store) = self.pinned_store().await?;
        Ok(self.jobs(store).regenerate_sentence(row, slot).await?)
    }

    pub async fn regenerate_word(&self, row: usize) -> Result<RowOutcome> {
        let (_sheet, store) = self.pinned_store().await?;
        Ok(self.jobs(store).regenerate_word(row).await?)
    }

    /// `voice` defaults to the configured voice.
    pub async fn regenerate_audio(
        &self,
        row: usize,
        slot: ExampleSlot,
        voice: Option<VoiceConfig>,
    ) -> Result<RowOutcome> {
        let voice = self.voice_or_default(voice);
        let (_sheet, store) = self.pinned_store().await?;
        Ok(self.jobs(store).regenerate_audio(row, slot, voice).await?)
    }

    // ------------------------------------------------------------------
    // Batch actions (over the rows `filter` selects)
    // ------------------------------------------------------------------

    pub async fn create_sentences(&self, filter: &RowFilter) -> Result<BatchResult> {
        let (_sheet, store) = self.pinned_store().await?;
        let rows = Self::filtered_rows(&store, filter).await;
        let token = self.batch_token().await;
        Ok(self.jobs(store).create_sentences(&rows, token).await?)
    }

    pub async fn regenerate_word_info(&self, filter: &RowFilter) -> Result<BatchResult> {
        let (_sheet, store) = self.pinned_store().await?;
        let rows = Self::filtered_rows(&store, filter).await;
        let token = self.batch_token().await;
        Ok(self.jobs(store).regenerate_word_info(&rows, token).await?)
    }

    pub async fn regenerate_all_content(&self, filter: &RowFilter) -> Result<Vec<PassResult>> {
        let (_sheet, store) = self.pinned_store().await?;
        let rows = Self::filtered_rows(&store, filter).await;
        let token = self.batch_token().await;
        Ok(self.jobs(store).regenerate_all_content(&rows, token).await?)
    }

    pub async fn generate_audio_files(
        &self,
        filter: &RowFilter,
        voice: Option<VoiceConfig>,
    ) -> Result<BatchResult> {
        let voice = self.voice_or_default(voice);
        let (_sheet, store) = self.pinned_store().await?;
        let rows = Self::filtered_rows(&store, filter).await;
        let token = self.batch_token().await;
        Ok(self
            .jobs(store)
            .generate_audio_files(&rows, voice, token)
            .await?)
    }

    /// Ask the running batch to stop after its current row.
    ///
    /// Returns whether a batch was running.
    pub async fn cancel_batch(&self) -> bool {
        let mut root = self.cancel_root.lock().await;
        let was_running = self.orchestrator.is_busy();
        root.cancel();
        *root = CancellationToken::new();
        if was_running {
            info!("Batch cancellation requested");
        }
        was_running
    }

    // ------------------------------------------------------------------
    // Audio
    // ------------------------------------------------------------------

    pub async fn audio_filenames(&self) -> Vec<String> {
        self.assets
            .lock()
            .await
            .filenames()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Zip every generated audio file.
    pub async fn export_audio(&self) -> Result<AudioExport> {
        let assets = self.assets.lock().await;
        if assets.is_empty() {
            return Err(CoreError::NothingToExport);
        }
        let bytes = assets.export_all()?;
        info!(files = assets.len(), archive = %self.audio.archive_name, "Audio exported");
        Ok(AudioExport {
            filename: self.audio.archive_name.clone(),
            bytes,
        })
    }

    async fn current_store(&self) -> Result<SharedRowStore> {
        self.store
            .read()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or(CoreError::NotLoaded)
    }

    /// The current sheet plus a read lock on the slot, held until the action
    /// ends so a reload or sign out waits for it.
    async fn pinned_store(
        &self,
    ) -> Result<(RwLockReadGuard<'_, Option<SharedRowStore>>, SharedRowStore)> {
        let sheet = self.store.read().await;
        let store = sheet.as_ref().map(Arc::clone).ok_or(CoreError::NotLoaded)?;
        Ok((sheet, store))
    }

    async fn filtered_rows(store: &SharedRowStore, filter: &RowFilter) -> Vec<usize> {
        store.read().await.visible_row_indices(|row| filter.matches(row))
    }

    fn jobs(&self, store: SharedRowStore) -> ContentJobs {
        ContentJobs::new(
            store,
            Arc::clone(&self.generator),
            self.orchestrator.clone(),
            Arc::clone(&self.assets),
            self.audio.clone(),
        )
    }

    async fn batch_token(&self) -> CancellationToken {
        self.cancel_root.lock().await.child_token()
    }

    fn voice_or_default(&self, voice: Option<VoiceConfig>) -> VoiceConfig {
        voice.unwrap_or_else(|| self.generator.default_voice().clone())
    }

    fn emit(&self, event: TableEvent) {
        self.event_bus.emit(CoreEvent::Table(event)).ok();
    }
}
