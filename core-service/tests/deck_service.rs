use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::content::{ContentProvider, SpeechRequest, TextRequest};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_generation::GenerationError;
use core_runtime::events::{CoreEvent, TableEvent};
use core_service::{CoreConfig, CoreError, DeckService, ExampleSlot, RowFilter};
use core_table::TableError;
use mockall::mock;
use tokio::sync::Notify;

mock! {
    HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

mock! {
    Provider {}

    #[async_trait]
    impl ContentProvider for Provider {
        fn is_configured(&self) -> bool;
        async fn generate_text(&self, request: TextRequest) -> BridgeResult<String>;
        async fn generate_speech(&self, request: SpeechRequest) -> BridgeResult<Bytes>;
    }
}

fn config() -> CoreConfig {
    let mut http = MockHttpClient::new();
    http.expect_execute().never();
    CoreConfig::builder()
        .http_client(Arc::new(http))
        .build()
        .unwrap()
}

/// Answers every prompt kind with a fixed value.
fn answering_provider() -> MockProvider {
    let mut provider = MockProvider::new();
    provider.expect_is_configured().return_const(true);
    provider.expect_generate_text().returning(|request| {
        let reply = if request.user_prompt.starts_with("Generate") {
            "我喜欢学习。"
        } else if request.user_prompt.starts_with("Provide") {
            "Wǒ xǐhuan xuéxí."
        } else {
            "I like studying."
        };
        Ok(reply.to_string())
    });
    provider
        .expect_generate_speech()
        .returning(|request| Ok(Bytes::from(format!("mp3:{}", request.input))));
    provider
}

/// Speech that takes a while, announcing each call as it starts.
struct SlowSpeech {
    started: Notify,
    delay: Duration,
}

impl SlowSpeech {
    fn new(delay: Duration) -> Self {
        Self {
            started: Notify::new(),
            delay,
        }
    }
}

#[async_trait]
impl ContentProvider for SlowSpeech {
    fn is_configured(&self) -> bool {
        true
    }

    async fn generate_text(&self, _request: TextRequest) -> BridgeResult<String> {
        Ok("unused".to_string())
    }

    async fn generate_speech(&self, request: SpeechRequest) -> BridgeResult<Bytes> {
        self.started.notify_one();
        tokio::time::sleep(self.delay).await;
        Ok(Bytes::from(format!("mp3:{}", request.input)))
    }
}

fn deck(provider: MockProvider) -> DeckService {
    DeckService::with_provider(config(), Arc::new(provider))
}

fn values(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

const HEADER: &[&str] = &[
    "Word",
    "Pronunciation",
    "Translation",
    "Sentence_01_zh",
    "Sentence_01_py",
    "Sentence_01_en",
    "Sentence_02_zh",
    "Sentence_02_py",
    "Sentence_02_en",
    "Sentence_01_audio",
    "Sentence_02_audio",
];

#[tokio::test]
async fn test_actions_require_a_loaded_sheet() {
    let deck = deck(answering_provider());
    assert!(!deck.is_loaded().await);
    assert!(matches!(deck.values().await, Err(CoreError::NotLoaded)));
    assert!(matches!(
        deck.create_sentences(&RowFilter::all()).await,
        Err(CoreError::NotLoaded)
    ));
}

#[tokio::test]
async fn test_schema_error_keeps_previous_sheet() {
    let deck = deck(answering_provider());
    deck.load_values(values(&[&["Word", "Translation"], &["猫", "cat"]]))
        .await
        .unwrap();

    let err = deck
        .load_values(values(&[&["Word", "Notes"], &["狗", ""]]))
        .await
        .unwrap_err();
    match err {
        CoreError::Table(TableError::Schema { missing }) => {
            assert_eq!(missing, vec!["Translation".to_string()])
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(
        deck.values().await.unwrap(),
        values(&[&["Word", "Translation"], &["猫", "cat"]])
    );
    assert_eq!(deck.resolve_column("Pronunciation").await.unwrap(), None);
}

#[tokio::test]
async fn test_cell_edit_emits_update() {
    let deck = deck(answering_provider());
    deck.load_values(values(&[&["Word", "Translation"], &["猫", "cat"]]))
        .await
        .unwrap();
    let mut events = deck.subscribe();

    deck.set_cell(0, 1, "kitty").await.unwrap();
    assert_eq!(deck.get_cell(0, 1).await.unwrap(), "kitty");
    assert_eq!(
        events.try_recv().unwrap().unwrap(),
        CoreEvent::Table(TableEvent::CellsUpdated {
            row: 0,
            columns: vec![1]
        })
    );

    let err = deck.set_cell(4, 1, "nope").await.unwrap_err();
    assert!(matches!(err, CoreError::Table(TableError::NotFound(_))));
}

#[tokio::test]
async fn test_batch_runs_only_on_filtered_rows() {
    let deck = deck(answering_provider());
    deck.load_values(values(&[
        HEADER,
        &["猫", "māo", "cat", "已有句子。", "", "", "", "", "", "", ""],
        &["狗", "gǒu", "dog", "", "", "", "", "", "", "", ""],
        &["鱼", "yú", "fish", "", "", "", "", "", "", "", ""],
    ]))
    .await
    .unwrap();

    let filter = RowFilter::all().where_empty(3).sheet_rows(2, 3);
    assert_eq!(deck.visible_rows(&filter).await.unwrap(), vec![1]);

    let result = deck.create_sentences(&filter).await.unwrap();
    assert_eq!(result.succeeded_count, 1);
    assert!(result.failed_rows.is_empty());

    assert_eq!(deck.get_cell(0, 3).await.unwrap(), "已有句子。");
    assert_eq!(deck.get_cell(1, 3).await.unwrap(), "我喜欢学习。");
    assert_eq!(deck.get_cell(1, 8).await.unwrap(), "I like studying.");
    assert_eq!(deck.get_cell(2, 3).await.unwrap(), "");
    assert!(!deck.is_batch_running());
}

#[tokio::test]
async fn test_audio_round_trip_through_export() {
    let deck = deck(answering_provider());
    deck.load_values(values(&[
        HEADER,
        &["猫", "māo", "cat", "猫很可爱。", "", "", "", "", "", "", ""],
    ]))
    .await
    .unwrap();

    assert!(matches!(
        deck.export_audio().await,
        Err(CoreError::NothingToExport)
    ));

    let result = deck
        .generate_audio_files(&RowFilter::all(), None)
        .await
        .unwrap();
    assert_eq!(result.succeeded_count, 1);

    let filenames = deck.audio_filenames().await;
    assert_eq!(filenames.len(), 1);
    assert_eq!(
        deck.get_cell(0, 9).await.unwrap(),
        format!("[sound:{}]", filenames[0])
    );

    let export = deck.export_audio().await.unwrap();
    assert_eq!(export.filename, "anki-audio.zip");
    let mut zip = zip::ZipArchive::new(Cursor::new(export.bytes.to_vec())).unwrap();
    let mut entry = zip.by_name(&filenames[0]).unwrap();
    let mut contents = String::new();
    entry.read_to_string(&mut contents).unwrap();
    assert_eq!(contents, "mp3:猫很可爱。");
    drop(entry);

    // Regenerating keeps the filename and the cell
    deck.regenerate_audio(0, ExampleSlot::First, None)
        .await
        .unwrap();
    assert_eq!(deck.audio_filenames().await, filenames);
}

#[tokio::test]
async fn test_sign_out_clears_sheet_and_audio() {
    let deck = deck(answering_provider());
    deck.load_values(values(&[
        HEADER,
        &["猫", "māo", "cat", "猫很可爱。", "", "", "", "", "", "", ""],
    ]))
    .await
    .unwrap();
    deck.generate_audio_files(&RowFilter::all(), None)
        .await
        .unwrap();
    let mut events = deck.subscribe();

    assert!(!deck.cancel_batch().await);
    deck.sign_out().await;

    assert!(!deck.is_loaded().await);
    assert!(deck.audio_filenames().await.is_empty());
    assert_eq!(
        events.try_recv().unwrap().unwrap(),
        CoreEvent::Table(TableEvent::Cleared)
    );
}

#[tokio::test]
async fn test_missing_key_surfaces_as_configuration_error() {
    let mut provider = MockProvider::new();
    provider.expect_is_configured().return_const(false);
    provider.expect_generate_text().never();

    let deck = deck(provider);
    deck.load_values(values(&[&["Word", "Translation"], &["猫", "cat"]]))
        .await
        .unwrap();

    let err = deck.regenerate_word(0).await.unwrap_err();
    assert!(err.is_configuration());
    assert!(matches!(
        err,
        CoreError::Generation(GenerationError::Configuration(_))
    ));
    assert!(!deck.is_configured());
}

fn two_row_sheet() -> Vec<Vec<String>> {
    values(&[
        HEADER,
        &["猫", "māo", "cat", "猫很可爱。", "", "", "猫在睡觉。", "", "", "", ""],
        &["狗", "gǒu", "dog", "狗很聪明。", "", "", "狗在跑。", "", "", "", ""],
    ])
}

#[tokio::test]
async fn test_reload_rejected_while_audio_batch_runs() {
    let speech = Arc::new(SlowSpeech::new(Duration::from_millis(30)));
    let deck = Arc::new(DeckService::with_provider(config(), speech.clone()));
    deck.load_values(two_row_sheet()).await.unwrap();

    let batch = {
        let deck = Arc::clone(&deck);
        tokio::spawn(async move { deck.generate_audio_files(&RowFilter::all(), None).await })
    };
    speech.started.notified().await;
    assert!(deck.is_batch_running());

    let err = deck
        .load_values(values(&[HEADER, &["鱼", "yú", "fish", "", "", "", "", "", "", "", ""]]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Generation(GenerationError::BatchInProgress)
    ));

    let result = batch.await.unwrap().unwrap();
    assert_eq!(result.succeeded_count, 2);

    // Every asset still has its marker in the loaded sheet
    let filenames = deck.audio_filenames().await;
    assert_eq!(filenames.len(), 4);
    assert_eq!(deck.get_cell(0, 9).await.unwrap(), format!("[sound:{}]", filenames[0]));
    assert_eq!(deck.get_cell(1, 10).await.unwrap(), format!("[sound:{}]", filenames[3]));

    // Once idle, a reload goes through and drops the old assets
    deck.load_values(values(&[HEADER, &["鱼", "yú", "fish", "", "", "", "", "", "", "", ""]]))
        .await
        .unwrap();
    assert!(deck.audio_filenames().await.is_empty());
    assert_eq!(deck.get_cell(0, 0).await.unwrap(), "鱼");
}

#[tokio::test]
async fn test_sign_out_clears_after_in_flight_row() {
    let speech = Arc::new(SlowSpeech::new(Duration::from_millis(30)));
    let deck = Arc::new(DeckService::with_provider(config(), speech.clone()));
    deck.load_values(two_row_sheet()).await.unwrap();

    let batch = {
        let deck = Arc::clone(&deck);
        tokio::spawn(async move { deck.generate_audio_files(&RowFilter::all(), None).await })
    };
    speech.started.notified().await;

    deck.sign_out().await;
    assert!(!deck.is_batch_running());
    assert!(!deck.is_loaded().await);
    assert!(deck.audio_filenames().await.is_empty());

    let result = batch.await.unwrap().unwrap();
    assert!(result.cancelled);
    assert_eq!(result.succeeded_count, 1);
    assert_eq!(result.skipped_rows, vec![1]);
    assert!(deck.audio_filenames().await.is_empty());
    assert!(matches!(deck.export_audio().await, Err(CoreError::NothingToExport)));
}
