//! Core service façade and bootstrap helpers.
//!
//! [`DeckService`] wires the Row Store, the Field Generator, the Batch
//! Orchestrator and the Audio Asset Manager behind one API a host UI can
//! drive. Desktop hosts typically enable the `desktop-shims` feature, which
//! lets [`bootstrap_desktop`] pick a reqwest-backed HTTP client and read the
//! API key from the environment.

pub mod deck;
pub mod error;

pub use deck::{AudioExport, DeckService};
pub use error::{CoreError, Result};

pub use core_generation::{BatchResult, ExampleSlot, FailedRow, PassResult, RowOutcome};
pub use core_runtime::config::CoreConfig;
pub use core_table::{CellCondition, RowFilter};

/// Convenience bootstrapper for desktop hosts.
///
/// Reads `OPENAI_API_KEY` from the environment. A missing key is not an
/// error here; generation actions report it when first used.
///
/// ```no_run
/// # #[cfg(feature = "desktop-shims")]
/// # async fn example() -> core_service::Result<()> {
/// use core_service::{bootstrap_desktop, RowFilter};
///
/// let deck = bootstrap_desktop()?;
/// deck.load_values(vec![vec!["Word".into(), "Translation".into()]]).await?;
/// let result = deck.create_sentences(&RowFilter::all()).await?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop() -> Result<DeckService> {
    use core_runtime::config::ProviderConfig;

    let config = CoreConfig::builder()
        .provider(ProviderConfig::default().with_api_key_from_env())
        .build()?;
    Ok(DeckService::new(config))
}
