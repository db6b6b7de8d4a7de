//! # Audio Asset Manager
//!
//! Generated mp3 files live in memory, in generation order, until the user
//! exports them as a zip archive for Anki's media folder. Cells refer to an
//! asset by filename through a `[sound:<filename>]` marker.

use std::io::{Cursor, Write};

use bytes::Bytes;
use rand::Rng;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{GenerationError, Result};

const MAX_LABEL_LEN: usize = 30;
const FALLBACK_LABEL: &str = "audio";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAsset {
    pub filename: String,
    pub bytes: Bytes,
}

#[derive(Debug, Default)]
pub struct AudioAssetManager {
    assets: Vec<AudioAsset>,
}

impl AudioAssetManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an asset. A filename that is already stored is overwritten in
    /// place, keeping its original position.
    pub fn store(&mut self, filename: impl Into<String>, bytes: Bytes) {
        let filename = filename.into();
        if let Some(existing) = self.find_mut(&filename) {
            warn!(filename = %filename, "Audio filename already stored, overwriting");
            existing.bytes = bytes;
            return;
        }
        debug!(filename = %filename, size = bytes.len(), "Stored audio asset");
        self.assets.push(AudioAsset { filename, bytes });
    }

    /// Overwrite the bytes of an existing asset.
    pub fn replace(&mut self, filename: &str, bytes: Bytes) -> Result<()> {
        let asset = self
            .find_mut(filename)
            .ok_or_else(|| GenerationError::NotFound(format!("audio asset {}", filename)))?;
        asset.bytes = bytes;
        debug!(filename = %filename, "Replaced audio asset");
        Ok(())
    }

    pub fn get(&self, filename: &str) -> Option<&AudioAsset> {
        self.assets.iter().find(|asset| asset.filename == filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.get(filename).is_some()
    }

    pub fn filenames(&self) -> Vec<&str> {
        self.assets.iter().map(|asset| asset.filename.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn clear(&mut self) {
        self.assets.clear();
    }

    /// Build a zip archive with one stored (uncompressed) entry per asset.
    ///
    /// An empty manager yields a valid archive with no entries.
    pub fn export_all(&self) -> Result<Bytes> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        for asset in &self.assets {
            writer.start_file(asset.filename.as_str(), options)?;
            writer.write_all(&asset.bytes)?;
        }

        let cursor = writer.finish()?;
        debug!(entries = self.assets.len(), "Exported audio archive");
        Ok(Bytes::from(cursor.into_inner()))
    }

    fn find_mut(&mut self, filename: &str) -> Option<&mut AudioAsset> {
        self.assets
            .iter_mut()
            .find(|asset| asset.filename == filename)
    }
}

/// Reduce a label to `[A-Za-z0-9_]`, at most 30 characters.
///
/// Runs of other characters become a single `_`; leading and trailing `_`
/// are dropped. An empty result falls back to `audio`.
pub fn sanitize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed: String = out.trim_matches('_').chars().take(MAX_LABEL_LEN).collect();
    if trimmed.is_empty() {
        FALLBACK_LABEL.to_string()
    } else {
        trimmed
    }
}

/// `[<prefix>_]<label>_s<slot>_<5 digits>.mp3`
pub fn make_audio_filename<R: Rng + ?Sized>(
    prefix: Option<&str>,
    label: &str,
    slot: u8,
    rng: &mut R,
) -> String {
    let suffix: u32 = rng.gen_range(10000..=99999);
    let base = format!("{}_s{}_{}.mp3", sanitize_label(label), slot, suffix);
    match prefix.map(str::trim).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{}_{}", prefix, base),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Read;

    fn read_entries(archive: Bytes) -> Vec<(String, Vec<u8>)> {
        let mut zip = zip::ZipArchive::new(Cursor::new(archive.to_vec())).unwrap();
        let mut entries = Vec::new();
        for i in 0..zip.len() {
            let mut file = zip.by_index(i).unwrap();
            let mut contents = Vec::new();
            file.read_to_end(&mut contents).unwrap();
            entries.push((file.name().to_string(), contents));
        }
        entries
    }

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("apple pie!"), "apple_pie");
        assert_eq!(sanitize_label("nǐ hǎo"), "n_h_o");
        assert_eq!(sanitize_label("  --  "), "audio");
        assert_eq!(sanitize_label(""), "audio");
        assert_eq!(sanitize_label("a".repeat(40).as_str()).len(), 30);
    }

    #[test]
    fn test_filename_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let name = make_audio_filename(None, "apple pie!", 1, &mut rng);
        let digits = name
            .strip_prefix("apple_pie_s1_")
            .and_then(|rest| rest.strip_suffix(".mp3"))
            .unwrap();
        assert_eq!(digits.len(), 5);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
        let number: u32 = digits.parse().unwrap();
        assert!((10000..=99999).contains(&number));
    }

    #[test]
    fn test_filename_prefix() {
        let mut rng = StdRng::seed_from_u64(7);
        let name = make_audio_filename(Some("hsk3"), "mao1", 2, &mut rng);
        assert!(name.starts_with("hsk3_mao1_s2_"));

        let name = make_audio_filename(Some("  "), "mao1", 2, &mut rng);
        assert!(name.starts_with("mao1_s2_"));
    }

    #[test]
    fn test_store_keeps_insertion_order_and_overwrites_duplicates() {
        let mut manager = AudioAssetManager::new();
        manager.store("b.mp3", Bytes::from_static(b"1"));
        manager.store("a.mp3", Bytes::from_static(b"2"));
        manager.store("b.mp3", Bytes::from_static(b"3"));

        assert_eq!(manager.filenames(), vec!["b.mp3", "a.mp3"]);
        assert_eq!(manager.get("b.mp3").unwrap().bytes, Bytes::from_static(b"3"));
    }

    #[test]
    fn test_replace_missing_asset_is_not_found() {
        let mut manager = AudioAssetManager::new();
        let err = manager.replace("nope.mp3", Bytes::new()).unwrap_err();
        assert!(matches!(err, GenerationError::NotFound(_)));
    }

    #[test]
    fn test_replace_then_export_holds_new_bytes() {
        let mut manager = AudioAssetManager::new();
        manager.store("foo.mp3", Bytes::from_static(b"B1"));
        manager.store("bar.mp3", Bytes::from_static(b"X"));
        manager.replace("foo.mp3", Bytes::from_static(b"B2")).unwrap();

        let entries = read_entries(manager.export_all().unwrap());
        assert_eq!(
            entries,
            vec![
                ("foo.mp3".to_string(), b"B2".to_vec()),
                ("bar.mp3".to_string(), b"X".to_vec()),
            ]
        );
    }

    #[test]
    fn test_export_empty_manager() {
        let manager = AudioAssetManager::new();
        assert!(read_entries(manager.export_all().unwrap()).is_empty());
    }

    #[test]
    fn test_clear() {
        let mut manager = AudioAssetManager::new();
        manager.store("foo.mp3", Bytes::from_static(b"1"));
        manager.clear();
        assert!(manager.is_empty());
        assert!(!manager.contains("foo.mp3"));
    }
}
