//! Resource materializer.
//!
//! Resolves each declared file entry (inline data URL or remote fetch) and
//! writes, extracts, or retains it per the entry's flags. One entry's
//! failure never blocks the others; the single fatal case is
//! parent-directory creation, which aborts the whole step.

use crate::error::EngineError;
use crate::types::{FileEntry, Outcome};
use base64::Engine as _;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Targets with this suffix are unpacked when `extract` is set.
pub const ARCHIVE_SUFFIX: &str = ".zip";

/// Decode the payload portion of a `data:<mime>,<base64>` locator.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, EngineError> {
    let (_, payload) = url
        .split_once(',')
        .ok_or_else(|| EngineError::resource(format!("malformed data url: {}", url)))?;
    Ok(base64::engine::general_purpose::STANDARD.decode(payload)?)
}

/// Materialize every declared file entry into the work area.
///
/// Outcomes are recorded back onto the entries for downstream consumers.
/// Entries without a source locator are left untouched.
pub async fn materialize_files(
    files: &mut BTreeMap<String, FileEntry>,
    area: &Path,
    client: &reqwest::Client,
) -> Result<(), EngineError> {
    for (name, entry) in files.iter_mut() {
        let Some(url) = entry.url.clone() else {
            continue;
        };

        let bytes = match resolve_bytes(&url, client).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("resolving {} failed: {}", name, e);
                entry.outcome = Some(Outcome::Failed(e.to_string()));
                continue;
            }
        };

        if !entry.save {
            // Resolved in place: consumers see bytes, not a re-fetchable
            // reference.
            entry.url = None;
            entry.outcome = Some(Outcome::InMemory(bytes));
            continue;
        }

        entry.outcome = Some(save_bytes(name, entry, &bytes, area)?);
    }
    Ok(())
}

async fn resolve_bytes(url: &str, client: &reqwest::Client) -> Result<Vec<u8>, EngineError> {
    if url.starts_with("data:") {
        return decode_data_url(url);
    }
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

/// Write or extract one entry's bytes.
///
/// Returns `Err` only for parent-directory creation, which is fatal for the
/// whole materialization step; every other failure is folded into
/// [`Outcome::Failed`].
fn save_bytes(
    name: &str,
    entry: &FileEntry,
    bytes: &[u8],
    area: &Path,
) -> Result<Outcome, EngineError> {
    let target = match resolve_target(area, name) {
        Ok(target) => target,
        Err(e) => return Ok(Outcome::Failed(e.to_string())),
    };

    let parent = target.parent().unwrap_or(area);
    std::fs::create_dir_all(parent).map_err(|e| {
        EngineError::resource(format!("creating directory {}: {}", parent.display(), e))
    })?;

    if name.ends_with(ARCHIVE_SUFFIX) && entry.extract {
        return Ok(extract_archive(name, entry, bytes, &target));
    }

    if entry.overwrite || !target.exists() {
        match std::fs::write(&target, bytes) {
            Ok(()) => {
                tracing::debug!("file saved: {}", target.display());
                Ok(Outcome::Written(target))
            }
            Err(e) => Ok(Outcome::Failed(format!(
                "writing {}: {}",
                target.display(),
                e
            ))),
        }
    } else {
        tracing::debug!("leaving existing {} untouched", target.display());
        Ok(Outcome::SkippedExisting)
    }
}

/// Unpack an archive entry into a directory named after the target.
///
/// With `overwrite` set the destination is removed and recreated first, so
/// anything already there is lost. Without it an existing destination skips
/// extraction entirely.
fn extract_archive(name: &str, entry: &FileEntry, bytes: &[u8], target: &Path) -> Outcome {
    let dest = target.with_extension("");

    if dest.exists() {
        if entry.overwrite {
            if let Err(e) = std::fs::remove_dir_all(&dest) {
                return Outcome::Failed(format!("clearing {}: {}", dest.display(), e));
            }
            tracing::debug!("existing directory cleared: {}", dest.display());
        } else {
            tracing::warn!(
                "skipping archive {}: overwrite=false and {} exists",
                name,
                dest.display()
            );
            return Outcome::SkippedExisting;
        }
    }

    if let Err(e) = std::fs::create_dir_all(&dest) {
        return Outcome::Failed(format!("creating {}: {}", dest.display(), e));
    }

    let reader = std::io::Cursor::new(bytes);
    let archive = match zip::ZipArchive::new(reader) {
        Ok(archive) => archive,
        Err(e) => return Outcome::Failed(format!("reading archive {}: {}", name, e)),
    };

    let mut archive = archive;
    match archive.extract(&dest) {
        Ok(()) => {
            tracing::debug!("archive extracted to {}", dest.display());
            Outcome::Extracted(dest)
        }
        Err(e) => Outcome::Failed(format!("extracting {}: {}", name, e)),
    }
}

fn resolve_target(area: &Path, rel: &str) -> Result<PathBuf, EngineError> {
    let rel_path = Path::new(rel);
    let escapes = rel_path.is_absolute()
        || rel_path
            .components()
            .any(|c| matches!(c, Component::ParentDir));
    if escapes {
        return Err(EngineError::resource(format!(
            "path {} escapes the work area",
            rel
        )));
    }
    Ok(area.join(rel_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn data_url(bytes: &[u8]) -> String {
        format!(
            "data:application/octet-stream,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        )
    }

    fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, contents) in entries {
            writer.start_file(*name, options).expect("start file");
            writer.write_all(contents.as_bytes()).expect("write entry");
        }
        writer.finish().expect("finish zip");
        cursor.into_inner()
    }

    fn entry(url: String) -> FileEntry {
        FileEntry {
            url: Some(url),
            ..FileEntry::default()
        }
    }

    async fn run(files: &mut BTreeMap<String, FileEntry>, area: &Path) {
        let client = reqwest::Client::new();
        materialize_files(files, area, &client)
            .await
            .expect("materialize");
    }

    #[test]
    fn data_url_round_trips() {
        let url = data_url(b"hello");
        assert_eq!(decode_data_url(&url).expect("decode"), b"hello");
        assert!(decode_data_url("data:no-comma").is_err());
    }

    #[tokio::test]
    async fn unsaved_entry_stays_in_memory_and_strips_url() {
        let area = tempfile::tempdir().expect("tempdir");
        let mut files = BTreeMap::new();
        files.insert(
            "notes.txt".to_string(),
            FileEntry {
                save: false,
                ..entry(data_url(b"in memory"))
            },
        );

        run(&mut files, area.path()).await;

        let entry = &files["notes.txt"];
        assert!(entry.url.is_none());
        assert_eq!(
            entry.outcome,
            Some(Outcome::InMemory(b"in memory".to_vec()))
        );
        assert!(
            std::fs::read_dir(area.path()).expect("read dir").next().is_none(),
            "save=false must not touch the filesystem"
        );
    }

    #[tokio::test]
    async fn plain_file_is_written_under_the_area() {
        let area = tempfile::tempdir().expect("tempdir");
        let mut files = BTreeMap::new();
        files.insert("docs/readme.txt".to_string(), entry(data_url(b"contents")));

        run(&mut files, area.path()).await;

        let target = area.path().join("docs/readme.txt");
        assert_eq!(std::fs::read(&target).expect("read"), b"contents");
        assert_eq!(files["docs/readme.txt"].outcome, Some(Outcome::Written(target)));
    }

    #[tokio::test]
    async fn existing_file_is_kept_without_overwrite() {
        let area = tempfile::tempdir().expect("tempdir");
        std::fs::write(area.path().join("keep.txt"), b"old").expect("seed");
        let mut files = BTreeMap::new();
        files.insert(
            "keep.txt".to_string(),
            FileEntry {
                overwrite: false,
                ..entry(data_url(b"new"))
            },
        );

        run(&mut files, area.path()).await;

        assert_eq!(
            std::fs::read(area.path().join("keep.txt")).expect("read"),
            b"old"
        );
        assert_eq!(files["keep.txt"].outcome, Some(Outcome::SkippedExisting));
    }

    #[tokio::test]
    async fn archive_overwrite_clears_unrelated_files() {
        let area = tempfile::tempdir().expect("tempdir");
        let dest = area.path().join("pkg");
        std::fs::create_dir_all(&dest).expect("seed dir");
        std::fs::write(dest.join("stale.txt"), b"stale").expect("seed file");

        let mut files = BTreeMap::new();
        files.insert(
            "pkg.zip".to_string(),
            entry(data_url(&zip_bytes(&[("fresh.txt", "fresh")]))),
        );

        run(&mut files, area.path()).await;

        assert!(!dest.join("stale.txt").exists(), "destructive by design");
        assert_eq!(
            std::fs::read(dest.join("fresh.txt")).expect("read"),
            b"fresh"
        );
        assert_eq!(files["pkg.zip"].outcome, Some(Outcome::Extracted(dest)));
    }

    #[tokio::test]
    async fn archive_without_overwrite_skips_existing_destination() {
        let area = tempfile::tempdir().expect("tempdir");
        let dest = area.path().join("pkg");
        std::fs::create_dir_all(&dest).expect("seed dir");
        std::fs::write(dest.join("existing.txt"), b"existing").expect("seed file");

        let mut files = BTreeMap::new();
        files.insert(
            "pkg.zip".to_string(),
            FileEntry {
                overwrite: false,
                ..entry(data_url(&zip_bytes(&[("fresh.txt", "fresh")])))
            },
        );

        run(&mut files, area.path()).await;

        assert_eq!(files["pkg.zip"].outcome, Some(Outcome::SkippedExisting));
        assert_eq!(
            std::fs::read(dest.join("existing.txt")).expect("read"),
            b"existing"
        );
        assert!(!dest.join("fresh.txt").exists());
    }

    #[tokio::test]
    async fn extraction_can_be_disabled() {
        let area = tempfile::tempdir().expect("tempdir");
        let raw = zip_bytes(&[("inner.txt", "x")]);
        let mut files = BTreeMap::new();
        files.insert(
            "verbatim.zip".to_string(),
            FileEntry {
                extract: false,
                ..entry(data_url(&raw))
            },
        );

        run(&mut files, area.path()).await;

        assert_eq!(
            std::fs::read(area.path().join("verbatim.zip")).expect("read"),
            raw
        );
    }

    #[tokio::test]
    async fn one_bad_entry_does_not_block_the_rest() {
        let area = tempfile::tempdir().expect("tempdir");
        let mut files = BTreeMap::new();
        files.insert("bad.zip".to_string(), entry(data_url(b"not a zip")));
        files.insert("good.txt".to_string(), entry(data_url(b"fine")));

        run(&mut files, area.path()).await;

        assert!(matches!(files["bad.zip"].outcome, Some(Outcome::Failed(_))));
        assert_eq!(
            std::fs::read(area.path().join("good.txt")).expect("read"),
            b"fine"
        );
    }

    #[tokio::test]
    async fn parent_directory_failure_aborts_the_whole_step() {
        let area = tempfile::tempdir().expect("tempdir");
        // A regular file where the parent directory should go.
        std::fs::write(area.path().join("a"), b"in the way").expect("seed");
        let mut files = BTreeMap::new();
        files.insert("a/b.txt".to_string(), entry(data_url(b"x")));
        files.insert("other.txt".to_string(), entry(data_url(b"y")));

        let client = reqwest::Client::new();
        let err = materialize_files(&mut files, area.path(), &client)
            .await
            .expect_err("must abort");
        assert!(matches!(err, EngineError::Resource(_)));
        assert!(
            !area.path().join("other.txt").exists(),
            "entries after the fatal one must not be processed"
        );
    }

    #[tokio::test]
    async fn escaping_paths_are_rejected_per_entry() {
        let area = tempfile::tempdir().expect("tempdir");
        let mut files = BTreeMap::new();
        files.insert("../escape.txt".to_string(), entry(data_url(b"x")));

        run(&mut files, area.path()).await;

        assert!(matches!(
            files["../escape.txt"].outcome,
            Some(Outcome::Failed(_))
        ));
    }
}
