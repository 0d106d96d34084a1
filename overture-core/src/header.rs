//! Header/template splitter.
//!
//! Separates the embedded prompt payload into a YAML front-matter header and
//! a template body. Two indirections are resolved first: a payload of the
//! exact form `##<path>##` is replaced by that file's contents, and a
//! `data:<mime>,<base64>` payload is decoded as a zip archive, extracted into
//! the work area, and replaced by its prompt-definition file.

use crate::error::EngineError;
use crate::materialize::decode_data_url;
use crate::types::{ChatRequest, Header};
use crate::workarea::WorkArea;
use regex::Regex;
use std::sync::OnceLock;

/// Suffix identifying the prompt-definition file inside an encoded archive.
pub const PROMPT_FILE_SUFFIX: &str = ".prompt";

/// Result of splitting the prompt payload.
#[derive(Debug, Clone)]
pub struct SplitPrompt {
    pub header: Header,
    pub body: String,
}

fn front_matter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)\A---\s*\n(.*?)\n---\s*\n?(.*)\z").expect("front-matter regex")
    })
}

fn file_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\A##([^\n#]+)##\z").expect("file-ref regex"))
}

/// Split the request's system-message payload into header and template body.
///
/// Absence of a system message or of a front-matter block yields an empty
/// header and the payload as the body. A malformed YAML block is the one
/// splitter failure that aborts the request: [`EngineError::ConfigParse`].
pub fn split_system_prompt(
    request: &ChatRequest,
    area: &WorkArea,
) -> Result<SplitPrompt, EngineError> {
    let mut payload = request.system_content().unwrap_or_default().to_string();

    if let Some(caps) = file_ref_re().captures(&payload) {
        let path = caps[1].to_string();
        match std::fs::read_to_string(&path) {
            Ok(contents) => payload = contents,
            Err(e) => tracing::warn!("failed to read referenced template {}: {}", path, e),
        }
    }

    if payload.starts_with("data:") && payload.contains(',') {
        payload = match inflate_archive_payload(&payload, area) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("encoded archive payload rejected: {}", e);
                String::new()
            }
        };
    }

    match front_matter_re().captures(&payload) {
        Some(caps) => {
            let header: Header = serde_yaml::from_str(&caps[1])
                .map_err(|e| EngineError::config_parse(e.to_string()))?;
            Ok(SplitPrompt {
                header,
                body: caps[2].to_string(),
            })
        }
        None => Ok(SplitPrompt {
            header: Header::default(),
            body: payload,
        }),
    }
}

/// Decode the payload as a zip archive, extract it into the work area, and
/// return the contents of its prompt-definition file (empty if none).
fn inflate_archive_payload(payload: &str, area: &WorkArea) -> Result<String, EngineError> {
    let bytes = decode_data_url(payload)?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))?;
    archive.extract(area.path())?;

    let mut candidates: Vec<&str> = archive
        .file_names()
        .filter(|name| name.ends_with(PROMPT_FILE_SUFFIX))
        .collect();
    candidates.sort_unstable();

    match candidates.first() {
        Some(name) => {
            tracing::debug!("archive payload provides template {}", name);
            Ok(std::fs::read_to_string(area.path().join(name))?)
        }
        None => {
            tracing::warn!("archive payload has no *{} file", PROMPT_FILE_SUFFIX);
            Ok(String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use base64::Engine as _;
    use std::io::Write as _;

    fn request_with_system(payload: &str) -> ChatRequest {
        ChatRequest::new(
            vec![Message::system(payload), Message::user("hi")],
            false,
        )
    }

    fn scratch_area() -> (tempfile::TempDir, WorkArea) {
        let root = tempfile::tempdir().expect("tempdir");
        let area = WorkArea::new_in(root.path()).expect("area");
        (root, area)
    }

    #[test]
    fn no_system_message_yields_empty_split() {
        let (_root, area) = scratch_area();
        let request = ChatRequest::new(vec![Message::user("hi")], false);
        let split = split_system_prompt(&request, &area).expect("split");
        assert!(split.header.model.is_none());
        assert!(split.body.is_empty());
    }

    #[test]
    fn payload_without_front_matter_is_all_body() {
        let (_root, area) = scratch_area();
        let request = request_with_system("You are a helpful assistant.");
        let split = split_system_prompt(&request, &area).expect("split");
        assert!(split.header.extra.is_empty());
        assert_eq!(split.body, "You are a helpful assistant.");
    }

    #[test]
    fn front_matter_parses_into_header() {
        let (_root, area) = scratch_area();
        let request = request_with_system(
            "---\nmodel: llama3.1\nollama_url: http://localhost:11434\n---\nAnswer in {tone}.",
        );
        let split = split_system_prompt(&request, &area).expect("split");
        assert_eq!(split.header.model.as_deref(), Some("llama3.1"));
        assert_eq!(split.body, "Answer in {tone}.");
    }

    #[test]
    fn split_round_trips_through_reconcatenation() {
        let (_root, area) = scratch_area();
        let payload = "---\nmodel: llama3.1\ntone: dry\n---\nBody {tone} text\n";
        let first = split_system_prompt(&request_with_system(payload), &area).expect("split");

        let yaml = serde_yaml::to_string(&first.header).expect("yaml");
        let rebuilt = format!("---\n{}---\n{}", yaml, first.body);
        let second = split_system_prompt(&request_with_system(&rebuilt), &area).expect("resplit");

        assert_eq!(second.header.model, first.header.model);
        assert_eq!(second.header.extra, first.header.extra);
        assert_eq!(second.body, first.body);
    }

    #[test]
    fn malformed_yaml_is_a_config_parse_error() {
        let (_root, area) = scratch_area();
        let request = request_with_system("---\nmodel: [unclosed\n---\nbody");
        let err = split_system_prompt(&request, &area).expect_err("must fail");
        assert!(matches!(err, EngineError::ConfigParse(_)));
    }

    #[test]
    fn file_reference_payload_is_substituted() {
        let (_root, area) = scratch_area();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tpl.txt");
        std::fs::write(&path, "---\nmodel: m\n---\nfrom file").expect("write");
        let request = request_with_system(&format!("##{}##", path.display()));
        let split = split_system_prompt(&request, &area).expect("split");
        assert_eq!(split.header.model.as_deref(), Some("m"));
        assert_eq!(split.body, "from file");
    }

    #[test]
    fn missing_file_reference_keeps_payload() {
        let (_root, area) = scratch_area();
        let request = request_with_system("##/no/such/file##");
        let split = split_system_prompt(&request, &area).expect("split");
        assert_eq!(split.body, "##/no/such/file##");
    }

    fn archive_payload(entries: &[(&str, &str)]) -> String {
        let mut cursor = std::io::Cursor::new(Vec::new());
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, contents) in entries {
            writer.start_file(*name, options).expect("start file");
            writer.write_all(contents.as_bytes()).expect("write entry");
        }
        writer.finish().expect("finish zip");
        format!(
            "data:application/zip,{}",
            base64::engine::general_purpose::STANDARD.encode(cursor.into_inner())
        )
    }

    #[test]
    fn archive_payload_substitutes_prompt_file() {
        let (_root, area) = scratch_area();
        let payload = archive_payload(&[
            ("notes.txt", "irrelevant"),
            ("main.prompt", "---\nmodel: m\n---\nfrom archive"),
        ]);
        let split = split_system_prompt(&request_with_system(&payload), &area).expect("split");
        assert_eq!(split.header.model.as_deref(), Some("m"));
        assert_eq!(split.body, "from archive");
        // Side effect: archive contents land in the work area.
        assert!(area.path().join("notes.txt").is_file());
    }

    #[test]
    fn archive_without_prompt_file_empties_payload() {
        let (_root, area) = scratch_area();
        let payload = archive_payload(&[("notes.txt", "irrelevant")]);
        let split = split_system_prompt(&request_with_system(&payload), &area).expect("split");
        assert!(split.body.is_empty());
        assert!(split.header.extra.is_empty());
    }

    #[test]
    fn corrupt_archive_payload_degrades_to_empty() {
        let (_root, area) = scratch_area();
        let payload = format!(
            "data:application/zip,{}",
            base64::engine::general_purpose::STANDARD.encode(b"not a zip")
        );
        let split = split_system_prompt(&request_with_system(&payload), &area).expect("split");
        assert!(split.body.is_empty());
    }
}
