//! Reading and writing DBC files
//!
//! Decodes bytes according to [`ImportOptions`], hands the text to the parser,
//! and writes serialized projects with the line endings and BOM requested by
//! [`ExportOptions`].

use crate::config::{ExportOptions, ImportOptions, TextEncoding};
use crate::dbc::{parse_into, serialize, ParseSummary};
use crate::model::Project;
use crate::types::{DbcError, Result};
use encoding_rs::GB18030;
use std::path::Path;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decode raw DBC bytes to text.
///
/// A UTF-8 byte-order mark is always removed. `Auto` tries strict UTF-8, then
/// GB18030, and finally Latin-1 when the bytes are not valid GB18030 either;
/// `Utf8` fails instead.
pub fn decode_text(bytes: &[u8], encoding: TextEncoding) -> Result<String> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match encoding {
        TextEncoding::Latin1 => Ok(latin1(body)),
        TextEncoding::Utf8 => {
            String::from_utf8(body.to_vec()).map_err(|e| DbcError::Decode(e.to_string()))
        }
        TextEncoding::Gb18030 => {
            let (text, had_errors) = GB18030.decode_without_bom_handling(body);
            if had_errors {
                log::warn!("DBC text contains invalid GB18030 sequences");
            }
            Ok(text.into_owned())
        }
        TextEncoding::Auto => {
            if body.len() != bytes.len() {
                return Ok(String::from_utf8_lossy(body).into_owned());
            }
            if let Ok(text) = std::str::from_utf8(bytes) {
                return Ok(text.to_string());
            }
            let (text, had_errors) = GB18030.decode_without_bom_handling(bytes);
            if !had_errors {
                log::info!("DBC text is not UTF-8, decoded as GB18030");
                return Ok(text.into_owned());
            }
            log::warn!("DBC text is neither UTF-8 nor GB18030, falling back to Latin-1");
            Ok(latin1(bytes))
        }
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Load a DBC file into a new project
pub fn load_project(path: &Path, options: &ImportOptions) -> Result<Project> {
    let mut project = Project::new();
    load_into(&mut project, path, options)?;
    Ok(project)
}

/// Replace the contents of `project` with the DBC file at `path`
pub fn load_into(project: &mut Project, path: &Path, options: &ImportOptions) -> Result<ParseSummary> {
    log::info!("Loading DBC file: {:?}", path);

    let bytes = std::fs::read(path)?;
    let text = decode_text(&bytes, options.encoding)?;
    let summary = parse_into(project, &text);

    log::info!(
        "Loaded {} messages, {} value tables from {:?} ({} statements skipped)",
        project.messages.len(),
        project.value_table_names().len(),
        path,
        summary.skipped
    );
    Ok(summary)
}

/// Serialize `project` and write it to `path`
pub fn save_project(project: &Project, path: &Path, options: &ExportOptions) -> Result<()> {
    let bytes = options.encode(&serialize(project));
    std::fs::write(path, bytes)?;
    log::info!("Saved DBC file: {:?}", path);
    Ok(())
}
