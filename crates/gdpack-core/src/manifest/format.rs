//! Manifest encoding and decoding with helpful error messages.
//!
//! TOML is the default encoding; files ending in `.json` use JSON.

use std::path::Path;

use super::Manifest;
use crate::{Error, Result};

/// Encoding used for a persisted manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ManifestFormat {
    #[default]
    Toml,
    Json,
}

impl ManifestFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(std::ffi::OsStr::to_str) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// Parse TOML manifest content.
pub fn parse(content: &str) -> Result<Manifest> {
    parse_str(content, ManifestFormat::Toml)
}

/// Parse manifest content in the given format.
pub fn parse_str(content: &str, format: ManifestFormat) -> Result<Manifest> {
    decode(content, format).map_err(|message| Error::Decode {
        path: None,
        message,
    })
}

/// Parse the manifest at `path`, choosing the format from its extension.
pub fn parse_file(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

    decode(&content, ManifestFormat::from_path(path)).map_err(|message| Error::Decode {
        path: Some(path.to_path_buf()),
        message,
    })
}

/// Serialize a manifest.
///
/// Fails with `InvalidSpec` rather than encode a spec that would be rejected
/// when read back.
pub fn to_string(manifest: &Manifest, format: ManifestFormat) -> Result<String> {
    manifest.validate()?;

    let encoded = match format {
        ManifestFormat::Toml => toml::to_string_pretty(manifest).map_err(|e| e.to_string()),
        ManifestFormat::Json => serde_json::to_string_pretty(manifest)
            .map(|mut json| {
                json.push('\n');
                json
            })
            .map_err(|e| e.to_string()),
    };

    encoded.map_err(|message| Error::Encode { message })
}

/// Persist a manifest to `path`.
///
/// The manifest is fully encoded before the file is touched, and the file is
/// replaced through a sibling temporary file so a failed write never leaves a
/// truncated manifest behind.
pub fn write(manifest: &Manifest, path: &Path) -> Result<()> {
    let content = to_string(manifest, ManifestFormat::from_path(path))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, content).map_err(|e| Error::io(&tmp_path, e))?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(Error::io(path, e));
    }

    tracing::debug!(path = %path.display(), "wrote manifest");

    Ok(())
}

fn decode(content: &str, format: ManifestFormat) -> std::result::Result<Manifest, String> {
    match format {
        ManifestFormat::Toml => toml::from_str(content).map_err(|e| enhance_toml_error(&e, content)),
        ManifestFormat::Json => serde_json::from_str(content).map_err(|e| {
            format!("JSON parsing error at line {}: {}", e.line(), e)
        }),
    }
}

/// Point at the offending line and column of a TOML error.
fn enhance_toml_error(error: &toml::de::Error, content: &str) -> String {
    let message = error.message();

    let Some(span) = error.span() else {
        return format!("TOML parsing error: {}", message);
    };

    let offset = span.start.min(content.len());
    let before = &content[..offset];
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let line_num = before.matches('\n').count() + 1;
    let column = before[line_start..].chars().count();
    let line = content[line_start..].lines().next().unwrap_or_default();

    format!(
        "TOML parsing error at line {}, column {}:\n    {}\n    {}^\n{}",
        line_num,
        column + 1,
        line,
        " ".repeat(column),
        message
    )
}
