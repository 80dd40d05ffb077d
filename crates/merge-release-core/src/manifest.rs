//! Reading and rewriting `package.json` manifests.
//!
//! Version updates replace only the bytes of the `version` value so the rest of
//! the file (key order, indentation, trailing newline) stays untouched and the
//! source-control diff is a single line.

use crate::errors::{ReleaseError, Result, io_error_with_path};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use serde_json::value::RawValue;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "package.json";

/// Package manager used to run the publish step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PackageManager {
    #[default]
    Npm,
    Pnpm,
    Yarn,
    Bun,
}

impl PackageManager {
    pub fn program(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Pnpm => "pnpm",
            Self::Yarn => "yarn",
            Self::Bun => "bun",
        }
    }

    /// Parse the `packageManager` manifest field (e.g. `pnpm@9.1.0`).
    fn from_field(field: &str) -> Option<Self> {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            return None;
        }
        let (tool, _) = trimmed.split_once('@').unwrap_or((trimmed, ""));
        match tool {
            "pnpm" => Some(Self::Pnpm),
            "npm" => Some(Self::Npm),
            "yarn" => Some(Self::Yarn),
            "bun" => Some(Self::Bun),
            _ => None,
        }
    }
}

/// A parsed `package.json`.
#[derive(Debug, Clone)]
pub struct PackageManifest {
    path: PathBuf,
    name: String,
    version: Option<String>,
    has_publish_script: bool,
    package_manager: PackageManager,
}

impl PackageManifest {
    /// Load the manifest from `dir/package.json`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = manifest_path(dir);
        let text = fs::read_to_string(&path).map_err(|e| io_error_with_path(e, &path))?;
        Self::parse(path, &text)
    }

    fn parse(path: PathBuf, text: &str) -> Result<Self> {
        let manifest: JsonValue = serde_json::from_str(text)
            .map_err(|e| ReleaseError::Manifest(format!("{}: {}", path.display(), e)))?;

        let name = manifest
            .get("name")
            .and_then(JsonValue::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ReleaseError::Manifest(format!(
                    "Manifest {} is missing a non-empty 'name' field",
                    path.display()
                ))
            })?
            .to_string();

        let version = manifest
            .get("version")
            .and_then(JsonValue::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let has_publish_script = manifest
            .get("scripts")
            .and_then(JsonValue::as_object)
            .is_some_and(|scripts| scripts.contains_key("publish"));

        let package_manager = manifest
            .get("packageManager")
            .and_then(JsonValue::as_str)
            .and_then(PackageManager::from_field)
            .unwrap_or_default();

        Ok(Self {
            path,
            name,
            version,
            has_publish_script,
            package_manager,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Whether the manifest declares its own `publish` script.
    pub fn has_publish_script(&self) -> bool {
        self.has_publish_script
    }

    pub fn package_manager(&self) -> PackageManager {
        self.package_manager
    }
}

pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILE)
}

/// Rewrite the `version` field of `dir/package.json` in place.
pub fn write_version(dir: &Path, version: &str) -> Result<()> {
    let path = manifest_path(dir);
    let input = fs::read_to_string(&path).map_err(|e| io_error_with_path(e, &path))?;
    let output = replace_version(&path, &input, version)?;
    if output != input {
        fs::write(&path, output).map_err(|e| io_error_with_path(e, &path))?;
    }
    Ok(())
}

/// Read back the `version` field of `dir/package.json`.
pub fn read_version(dir: &Path) -> Result<Option<String>> {
    Ok(PackageManifest::load(dir)?.version)
}

/// Return `input` with its top-level `version` value replaced.
///
/// A manifest without a `version` field gets one inserted right after the
/// opening brace.
fn replace_version(path: &Path, input: &str, new_version: &str) -> Result<String> {
    #[derive(Deserialize)]
    struct PackageJsonBorrowed<'a> {
        #[serde(borrow)]
        version: Option<&'a RawValue>,
    }

    let borrowed: PackageJsonBorrowed = serde_json::from_str(input).map_err(|err| {
        ReleaseError::Manifest(format!("Failed to parse {}: {err}", path.display()))
    })?;
    let quoted = serde_json::to_string(new_version)
        .map_err(|err| ReleaseError::Manifest(format!("cannot encode version: {err}")))?;

    let mut output = input.to_string();
    match borrowed.version {
        Some(raw) => {
            let current: String = serde_json::from_str(raw.get()).map_err(|err| {
                ReleaseError::Manifest(format!(
                    "Version field in {} is not a string: {err}",
                    path.display()
                ))
            })?;
            if current != new_version {
                let (start, end) = raw_span(raw, input)?;
                output.replace_range(start..end, &quoted);
            }
        }
        None => {
            let brace = input.find('{').ok_or_else(|| {
                ReleaseError::Manifest(format!("{} is not a JSON object", path.display()))
            })?;
            let rest_is_empty = input[brace + 1..].trim_start().starts_with('}');
            let insertion = if rest_is_empty {
                format!("\n  \"version\": {quoted}\n")
            } else {
                format!("\n  \"version\": {quoted},")
            };
            output.insert_str(brace + 1, &insertion);
        }
    }
    Ok(output)
}

/// Compute the byte span of a `RawValue` within the original JSON source.
fn raw_span(raw: &RawValue, source: &str) -> Result<(usize, usize)> {
    let slice = raw.get();
    let start = (slice.as_ptr() as usize).checked_sub(source.as_ptr() as usize);
    match start {
        Some(start) if start + slice.len() <= source.len() => Ok((start, start + slice.len())),
        _ => Err(ReleaseError::Manifest(
            "internal error: RawValue is not derived from the provided JSON source".into(),
        )),
    }
}
