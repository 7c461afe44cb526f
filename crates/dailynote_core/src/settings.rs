//! Daily-notes settings, `daily-notes.toml`.
//!
//! ```toml
//! storage_directory = "daily-notes"   # relative to the vault root
//! initial_page_size = 30              # 7..=90, first load
//! page_size = 20                      # 5..=50, each "load older"
//! ```
//!
//! Every field has a default, so a missing or empty file is equivalent to
//! `DailyNoteSettings::default()`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_STORAGE_DIRECTORY: &str = "daily-notes";
pub const DEFAULT_INITIAL_PAGE_SIZE: u32 = 30;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const INITIAL_PAGE_SIZE_RANGE: RangeInclusive<u32> = 7..=90;
pub const PAGE_SIZE_RANGE: RangeInclusive<u32> = 5..=50;

/// Settings parse/validation failure.
#[derive(Debug)]
pub enum SettingsError {
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
    InvalidStorageDirectory(String),
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid settings file: {err}"),
            Self::Serialize(err) => write!(f, "failed to serialize settings: {err}"),
            Self::InvalidStorageDirectory(value) => {
                write!(f, "storage_directory must be a non-empty relative path: `{value}`")
            }
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{field} must be within {min}..={max}, got {value}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Serialize(err) => Some(err),
            _ => None,
        }
    }
}

/// User-facing configuration for the daily-notes core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyNoteSettings {
    /// Folder holding `YYYY-MM-DD.md` files, relative to the vault root.
    #[serde(default = "default_storage_directory")]
    pub storage_directory: String,
    /// Notes returned by the first page load.
    #[serde(default = "default_initial_page_size")]
    pub initial_page_size: u32,
    /// Notes returned by each subsequent "load older" request.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_storage_directory() -> String {
    DEFAULT_STORAGE_DIRECTORY.to_string()
}

fn default_initial_page_size() -> u32 {
    DEFAULT_INITIAL_PAGE_SIZE
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for DailyNoteSettings {
    fn default() -> Self {
        Self {
            storage_directory: default_storage_directory(),
            initial_page_size: default_initial_page_size(),
            page_size: default_page_size(),
        }
    }
}

impl DailyNoteSettings {
    /// Settings with a custom storage directory and default page sizes.
    pub fn new(storage_directory: impl Into<String>) -> Self {
        Self {
            storage_directory: storage_directory.into(),
            ..Self::default()
        }
    }

    pub fn with_page_sizes(mut self, initial_page_size: u32, page_size: u32) -> Self {
        self.initial_page_size = initial_page_size;
        self.page_size = page_size;
        self
    }

    /// The well-known settings filename.
    pub fn filename() -> &'static str {
        "daily-notes.toml"
    }

    /// Parses and validates TOML.
    pub fn from_toml(s: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(s).map_err(SettingsError::Parse)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml(&self) -> Result<String, SettingsError> {
        toml::to_string_pretty(self).map_err(SettingsError::Serialize)
    }

    /// Checks ranges and the storage directory shape.
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_range(
            "initial_page_size",
            self.initial_page_size,
            &INITIAL_PAGE_SIZE_RANGE,
        )?;
        check_range("page_size", self.page_size, &PAGE_SIZE_RANGE)?;

        if canonical_directory(&self.storage_directory).is_none() {
            return Err(SettingsError::InvalidStorageDirectory(
                self.storage_directory.clone(),
            ));
        }
        Ok(())
    }

    /// Lenient copy: clamps page sizes into range and reduces the directory
    /// to plain relative segments.
    ///
    /// Leading slashes are stripped. A directory that still fails
    /// `validate` (blank, `..`, drive prefix) falls back to the default.
    pub fn normalized(&self) -> Self {
        let relative = self.storage_directory.trim().trim_start_matches(['/', '\\']);
        Self {
            storage_directory: canonical_directory(relative)
                .unwrap_or_else(default_storage_directory),
            initial_page_size: clamp(self.initial_page_size, &INITIAL_PAGE_SIZE_RANGE),
            page_size: clamp(self.page_size, &PAGE_SIZE_RANGE),
        }
    }

    /// Storage directory as a vault-relative path without `.` segments.
    pub fn storage_path(&self) -> PathBuf {
        PathBuf::from(self.normalized().storage_directory)
    }
}

/// Joins the plain segments of `value` with `/`.
///
/// `None` for blank, absolute, prefixed, or parent-escaping paths.
fn canonical_directory(value: &str) -> Option<String> {
    let mut segments = Vec::new();
    for component in Path::new(value.trim()).components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_str()?),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

fn check_range(
    field: &'static str,
    value: u32,
    range: &RangeInclusive<u32>,
) -> Result<(), SettingsError> {
    if range.contains(&value) {
        return Ok(());
    }
    Err(SettingsError::OutOfRange {
        field,
        value,
        min: *range.start(),
        max: *range.end(),
    })
}

fn clamp(value: u32, range: &RangeInclusive<u32>) -> u32 {
    value.clamp(*range.start(), *range.end())
}

#[cfg(test)]
mod tests {
    use super::{DailyNoteSettings, SettingsError};
    use std::path::PathBuf;

    #[test]
    fn empty_document_yields_defaults() {
        let settings = DailyNoteSettings::from_toml("").unwrap();
        assert_eq!(settings, DailyNoteSettings::default());
        assert_eq!(settings.storage_directory, "daily-notes");
        assert_eq!(settings.initial_page_size, 30);
        assert_eq!(settings.page_size, 20);
    }

    #[test]
    fn toml_roundtrip_keeps_values() {
        let settings = DailyNoteSettings::new("journal/daily").with_page_sizes(14, 7);
        let text = settings.to_toml().unwrap();
        assert!(text.contains("storage_directory = \"journal/daily\""));
        assert_eq!(DailyNoteSettings::from_toml(&text).unwrap(), settings);
    }

    #[test]
    fn validate_rejects_out_of_range_sizes() {
        let err = DailyNoteSettings::from_toml("initial_page_size = 6").unwrap_err();
        assert!(matches!(
            err,
            SettingsError::OutOfRange {
                field: "initial_page_size",
                ..
            }
        ));
        assert!(DailyNoteSettings::from_toml("page_size = 51").is_err());
        assert!(DailyNoteSettings::from_toml("page_size = 5").is_ok());
    }

    #[test]
    fn validate_rejects_escaping_or_absolute_directories() {
        for dir in ["", "   ", "/abs/notes", "../outside", "notes/../../x"] {
            let settings = DailyNoteSettings::new(dir);
            assert!(
                matches!(
                    settings.validate(),
                    Err(SettingsError::InvalidStorageDirectory(_))
                ),
                "`{dir}` should be rejected"
            );
        }
    }

    #[test]
    fn normalized_clamps_and_trims() {
        let settings = DailyNoteSettings {
            storage_directory: "  journal/  ".to_string(),
            initial_page_size: 1000,
            page_size: 0,
        };
        let normalized = settings.normalized();
        assert_eq!(normalized.storage_directory, "journal");
        assert_eq!(normalized.initial_page_size, 90);
        assert_eq!(normalized.page_size, 5);
        assert!(normalized.validate().is_ok());
        assert_eq!(normalized.storage_path(), PathBuf::from("journal"));

        assert_eq!(
            DailyNoteSettings::new(" ").normalized().storage_directory,
            "daily-notes"
        );
    }

    #[test]
    fn normalized_never_leaves_the_vault() {
        let cases = [
            ("/tmp/notes", "tmp/notes"),
            ("//journal/", "journal"),
            ("../outside", "daily-notes"),
            ("notes/../../x", "daily-notes"),
            ("/", "daily-notes"),
            (".", "daily-notes"),
        ];
        for (raw, expected) in cases {
            let normalized = DailyNoteSettings::new(raw).normalized();
            assert_eq!(normalized.storage_directory, expected, "input `{raw}`");
            assert!(normalized.validate().is_ok(), "input `{raw}`");
            assert!(normalized.storage_path().is_relative());
        }
    }

    #[test]
    fn current_dir_segments_are_dropped() {
        let settings = DailyNoteSettings::new("./journal/./daily/");
        assert!(settings.validate().is_ok());
        assert_eq!(settings.normalized().storage_directory, "journal/daily");
        assert_eq!(settings.storage_path(), PathBuf::from("journal/daily"));
    }
}
