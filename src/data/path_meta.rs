//! Metadata carried by the folder a scan file lives in.
//!
//! The scanner's operators name each scan folder
//! `{prefix}{sample}{sep}{scan}{sep}{flag}`, e.g. `s07-2-A` or `s07_2_c`,
//! where `sep` is `-` or `_` and the one-character prefix is dropped.

use std::path::Path;

use log::warn;

use crate::config::AcPolicy;
use crate::error::PathFormatError;

use super::model::{AcLabel, PathMetadata};

/// Read metadata from the name of `path`'s parent folder.
pub fn parse_path(path: &Path, policy: AcPolicy) -> Result<PathMetadata, PathFormatError> {
    let folder = path
        .parent()
        .and_then(|p| p.file_name())
        .ok_or(PathFormatError::MissingParent)?;
    parse_segment(&folder.to_string_lossy(), policy)
}

/// Parse a single folder name.
///
/// A `-` anywhere in the name makes `-` the separator; otherwise `_` is
/// used. Fields past the ones `policy` needs are ignored.
pub fn parse_segment(segment: &str, policy: AcPolicy) -> Result<PathMetadata, PathFormatError> {
    let sep = separator(segment).ok_or_else(|| PathFormatError::NoSeparator {
        segment: segment.to_string(),
    })?;
    let fields: Vec<&str> = segment.split(sep).collect();

    let expected = policy.required_fields();
    if fields.len() < expected {
        return Err(PathFormatError::TooFewFields {
            segment: segment.to_string(),
            found: fields.len(),
            expected,
        });
    }

    let sample = strip_prefix_char(fields[0]);
    let scan = fields[1];
    for (field, value) in [("sample", sample), ("scan", scan)] {
        if value.is_empty() {
            warn!("Folder name '{segment}' has an empty {field} field");
        }
    }

    let ac = match policy {
        AcPolicy::Label => AcLabel::from_flag(fields[2]),
        AcPolicy::Placeholder => AcLabel::Unlabelled,
    };

    Ok(PathMetadata {
        sample: sample.to_string(),
        scan: scan.to_string(),
        ac,
    })
}

fn separator(segment: &str) -> Option<char> {
    ['-', '_'].into_iter().find(|&c| segment.contains(c))
}

fn strip_prefix_char(s: &str) -> &str {
    let mut chars = s.chars();
    chars.next();
    chars.as_str()
}
