use std::path::Path;

use log::debug;

use crate::config::AcPolicy;
use crate::error::{ExportError, ParseError, Result};

use super::model::{ParsedTable, Point};
use super::path_meta::parse_path;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load one `.t2t` file: decode its numeric body, then tag it with the
/// metadata of the folder it sits in.
///
/// The body is parsed before the folder name is inspected, so a file with
/// bad numbers is reported as a parse error even if its folder is misnamed.
pub fn load_file(path: &Path, header_lines: usize, policy: AcPolicy) -> Result<ParsedTable> {
    let text = std::fs::read_to_string(path).map_err(|source| ExportError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let points = parse_t2t(&text, header_lines).map_err(|source| ExportError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let metadata = parse_path(path, policy).map_err(|source| ExportError::PathFormat {
        path: path.to_path_buf(),
        source,
    })?;

    let table = ParsedTable::new(path, metadata, points)?;
    debug!(
        "{}: {} points, {} channels",
        path.display(),
        table.len(),
        table.channels()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// .t2t body
// ---------------------------------------------------------------------------

/// Decode the text of a `.t2t` export.
///
/// Layout:
/// ```text
/// <header line 1>
/// ...
/// <header line `header_lines`>
/// x,y,z,c1,c2,...,cN
/// x,y,z,c1,c2,...,cN
/// ```
///
/// The header is dropped without looking at it. Every remaining line must
/// hold the same number of comma-separated `f32` values, at least three.
pub fn parse_t2t(text: &str, header_lines: usize) -> std::result::Result<Vec<Point>, ParseError> {
    let mut width: Option<usize> = None;
    let mut points = Vec::new();

    for (idx, line) in text.trim().split('\n').enumerate().skip(header_lines) {
        let line_no = idx + 1;
        let values = parse_line(line.trim_end_matches('\r'), line_no)?;

        match width {
            None => {
                if values.len() < 3 {
                    return Err(ParseError::TooFewColumns {
                        found: values.len(),
                    });
                }
                width = Some(values.len());
            }
            Some(expected) if expected != values.len() => {
                return Err(ParseError::RaggedRow {
                    line: line_no,
                    expected,
                    found: values.len(),
                });
            }
            Some(_) => {}
        }

        points.push(Point::from_values(values));
    }

    if points.is_empty() {
        return Err(ParseError::NoDataRows { header_lines });
    }
    Ok(points)
}

fn parse_line(line: &str, line_no: usize) -> std::result::Result<Vec<f32>, ParseError> {
    line.split(',')
        .enumerate()
        .map(|(j, tok)| {
            tok.trim().parse::<f32>().map_err(|_| ParseError::NotANumber {
                line: line_no,
                column: j + 1,
                value: tok.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::AcLabel;

    const HEADER: &str = "THz scan export\nTC=2340ms\nresX=100um resY=100um\nX,Y,Z,data\n";

    #[test]
    fn skips_header_and_splits_coordinates() {
        let text = format!("{HEADER}0,0,1.5,0.1,0.2,0.3\n0.1,0,1.5,0.4,0.5,0.6\n");
        let points = parse_t2t(&text, 4).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[1].x, 0.1);
        assert_eq!(points[1].z, 1.5);
        assert_eq!(points[1].channels, vec![0.4, 0.5, 0.6]);
    }

    #[test]
    fn tolerates_crlf_and_padding() {
        let text = format!("{HEADER}1, 2 ,3,4\n5,6,7,8\n").replace('\n', "\r\n");
        let points = parse_t2t(&text, 4).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].y, 2.0);
        assert_eq!(points[1].channels, vec![8.0]);
    }

    #[test]
    fn exactly_three_values_means_no_channels() {
        let points = parse_t2t(&format!("{HEADER}1,2,3\n"), 4).unwrap();
        assert!(points[0].channels.is_empty());
    }

    #[test]
    fn non_numeric_field_reports_position() {
        let text = format!("{HEADER}1,2,3,4\n1,2,oops,4\n");
        assert_eq!(
            parse_t2t(&text, 4),
            Err(ParseError::NotANumber {
                line: 6,
                column: 3,
                value: "oops".to_string(),
            })
        );
    }

    #[test]
    fn ragged_row_is_rejected() {
        let text = format!("{HEADER}1,2,3,4\n1,2,3\n");
        assert_eq!(
            parse_t2t(&text, 4),
            Err(ParseError::RaggedRow {
                line: 6,
                expected: 4,
                found: 3,
            })
        );
    }

    #[test]
    fn fewer_than_three_values_is_rejected() {
        let text = format!("{HEADER}1,2\n");
        assert_eq!(
            parse_t2t(&text, 4),
            Err(ParseError::TooFewColumns { found: 2 })
        );
    }

    #[test]
    fn header_only_has_no_data() {
        assert_eq!(
            parse_t2t(HEADER, 4),
            Err(ParseError::NoDataRows { header_lines: 4 })
        );
        assert_eq!(
            parse_t2t("", 4),
            Err(ParseError::NoDataRows { header_lines: 4 })
        );
    }

    #[test]
    fn blank_line_inside_body_is_an_error() {
        let text = format!("{HEADER}1,2,3\n\n4,5,6\n");
        assert!(matches!(
            parse_t2t(&text, 4),
            Err(ParseError::NotANumber { line: 6, .. })
        ));
    }

    #[test]
    fn load_file_tags_points_with_folder_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let scan_dir = dir.path().join("s07-2-A");
        std::fs::create_dir(&scan_dir).unwrap();
        let path = scan_dir.join("scan.t2t");
        std::fs::write(&path, format!("{HEADER}0,0,0,1,2,3\n1,0,0,4,5,6\n")).unwrap();

        let table = load_file(&path, 4, AcPolicy::Label).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.channels(), 3);
        assert_eq!(table.metadata.sample, "07");
        assert_eq!(table.metadata.ac, AcLabel::Authentic);
        assert_eq!(table.source(), path.as_path());
    }

    #[test]
    fn load_file_checks_numbers_before_folder_name() {
        let dir = tempfile::tempdir().unwrap();
        let scan_dir = dir.path().join("badname");
        std::fs::create_dir(&scan_dir).unwrap();
        let path = scan_dir.join("scan.t2t");
        std::fs::write(&path, format!("{HEADER}0,0,x\n")).unwrap();

        let err = load_file(&path, 4, AcPolicy::Label).unwrap_err();
        assert!(matches!(err, ExportError::Parse { .. }));

        std::fs::write(&path, format!("{HEADER}0,0,0\n")).unwrap();
        let err = load_file(&path, 4, AcPolicy::Label).unwrap_err();
        assert!(matches!(err, ExportError::PathFormat { .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_file(Path::new("nowhere/s01-1-A/scan.t2t"), 4, AcPolicy::Label).unwrap_err();
        assert!(matches!(err, ExportError::Read { .. }));
    }
}
