use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::core::record::{Component, Gap, TpfRecord};
use crate::core::timeline::{Timeline, TilingPath};
use crate::core::types::Orientation;
use crate::parsing::{parse_coordinate, ParseError};
use crate::utils::validation::{check_record_limit, ErrorCollector, ErrorKind};

/// Parse TPF text into one timeline per scaffold.
///
/// Component lines are `accession  sequence:start-end  scaffold  orientation`;
/// any line whose first field contains `gap` (case-insensitive) is a gap line
/// `GAP  TYPE-n  size`. Gaps belong to the scaffold of the preceding component.
///
/// Coordinates within a scaffold must strictly increase. Violations are not a
/// parse failure: each offending line is recorded as a
/// [`ErrorKind::CoordinateTypo`] so every typo can be reported at once.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for lines with too few fields, malformed
/// regions or sizes, or when no components are found, and
/// `ParseError::TooManyRecords` if the record limit is exceeded.
pub fn parse_tpf_text(
    text: &str,
    texel_divisor: u64,
    errors: &mut ErrorCollector,
) -> Result<TilingPath, ParseError> {
    let mut timelines: IndexMap<String, Timeline> = IndexMap::new();
    let mut max_end: HashMap<String, u64> = HashMap::new();
    let mut current: Option<String> = None;
    let mut count = 0usize;

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Line numbers in errors are 1-based for user friendliness
        let line_num = i + 1;

        if check_record_limit(count).is_some() {
            return Err(ParseError::TooManyRecords(count));
        }
        count += 1;

        let fields: Vec<&str> = line.split_whitespace().collect();

        if is_gap_line(&fields) {
            let gap = parse_gap(&fields, line_num)?;
            match current.as_ref().and_then(|s| timelines.get_mut(s)) {
                Some(timeline) => timeline.records.push(TpfRecord::Gap(gap)),
                None => debug!("Ignoring gap before first component on line {line_num}"),
            }
            continue;
        }

        let mut component = parse_component(&fields, line_num)?;
        component.line = line_num;

        // Check for coordinate typos against everything seen so far on this scaffold
        let scaffold = component.scaffold.clone();
        let out_of_order = max_end
            .get(&scaffold)
            .is_some_and(|&previous| component.start <= previous || component.end <= previous);
        if out_of_order || component.start >= component.end {
            errors.push(
                ErrorKind::CoordinateTypo,
                format!("line {line_num}: {line}"),
            );
        }
        let entry = max_end.entry(scaffold.clone()).or_insert(component.end);
        *entry = (*entry).max(component.end);

        timelines
            .entry(scaffold.clone())
            .or_insert_with(|| Timeline::new(scaffold.clone()))
            .records
            .push(TpfRecord::Component(component));
        current = Some(scaffold);
    }

    if timelines.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No components found in TPF".to_string(),
        ));
    }

    let path = TilingPath::new(timelines, texel_divisor);
    if errors.contains(ErrorKind::CoordinateTypo) {
        warn!("Coordinate errors detected in TPF - presumed typos");
    }
    debug!(
        "Parsed {} scaffolds, {} bp, texel {} bp",
        path.len(),
        path.total_bases,
        path.texel
    );

    Ok(path)
}

fn is_gap_line(fields: &[&str]) -> bool {
    fields
        .first()
        .is_some_and(|f| f.to_lowercase().contains("gap"))
}

fn parse_gap(fields: &[&str], line_num: usize) -> Result<Gap, ParseError> {
    if fields.len() < 3 {
        return Err(ParseError::InvalidFormat(format!(
            "Gap on line {line_num} has fewer than 3 fields"
        )));
    }
    let size: u64 = fields[2].parse().map_err(|_| {
        ParseError::InvalidFormat(format!(
            "Invalid gap size on line {}: '{}'",
            line_num, fields[2]
        ))
    })?;
    Ok(Gap::new(fields[1], size))
}

fn parse_component(fields: &[&str], line_num: usize) -> Result<Component, ParseError> {
    if fields.len() < 4 {
        return Err(ParseError::InvalidFormat(format!(
            "Line {line_num} has fewer than 4 fields"
        )));
    }

    let (sequence, range) = fields[1].rsplit_once(':').ok_or_else(|| {
        ParseError::InvalidFormat(format!(
            "Invalid region on line {}: '{}'",
            line_num, fields[1]
        ))
    })?;
    let (start, end) = range.split_once('-').ok_or_else(|| {
        ParseError::InvalidFormat(format!(
            "Invalid region on line {}: '{}'",
            line_num, fields[1]
        ))
    })?;

    Ok(Component {
        accession: fields[0].to_string(),
        sequence: sequence.to_string(),
        start: parse_coordinate(start, line_num)?,
        end: parse_coordinate(end, line_num)?,
        scaffold: fields[2].to_string(),
        orientation: Orientation::from_tpf(fields[3]),
        line: line_num,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timeline::DEFAULT_TEXEL_DIVISOR;

    const TPF: &str = "?\tscaffold_1:1-1000\tscaffold_1\tPLUS
GAP\tTYPE-2\t200
?\tscaffold_1:1001-2000\tscaffold_1\tMINUS
?\tscaffold_2:1-500\tscaffold_2\tPLUS
";

    #[test]
    fn test_parse_tpf_text() {
        let mut errors = ErrorCollector::new();
        let path = parse_tpf_text(TPF, DEFAULT_TEXEL_DIVISOR, &mut errors).unwrap();

        assert!(errors.is_empty());
        assert_eq!(path.len(), 2);
        assert_eq!(path.total_bases, 2500);
        assert_eq!(path.texel, 1);

        let timeline = path.get("scaffold_1").unwrap();
        assert_eq!(timeline.records.len(), 3);
        assert!(timeline.records[1].is_gap());
        assert_eq!(path.max_end("scaffold_1"), Some(2000));

        let second = timeline.records[2].as_component().unwrap();
        assert_eq!(second.orientation, Orientation::Minus);
        assert_eq!(second.line, 3);
    }

    #[test]
    fn test_gap_matched_case_insensitively() {
        let tpf = "?\tscaffold_1:1-1000\tscaffold_1\tPLUS\ngap\tTYPE-2\t100\n";
        let mut errors = ErrorCollector::new();
        let path = parse_tpf_text(tpf, DEFAULT_TEXEL_DIVISOR, &mut errors).unwrap();
        assert!(path.get("scaffold_1").unwrap().records[1].is_gap());
    }

    #[test]
    fn test_detects_coordinate_typos() {
        let tpf = "?\tscaffold_1:1-1000\tscaffold_1\tPLUS
?\tscaffold_1:900-1500\tscaffold_1\tPLUS
?\tscaffold_1:2000-1800\tscaffold_1\tPLUS
?\tscaffold_2:1-500\tscaffold_2\tPLUS
";
        let mut errors = ErrorCollector::new();
        parse_tpf_text(tpf, DEFAULT_TEXEL_DIVISOR, &mut errors).unwrap();

        assert!(errors.has_fatal());
        let record = &errors.records()[0];
        assert_eq!(record.kind, ErrorKind::CoordinateTypo);
        assert_eq!(record.messages.len(), 2);
        assert!(record.messages[0].starts_with("line 2:"));
        assert!(record.messages[1].starts_with("line 3:"));
    }

    #[test]
    fn test_inverted_first_component_is_typo() {
        let tpf = "?\tscaffold_1:500-100\tscaffold_1\tPLUS\n";
        let mut errors = ErrorCollector::new();
        parse_tpf_text(tpf, DEFAULT_TEXEL_DIVISOR, &mut errors).unwrap();
        assert!(errors.contains(ErrorKind::CoordinateTypo));
    }

    #[test]
    fn test_invalid_region() {
        let tpf = "?\tscaffold_1_1-1000\tscaffold_1\tPLUS\n";
        let mut errors = ErrorCollector::new();
        let result = parse_tpf_text(tpf, DEFAULT_TEXEL_DIVISOR, &mut errors);
        assert!(matches!(result, Err(ParseError::InvalidFormat(_))));
    }

    #[test]
    fn test_empty_tpf() {
        let mut errors = ErrorCollector::new();
        assert!(parse_tpf_text("", DEFAULT_TEXEL_DIVISOR, &mut errors).is_err());
    }
}
