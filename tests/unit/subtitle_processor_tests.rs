/*!
 * Tests for SRT parsing and serialization
 */

use anyhow::Result;

use opensubtrans::errors::SubtitleError;
use opensubtrans::subtitle_processor::{SubtitleCollection, SubtitleEntry, parse_srt_string, to_srt_string};

use crate::common;

#[test]
fn test_parseSrtString_withSample_shouldKeepOrderTimingAndLines() -> Result<()> {
    let entries = parse_srt_string(common::SAMPLE_SRT)?;

    assert_eq!(entries.len(), 3);
    assert_eq!(entries.iter().map(|e| e.seq_num).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(entries[0].start_time_ms, 1_000);
    assert_eq!(entries[0].end_time_ms, 4_000);
    assert_eq!(entries[1].lines, vec!["Where is the station?", "It is late."]);
    assert_eq!(entries[1].text(), "Where is the station?\nIt is late.");
    Ok(())
}

#[test]
fn test_roundTrip_withCanonicalInput_shouldBeByteIdentical() -> Result<()> {
    let canonical = common::numbered_srt(25);
    let entries = parse_srt_string(&canonical)?;

    assert_eq!(to_srt_string(&entries), canonical);
    assert_eq!(to_srt_string(&parse_srt_string(common::SAMPLE_SRT)?), format!("{}\n", common::SAMPLE_SRT));
    Ok(())
}

#[test]
fn test_parseSrtString_withExtraBlankLines_shouldIgnoreThem() -> Result<()> {
    let content = "\n\n1\n00:00:01,000 --> 00:00:02,000\nHi\n\n\n\n2\n00:00:03,000 --> 00:00:04,000\nThere\n\n\n";
    let entries = parse_srt_string(content)?;
    assert_eq!(entries.len(), 2);
    Ok(())
}

#[test]
fn test_parseSrtString_withNonIncreasingIndex_shouldFail() {
    let content = "2\n00:00:01,000 --> 00:00:02,000\nHi\n\n2\n00:00:03,000 --> 00:00:04,000\nAgain\n";
    assert_eq!(
        parse_srt_string(content),
        Err(SubtitleError::IndexNotIncreasing { line: 5, previous: 2, found: 2 })
    );
}

#[test]
fn test_parseSrtString_withGapInIndices_shouldKeepOriginalNumbers() -> Result<()> {
    let content = "3\n00:00:01,000 --> 00:00:02,000\nHi\n\n10\n00:00:03,000 --> 00:00:04,000\nThere\n";
    let entries = parse_srt_string(content)?;
    assert_eq!(entries[1].seq_num, 10);
    assert!(to_srt_string(&entries).starts_with("3\n"));
    Ok(())
}

#[test]
fn test_parseSrtString_withInvalidCues_shouldReportFormatErrors() {
    assert_eq!(
        parse_srt_string("1\n00:00:05,000 --> 00:00:05,000\nZero length\n"),
        Err(SubtitleError::InvalidTimeRange { index: 1 })
    );
    assert_eq!(
        parse_srt_string("1\n00:00:01,000 --> 00:00:02,000\n"),
        Err(SubtitleError::MissingText { index: 1 })
    );
    assert!(matches!(
        parse_srt_string("1\n00:00:01 --> 00:00:02\nHi\n"),
        Err(SubtitleError::MalformedTimestamp { line: 2, .. })
    ));
    assert!(matches!(parse_srt_string("1\n"), Err(SubtitleError::MalformedTimestamp { .. })));
}

#[test]
fn test_parseSrtString_withEmptyInput_shouldReturnNoCues() -> Result<()> {
    assert!(parse_srt_string("")?.is_empty());
    assert!(parse_srt_string("\n \n")?.is_empty());
    Ok(())
}

#[test]
fn test_timestamps_shouldConvertBothWays() -> Result<()> {
    assert_eq!(SubtitleEntry::parse_timestamp("01:02:03,004")?, 3_723_004);
    assert_eq!(SubtitleEntry::format_timestamp(3_723_004), "01:02:03,004");
    assert!(SubtitleEntry::parse_timestamp("00:60:00,000").is_err());
    Ok(())
}

#[test]
fn test_subtitleCollection_shouldReadAndWriteFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;

    let collection = SubtitleCollection::from_srt_file(&input)?;
    assert_eq!(collection.entries.len(), 3);

    let output = temp_dir.path().join("out/movie.copy.srt");
    collection.write_to_srt(&output)?;
    let reread = SubtitleCollection::from_srt_file(&output)?;
    assert_eq!(reread.entries, collection.entries);
    Ok(())
}

#[test]
fn test_subtitleCollection_withMalformedFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "bad.srt", "1\nnot a timestamp\nHi\n")?;

    assert!(SubtitleCollection::from_srt_file(&input).is_err());
    Ok(())
}
