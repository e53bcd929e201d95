use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

use crate::error::{Result, SubtransError};
use crate::transcribe::Segment;

static TIMESTAMP_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2,}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{2,}):(\d{2}):(\d{2})[,.](\d{3})")
        .expect("timestamp pattern is valid")
});

/// One numbered, time-coded subtitle block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    pub index: u32,
    pub start: Duration,
    pub end: Duration,
    pub content: String,
}

/// Ordered subtitle entries with dense 1-based indices.
///
/// Entries can only be appended, and their text only replaced as a whole
/// list of the same length, so index and timing never drift from the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtitleDocument {
    entries: Vec<SubtitleEntry>,
}

impl SubtitleDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, assigning it the next index
    pub fn push(&mut self, start: Duration, end: Duration, content: impl AsRef<str>) {
        let index = self.entries.len() as u32 + 1;
        self.entries.push(SubtitleEntry {
            index,
            start,
            end,
            content: canonical_content(content.as_ref()),
        });
    }

    /// Build a document from transcription segments.
    ///
    /// Segments ending before they start are clamped and out-of-order segments
    /// are stable-sorted by start time.
    pub fn from_segments(segments: &[Segment]) -> Self {
        let mut ordered: Vec<&Segment> = segments.iter().collect();
        if ordered.windows(2).any(|pair| pair[0].start > pair[1].start) {
            warn!("Transcriber returned segments out of order, sorting by start time");
            ordered.sort_by_key(|segment| segment.start);
        }

        let mut document = Self::new();
        for segment in ordered {
            let end = if segment.end < segment.start {
                warn!(
                    "Segment ends before it starts ({} < {}), clamping",
                    format_timestamp(segment.end),
                    format_timestamp(segment.start)
                );
                segment.start
            } else {
                segment.end
            };
            document.push(segment.start, end, segment.text.trim());
        }
        document
    }

    pub fn entries(&self) -> &[SubtitleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Text of every entry, in display order
    pub fn contents(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.content.clone()).collect()
    }

    /// Replace the text of every entry; the list must line up one-to-one.
    pub fn replace_contents(mut self, contents: Vec<String>) -> Result<Self> {
        if contents.len() != self.entries.len() {
            return Err(SubtransError::Translation(format!(
                "Expected {} translated lines, got {}",
                self.entries.len(),
                contents.len()
            )));
        }

        for (entry, content) in self.entries.iter_mut().zip(contents) {
            entry.content = canonical_content(&content);
        }
        Ok(self)
    }
}

/// Content as it is stored and rendered: `\n` line breaks, no blank lines,
/// no trailing whitespace on any line
pub fn canonical_content(content: &str) -> String {
    content
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse SRT text into a document
pub fn parse(text: &str) -> Result<SubtitleDocument> {
    let normalized = text.trim_start_matches('\u{feff}').replace("\r\n", "\n").replace('\r', "\n");

    let mut blocks: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in normalized.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    let mut entries = Vec::with_capacity(blocks.len());
    for (number, lines) in blocks.iter().enumerate() {
        entries.push(parse_block(number + 1, lines)?);
    }

    let dense = entries.iter().enumerate().all(|(i, entry)| entry.index as usize == i + 1);
    if !dense {
        warn!("SRT indices are not sequential, renumbering {} entries", entries.len());
    }

    let mut document = SubtitleDocument::new();
    for entry in entries {
        document.push(entry.start, entry.end, entry.content);
    }
    Ok(document)
}

fn parse_block(block: usize, lines: &[&str]) -> Result<SubtitleEntry> {
    let malformed = |reason: String| SubtransError::Format { block, reason };

    let index_line = lines[0].trim();
    let index: u32 = index_line
        .parse()
        .map_err(|_| malformed(format!("index '{}' is not a positive integer", index_line)))?;
    if index == 0 {
        return Err(malformed("index must start at 1".to_string()));
    }

    let timestamp_line = lines
        .get(1)
        .map(|line| line.trim())
        .ok_or_else(|| malformed("missing timestamp line".to_string()))?;
    let caps = TIMESTAMP_LINE
        .captures(timestamp_line)
        .ok_or_else(|| malformed(format!("malformed timestamp line '{}'", timestamp_line)))?;

    let field = |i: usize| -> u64 { caps[i].parse().unwrap_or(u64::MAX) };
    let start = timestamp_from_parts(field(1), field(2), field(3), field(4))
        .ok_or_else(|| malformed(format!("start time out of range in '{}'", timestamp_line)))?;
    let end = timestamp_from_parts(field(5), field(6), field(7), field(8))
        .ok_or_else(|| malformed(format!("end time out of range in '{}'", timestamp_line)))?;
    if end < start {
        return Err(malformed(format!("end precedes start in '{}'", timestamp_line)));
    }

    let content = lines[2..].join("\n").trim_end().to_string();

    Ok(SubtitleEntry {
        index,
        start,
        end,
        content,
    })
}

fn timestamp_from_parts(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Option<Duration> {
    if minutes >= 60 || seconds >= 60 || millis >= 1000 {
        return None;
    }
    let total = hours
        .checked_mul(3_600_000)?
        .checked_add(minutes * 60_000 + seconds * 1_000 + millis)?;
    Some(Duration::from_millis(total))
}

/// Render a document as SRT text
pub fn compose(document: &SubtitleDocument) -> String {
    let blocks: Vec<String> = document
        .entries()
        .iter()
        .map(|entry| {
            format!(
                "{}\n{} --> {}\n{}\n",
                entry.index,
                format_timestamp(entry.start),
                format_timestamp(entry.end),
                entry.content
            )
        })
        .collect();

    blocks.join("\n")
}

/// Format a duration as an SRT timestamp (HH:MM:SS,mmm)
pub fn format_timestamp(time: Duration) -> String {
    let total_milliseconds = time.as_millis();
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Read and parse an SRT file
pub async fn read_srt<P: AsRef<Path>>(path: P) -> Result<SubtitleDocument> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .await
        .map_err(|e| SubtransError::Input(format!("Cannot read subtitles {}: {}", path.display(), e)))?;
    parse(&text)
}

/// Write a document to an SRT file.
///
/// The text lands in a temporary file next to the destination first and is
/// renamed into place, so readers never see a half-written file.
pub async fn write_srt<P: AsRef<Path>>(path: P, document: &SubtitleDocument) -> Result<()> {
    let path = path.as_ref().to_path_buf();
    info!("Writing {} subtitles to {}", document.len(), path.display());

    let text = compose(document);
    tokio::task::spawn_blocking(move || -> Result<()> {
        use std::io::Write;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };
        let mut staged = tempfile::Builder::new().prefix(".subtrans-").suffix(".srt").tempfile_in(&dir)?;
        staged.write_all(text.as_bytes())?;
        staged.as_file().sync_all()?;
        staged
            .persist(&path)
            .map_err(|e| SubtransError::Io(e.error))?;
        Ok(())
    })
    .await
    .map_err(|e| SubtransError::Io(std::io::Error::other(e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn sample() -> SubtitleDocument {
        let mut document = SubtitleDocument::new();
        document.push(ms(0), ms(1_200), "Hi");
        document.push(ms(1_200), ms(2_000), "Bye\nfor now");
        document.push(ms(3_723_004), ms(3_725_999), "End");
        document
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(ms(0)), "00:00:00,000");
        assert_eq!(format_timestamp(ms(65_123)), "00:01:05,123");
        assert_eq!(format_timestamp(ms(3_661_500)), "01:01:01,500");
        assert_eq!(format_timestamp(Duration::from_micros(1_999_999)), "00:00:01,999");
    }

    #[test]
    fn test_parse_single_block() {
        let document = parse("1\n00:00:01,000 --> 00:00:02,500\nHello\n\n").unwrap();
        assert_eq!(
            document.entries(),
            &[SubtitleEntry {
                index: 1,
                start: ms(1_000),
                end: ms(2_500),
                content: "Hello".to_string(),
            }]
        );
    }

    #[test]
    fn test_compose_layout() {
        let text = compose(&sample());
        assert_eq!(
            text,
            "1\n00:00:00,000 --> 00:00:01,200\nHi\n\n\
             2\n00:00:01,200 --> 00:00:02,000\nBye\nfor now\n\n\
             3\n01:02:03,004 --> 01:02:05,999\nEnd\n"
        );
    }

    #[test]
    fn test_round_trip() {
        let document = sample();
        assert_eq!(parse(&compose(&document)).unwrap(), document);
    }

    #[test]
    fn test_round_trip_ignores_trailing_whitespace() {
        let mut document = SubtitleDocument::new();
        document.push(ms(10), ms(20), "padded   ");
        document.push(ms(20), ms(20), "");

        let parsed = parse(&compose(&document)).unwrap();
        assert_eq!(parsed.entries()[0].content, "padded");
        assert_eq!(parsed.entries()[1].content, "");
        assert_eq!(parsed.entries()[1].start, ms(20));
    }

    #[test]
    fn test_round_trip_with_irregular_line_breaks() {
        let mut document = SubtitleDocument::new();
        document.push(ms(0), ms(10), "\nHello");
        document.push(ms(10), ms(20), "A\n\nB");
        document.push(ms(20), ms(30), "a\rb");
        document.push(ms(30), ms(40), "x \r\n  \r\ny\n");

        assert_eq!(document.contents(), vec!["Hello", "A\nB", "a\nb", "x\ny"]);
        assert_eq!(parse(&compose(&document)).unwrap(), document);

        let replaced = document
            .replace_contents(vec!["\n\nUno".into(), "Dos\r\n\r\nTres".into(), "c\rd".into(), "   ".into()])
            .unwrap();
        assert_eq!(replaced.contents(), vec!["Uno", "Dos\nTres", "c\nd", ""]);
        assert_eq!(parse(&compose(&replaced)).unwrap(), replaced);
    }

    #[test]
    fn test_parse_tolerates_crlf_bom_and_dot_millis() {
        let text = "\u{feff}1\r\n00:00:01.000 --> 00:00:02.000 X1:10\r\nLine one\r\nLine two\r\n\r\n\r\n2\r\n00:00:03,000 --> 00:00:04,000\r\nNext\r\n";
        let document = parse(text).unwrap();
        assert_eq!(document.len(), 2);
        assert_eq!(document.entries()[0].content, "Line one\nLine two");
        assert_eq!(document.entries()[1].start, ms(3_000));
    }

    #[test]
    fn test_parse_renumbers_sparse_indices() {
        let text = "4\n00:00:01,000 --> 00:00:02,000\nA\n\n9\n00:00:02,000 --> 00:00:03,000\nB\n";
        let document = parse(text).unwrap();
        let indices: Vec<u32> = document.entries().iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn test_parse_rejects_malformed_blocks() {
        let cases = [
            ("one\n00:00:01,000 --> 00:00:02,000\nHi\n", 1),
            ("1\n00:00:01,000 --> 00:00:02,000\nHi\n\n2\nHello\n", 2),
            ("1\n00:00:01 --> 00:00:02\nHi\n", 1),
            ("1\n", 1),
            ("1\n00:61:01,000 --> 00:00:02,000\nHi\n", 1),
            ("1\n00:00:05,000 --> 00:00:02,000\nHi\n", 1),
            ("0\n00:00:01,000 --> 00:00:02,000\nHi\n", 1),
        ];
        for (text, expected_block) in cases {
            match parse(text) {
                Err(SubtransError::Format { block, .. }) => assert_eq!(block, expected_block, "{:?}", text),
                other => panic!("expected format error for {:?}, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("\n\n  \n").unwrap().is_empty());
    }

    #[test]
    fn test_from_segments_indexes_and_repairs() {
        let segments = vec![
            Segment::new(ms(2_000), ms(3_500), " End "),
            Segment::new(ms(0), ms(1_200), "Hi"),
            Segment::new(ms(1_200), ms(900), "Bye"),
        ];
        let document = SubtitleDocument::from_segments(&segments);
        let entries = document.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].content, "Hi");
        assert_eq!(entries[1].end, ms(1_200));
        assert_eq!(entries[2].content, "End");
        assert_eq!(entries.iter().map(|e| e.index).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_replace_contents_requires_same_length() {
        let document = sample();
        assert!(matches!(
            document.clone().replace_contents(vec!["only one".to_string()]),
            Err(SubtransError::Translation(_))
        ));

        let replaced = document
            .clone()
            .replace_contents(vec!["a".into(), "b".into(), "c".into()])
            .unwrap();
        for (before, after) in document.entries().iter().zip(replaced.entries()) {
            assert_eq!((before.index, before.start, before.end), (after.index, after.start, after.end));
        }
        assert_eq!(replaced.contents(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie.orig.srt");

        write_srt(&path, &sample()).await.unwrap();
        let loaded = read_srt(&path).await.unwrap();
        assert_eq!(loaded, sample());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }
}
