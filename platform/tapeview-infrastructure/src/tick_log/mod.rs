use csv::ByteRecord;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;
use tapeview_domain::error::{ParseError, TickLogError};
use tapeview_domain::repositories::tick_log::{
    TickLogRepository, TickLogRow, TickLogSnapshot, FIELDS_PER_SYMBOL,
};

/// Headerless, append-only CSV tick log: `[index,] timestamp, (price, change, volume) × symbols`.
#[derive(Debug, Clone)]
pub struct CsvTickLogRepository {
    path: PathBuf,
    symbol_groups: usize,
    leading_index_column: bool,
}

impl CsvTickLogRepository {
    pub fn new(path: impl Into<PathBuf>, symbol_groups: usize) -> Self {
        Self {
            path: path.into(),
            symbol_groups,
            leading_index_column: false,
        }
    }

    pub fn with_leading_index_column(mut self, enabled: bool) -> Self {
        self.leading_index_column = enabled;
        self
    }

    fn io_error(&self, err: impl std::fmt::Display) -> TickLogError {
        TickLogError::Io {
            path: self.path.display().to_string(),
            message: err.to_string(),
        }
    }
}

impl TickLogRepository for CsvTickLogRepository {
    fn read_snapshot(&self) -> Result<TickLogSnapshot, TickLogError> {
        let span = tracing::info_span!("tick_log_read", path = %self.path.display());
        let _enter = span.enter();
        let started = Instant::now();

        let file = File::open(&self.path).map_err(|err| self.io_error(err))?;
        let snapshot = match parse_snapshot(file, self.symbol_groups, self.leading_index_column) {
            Ok(snapshot) => snapshot,
            Err(SnapshotError::Io(message)) => return Err(self.io_error(message)),
            Err(SnapshotError::Parse(err)) => {
                metrics::counter!("tapeview.infra.tick_log.parse_errors_total").increment(1);
                return Err(err.into());
            }
        };

        metrics::histogram!("tapeview.infra.tick_log.read_ms")
            .record(started.elapsed().as_secs_f64() * 1000.0);
        metrics::gauge!("tapeview.infra.tick_log.rows").set(snapshot.rows.len() as f64);
        metrics::gauge!("tapeview.infra.tick_log.partial_trailing_rows")
            .set(snapshot.partial_trailing_rows as f64);
        tracing::debug!(
            rows = snapshot.rows.len(),
            partial_trailing_rows = snapshot.partial_trailing_rows,
            "tick log snapshot read"
        );
        Ok(snapshot)
    }
}

#[derive(Debug)]
pub enum SnapshotError {
    Io(String),
    Parse(ParseError),
}

/// Structurally validates every row of `reader`.
///
/// Only the final row may be short or carry invalid UTF-8: it is the writer's in-flight
/// append and is counted, not rejected. Elsewhere a field that is not valid UTF-8 is kept
/// with replacement characters so the tick reader drops that row for its symbol only.
pub fn parse_snapshot<R: Read>(
    reader: R,
    symbol_groups: usize,
    leading_index_column: bool,
) -> Result<TickLogSnapshot, SnapshotError> {
    let offset = usize::from(leading_index_column);
    let expected = offset + 1 + FIELDS_PER_SYMBOL * symbol_groups;

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records: Vec<(u64, ByteRecord)> = Vec::new();
    for (idx, result) in csv_reader.byte_records().enumerate() {
        let fallback_line = idx as u64 + 1;
        let record = result.map_err(|err| {
            if err.is_io_error() {
                SnapshotError::Io(err.to_string())
            } else {
                let row = err.position().map_or(fallback_line, |pos| pos.line());
                SnapshotError::Parse(ParseError::Malformed {
                    row,
                    message: err.to_string(),
                })
            }
        })?;
        let line = record.position().map_or(fallback_line, |pos| pos.line());
        records.push((line, record));
    }

    let mut snapshot = TickLogSnapshot {
        symbol_groups,
        rows: Vec::with_capacity(records.len()),
        partial_trailing_rows: 0,
    };
    let last = records.len().saturating_sub(1);

    for (idx, (line, record)) in records.into_iter().enumerate() {
        let found = record.len();
        let is_last = idx == last;
        if found != expected {
            if is_last && found < expected {
                tracing::debug!(line, found, expected, "dropping partial trailing row");
                snapshot.partial_trailing_rows += 1;
                continue;
            }
            return Err(SnapshotError::Parse(ParseError::ColumnCount {
                row: line,
                expected,
                found,
            }));
        }

        let valid_utf8 = record.iter().all(|field| std::str::from_utf8(field).is_ok());
        if !valid_utf8 {
            if is_last {
                tracing::debug!(line, "dropping trailing row cut mid-character");
                snapshot.partial_trailing_rows += 1;
                continue;
            }
            tracing::debug!(line, "row has fields that are not valid UTF-8");
        }

        let mut fields = record
            .iter()
            .skip(offset)
            .map(|field| String::from_utf8_lossy(field).into_owned());
        let timestamp = fields.next().unwrap_or_default();
        snapshot.rows.push(TickLogRow {
            line,
            timestamp,
            fields: fields.collect(),
        });
    }

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tapeview_domain::services::tick_reader::{read_symbol_ticks, RowDropReason};
    use tapeview_domain::value_objects::symbol::SymbolSlot;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_tmp_path(name: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("tapeview_{name}_{}_{}", std::process::id(), now))
    }

    const TWO_SYMBOLS: &str = "\
2022-03-01 09:30:05,178.44,+1.25 (+0.71%),\"64,598,200\",300.10,-0.50 (-0.17%),\"1,200\"
2022-03-01 09:30:20,178.50,+1.31 (+0.74%),\"64,610,000\",300.00,-0.60 (-0.20%),\"1,300\"
";

    #[test]
    fn reads_grouped_digit_rows_verbatim() {
        let snapshot = parse_snapshot(TWO_SYMBOLS.as_bytes(), 2, false).expect("snapshot");
        assert_eq!(snapshot.rows.len(), 2);
        assert_eq!(snapshot.partial_trailing_rows, 0);
        let first = &snapshot.rows[0];
        assert_eq!(first.line, 1);
        assert_eq!(first.timestamp, "2022-03-01 09:30:05");
        assert_eq!(
            first.group(0).expect("group 0"),
            ["178.44", "+1.25 (+0.71%)", "64,598,200"]
        );
        assert_eq!(first.group(1).expect("group 1")[2], "1,200");
    }

    #[test]
    fn short_final_row_is_a_partial_append() {
        let data = format!("{TWO_SYMBOLS}2022-03-01 09:30:35,178.6");
        let snapshot = parse_snapshot(data.as_bytes(), 2, false).expect("snapshot");
        assert_eq!(snapshot.rows.len(), 2);
        assert_eq!(snapshot.partial_trailing_rows, 1);
    }

    #[test]
    fn short_row_in_the_middle_is_fatal() {
        let data = format!("2022-03-01 09:30:00,1,+1,1\n{TWO_SYMBOLS}");
        let err = parse_snapshot(data.as_bytes(), 2, false).expect_err("column count");
        match err {
            SnapshotError::Parse(ParseError::ColumnCount {
                row,
                expected,
                found,
            }) => {
                assert_eq!((row, expected, found), (1, 7, 4));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn wide_final_row_is_fatal() {
        let data = format!("{TWO_SYMBOLS}2022-03-01 09:30:35,1,+1,1,2,-1,2,extra\n");
        assert!(matches!(
            parse_snapshot(data.as_bytes(), 2, false),
            Err(SnapshotError::Parse(ParseError::ColumnCount { found: 8, .. }))
        ));
    }

    #[test]
    fn leading_index_column_is_skipped() {
        let data = "0,2022-03-01 09:30:05,1,+1,\"1,000\"\n1,2022-03-01 09:30:10,2,-1,900\n";
        let snapshot = parse_snapshot(data.as_bytes(), 1, true).expect("snapshot");
        assert_eq!(snapshot.rows[1].timestamp, "2022-03-01 09:30:10");
        assert_eq!(snapshot.rows[0].fields, ["1", "+1", "1,000"]);
    }

    #[test]
    fn final_row_cut_mid_character_is_a_partial_append() {
        let mut data = TWO_SYMBOLS.as_bytes().to_vec();
        data.extend_from_slice(b"2022-03-01 09:30:35,178.6,+1 \xe2\x88");
        let snapshot = parse_snapshot(data.as_slice(), 2, false).expect("snapshot");
        assert_eq!(snapshot.rows.len(), 2);
        assert_eq!(snapshot.partial_trailing_rows, 1);

        let mut full_width = TWO_SYMBOLS.as_bytes().to_vec();
        full_width.extend_from_slice(b"2022-03-01 09:30:35,1,+1,1,2,-1,\xe2\x88\n");
        let snapshot = parse_snapshot(full_width.as_slice(), 2, false).expect("snapshot");
        assert_eq!(snapshot.rows.len(), 2);
        assert_eq!(snapshot.partial_trailing_rows, 1);
    }

    #[test]
    fn invalid_utf8_field_mid_file_only_drops_that_symbol() {
        let mut data = b"2022-03-01 09:30:00,178.40,+1.2\xff (+0.7%),100,300.00,-0.5,900\n".to_vec();
        data.extend_from_slice(TWO_SYMBOLS.as_bytes());
        let snapshot = parse_snapshot(data.as_slice(), 2, false).expect("snapshot");
        assert_eq!(snapshot.rows.len(), 3);
        assert_eq!(snapshot.partial_trailing_rows, 0);

        let (aapl, report) =
            read_symbol_ticks(&snapshot, &SymbolSlot::new("AAPL", 0)).expect("aapl");
        assert_eq!(aapl.len(), 2);
        assert_eq!(report.count(RowDropReason::Unparsable), 1);
        assert_eq!(report.first_dropped_line, Some(1));

        let (msft, report) =
            read_symbol_ticks(&snapshot, &SymbolSlot::new("MSFT", 1)).expect("msft");
        assert_eq!(msft.len(), 3);
        assert_eq!(report.dropped(), 0);
    }

    #[test]
    fn empty_log_is_an_empty_snapshot() {
        let snapshot = parse_snapshot("".as_bytes(), 7, false).expect("snapshot");
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.symbol_groups, 7);
    }

    #[test]
    fn missing_file_is_transient() {
        let repo = CsvTickLogRepository::new(unique_tmp_path("missing.csv"), 2);
        let err = repo.read_snapshot().expect_err("missing file");
        assert!(matches!(err, TickLogError::Io { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn repository_reads_file_from_disk() {
        let tmp_path = unique_tmp_path("ticks.csv");
        fs::write(&tmp_path, TWO_SYMBOLS).expect("write csv");

        let repo = CsvTickLogRepository::new(&tmp_path, 2);
        let snapshot = repo.read_snapshot().expect("read");
        assert_eq!(snapshot.rows.len(), 2);

        let broken = CsvTickLogRepository::new(&tmp_path, 3);
        let err = broken.read_snapshot().expect_err("wrong width");
        assert!(err.is_fatal());
        assert!(err.to_string().contains("expected 10 columns, found 7"));

        let _ = fs::remove_file(&tmp_path);
    }
}
