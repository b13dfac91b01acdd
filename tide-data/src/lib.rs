//! Data processing for hourly tide series.
//!
//! This crate handles combining per-year downloads into one series per
//! station and reducing that series to daily maxima.

/// Year Merger: concatenation of per-year CSVs for one station.
pub mod merge {
    use csv::{ReaderBuilder, StringRecord, Writer};
    use log::{debug, info};
    use std::path::{Path, PathBuf};
    use tide_noaa::error::{Result, TideError};
    use tide_noaa::schema::{normalize_header, HourlySchema};
    use tide_noaa::year_window::YearWindow;
    use tide_utils::files::write_atomic;

    /// Result of a merge: where it went and what it holds.
    #[derive(Debug, Clone, PartialEq)]
    pub struct MergeReport {
        pub path: PathBuf,
        pub rows: usize,
        pub columns: Vec<String>,
    }

    /// `{station}_{first}_{last}_hourly_merged.csv`
    pub fn merged_file_name(station_id: &str, window: &YearWindow) -> String {
        format!(
            "{}_{}_{}_hourly_merged.csv",
            station_id,
            window.first(),
            window.last()
        )
    }

    /// Identity of a merged column.
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum ColumnKey {
        /// A schema field, whichever accepted name the file used for it
        Field(&'static str),
        /// Any other column, by normalized name
        Named(String),
    }

    fn column_keys(headers: &StringRecord, schema: &HourlySchema) -> Vec<ColumnKey> {
        let mut keys: Vec<ColumnKey> = headers
            .iter()
            .map(|name| ColumnKey::Named(normalize_header(name)))
            .collect();
        for (field, idx) in schema.locate_fields(headers) {
            keys[idx] = ColumnKey::Field(field);
        }
        keys
    }

    /// Header union across files.
    #[derive(Debug, Default)]
    struct MergedHeader {
        names: Vec<String>,
        keys: Vec<ColumnKey>,
    }

    impl MergedHeader {
        fn extend(&mut self, headers: &StringRecord, schema: &HourlySchema) {
            for (name, key) in headers.iter().zip(column_keys(headers, schema)) {
                if !self.keys.contains(&key) {
                    self.keys.push(key);
                    self.names.push(name.trim().to_string());
                }
            }
        }

        /// For each output column, the position of that column in `headers`.
        fn mapping(&self, headers: &StringRecord, schema: &HourlySchema) -> Vec<Option<usize>> {
            let input = column_keys(headers, schema);
            self.keys
                .iter()
                .map(|key| input.iter().position(|k| k == key))
                .collect()
        }
    }

    /// Concatenate year files in the given order into `out_path`.
    ///
    /// Rows are neither sorted nor deduplicated. The timestamp and water-level
    /// columns are matched through `schema`, so `Water Level` in one year and
    /// `water_level` in another land in the same column under the first
    /// file's name. Other columns are matched by normalized name. A column
    /// missing from one file is left empty for that file's rows.
    pub fn merge_years(
        station_id: &str,
        year_files: &[PathBuf],
        schema: &HourlySchema,
        out_path: &Path,
    ) -> Result<MergeReport> {
        if year_files.is_empty() {
            return Err(TideError::EmptyMerge(station_id.to_string()));
        }

        let mut header = MergedHeader::default();
        for path in year_files {
            let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
            header.extend(rdr.headers()?, schema);
        }

        let mut writer = Writer::from_writer(vec![]);
        writer.write_record(&header.names)?;
        let mut rows = 0usize;
        for path in year_files {
            let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
            let mapping = header.mapping(rdr.headers()?, schema);
            let mut file_rows = 0usize;
            for result in rdr.records() {
                let record = result?;
                let row: Vec<&str> = mapping
                    .iter()
                    .map(|idx| idx.and_then(|i| record.get(i)).unwrap_or(""))
                    .collect();
                writer.write_record(&row)?;
                file_rows += 1;
            }
            debug!("{}: {} rows from {}", station_id, file_rows, path.display());
            rows += file_rows;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| TideError::Io(e.into_error()))?;
        write_atomic(out_path, &bytes)?;
        info!("merged -> {} ({} rows)", out_path.display(), rows);

        Ok(MergeReport {
            path: out_path.to_path_buf(),
            rows,
            columns: header.names,
        })
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::daily::reduce_daily_max;
        use std::fs;
        use tide_noaa::schema::NOAA_HOURLY;
        use tide_noaa::station::Station;

        const YEAR_2019: &str = "Date Time, Water Level, Sigma, I, L
2019-12-31 22:00,0.120,0.003,0,0
2019-12-31 23:00,0.150,0.003,0,0
";
        const YEAR_2020: &str = "Date Time, Water Level, Sigma, I, L
2020-01-01 00:00,0.180,0.003,0,0
2020-01-01 01:00,0.200,0.003,0,0
2020-01-01 02:00,0.170,0.003,0,0
";

        fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
            let path = dir.join(name);
            fs::write(&path, contents).unwrap();
            path
        }

        #[test]
        fn test_merged_file_name() {
            let window = YearWindow::new(2015, 2024).unwrap();
            assert_eq!(
                merged_file_name("8723214", &window),
                "8723214_2015_2024_hourly_merged.csv"
            );
        }

        #[test]
        fn test_merge_preserves_order_and_counts() {
            let dir = tempfile::tempdir().unwrap();
            let files = vec![
                write(dir.path(), "a.csv", YEAR_2019),
                write(dir.path(), "b.csv", YEAR_2020),
            ];
            let out = dir.path().join("merged.csv");
            let report = merge_years("8723214", &files, &NOAA_HOURLY, &out).unwrap();
            assert_eq!(report.rows, 5);
            assert_eq!(report.columns, vec!["Date Time", "Water Level", "Sigma", "I", "L"]);

            let merged = fs::read_to_string(&out).unwrap();
            let lines: Vec<&str> = merged.lines().collect();
            assert_eq!(lines.len(), 6);
            assert_eq!(lines[0], "Date Time,Water Level,Sigma,I,L");
            assert!(lines[1].starts_with("2019-12-31 22:00"));
            assert!(lines[5].starts_with("2020-01-01 02:00"));
        }

        #[test]
        fn test_merge_keeps_duplicates() {
            let dir = tempfile::tempdir().unwrap();
            let a = write(dir.path(), "a.csv", YEAR_2019);
            let files = vec![a.clone(), a];
            let report = merge_years("8723214", &files, &NOAA_HOURLY, &dir.path().join("m.csv")).unwrap();
            assert_eq!(report.rows, 4);
        }

        #[test]
        fn test_merge_aligns_schema_fields_across_names() {
            let dir = tempfile::tempdir().unwrap();
            let files = vec![
                write(dir.path(), "a.csv", "Date Time,Water Level,Sigma\n2020-01-01 00:00,0.1,0.003\n"),
                write(dir.path(), "b.csv", "water_level,date time,Quality\n0.2,2021-01-01 00:00,v\n"),
            ];
            let out = dir.path().join("m.csv");
            let report = merge_years("8761927", &files, &NOAA_HOURLY, &out).unwrap();
            assert_eq!(report.columns, vec!["Date Time", "Water Level", "Sigma", "Quality"]);
            let merged = fs::read_to_string(&out).unwrap();
            let lines: Vec<&str> = merged.lines().collect();
            assert_eq!(lines[1], "2020-01-01 00:00,0.1,0.003,");
            assert_eq!(lines[2], "2021-01-01 00:00,0.2,,v");
        }

        #[test]
        fn test_renamed_level_column_survives_reduction() {
            let dir = tempfile::tempdir().unwrap();
            let files = vec![
                write(dir.path(), "a.csv", "Date Time, Water Level\n2020-06-01 00:00,0.31\n2020-06-01 01:00,0.42\n"),
                write(dir.path(), "b.csv", "time,observed\n2021-06-01 00:00,0.55\n"),
            ];
            let out = dir.path().join("m.csv");
            merge_years("8723214", &files, &NOAA_HOURLY, &out).unwrap();

            let station = Station {
                station_id: "8723214".to_string(),
                city: "Miami (Virginia Key)".to_string(),
            };
            let merged = fs::File::open(&out).unwrap();
            let reduction = reduce_daily_max(merged, &station, &NOAA_HOURLY).unwrap();
            assert_eq!(reduction.input_rows, 3);
            assert_eq!(reduction.dropped_level, 0);
            let got: Vec<f64> = reduction.rows.iter().map(|r| r.daily_max_tide_m).collect();
            assert_eq!(got, vec![0.42, 0.55]);
        }

        #[test]
        fn test_unresolved_duplicate_name_kept_apart() {
            // "Water Level" wins the field; the literal water_level column stays separate
            let dir = tempfile::tempdir().unwrap();
            let files = vec![write(
                dir.path(),
                "a.csv",
                "Date Time,water_level,Water Level\n2020-01-01 00:00,9.9,0.1\n",
            )];
            let out = dir.path().join("m.csv");
            let report = merge_years("8761927", &files, &NOAA_HOURLY, &out).unwrap();
            assert_eq!(report.columns, vec!["Date Time", "water_level", "Water Level"]);
            let merged = fs::read_to_string(&out).unwrap();
            assert_eq!(merged.lines().nth(1), Some("2020-01-01 00:00,9.9,0.1"));
        }

        #[test]
        fn test_merge_empty_input() {
            let dir = tempfile::tempdir().unwrap();
            let err = merge_years("8638610", &[], &NOAA_HOURLY, &dir.path().join("m.csv")).unwrap_err();
            assert!(matches!(err, TideError::EmptyMerge(ref id) if id == "8638610"));
        }

        #[test]
        fn test_merge_missing_file() {
            let dir = tempfile::tempdir().unwrap();
            let files = vec![dir.path().join("absent.csv")];
            assert!(merge_years("8638610", &files, &NOAA_HOURLY, &dir.path().join("m.csv")).is_err());
        }
    }
}

/// Daily Reducer: one maximum water level per calendar date.
pub mod daily {
    use chrono::NaiveDate;
    use csv::{ReaderBuilder, Writer};
    use log::{debug, info};
    use std::collections::BTreeMap;
    use std::fs::File;
    use std::io::Read;
    use std::path::{Path, PathBuf};
    use tide_noaa::error::{Result, TideError};
    use tide_noaa::observation::{DailyMax, RawObservation, RowRejection, DAILY_MAX_HEADERS};
    use tide_noaa::schema::HourlySchema;
    use tide_noaa::station::Station;
    use tide_utils::files::write_atomic;

    /// Daily maxima plus counts of the rows that did not contribute.
    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct DailyReduction {
        pub rows: Vec<DailyMax>,
        pub input_rows: usize,
        pub dropped_quality: usize,
        pub dropped_timestamp: usize,
        pub dropped_level: usize,
    }

    /// A daily-maximum file that was written.
    #[derive(Debug, Clone, PartialEq)]
    pub struct DailyOutput {
        pub path: PathBuf,
        pub rows: usize,
    }

    /// Output name derived from the input file's stem:
    /// `X_hourly_merged.csv` and `X_hourly.csv` both become `X_daily_max.csv`.
    pub fn daily_file_name(input: &Path) -> String {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base = stem.replace("_hourly_merged", "").replace("_hourly", "");
        format!("{base}_daily_max.csv")
    }

    /// Reduce an hourly series to one row per UTC calendar date.
    ///
    /// Rows failing the quality filter, with unparseable timestamps, or with
    /// a missing level are dropped. Output is ordered by date.
    pub fn reduce_daily_max<R: Read>(
        reader: R,
        station: &Station,
        schema: &HourlySchema,
    ) -> Result<DailyReduction> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let columns = schema.resolve(rdr.headers()?)?;

        let mut reduction = DailyReduction::default();
        let mut maxima: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for result in rdr.records() {
            let record = result?;
            reduction.input_rows += 1;
            if !schema.accepts_row(&record, &columns) {
                reduction.dropped_quality += 1;
                continue;
            }
            let obs = match RawObservation::from_record(&record, &columns) {
                Ok(obs) => obs,
                Err(RowRejection::BadTimestamp) => {
                    reduction.dropped_timestamp += 1;
                    continue;
                }
                Err(RowRejection::BadLevel) => {
                    reduction.dropped_level += 1;
                    continue;
                }
            };
            maxima
                .entry(obs.date())
                .and_modify(|max| *max = max.max(obs.water_level))
                .or_insert(obs.water_level);
        }

        debug!(
            "{}: {} rows in, dropped {} quality / {} timestamp / {} level",
            station.station_id,
            reduction.input_rows,
            reduction.dropped_quality,
            reduction.dropped_timestamp,
            reduction.dropped_level
        );

        reduction.rows = maxima
            .into_iter()
            .map(|(date, daily_max_tide_m)| DailyMax {
                date,
                station_id: station.station_id.clone(),
                daily_max_tide_m,
                city: station.city.clone(),
            })
            .collect();
        Ok(reduction)
    }

    /// Write daily rows as `date,daily_max_tide_m,city`.
    pub fn write_daily_csv(rows: &[DailyMax], out_path: &Path) -> Result<()> {
        let mut writer = Writer::from_writer(vec![]);
        writer.write_record(DAILY_MAX_HEADERS)?;
        for row in rows {
            writer.write_record(&row.to_record())?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| TideError::Io(e.into_error()))?;
        write_atomic(out_path, &bytes)?;
        Ok(())
    }

    /// Reduce `in_csv` and write `out_path`.
    pub fn hourly_to_daily_max(
        in_csv: &Path,
        station: &Station,
        schema: &HourlySchema,
        out_path: &Path,
    ) -> Result<DailyOutput> {
        let file = File::open(in_csv)?;
        let reduction = reduce_daily_max(file, station, schema)?;
        write_daily_csv(&reduction.rows, out_path)?;
        info!(
            "daily -> {} ({} rows)",
            out_path.display(),
            reduction.rows.len()
        );
        Ok(DailyOutput {
            path: out_path.to_path_buf(),
            rows: reduction.rows.len(),
        })
    }

}
