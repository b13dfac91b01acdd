//! Declared schema for hourly water-level CSVs.
//!
//! NOAA exports (and files saved by hand from the CO-OPS site) name the
//! same fields differently: `Date Time`, `date_time`, `Water Level`,
//! `observed`, ... Each field lists the names it accepts; a header is
//! resolved once and every missing required field is reported together.

use csv::StringRecord;
use thiserror::Error;

/// One named field of the schema and the header names that satisfy it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Accepted normalized header names, in order of preference
    pub aliases: &'static [&'static str],
    pub required: bool,
}

/// Column positions of a header that satisfied the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub timestamp: usize,
    pub water_level: usize,
    /// Every column named by a quality alias, in header order
    pub quality: Vec<usize>,
}

/// Header failed schema validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("hourly series is missing required field(s) {missing:?}; columns found: {found:?}")]
pub struct SchemaError {
    pub missing: Vec<&'static str>,
    pub found: Vec<String>,
}

/// Schema of an hourly water-level series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourlySchema {
    pub timestamp: FieldSpec,
    pub water_level: FieldSpec,
    pub quality: FieldSpec,
    /// Lowercased quality values that mark a verified (or unflagged) reading
    pub accepted_quality: &'static [&'static str],
}

/// Schema for CO-OPS `hourly_height` CSV exports.
pub const NOAA_HOURLY: HourlySchema = HourlySchema {
    timestamp: FieldSpec {
        name: "timestamp",
        aliases: &["date time", "date_time", "datetime", "time"],
        required: true,
    },
    water_level: FieldSpec {
        name: "water_level",
        aliases: &["water level", "water_level", "waterlevel", "observed", "value"],
        required: true,
    },
    quality: FieldSpec {
        name: "quality",
        aliases: &["quality", "qc", "flag"],
        required: false,
    },
    accepted_quality: &["v", "nan", ""],
};

impl Default for HourlySchema {
    fn default() -> Self {
        NOAA_HOURLY
    }
}

/// Normalize a header cell: trim, lowercase, collapse inner whitespace.
pub fn normalize_header(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl FieldSpec {
    /// Position of the first alias present in the normalized header.
    fn locate(&self, normalized: &[String]) -> Option<usize> {
        self.aliases
            .iter()
            .find_map(|alias| normalized.iter().position(|h| h == alias))
    }

    /// Positions of every header cell matching any alias.
    fn locate_all(&self, normalized: &[String]) -> Vec<usize> {
        normalized
            .iter()
            .enumerate()
            .filter(|(_, h)| self.aliases.contains(&h.as_str()))
            .map(|(idx, _)| idx)
            .collect()
    }
}

impl HourlySchema {
    /// Resolve a CSV header against the schema.
    pub fn resolve(&self, headers: &StringRecord) -> Result<ResolvedColumns, SchemaError> {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        let timestamp = self.timestamp.locate(&normalized);
        let water_level = self.water_level.locate(&normalized);
        let quality = self.quality.locate_all(&normalized);

        match (timestamp, water_level) {
            (Some(timestamp), Some(water_level)) => Ok(ResolvedColumns {
                timestamp,
                water_level,
                quality,
            }),
            _ => {
                let mut missing = Vec::new();
                for (spec, found) in [(&self.timestamp, timestamp), (&self.water_level, water_level)] {
                    if spec.required && found.is_none() {
                        missing.push(spec.name);
                    }
                }
                Err(SchemaError {
                    missing,
                    found: normalized,
                })
            }
        }
    }

    /// Header positions of the timestamp and water-level fields that are
    /// present, keyed by field name. Unlike [`HourlySchema::resolve`] this
    /// does not fail when a field is missing.
    pub fn locate_fields(&self, headers: &StringRecord) -> Vec<(&'static str, usize)> {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        [&self.timestamp, &self.water_level]
            .into_iter()
            .filter_map(|spec| spec.locate(&normalized).map(|idx| (spec.name, idx)))
            .collect()
    }

    /// Whether a quality cell passes the filter.
    pub fn accepts_quality(&self, value: &str) -> bool {
        let lowered = value.trim().to_lowercase();
        self.accepted_quality.iter().any(|accepted| *accepted == lowered)
    }

    /// A row passes when every quality column holds an accepted value.
    /// Rows of a series without quality columns always pass.
    pub fn accepts_row(&self, record: &StringRecord, columns: &ResolvedColumns) -> bool {
        columns
            .quality
            .iter()
            .all(|&idx| self.accepts_quality(record.get(idx).unwrap_or("")))
    }
}
