use crate::error::{Result, TideError};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tide_utils::dates::current_year;

/// Earliest year the CO-OPS datagetter is queried for.
pub const EARLIEST_SUPPORTED_YEAR: i32 = 1900;

/// Closed range of calendar years to fetch, iterated in ascending order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearWindow {
    first: i32,
    last: i32,
}

impl YearWindow {
    pub fn new(first: i32, last: i32) -> Result<Self> {
        if first > last {
            return Err(TideError::InvalidYearWindow { first, last });
        }
        Ok(YearWindow { first, last })
    }

    /// Like [`YearWindow::new`], but both ends must also pass [`validate_year`].
    pub fn supported(first: i32, last: i32) -> Result<Self> {
        let window = YearWindow::new(first, last)?;
        window.check_supported()?;
        Ok(window)
    }

    /// Fails with `UnsupportedYear` for the first end outside the
    /// data source's historical range.
    pub fn check_supported(&self) -> Result<()> {
        validate_year(self.first)?;
        validate_year(self.last)
    }

    pub fn first(&self) -> i32 {
        self.first
    }

    pub fn last(&self) -> i32 {
        self.last
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.first..=self.last
    }
}

impl Default for YearWindow {
    /// 2015 through 2024.
    fn default() -> Self {
        YearWindow {
            first: 2015,
            last: 2024,
        }
    }
}

impl IntoIterator for YearWindow {
    type Item = i32;
    type IntoIter = RangeInclusive<i32>;

    fn into_iter(self) -> Self::IntoIter {
        self.years()
    }
}

/// Check a year against the data source's historical range.
pub fn validate_year(year: i32) -> Result<()> {
    let latest = current_year();
    if !(EARLIEST_SUPPORTED_YEAR..=latest).contains(&year) {
        return Err(TideError::UnsupportedYear {
            year,
            earliest: EARLIEST_SUPPORTED_YEAR,
            latest,
        });
    }
    Ok(())
}
