//! Dense year × country table.

use std::collections::{BTreeMap, BTreeSet};

use papertrail_core::{CountYearRecord, Error, Result};
use serde::Serialize;

/// Counts indexed by every year of the range and every country seen.
///
/// Absent (year, country) cells hold 0; duplicate records for a cell are
/// summed, saturating at `u64::MAX`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    years: Vec<i32>,
    countries: Vec<String>,
    /// `cells[year_idx][country_idx]`
    cells: Vec<Vec<u64>>,
}

impl PivotTable {
    pub fn from_records(records: &[CountYearRecord], start_year: i32, end_year: i32) -> Result<Self> {
        let years: Vec<i32> = (start_year..=end_year).collect();
        let countries: Vec<String> = records
            .iter()
            .map(|r| r.country_code.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let column: BTreeMap<&str, usize> = countries
            .iter()
            .enumerate()
            .map(|(i, cc)| (cc.as_str(), i))
            .collect();

        let mut cells = vec![vec![0u64; countries.len()]; years.len()];
        for record in records {
            if record.year < start_year || record.year > end_year {
                return Err(Error::YearOutOfRange {
                    year: record.year,
                    start: start_year,
                    end: end_year,
                });
            }
            let row = (record.year - start_year) as usize;
            let col = column[record.country_code.as_str()];
            cells[row][col] = cells[row][col].saturating_add(record.count);
        }

        Ok(Self {
            years,
            countries,
            cells,
        })
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Country columns, ascending.
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    /// Cell value, or `None` if the year or country is not in the table.
    pub fn value(&self, year: i32, country_code: &str) -> Option<u64> {
        let row = self.years.iter().position(|&y| y == year)?;
        let col = self.column_index(country_code)?;
        Some(self.cells[row][col])
    }

    /// One country's counts across all years, in year order.
    pub fn column(&self, country_code: &str) -> Option<Vec<u64>> {
        let col = self.column_index(country_code)?;
        Some(self.cells.iter().map(|row| row[col]).collect())
    }

    fn column_index(&self, country_code: &str) -> Option<usize> {
        self.countries
            .binary_search_by(|cc| cc.as_str().cmp(country_code))
            .ok()
    }
}
