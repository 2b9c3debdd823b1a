//! Per-year leaderboards and the ranked country list.

use std::collections::BTreeMap;

use papertrail_core::{CountYearRecord, CountrySummary, YearRanking, UNKNOWN_COUNTRY};

/// The `k` largest countries of each year, ties broken by country code.
pub fn top_k_per_year(records: &[CountYearRecord], k: usize) -> Vec<YearRanking> {
    let mut by_year: BTreeMap<i32, Vec<&CountYearRecord>> = BTreeMap::new();
    for record in records {
        by_year.entry(record.year).or_default().push(record);
    }

    let mut out = Vec::new();
    for (year, mut rows) in by_year {
        rows.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.country_code.cmp(&b.country_code))
        });
        out.extend(rows.into_iter().take(k).enumerate().map(|(i, r)| YearRanking {
            year,
            rank: i + 1,
            country_code: r.country_code.clone(),
            country: r.country.clone(),
            count: r.count,
        }));
    }
    out
}

/// First `n` country codes of a sorted summary, without `UNKNOWN`.
pub fn ranked_countries(summary: &[CountrySummary], n: usize) -> Vec<String> {
    summary
        .iter()
        .filter(|s| s.country_code != UNKNOWN_COUNTRY)
        .take(n)
        .map(|s| s.country_code.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(year: i32, cc: &str, count: u64) -> CountYearRecord {
        CountYearRecord {
            year,
            country_code: cc.into(),
            country: String::new(),
            count,
        }
    }

    #[test]
    fn test_top_k_per_year() {
        let records = vec![
            rec(2021, "US", 10),
            rec(2020, "US", 50),
            rec(2020, "CN", 70),
            rec(2020, "DE", 50),
            rec(2021, "CN", 30),
        ];
        let top = top_k_per_year(&records, 2);

        let rows: Vec<(i32, usize, &str)> = top
            .iter()
            .map(|r| (r.year, r.rank, r.country_code.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![(2020, 1, "CN"), (2020, 2, "DE"), (2021, 1, "CN"), (2021, 2, "US")]
        );
    }

    #[test]
    fn test_ranked_countries_skips_unknown() {
        let summary: Vec<CountrySummary> = ["US", UNKNOWN_COUNTRY, "CN", "GB"]
            .iter()
            .map(|cc| CountrySummary {
                country_code: cc.to_string(),
                country: String::new(),
                total_count: 1,
                growth_ratio: 1.0,
                recent_slope: 0.0,
            })
            .collect();
        assert_eq!(ranked_countries(&summary, 2), vec!["US", "CN"]);
        assert_eq!(ranked_countries(&summary, 10).len(), 3);
    }
}
