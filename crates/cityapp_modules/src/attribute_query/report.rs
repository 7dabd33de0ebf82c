use chrono::{DateTime, Utc};

use cityapp_grass::{StatKey, UnivariateStats};

/// Report rows: label and the statistic shown on that row.
const ROWS: [(&str, StatKey); 14] = [
    ("Number of features:", StatKey::Count),
    ("Sum of values:", StatKey::Sum),
    ("Minimum value:", StatKey::Min),
    ("Maximum value:", StatKey::Max),
    ("Range of values:", StatKey::Range),
    ("Mean:", StatKey::Mean),
    ("Mean of absolute values:", StatKey::MeanOfAbs),
    ("Median:", StatKey::Median),
    ("Standard deviation:", StatKey::StdDev),
    ("Variance:", StatKey::Variance),
    ("Relative standard deviation:", StatKey::RelativeStdDev),
    ("1st quartile:", StatKey::FirstQuartile),
    ("3rd quartile:", StatKey::ThirdQuartile),
    ("90th percentile:", StatKey::Percentile90),
];

const LABEL_WIDTH: usize = 29;

/// Text page of the query report.
pub fn statistics_text(
    created: DateTime<Utc>,
    column: &str,
    criteria: &str,
    stats: &UnivariateStats,
) -> String {
    let mut out = format!(
        "Statistics and map results\n\nDate of creation: {}\nQueried column: {}\nCriteria: {}\nResults:\n",
        created.format("%a %b %d %Y %H:%M:%S UTC"),
        column,
        criteria
    );
    for (label, key) in ROWS {
        let value = stats.get(key).unwrap_or("-");
        out.push_str(&format!("{:<width$}{}\n", label, value, width = LABEL_WIDTH));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn rows_are_addressed_by_name() {
        let stats = UnivariateStats::parse(
            "n=4\nmin=1\nmax=9\nrange=8\nmean=5\nmean_abs=5\nvariance=10\nstddev=3.16\n\
             coeff_var=63.2\nsum=20\nfirst_quartile=2\nmedian=5\nthird_quartile=8\npercentile_90=9\n",
        );
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 14, 30, 0).unwrap();
        let text = statistics_text(at, "floors", "floors > 0", &stats);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Statistics and map results");
        assert_eq!(lines[2], "Date of creation: Wed May 01 2024 14:30:00 UTC");
        assert_eq!(lines[3], "Queried column: floors");
        assert_eq!(lines[4], "Criteria: floors > 0");
        assert_eq!(lines[6], "Number of features:          4");
        assert_eq!(lines[7], "Sum of values:               20");
        assert_eq!(lines[13], "Median:                      5");
        assert_eq!(lines[15], "Variance:                    10");
        assert_eq!(lines[19], "90th percentile:             9");
    }

    #[test]
    fn missing_statistics_show_a_dash() {
        let stats = UnivariateStats::parse("n=0\n");
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let text = statistics_text(at, "floors", "floors > 100", &stats);
        assert!(text.contains("Number of features:          0\n"));
        assert!(text.contains("Mean:                        -\n"));
    }
}
