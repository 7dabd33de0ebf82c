use indexmap::IndexMap;
use std::fmt;

use super::parse_key_values;

/// Statistics printed by `v.db.univar -e -g`, in the order the engine
/// prints them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKey {
    Count,
    Min,
    Max,
    Range,
    Mean,
    MeanOfAbs,
    Variance,
    StdDev,
    RelativeStdDev,
    Sum,
    FirstQuartile,
    Median,
    ThirdQuartile,
    Percentile90,
}

impl StatKey {
    pub const ALL: [StatKey; 14] = [
        StatKey::Count,
        StatKey::Min,
        StatKey::Max,
        StatKey::Range,
        StatKey::Mean,
        StatKey::MeanOfAbs,
        StatKey::Variance,
        StatKey::StdDev,
        StatKey::RelativeStdDev,
        StatKey::Sum,
        StatKey::FirstQuartile,
        StatKey::Median,
        StatKey::ThirdQuartile,
        StatKey::Percentile90,
    ];

    /// Key as written by the engine.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatKey::Count => "n",
            StatKey::Min => "min",
            StatKey::Max => "max",
            StatKey::Range => "range",
            StatKey::Mean => "mean",
            StatKey::MeanOfAbs => "mean_abs",
            StatKey::Variance => "variance",
            StatKey::StdDev => "stddev",
            StatKey::RelativeStdDev => "coeff_var",
            StatKey::Sum => "sum",
            StatKey::FirstQuartile => "first_quartile",
            StatKey::Median => "median",
            StatKey::ThirdQuartile => "third_quartile",
            StatKey::Percentile90 => "percentile_90",
        }
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Univariate statistics of one column, raw text values in stream order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnivariateStats {
    entries: IndexMap<String, String>,
}

impl UnivariateStats {
    pub fn parse(raw: &str) -> Self {
        Self {
            entries: parse_key_values(raw).into_iter().collect(),
        }
    }

    pub fn get(&self, key: StatKey) -> Option<&str> {
        self.get_raw(key.as_str())
    }

    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Entries in the order the engine printed them.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
