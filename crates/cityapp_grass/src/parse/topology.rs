use std::fmt;

use super::parse_key_values;

/// Geometry class of a vector layer, derived from `v.info -t` counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    Point,
    Line,
    Area,
    Mixed,
    Empty,
}

impl Topology {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topology::Point => "point",
            Topology::Line => "line",
            Topology::Area => "area",
            Topology::Mixed => "mixed",
            Topology::Empty => "empty",
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feature counts that decide the [`Topology`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TopologyCounts {
    pub points: u64,
    pub lines: u64,
    pub centroids: u64,
}

impl TopologyCounts {
    /// Read `points=`, `lines=` and `centroids=` from `v.info -t`.
    /// Missing or unreadable counts are treated as zero.
    pub fn parse(raw: &str) -> Self {
        let mut counts = Self::default();
        for (key, value) in parse_key_values(raw) {
            let n = value.parse().unwrap_or(0);
            match key.as_str() {
                "points" => counts.points = n,
                "lines" => counts.lines = n,
                "centroids" => counts.centroids = n,
                _ => {}
            }
        }
        counts
    }

    /// Points win unless lines or centroids are also present; then lines
    /// unless centroids are present; then centroids; otherwise empty.
    pub fn classify(&self) -> Topology {
        let points = self.points > 0;
        let lines = self.lines > 0;
        let centroids = self.centroids > 0;

        if points {
            if lines || centroids {
                Topology::Mixed
            } else {
                Topology::Point
            }
        } else if lines {
            if centroids {
                Topology::Mixed
            } else {
                Topology::Line
            }
        } else if centroids {
            Topology::Area
        } else {
            Topology::Empty
        }
    }
}
