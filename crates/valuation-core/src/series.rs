use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A one-dimensional period-indexed sequence of values.
///
/// `periods` and `values` are kept aligned; an entry the provider never
/// reported, or that an operation left undefined, is `None`. Ordering
/// follows whatever produced the series (statement tables yield
/// most-recent-first); [`sort_ascending`](Self::sort_ascending) gives a
/// chronological view when one is needed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    periods: Vec<NaiveDate>,
    values: Vec<Option<f64>>,
}

impl Series {
    pub fn new(periods: Vec<NaiveDate>, values: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(periods.len(), values.len());
        Self { periods, values }
    }

    pub fn from_pairs(pairs: Vec<(NaiveDate, Option<f64>)>) -> Self {
        let (periods, values) = pairs.into_iter().unzip();
        Self { periods, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn periods(&self) -> &[NaiveDate] {
        &self.periods
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Option<f64>)> + '_ {
        self.periods.iter().copied().zip(self.values.iter().copied())
    }

    /// Drop undefined entries, keeping period alignment.
    pub fn dropna(&self) -> Self {
        let pairs = self
            .iter()
            .filter_map(|(p, v)| v.map(|v| (p, Some(v))))
            .collect();
        Self::from_pairs(pairs)
    }

    /// Reorder chronologically, oldest period first.
    pub fn sort_ascending(&self) -> Self {
        let mut pairs: Vec<_> = self.iter().collect();
        pairs.sort_by_key(|(p, _)| *p);
        Self::from_pairs(pairs)
    }

    /// Fractional change between consecutive entries of the
    /// ascending-sorted series. The first entry has no predecessor and is
    /// undefined; so is any change across an undefined or zero base.
    pub fn pct_change(&self) -> Self {
        let sorted = self.sort_ascending();
        let values = (0..sorted.len())
            .map(|i| {
                if i == 0 {
                    return None;
                }
                match (sorted.values[i - 1], sorted.values[i]) {
                    (Some(prev), Some(cur)) if prev != 0.0 => Some((cur - prev) / prev),
                    _ => None,
                }
            })
            .collect();
        Self {
            periods: sorted.periods,
            values,
        }
    }

    /// Replace undefined entries with a constant.
    pub fn fill_none(&self, fill: f64) -> Self {
        Self {
            periods: self.periods.clone(),
            values: self.values.iter().map(|v| Some(v.unwrap_or(fill))).collect(),
        }
    }

    /// Element-wise combination with another series on the same period
    /// index. Entries where either side is undefined stay undefined.
    pub fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        debug_assert_eq!(self.periods, other.periods);
        let values = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => Some(f(*a, *b)),
                _ => None,
            })
            .collect();
        Self {
            periods: self.periods.clone(),
            values,
        }
    }

    /// Element-wise map over defined entries.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            periods: self.periods.clone(),
            values: self.values.iter().map(|v| v.map(&f)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, 12, 31).unwrap()
    }

    fn series(pairs: &[(i32, Option<f64>)]) -> Series {
        Series::from_pairs(pairs.iter().map(|(y, v)| (date(*y), *v)).collect())
    }

    #[test]
    fn dropna_removes_undefined_entries() {
        let s = series(&[(2023, Some(3.0)), (2022, None), (2021, Some(1.0))]);
        let dropped = s.dropna();
        assert_eq!(dropped.len(), 2);
        assert_eq!(dropped.values(), &[Some(3.0), Some(1.0)]);
    }

    #[test]
    fn sort_ascending_orders_by_period() {
        let s = series(&[(2023, Some(3.0)), (2021, Some(1.0)), (2022, Some(2.0))]);
        let sorted = s.sort_ascending();
        assert_eq!(sorted.periods(), &[date(2021), date(2022), date(2023)]);
        assert_eq!(sorted.values(), &[Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn pct_change_skips_undefined_and_zero_bases() {
        let s = series(&[
            (2024, Some(30.0)),
            (2023, Some(0.0)),
            (2022, Some(20.0)),
            (2021, Some(10.0)),
        ]);
        let changes = s.pct_change();
        // Ascending: 10, 20, 0, 30. First has no base; 30's base is zero.
        assert_eq!(changes.values()[0], None);
        assert_relative_eq!(changes.values()[1].unwrap(), 1.0);
        assert_relative_eq!(changes.values()[2].unwrap(), -1.0);
        assert_eq!(changes.values()[3], None);
    }

    #[test]
    fn zip_with_keeps_undefined_holes() {
        let a = series(&[(2023, Some(4.0)), (2022, None)]);
        let b = series(&[(2023, Some(2.0)), (2022, Some(1.0))]);
        let sum = a.zip_with(&b, |x, y| x + y);
        assert_eq!(sum.values(), &[Some(6.0), None]);
    }
}
