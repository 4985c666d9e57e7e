//! Folding records into entity × period count matrices.
//!
//! Two matrices come out of one pass: the total count, and a filtered
//! count that ignores records whose event label is on the exclusion list.
//! After folding, every entity seen anywhere gets an explicit zero for each
//! period of the window where it had no records, so rendered sheets are
//! always rectangular.
//!
//! Rows are kept in a `BTreeMap` keyed by raw identifier, which fixes the
//! output order independently of input order.

use super::window::ReportWindow;
use crate::events::types::{ParsedRecord, Period};
use std::collections::{BTreeMap, HashSet};

/// Counts per entity and period.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountMatrix {
    periods: Vec<Period>,
    rows: BTreeMap<String, BTreeMap<Period, u64>>,
}

impl CountMatrix {
    /// Empty matrix over the given (chronologically sorted) periods.
    pub fn new(periods: Vec<Period>) -> Self {
        Self {
            periods,
            rows: BTreeMap::new(),
        }
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Entities in raw-identifier order.
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn get(&self, entity: &str, period: Period) -> Option<u64> {
        self.rows.get(entity)?.get(&period).copied()
    }

    /// Counts of one entity, one value per period in column order.
    pub fn row(&self, entity: &str) -> Option<Vec<u64>> {
        let cells = self.rows.get(entity)?;
        Some(
            self.periods
                .iter()
                .map(|p| cells.get(p).copied().unwrap_or(0))
                .collect(),
        )
    }

    pub fn increment(&mut self, entity: &str, period: Period) {
        *self
            .rows
            .entry(entity.to_string())
            .or_default()
            .entry(period)
            .or_insert(0) += 1;
    }

    /// Give each listed entity an explicit cell for every period.
    pub fn zero_fill<'a, I>(&mut self, entities: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for entity in entities {
            let cells = self.rows.entry(entity.to_string()).or_default();
            for period in &self.periods {
                cells.entry(*period).or_insert(0);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of one period's column.
    pub fn period_total(&self, period: Period) -> u64 {
        self.rows
            .values()
            .filter_map(|cells| cells.get(&period))
            .sum()
    }

    pub fn total(&self) -> u64 {
        self.rows.values().flat_map(|cells| cells.values()).sum()
    }
}

/// Result of an aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    pub total: CountMatrix,
    pub filtered: CountMatrix,
    /// Records dropped for falling outside the window.
    pub out_of_window: usize,
}

impl Aggregation {
    /// Periods that received at least one record.
    pub fn populated_periods(&self) -> Vec<Period> {
        self.total
            .periods()
            .iter()
            .copied()
            .filter(|p| self.total.period_total(*p) > 0)
            .collect()
    }
}

/// Single-pass fold of records into [`Aggregation`].
pub struct Aggregator<'a> {
    window: &'a ReportWindow,
    excluded: HashSet<&'a str>,
    result: Aggregation,
}

impl<'a> Aggregator<'a> {
    pub fn new(window: &'a ReportWindow, excluded_labels: &'a [String]) -> Self {
        let periods = window.periods();
        Self {
            window,
            excluded: excluded_labels.iter().map(String::as_str).collect(),
            result: Aggregation {
                total: CountMatrix::new(periods.clone()),
                filtered: CountMatrix::new(periods),
                out_of_window: 0,
            },
        }
    }

    pub fn is_excluded(&self, record: &ParsedRecord) -> bool {
        self.excluded.contains(record.event_label.as_str())
    }

    /// Count one record; returns `false` when it lies outside the window.
    pub fn add(&mut self, record: &ParsedRecord) -> bool {
        if !self.window.contains_date(record.date) {
            self.result.out_of_window += 1;
            return false;
        }

        let period = record.period();
        self.result.total.increment(&record.entity_id, period);
        if !self.is_excluded(record) {
            self.result.filtered.increment(&record.entity_id, period);
        }
        true
    }

    pub fn extend<'r, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'r ParsedRecord>,
    {
        for record in records {
            self.add(record);
        }
    }

    /// Zero-fill both matrices over the union of their entities.
    pub fn finish(mut self) -> Aggregation {
        let universe: Vec<String> = self
            .result
            .total
            .entities()
            .chain(self.result.filtered.entities())
            .map(str::to_string)
            .collect();

        let names = universe.iter().map(String::as_str);
        self.result.total.zero_fill(names.clone());
        self.result.filtered.zero_fill(names);
        self.result
    }
}
