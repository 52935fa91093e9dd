//! Field distribution analysis.
//!
//! One pass over the batch builds, for every top-level field seen in any
//! object record, a type histogram, distinct-value counts, the mode and
//! numeric statistics.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::models::Record;
use crate::value::{as_number, type_name, value_key};

use super::models::{FieldDistribution, NumericStats};

#[derive(Default)]
struct FieldAccumulator {
    value_count: usize,
    null_count: usize,
    types: BTreeMap<String, usize>,
    // Distinct values in first-seen order with their counts
    distinct: Vec<(Value, usize)>,
    positions: HashMap<String, usize>,
    numbers: Vec<f64>,
}

impl FieldAccumulator {
    fn push(&mut self, value: &Value) {
        self.value_count += 1;
        if value.is_null() {
            self.null_count += 1;
            return;
        }

        *self.types.entry(type_name(value).to_string()).or_insert(0) += 1;

        let key = value_key(value);
        match self.positions.get(&key) {
            Some(&position) => self.distinct[position].1 += 1,
            None => {
                self.positions.insert(key, self.distinct.len());
                self.distinct.push((value.clone(), 1));
            }
        }

        if let Some(number) = as_number(value) {
            self.numbers.push(number);
        }
    }

    fn finish(self, field: String) -> FieldDistribution {
        // Strictly-greater comparison keeps the earliest value on ties
        let mut mode: Option<&(Value, usize)> = None;
        for entry in &self.distinct {
            if mode.is_none_or(|best| entry.1 > best.1) {
                mode = Some(entry);
            }
        }

        FieldDistribution {
            field,
            value_count: self.value_count,
            null_count: self.null_count,
            unique_count: self.distinct.len(),
            most_common_value: mode.map(|(value, _)| value.clone()),
            most_common_count: mode.map_or(0, |(_, count)| *count),
            numeric_stats: calculate_statistics(&self.numbers),
            type_histogram: self.types,
        }
    }
}

/// Builds the distribution of every field observed in `records`.
///
/// Records that are not objects contribute nothing.
pub fn analyze_distributions(records: &[Record]) -> BTreeMap<String, FieldDistribution> {
    let mut accumulators: BTreeMap<String, FieldAccumulator> = BTreeMap::new();

    for fields in records.iter().filter_map(Record::fields) {
        for (field, value) in fields {
            accumulators
                .entry(field.clone())
                .or_default()
                .push(value);
        }
    }

    accumulators
        .into_iter()
        .map(|(field, accumulator)| (field.clone(), accumulator.finish(field)))
        .collect()
}

/// Calculates numeric statistics for a set of values.
///
/// Uses population standard deviation (divides by n, not n-1); outlier
/// z-scores depend on this exact formula. The median is the element at
/// index `n / 2` of the sorted values, so even-length inputs take the upper
/// of the two middle elements without averaging.
pub fn calculate_statistics(values: &[f64]) -> Option<NumericStats> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    Some(NumericStats {
        mean,
        std_dev: variance.sqrt(),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        median: sorted[sorted.len() / 2],
        count: values.len(),
    })
}
