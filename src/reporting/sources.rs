//! Which connected source produced the most transactions.

use serde::Serialize;

use crate::transaction::TransactionRecord;

/// The source with the most transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopSource {
    /// The lowercased provider name, `None` if no transaction has a source.
    pub source_name: Option<String>,
    /// The source's share of all transactions, rounded to a whole percent.
    pub percentage_of_all: u32,
}

/// Find the provider with the most transactions.
///
/// Providers are compared case-insensitively. Ties go to the provider seen
/// first in `transactions`. The percentage is taken over every transaction,
/// including those without a source.
pub fn compute_top_source(transactions: &[TransactionRecord]) -> TopSource {
    let mut counts: Vec<(String, usize)> = Vec::new();

    for provider in transactions.iter().filter_map(TransactionRecord::provider_key) {
        match counts.iter_mut().find(|(name, _)| *name == provider) {
            Some((_, count)) => *count += 1,
            None => counts.push((provider, 1)),
        }
    }

    let mut top: Option<(String, usize)> = None;
    for (name, count) in counts {
        if top.as_ref().is_none_or(|(_, top_count)| count > *top_count) {
            top = Some((name, count));
        }
    }

    match top {
        Some((name, count)) => TopSource {
            source_name: Some(name),
            percentage_of_all: (count as f64 / transactions.len() as f64 * 100.0).round() as u32,
        },
        None => TopSource::default(),
    }
}
