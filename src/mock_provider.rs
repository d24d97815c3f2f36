//! Stand-ins for real provider integrations.
//!
//! Connecting a source asks a [TransactionGenerator] for the transactions to
//! import. The server uses [RandomTransactionGenerator] to fill the demo with
//! plausible data, tests use [FixedTransactionGenerator]. The randomness stays
//! in here; the reporting engine only ever sees stored records.

use std::{
    fmt::Debug,
    sync::{Mutex, PoisonError},
};

use rand::{Rng, SeedableRng, rngs::StdRng};
use time::{Duration, PrimitiveDateTime};

use crate::transaction::{NewTransaction, TransactionType};

const DESCRIPTIONS: [&str; 7] = [
    "Ad revenue payout",
    "Premium subscriptions",
    "Merch sale",
    "Sponsorship",
    "Platform fees",
    "Refund",
    "Consulting",
];

const CATEGORIES: [&str; 7] = [
    "Ads",
    "Subscriptions",
    "Merch",
    "Sponsorship",
    "Fees",
    "Refunds",
    "Services",
];

/// Produces the transactions imported when a source is connected.
pub trait TransactionGenerator: Debug + Send + Sync {
    /// Generate transactions from `provider` dated no later than `now`.
    fn generate(&self, provider: &str, now: PrimitiveDateTime) -> Vec<NewTransaction>;
}

/// Generates random but plausible transactions.
///
/// Each call produces [RandomTransactionGenerator::DEFAULT_COUNT] transactions
/// dated within the last 90 days: about 65% income, amounts between 20 and 800
/// rounded to cents.
#[derive(Debug)]
pub struct RandomTransactionGenerator {
    rng: Mutex<StdRng>,
    count: usize,
}

impl RandomTransactionGenerator {
    /// The number of transactions generated per connection.
    pub const DEFAULT_COUNT: usize = 15;

    const MAX_DAYS_AGO: i64 = 90;
    const INCOME_PROBABILITY: f64 = 0.65;
    const MIN_AMOUNT: f64 = 20.0;
    const MAX_AMOUNT: f64 = 800.0;

    /// Create a generator seeded from the operating system.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a generator that always produces the same sequence.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            count: Self::DEFAULT_COUNT,
        }
    }
}

impl Default for RandomTransactionGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionGenerator for RandomTransactionGenerator {
    fn generate(&self, provider: &str, now: PrimitiveDateTime) -> Vec<NewTransaction> {
        // The RNG state is still usable after a panic elsewhere.
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        (0..self.count)
            .map(|i| {
                let days_ago = rng.gen_range(0..Self::MAX_DAYS_AGO);
                let is_income = rng.gen_bool(Self::INCOME_PROBABILITY);
                let amount = rng.gen_range(Self::MIN_AMOUNT..Self::MAX_AMOUNT);
                let amount = (amount * 100.0).round() / 100.0;

                let (transaction_type, direction) = if is_income {
                    (TransactionType::Income, "income")
                } else {
                    (TransactionType::Expense, "expense")
                };

                NewTransaction::build(amount, now.saturating_sub(Duration::days(days_ago)))
                    .transaction_type(transaction_type)
                    .category(CATEGORIES[i % CATEGORIES.len()])
                    .description(DESCRIPTIONS[i % DESCRIPTIONS.len()])
                    .note(&format!("{} {direction}", provider.to_uppercase()))
            })
            .collect()
    }
}

/// Always generates the same transactions, whatever the provider.
#[derive(Debug, Clone, Default)]
pub struct FixedTransactionGenerator {
    transactions: Vec<NewTransaction>,
}

impl FixedTransactionGenerator {
    /// Create a generator that returns `transactions` on every call.
    pub fn new(transactions: Vec<NewTransaction>) -> Self {
        Self { transactions }
    }
}

impl TransactionGenerator for FixedTransactionGenerator {
    fn generate(&self, _provider: &str, _now: PrimitiveDateTime) -> Vec<NewTransaction> {
        self.transactions.clone()
    }
}
