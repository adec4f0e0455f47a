use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use tracing::warn;

use isa_invest_core::{Investment, InvestmentRepository, RepositoryError};

/// Process-lifetime store of investment records.
///
/// A single mutex guards the whole store, covering both the primary map and
/// the customer index, so a reader sees either a fully inserted record or none.
/// Records are cloned in and out; callers never hold references into the map.
#[derive(Debug, Default)]
pub struct InMemoryInvestmentStore {
    inner: Mutex<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    by_id: HashMap<String, Investment>,
    // customer id -> investment ids in insertion order
    by_customer: HashMap<String, Vec<String>>,
}

impl InMemoryInvestmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> Result<usize, RepositoryError> {
        Ok(self.lock()?.by_id.len())
    }

    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        Ok(self.lock()?.by_id.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>, RepositoryError> {
        self.inner
            .lock()
            .map_err(|_| RepositoryError::Unavailable("investment store lock poisoned".to_string()))
    }
}

impl StoreInner {
    fn insert(&mut self, investment: Investment) {
        let id = investment.id.clone();
        let customer_id = investment.customer_id.clone();

        if let Some(previous) = self.by_id.insert(id.clone(), investment) {
            warn!(stage = "storage", investment_id = %id, "overwriting existing investment");
            if previous.customer_id == customer_id {
                return;
            }
            self.unindex(&previous.customer_id, &id);
        }

        self.by_customer.entry(customer_id).or_default().push(id);
    }

    fn unindex(&mut self, customer_id: &str, id: &str) {
        if let Some(ids) = self.by_customer.get_mut(customer_id) {
            ids.retain(|existing| existing != id);
            if ids.is_empty() {
                self.by_customer.remove(customer_id);
            }
        }
    }
}

impl InvestmentRepository for InMemoryInvestmentStore {
    fn create(&self, investment: Investment) -> Result<(), RepositoryError> {
        self.lock()?.insert(investment);
        Ok(())
    }

    fn get_by_id(&self, id: &str) -> Result<Investment, RepositoryError> {
        self.lock()?
            .by_id
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    fn get_by_customer_id(&self, customer_id: &str) -> Result<Vec<Investment>, RepositoryError> {
        let inner = self.lock()?;
        let Some(ids) = inner.by_customer.get(customer_id) else {
            return Ok(Vec::new());
        };

        Ok(ids
            .iter()
            .filter_map(|id| inner.by_id.get(id))
            .cloned()
            .collect())
    }
}
