use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::KeyValueStore;
use crate::core::{
    AccumulationRequest, AccumulationResult, DecumulationRequest, DecumulationResult,
    project_accumulation, project_decumulation,
};
use crate::currency::Currency;
use crate::error::{Error, Result};

/// Saved calculations kept; older entries are evicted first.
pub const MAX_SAVED: usize = 50;

const CURRENCY_KEY: &str = "selected_currency";
const SAVED_CALCULATIONS_KEY: &str = "saved_calculations";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationKind {
    #[serde(alias = "accumulation")]
    Sip,
    #[serde(alias = "decumulation")]
    Swp,
}

impl CalculationKind {
    pub fn label(self) -> &'static str {
        match self {
            CalculationKind::Sip => "SIP",
            CalculationKind::Swp => "SWP",
        }
    }
}

/// A projection together with the request that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Projection {
    Sip {
        request: AccumulationRequest,
        result: AccumulationResult,
    },
    Swp {
        request: DecumulationRequest,
        result: DecumulationResult,
    },
}

impl Projection {
    pub fn accumulation(request: AccumulationRequest) -> Self {
        Projection::Sip {
            result: project_accumulation(&request),
            request,
        }
    }

    pub fn decumulation(request: DecumulationRequest) -> Self {
        Projection::Swp {
            result: project_decumulation(&request),
            request,
        }
    }

    pub fn kind(&self) -> CalculationKind {
        match self {
            Projection::Sip { .. } => CalculationKind::Sip,
            Projection::Swp { .. } => CalculationKind::Swp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCalculation {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Currency code the amounts were entered in. A label only.
    pub currency: String,
    pub projection: Projection,
}

impl SavedCalculation {
    pub fn new(projection: Projection, currency: Currency, created_at: DateTime<Utc>) -> Self {
        Self {
            id: created_at.timestamp_millis().to_string(),
            created_at,
            currency: currency.code().to_string(),
            projection,
        }
    }

    pub fn kind(&self) -> CalculationKind {
        self.projection.kind()
    }

    fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return true;
        }
        let label = self.kind().label().to_ascii_lowercase();
        label.contains(&query.to_ascii_lowercase())
            || self
                .created_at
                .format("%Y-%m-%d")
                .to_string()
                .contains(query)
    }
}

/// Currency preference and saved-calculation list on top of a key-value store.
///
/// Every mutation is a read-modify-write of the whole list; callers sharing a
/// `History` across threads must serialise access.
#[derive(Debug)]
pub struct History<S> {
    store: S,
}

impl<S: KeyValueStore> History<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn currency(&self) -> Currency {
        match self.store.get(CURRENCY_KEY) {
            Ok(Some(code)) => code.parse().unwrap_or_else(|e| {
                warn!("ignoring stored currency preference: {e}");
                Currency::default()
            }),
            Ok(None) => Currency::default(),
            Err(e) => {
                warn!("failed to read currency preference: {e}");
                Currency::default()
            }
        }
    }

    pub fn set_currency(&mut self, currency: Currency) -> Result<()> {
        self.store.set(CURRENCY_KEY, currency.code().to_string())
    }

    /// Saved calculations, newest first. Unreadable contents read as empty.
    pub fn list(&self) -> Vec<SavedCalculation> {
        match self.read_list() {
            Ok(saved) => saved,
            Err(e) => {
                warn!("discarding unreadable saved calculations: {e}");
                Vec::new()
            }
        }
    }

    pub fn search(&self, query: &str) -> Vec<SavedCalculation> {
        self.list()
            .into_iter()
            .filter(|calc| calc.matches(query))
            .collect()
    }

    pub fn get(&self, id: &str) -> Result<SavedCalculation> {
        self.list()
            .into_iter()
            .find(|calc| calc.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Prepends `calculation`, re-keying it if its id is already taken, and
    /// returns the record as stored.
    /// Unreadable contents are replaced by the new record.
    pub fn save(&mut self, mut calculation: SavedCalculation) -> Result<SavedCalculation> {
        let mut saved = self.read_list().unwrap_or_else(|e| {
            warn!("overwriting unreadable saved calculations: {e}");
            Vec::new()
        });
        while saved.iter().any(|calc| calc.id == calculation.id) {
            calculation.id = next_id(&calculation.id);
        }

        saved.insert(0, calculation.clone());
        if saved.len() > MAX_SAVED {
            debug!(
                "evicting {} oldest saved calculations",
                saved.len() - MAX_SAVED
            );
            saved.truncate(MAX_SAVED);
        }

        self.write_list(&saved)?;
        Ok(calculation)
    }

    /// Fails with the read error when the stored list is unreadable, leaving
    /// it untouched.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        let mut saved = self.read_list()?;
        let before = saved.len();
        saved.retain(|calc| calc.id != id);
        if saved.len() == before {
            return Err(Error::NotFound(id.to_string()));
        }
        self.write_list(&saved)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(SAVED_CALCULATIONS_KEY)
    }

    fn read_list(&self) -> Result<Vec<SavedCalculation>> {
        match self.store.get(SAVED_CALCULATIONS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn write_list(&mut self, saved: &[SavedCalculation]) -> Result<()> {
        let raw = serde_json::to_string(saved)?;
        self.store.set(SAVED_CALCULATIONS_KEY, raw)
    }
}

fn next_id(id: &str) -> String {
    match id.parse::<i64>() {
        Ok(n) => match n.checked_add(1) {
            Some(next) => next.to_string(),
            None => format!("{id}-1"),
        },
        Err(_) => format!("{id}-1"),
    }
}
