//! Postal-code (CEP) lookup and debounced address auto-fill

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::Address;
use crate::validation::{digits, format_cep, validate_cep};

/// Address fragment resolved from a postal code
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CepAddress {
    pub cep: String,
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

impl CepAddress {
    /// Fill the looked-up fields, leaving number and complement alone
    pub fn apply_to(&self, address: &mut Address) {
        address.cep = self.cep.clone();
        address.street = self.street.clone();
        address.neighborhood = self.neighborhood.clone();
        address.city = self.city.clone();
        address.state = self.state.clone();
    }
}

/// Postal-code lookup service. Failures of any kind are reported as `None`.
pub trait CepLookup: Send + Sync + 'static {
    fn lookup(&self, cep: &str) -> impl Future<Output = Option<CepAddress>> + Send;
}

#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
    #[serde(default)]
    erro: Option<Value>,
}

impl ViaCepResponse {
    fn not_found(&self) -> bool {
        match &self.erro {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(flag)) => flag == "true",
            _ => false,
        }
    }

    fn into_address(self, cep: &str) -> Option<CepAddress> {
        if self.not_found() {
            return None;
        }
        Some(CepAddress {
            cep: format_cep(cep),
            street: self.logradouro,
            neighborhood: self.bairro,
            city: self.localidade,
            state: self.uf,
        })
    }
}

/// ViaCEP-compatible HTTP lookup
#[derive(Debug, Clone)]
pub struct ViaCepClient {
    client: reqwest::Client,
    base_url: String,
}

impl ViaCepClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }
}

impl CepLookup for ViaCepClient {
    async fn lookup(&self, cep: &str) -> Option<CepAddress> {
        if !validate_cep(cep) {
            return None;
        }
        let cep = digits(cep);
        let url = format!("{}/{}/json/", self.base_url, cep);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Postal code lookup failed: {}", e);
                return None;
            }
        };
        if !response.status().is_success() {
            debug!("Postal code lookup returned {}", response.status());
            return None;
        }

        match response.json::<ViaCepResponse>().await {
            Ok(body) => body.into_address(&cep),
            Err(e) => {
                warn!("Unreadable postal code response: {}", e);
                None
            }
        }
    }
}

/// Event delivered by [`AddressAutofill`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutofillEvent {
    Found { field: String, address: CepAddress },
    NotFound { field: String },
}

/// Pending lookup of one field, tagged with the generation that spawned it
struct PendingLookup {
    generation: u64,
    handle: JoinHandle<()>,
}

type PendingMap = Arc<Mutex<HashMap<String, PendingLookup>>>;

/// Debounced auto-fill. Each field keeps at most one pending lookup.
pub struct AddressAutofill<L> {
    lookup: Arc<L>,
    quiet_period: Duration,
    pending: PendingMap,
    generation: AtomicU64,
    events: mpsc::UnboundedSender<AutofillEvent>,
}

impl<L: CepLookup> AddressAutofill<L> {
    pub fn new(lookup: L, quiet_period: Duration) -> (Self, mpsc::UnboundedReceiver<AutofillEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let autofill = Self {
            lookup: Arc::new(lookup),
            quiet_period,
            pending: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
            events,
        };
        (autofill, receiver)
    }

    /// Replace the pending lookup for `field`. Returns whether a lookup was
    /// scheduled; incomplete postal codes only cancel.
    pub async fn schedule(&self, field: &str, cep: &str) -> bool {
        let mut pending = self.pending.lock().await;
        if let Some(previous) = pending.remove(field) {
            previous.handle.abort();
        }
        if !validate_cep(cep) {
            return false;
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let lookup = Arc::clone(&self.lookup);
        let registry = Arc::clone(&self.pending);
        let events = self.events.clone();
        let quiet_period = self.quiet_period;
        let field_name = field.to_string();
        let cep = digits(cep);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            let found = lookup.lookup(&cep).await;

            let mut pending = registry.lock().await;
            let current = pending
                .get(&field_name)
                .is_some_and(|entry| entry.generation == generation);
            if !current {
                return;
            }
            pending.remove(&field_name);
            let event = match found {
                Some(address) => AutofillEvent::Found {
                    field: field_name,
                    address,
                },
                None => {
                    info!("Postal code {} not found", cep);
                    AutofillEvent::NotFound { field: field_name }
                }
            };
            // Receiver gone means nobody is filling the form anymore
            let _ = events.send(event);
        });
        pending.insert(field.to_string(), PendingLookup { generation, handle });
        true
    }

    /// Abort every pending lookup
    pub async fn cancel_all(&self) {
        let mut pending = self.pending.lock().await;
        for (_, entry) in pending.drain() {
            entry.handle.abort();
        }
    }

    /// Number of fields with a lookup still in flight
    pub async fn pending(&self) -> usize {
        self.pending.lock().await.len()
    }
}
