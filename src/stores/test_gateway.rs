//! In-test gateway with programmable failures and recorded calls.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::services::{
    ApiError, ApiResult, Gateway, Ticket, TicketType, TicketTypeDraft, Wallet,
};

/// Gateway double backed by seeded collections. While a failure is armed,
/// every call returns it; every call is recorded by name either way.
#[derive(Default)]
pub(crate) struct MockGateway {
    wallets: Mutex<Vec<Wallet>>,
    tickets: Mutex<Vec<Ticket>>,
    types: Mutex<Vec<TicketType>>,
    fail: Mutex<Option<ApiError>>,
    calls: Mutex<Vec<&'static str>>,
    next_id: Mutex<i64>,
    /// When set, created/updated wallets come back with this name instead
    /// of the requested one, so tests can observe the canonical re-sync.
    reply_wallet_name: Mutex<Option<String>>,
    /// When set, created/updated ticket types come back with this
    /// `last_distributed`, so tests can observe re-annotation.
    reply_last_distributed: Mutex<Option<String>>,
    /// When armed, the next call parks until the handle returned by
    /// `hold_next_request` is notified.
    gate: Mutex<Option<Arc<Notify>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(100),
            ..Self::default()
        }
    }

    pub fn seed_wallets(&self, wallets: Vec<Wallet>) {
        *self.wallets.lock().unwrap() = wallets;
    }

    pub fn seed_tickets(&self, tickets: Vec<Ticket>) {
        *self.tickets.lock().unwrap() = tickets;
    }

    pub fn seed_types(&self, types: Vec<TicketType>) {
        *self.types.lock().unwrap() = types;
    }

    pub fn fail_with(&self, err: ApiError) {
        *self.fail.lock().unwrap() = Some(err);
    }

    pub fn clear_failure(&self) {
        *self.fail.lock().unwrap() = None;
    }

    pub fn reply_wallet_name(&self, name: &str) {
        *self.reply_wallet_name.lock().unwrap() = Some(name.to_string());
    }

    pub fn reply_last_distributed(&self, timestamp: &str) {
        *self.reply_last_distributed.lock().unwrap() = Some(timestamp.to_string());
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// Hold the next gateway call open until the returned handle's
    /// `notify_one` fires, so a test can observe the store mid-request.
    /// One-shot: later calls pass straight through.
    pub fn hold_next_request(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    async fn pause(&self) {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn note(&self, call: &'static str) -> ApiResult<()> {
        self.calls.lock().unwrap().push(call);
        match self.fail.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn assign_id(&self) -> i64 {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        *next
    }

    fn wallet_reply(&self, id: i64, requested: &str) -> Wallet {
        let name = self
            .reply_wallet_name
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| requested.to_string());
        Wallet { id, name }
    }

    fn type_reply(&self, id: i64, draft: &TicketTypeDraft) -> TicketType {
        TicketType {
            id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            distribute_quantity: draft.distribute_quantity,
            frequency_value: draft.frequency_value,
            frequency_unit: draft.frequency_unit.as_str().to_string(),
            target_wallet_id: draft.target_wallet_id,
            target_wallet_name: None,
            last_distributed: self.reply_last_distributed.lock().unwrap().clone(),
            next_distribution: None,
        }
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn list_wallets(&self) -> ApiResult<Vec<Wallet>> {
        self.pause().await;
        self.note("list_wallets")?;
        Ok(self.wallets.lock().unwrap().clone())
    }

    async fn create_wallet(&self, name: &str) -> ApiResult<Wallet> {
        self.pause().await;
        self.note("create_wallet")?;
        Ok(self.wallet_reply(self.assign_id(), name))
    }

    async fn update_wallet(&self, id: i64, name: &str) -> ApiResult<Wallet> {
        self.pause().await;
        self.note("update_wallet")?;
        Ok(self.wallet_reply(id, name))
    }

    async fn delete_wallet(&self, _id: i64) -> ApiResult<()> {
        self.pause().await;
        self.note("delete_wallet")
    }

    async fn list_tickets(&self, wallet_id: i64) -> ApiResult<Vec<Ticket>> {
        self.pause().await;
        self.note("list_tickets")?;
        let tickets = self.tickets.lock().unwrap();
        Ok(tickets
            .iter()
            .filter(|t| t.wallet_id == wallet_id)
            .cloned()
            .collect())
    }

    async fn consume_ticket(&self, _id: i64) -> ApiResult<()> {
        self.pause().await;
        self.note("consume_ticket")
    }

    async fn list_ticket_types(&self) -> ApiResult<Vec<TicketType>> {
        self.pause().await;
        self.note("list_ticket_types")?;
        Ok(self.types.lock().unwrap().clone())
    }

    async fn create_ticket_type(&self, draft: &TicketTypeDraft) -> ApiResult<TicketType> {
        self.pause().await;
        self.note("create_ticket_type")?;
        Ok(self.type_reply(self.assign_id(), draft))
    }

    async fn update_ticket_type(&self, id: i64, draft: &TicketTypeDraft) -> ApiResult<TicketType> {
        self.pause().await;
        self.note("update_ticket_type")?;
        Ok(self.type_reply(id, draft))
    }

    async fn delete_ticket_type(&self, _id: i64) -> ApiResult<()> {
        self.pause().await;
        self.note("delete_ticket_type")
    }
}

pub(crate) fn wallet(id: i64, name: &str) -> Wallet {
    Wallet {
        id,
        name: name.to_string(),
    }
}

pub(crate) fn ticket(id: i64, wallet_id: i64) -> Ticket {
    Ticket {
        id,
        wallet_id,
        ticket_type_name: "Pizza Night".to_string(),
        issued_date: Some("2025-06-01T12:00:00".to_string()),
    }
}

pub(crate) fn ticket_type(id: i64, name: &str) -> TicketType {
    TicketType {
        id,
        name: name.to_string(),
        description: None,
        distribute_quantity: 1,
        frequency_value: 7,
        frequency_unit: "days".to_string(),
        target_wallet_id: Some(1),
        target_wallet_name: None,
        last_distributed: None,
        next_distribution: None,
    }
}

pub(crate) fn rejected(message: &str) -> ApiError {
    ApiError::Rejected {
        status: 400,
        message: message.to_string(),
    }
}
