//! Ticket type store
//!
//! Owns the ticket type collection for the configuration panel, with its
//! own loading flag and error slot so panel failures never bleed into the
//! wallet view. Creates and updates are confirmed-then-applied (the server
//! assigns ids and bumps schedules); deletes are optimistic with rollback.
//!
//! Same lock discipline as the wallet store: the mutex is released across
//! the gateway call, so the collection stays readable and other records
//! stay editable while a request is in flight.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::services::{Gateway, TicketType, TicketTypeDraft};
use crate::stores::errors::{EntityRef, MutationError, MutationResult, Operation};
use crate::utils::schedule::MonthOverflow;

#[derive(Default)]
struct TicketTypeState {
    ticket_types: Vec<TicketType>,
    loading: bool,
    last_error: Option<MutationError>,
}

pub struct TicketTypeStore {
    api: Arc<dyn Gateway>,
    month_overflow: MonthOverflow,
    state: Mutex<TicketTypeState>,
}

impl TicketTypeStore {
    pub fn new(api: Arc<dyn Gateway>) -> Self {
        Self::with_month_overflow(api, MonthOverflow::default())
    }

    /// Create a store with an explicit month-overflow policy for schedule
    /// annotation
    pub fn with_month_overflow(api: Arc<dyn Gateway>, month_overflow: MonthOverflow) -> Self {
        Self {
            api,
            month_overflow,
            state: Mutex::new(TicketTypeState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TicketTypeState> {
        // edits replace whole values, so a poisoned lock still guards
        // coherent state
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ticket types, each annotated with its next distribution instant
    pub fn ticket_types(&self) -> Vec<TicketType> {
        self.lock().ticket_types.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn last_error(&self) -> Option<MutationError> {
        self.lock().last_error.clone()
    }

    pub fn dismiss_error(&self) {
        self.lock().last_error = None;
    }

    fn fail(state: &mut TicketTypeState, err: MutationError) -> MutationError {
        log::error!("{}", err);
        state.last_error = Some(err.clone());
        err
    }

    fn validate(draft: &TicketTypeDraft) -> Result<(), &'static str> {
        if draft.name.trim().is_empty() {
            return Err("Ticket type name cannot be empty");
        }
        if draft.distribute_quantity == 0 {
            return Err("Distribute quantity must be at least 1");
        }
        if draft.frequency_value == 0 {
            return Err("Frequency value must be at least 1");
        }
        Ok(())
    }

    /// Load the ticket type collection and annotate every record with its
    /// next distribution
    pub async fn refresh(&self) -> MutationResult<()> {
        {
            let mut state = self.lock();
            state.last_error = None;
            state.loading = true;
        }

        let result = self.api.list_ticket_types().await;
        let mut state = self.lock();
        state.loading = false;
        match result {
            Ok(mut types) => {
                for record in &mut types {
                    record.annotate(self.month_overflow);
                }
                log::debug!("Loaded {} ticket types", types.len());
                state.ticket_types = types;
                Ok(())
            }
            Err(err) => Err(Self::fail(
                &mut state,
                MutationError::remote(Operation::Load, EntityRef::TicketTypes, &err),
            )),
        }
    }

    /// Create a ticket type and append the server-assigned record,
    /// annotated. Nothing is added speculatively since the id only exists
    /// once the server answers.
    pub async fn add_ticket_type(&self, draft: &TicketTypeDraft) -> MutationResult<TicketType> {
        {
            let mut state = self.lock();
            state.last_error = None;
            if let Err(cause) = Self::validate(draft) {
                return Err(Self::fail(
                    &mut state,
                    MutationError::new(
                        Operation::Add,
                        EntityRef::TicketTypeNamed(draft.name.clone()),
                        cause,
                    ),
                ));
            }
        }

        match self.api.create_ticket_type(draft).await {
            Ok(mut record) => {
                record.annotate(self.month_overflow);
                log::info!("Added ticket type {} ({})", record.id, record.name);
                self.lock().ticket_types.push(record.clone());
                Ok(record)
            }
            Err(err) => {
                let mut state = self.lock();
                Err(Self::fail(
                    &mut state,
                    MutationError::remote(
                        Operation::Add,
                        EntityRef::TicketTypeNamed(draft.name.clone()),
                        &err,
                    ),
                ))
            }
        }
    }

    /// Replace a ticket type with the server's updated record. The local
    /// record is left alone until the server confirms, so a failure needs
    /// no rollback. A draft that changes nothing skips the request.
    pub async fn update_ticket_type(
        &self,
        id: i64,
        draft: &TicketTypeDraft,
    ) -> MutationResult<()> {
        {
            let mut state = self.lock();
            state.last_error = None;
            if let Err(cause) = Self::validate(draft) {
                return Err(Self::fail(
                    &mut state,
                    MutationError::new(Operation::Update, EntityRef::TicketType(id), cause),
                ));
            }
            let Some(position) = state.ticket_types.iter().position(|t| t.id == id) else {
                return Err(Self::fail(
                    &mut state,
                    MutationError::new(
                        Operation::Update,
                        EntityRef::TicketType(id),
                        "not in the local collection",
                    ),
                ));
            };
            if draft.matches(&state.ticket_types[position]) {
                log::debug!("Ticket type {} unchanged, skipping request", id);
                return Ok(());
            }
        }

        match self.api.update_ticket_type(id, draft).await {
            Ok(mut record) => {
                record.annotate(self.month_overflow);
                // positions may have shifted while the request was in flight
                let mut state = self.lock();
                if let Some(slot) = state.ticket_types.iter_mut().find(|t| t.id == id) {
                    *slot = record;
                }
                Ok(())
            }
            Err(err) => {
                let mut state = self.lock();
                Err(Self::fail(
                    &mut state,
                    MutationError::remote(Operation::Update, EntityRef::TicketType(id), &err),
                ))
            }
        }
    }

    /// Remove a ticket type speculatively, then confirm the delete.
    /// Failure restores the collection exactly as it was.
    pub async fn delete_ticket_type(&self, id: i64) -> MutationResult<()> {
        let snapshot = {
            let mut state = self.lock();
            state.last_error = None;
            let snapshot = state.ticket_types.clone();
            state.ticket_types.retain(|t| t.id != id);
            snapshot
        };

        match self.api.delete_ticket_type(id).await {
            Ok(()) => {
                log::info!("Deleted ticket type {}", id);
                Ok(())
            }
            Err(err) => {
                let mut state = self.lock();
                state.ticket_types = snapshot;
                Err(Self::fail(
                    &mut state,
                    MutationError::remote(Operation::Delete, EntityRef::TicketType(id), &err),
                ))
            }
        }
    }
}
