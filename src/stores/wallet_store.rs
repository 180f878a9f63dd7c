//! Wallet store
//!
//! Owns the wallet collection, the selected wallet, and the selected
//! wallet's tickets. Mutations are optimistic: the local collection is
//! edited first, the gateway confirms, and a failure rolls the edit back
//! from a snapshot and lands in the store's error slot.
//!
//! State sits behind a mutex held only for the synchronous edits on
//! either side of the gateway call, never across it. Reads observe the
//! speculative state while a request is in flight, and mutations on
//! other entities go through without waiting.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::services::{Gateway, Ticket, Wallet};
use crate::stores::errors::{EntityRef, MutationError, MutationResult, Operation};

#[derive(Default)]
struct WalletState {
    wallets: Vec<Wallet>,
    selected: Option<Wallet>,
    tickets: Vec<Ticket>,
    loading: bool,
    last_error: Option<MutationError>,
}

pub struct WalletStore {
    api: Arc<dyn Gateway>,
    state: Mutex<WalletState>,
}

impl WalletStore {
    pub fn new(api: Arc<dyn Gateway>) -> Self {
        Self {
            api,
            state: Mutex::new(WalletState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WalletState> {
        // edits replace whole values, so a poisoned lock still guards
        // coherent state
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn wallets(&self) -> Vec<Wallet> {
        self.lock().wallets.clone()
    }

    pub fn selected_wallet(&self) -> Option<Wallet> {
        self.lock().selected.clone()
    }

    /// Tickets of the currently selected wallet
    pub fn tickets(&self) -> Vec<Ticket> {
        self.lock().tickets.clone()
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

    fn fail(state: &mut WalletState, err: MutationError) -> MutationError {
        log::error!("{}", err);
        state.last_error = Some(err.clone());
        err
    }

    /// Load the wallet collection from the remote store
    pub async fn refresh(&self) -> MutationResult<()> {
        {
            let mut state = self.lock();
            state.last_error = None;
            state.loading = true;
        }

        let result = self.api.list_wallets().await;
        let mut state = self.lock();
        state.loading = false;
        match result {
            Ok(wallets) => {
                log::debug!("Loaded {} wallets", wallets.len());
                state.wallets = wallets;
                Ok(())
            }
            Err(err) => Err(Self::fail(
                &mut state,
                MutationError::remote(Operation::Load, EntityRef::Wallets, &err),
            )),
        }
    }

    /// Select a wallet from the loaded collection and fetch its tickets.
    /// The selection sticks even if the ticket fetch fails.
    pub async fn select_wallet(&self, id: i64) -> MutationResult<()> {
        let wallet = {
            let mut state = self.lock();
            state.last_error = None;
            let Some(wallet) = state.wallets.iter().find(|w| w.id == id).cloned() else {
                return Err(Self::fail(
                    &mut state,
                    MutationError::new(
                        Operation::Select,
                        EntityRef::Wallet(id),
                        "not in the local collection",
                    ),
                ));
            };
            state.selected = Some(wallet.clone());
            state.tickets.clear();
            state.loading = true;
            wallet
        };
        log::debug!("Selected wallet {} ({})", wallet.id, wallet.name);

        let result = self.api.list_tickets(id).await;
        let mut state = self.lock();
        state.loading = false;
        match result {
            Ok(tickets) => {
                state.tickets = tickets;
                Ok(())
            }
            Err(err) => Err(Self::fail(
                &mut state,
                MutationError::remote(Operation::Load, EntityRef::Tickets, &err),
            )),
        }
    }

    /// Drop the selection and its tickets
    pub fn deselect(&self) {
        let mut state = self.lock();
        state.selected = None;
        state.tickets.clear();
        state.last_error = None;
    }

    /// Create a wallet and append the server-assigned record. Nothing is
    /// added speculatively since the id only exists once the server answers.
    pub async fn add_wallet(&self, name: &str) -> MutationResult<Wallet> {
        let name = name.trim();
        {
            let mut state = self.lock();
            state.last_error = None;
            if name.is_empty() {
                return Err(Self::fail(
                    &mut state,
                    MutationError::new(
                        Operation::Add,
                        EntityRef::WalletNamed(name.to_string()),
                        "Wallet name cannot be empty",
                    ),
                ));
            }
        }

        match self.api.create_wallet(name).await {
            Ok(wallet) => {
                log::info!("Added wallet {} ({})", wallet.id, wallet.name);
                self.lock().wallets.push(wallet.clone());
                Ok(wallet)
            }
            Err(err) => {
                let mut state = self.lock();
                Err(Self::fail(
                    &mut state,
                    MutationError::remote(
                        Operation::Add,
                        EntityRef::WalletNamed(name.to_string()),
                        &err,
                    ),
                ))
            }
        }
    }

    /// Rename a wallet in place, mirroring into the selection, then confirm
    /// with the remote store. The server's record wins over the speculative
    /// name on success; failure restores both from the snapshot.
    pub async fn rename_wallet(&self, id: i64, new_name: &str) -> MutationResult<()> {
        let new_name = new_name.trim();
        let snapshot = {
            let mut state = self.lock();
            state.last_error = None;
            if new_name.is_empty() {
                return Err(Self::fail(
                    &mut state,
                    MutationError::new(
                        Operation::Rename,
                        EntityRef::Wallet(id),
                        "Wallet name cannot be empty",
                    ),
                ));
            }
            let Some(position) = state.wallets.iter().position(|w| w.id == id) else {
                return Err(Self::fail(
                    &mut state,
                    MutationError::new(
                        Operation::Rename,
                        EntityRef::Wallet(id),
                        "not in the local collection",
                    ),
                ));
            };
            if state.wallets[position].name == new_name {
                log::debug!("Wallet {} name unchanged, skipping request", id);
                return Ok(());
            }

            let snapshot = (state.wallets.clone(), state.selected.clone());
            state.wallets[position].name = new_name.to_string();
            if let Some(selected) = state.selected.as_mut().filter(|s| s.id == id) {
                selected.name = new_name.to_string();
            }
            snapshot
        };

        match self.api.update_wallet(id, new_name).await {
            Ok(canonical) => {
                // positions may have shifted while the request was in flight
                let mut state = self.lock();
                if let Some(slot) = state.wallets.iter_mut().find(|w| w.id == id) {
                    *slot = canonical.clone();
                }
                if let Some(selected) = state.selected.as_mut().filter(|s| s.id == id) {
                    *selected = canonical;
                }
                Ok(())
            }
            Err(err) => {
                let mut state = self.lock();
                let (wallets, selected) = snapshot;
                state.wallets = wallets;
                state.selected = selected;
                Err(Self::fail(
                    &mut state,
                    MutationError::remote(Operation::Rename, EntityRef::Wallet(id), &err),
                ))
            }
        }
    }

    /// Remove a wallet speculatively, deselecting it if it was selected,
    /// then confirm the delete. Failure restores the collection, the
    /// selection, and the ticket list exactly as they were.
    pub async fn delete_wallet(&self, id: i64) -> MutationResult<()> {
        let snapshot = {
            let mut state = self.lock();
            state.last_error = None;
            let snapshot = (
                state.wallets.clone(),
                state.selected.clone(),
                state.tickets.clone(),
            );
            state.wallets.retain(|w| w.id != id);
            if state.selected.as_ref().is_some_and(|s| s.id == id) {
                state.selected = None;
                state.tickets.clear();
            }
            snapshot
        };

        match self.api.delete_wallet(id).await {
            Ok(()) => {
                log::info!("Deleted wallet {}", id);
                Ok(())
            }
            Err(err) => {
                let mut state = self.lock();
                let (wallets, selected, tickets) = snapshot;
                state.wallets = wallets;
                state.selected = selected;
                state.tickets = tickets;
                Err(Self::fail(
                    &mut state,
                    MutationError::remote(Operation::Delete, EntityRef::Wallet(id), &err),
                ))
            }
        }
    }

    /// Remove a ticket from the selected wallet speculatively, then confirm
    /// the consume with the remote store
    pub async fn consume_ticket(&self, id: i64) -> MutationResult<()> {
        let snapshot = {
            let mut state = self.lock();
            state.last_error = None;
            let snapshot = state.tickets.clone();
            state.tickets.retain(|t| t.id != id);
            snapshot
        };

        match self.api.consume_ticket(id).await {
            Ok(()) => {
                log::info!("Consumed ticket {}", id);
                Ok(())
            }
            Err(err) => {
                let mut state = self.lock();
                state.tickets = snapshot;
                Err(Self::fail(
                    &mut state,
                    MutationError::remote(Operation::Consume, EntityRef::Ticket(id), &err),
                ))
            }
        }
    }
}
