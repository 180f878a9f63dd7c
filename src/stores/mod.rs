// Client state management
// Stores own the collections, apply optimistic mutations, and keep
// per-scope loading/error slots

pub mod countdown;
pub mod errors;
pub mod ticket_type_store;
pub mod wallet_store;

#[cfg(test)]
pub(crate) mod test_gateway;

pub use countdown::{CountdownRegistry, REFRESH_INTERVAL};
pub use errors::{EntityRef, MutationError, MutationResult, Operation};
pub use ticket_type_store::TicketTypeStore;
pub use wallet_store::WalletStore;
