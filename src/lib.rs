//! Client core for the Impulse ticket manager
//!
//! Keeps the wallet, ticket, and ticket type collections in sync with the
//! remote store through optimistic mutations: edits land locally first,
//! the API confirms, and failures roll back from snapshots. Ticket types
//! are annotated with their next distribution instant and the countdown
//! registry keeps a live one-minute label for each of them.

pub mod services;
pub mod stores;
pub mod utils;

pub use services::{
    ApiClient, ApiError, ApiResult, Gateway, Ticket, TicketType, TicketTypeDraft, Wallet,
};
pub use stores::{
    CountdownRegistry, MutationError, MutationResult, TicketTypeStore, WalletStore,
};
pub use utils::{format_remaining, next_distribution, FrequencyUnit, MonthOverflow};
