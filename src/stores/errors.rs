//! Store mutation error type
//!
//! One structured shape for everything a store operation can surface:
//! which operation, on which record, and why. Displays as the
//! "Failed to <verb> <target>: <cause>" line the UI shows.

use std::fmt;

use crate::services::ApiError;

/// The store operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load,
    Add,
    Rename,
    Update,
    Delete,
    Consume,
    Select,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::Load => "load",
            Self::Add => "add",
            Self::Rename => "rename",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Consume => "consume",
            Self::Select => "select",
        };
        f.write_str(verb)
    }
}

/// The record (or collection) an operation was acting on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    Wallet(i64),
    /// A wallet that has no server id yet (failed create)
    WalletNamed(String),
    Ticket(i64),
    TicketType(i64),
    /// A ticket type that has no server id yet (failed create)
    TicketTypeNamed(String),
    Wallets,
    Tickets,
    TicketTypes,
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wallet(id) => write!(f, "wallet {}", id),
            Self::WalletNamed(name) => write!(f, "wallet \"{}\"", name),
            Self::Ticket(id) => write!(f, "ticket {}", id),
            Self::TicketType(id) => write!(f, "ticket type {}", id),
            Self::TicketTypeNamed(name) => write!(f, "ticket type \"{}\"", name),
            Self::Wallets => f.write_str("wallets"),
            Self::Tickets => f.write_str("tickets"),
            Self::TicketTypes => f.write_str("ticket types"),
        }
    }
}

/// A failed store operation, kept in the store's error slot until the next
/// operation starts or the caller dismisses it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationError {
    pub operation: Operation,
    pub target: EntityRef,
    pub cause: String,
}

impl MutationError {
    pub fn new(operation: Operation, target: EntityRef, cause: impl Into<String>) -> Self {
        Self {
            operation,
            target,
            cause: cause.into(),
        }
    }

    /// Wrap a gateway error, keeping the server's own message as the cause
    pub fn remote(operation: Operation, target: EntityRef, err: &ApiError) -> Self {
        Self::new(operation, target, err.message())
    }
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to {} {}: {}", self.operation, self.target, self.cause)
    }
}

impl std::error::Error for MutationError {}

/// Result type alias for store operations
pub type MutationResult<T> = Result<T, MutationError>;
