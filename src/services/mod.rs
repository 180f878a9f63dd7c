// External services
// HTTP access to the ticket API

pub mod api;

pub use api::{ApiClient, ApiError, ApiResult, Gateway, Ticket, TicketType, TicketTypeDraft, Wallet};
