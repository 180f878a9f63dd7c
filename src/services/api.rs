//! Ticket API client
//!
//! Wire records, the typed request error, and the `Gateway` trait the stores
//! mutate through. `ApiClient` is the HTTP implementation; tests substitute
//! their own `Gateway`.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::utils::schedule::{next_distribution_with, FrequencyUnit, MonthOverflow};

/// A wallet holding issued tickets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: i64,
    pub name: String,
}

/// A ticket issued into a wallet, removed from view once consumed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub wallet_id: i64,
    pub ticket_type_name: String,
    #[serde(default)]
    pub issued_date: Option<String>,
}

/// A recurring ticket type definition
///
/// `frequency_unit` stays a plain string so a record with an unrecognized
/// unit still loads; the schedule annotation degrades instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketType {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub distribute_quantity: u32,
    pub frequency_value: u32,
    pub frequency_unit: String,
    #[serde(default)]
    pub target_wallet_id: Option<i64>,
    #[serde(default)]
    pub target_wallet_name: Option<String>,
    #[serde(default)]
    pub last_distributed: Option<String>,
    /// Derived locally from `last_distributed` + frequency; never on the wire.
    #[serde(skip)]
    pub next_distribution: Option<chrono::DateTime<chrono::Utc>>,
}

impl TicketType {
    /// Recompute the derived next-distribution instant from the record's
    /// own schedule fields.
    pub fn annotate(&mut self, policy: MonthOverflow) {
        self.next_distribution = next_distribution_with(
            policy,
            self.last_distributed.as_deref(),
            self.frequency_value,
            &self.frequency_unit,
        );
    }
}

/// The editable field set sent when creating or updating a ticket type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketTypeDraft {
    pub name: String,
    pub description: Option<String>,
    pub distribute_quantity: u32,
    pub frequency_value: u32,
    pub frequency_unit: FrequencyUnit,
    pub target_wallet_id: Option<i64>,
}

impl TicketTypeDraft {
    /// True when applying this draft to `record` would change nothing,
    /// so the update request can be skipped.
    pub fn matches(&self, record: &TicketType) -> bool {
        self.name == record.name
            && self.description == record.description
            && self.distribute_quantity == record.distribute_quantity
            && self.frequency_value == record.frequency_value
            && self.frequency_unit.as_str() == record.frequency_unit
            && self.target_wallet_id == record.target_wallet_id
    }
}

/// Error from a gateway request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS, ...)
    Transport(String),
    /// The server answered with a non-success status
    Rejected { status: u16, message: String },
    /// The server answered 2xx but the body did not decode
    MalformedResponse(String),
}

impl ApiError {
    /// The human-readable cause, without the error-kind prefix. For a
    /// rejection this is the server's own message.
    pub fn message(&self) -> &str {
        match self {
            Self::Transport(msg) => msg,
            Self::Rejected { message, .. } => message,
            Self::MalformedResponse(msg) => msg,
        }
    }

    /// HTTP status of a rejection, if that is what this is
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResponse(_))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "Request failed: {}", msg),
            Self::Rejected { status, message } => {
                write!(f, "Server returned {}: {}", status, message)
            }
            Self::MalformedResponse(msg) => write!(f, "Failed to parse response: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Result type alias for gateway requests
pub type ApiResult<T> = Result<T, ApiError>;

/// Error payload shape; the server uses `error` on some routes and
/// `message` on others.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.error.or(self.message)
    }
}

/// Remote collection operations the stores mutate through
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn list_wallets(&self) -> ApiResult<Vec<Wallet>>;
    async fn create_wallet(&self, name: &str) -> ApiResult<Wallet>;
    async fn update_wallet(&self, id: i64, name: &str) -> ApiResult<Wallet>;
    async fn delete_wallet(&self, id: i64) -> ApiResult<()>;
    async fn list_tickets(&self, wallet_id: i64) -> ApiResult<Vec<Ticket>>;
    async fn consume_ticket(&self, id: i64) -> ApiResult<()>;
    async fn list_ticket_types(&self) -> ApiResult<Vec<TicketType>>;
    async fn create_ticket_type(&self, draft: &TicketTypeDraft) -> ApiResult<TicketType>;
    async fn update_ticket_type(&self, id: i64, draft: &TicketTypeDraft) -> ApiResult<TicketType>;
    async fn delete_ticket_type(&self, id: i64) -> ApiResult<()>;
}

/// HTTP client for the ticket API
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client for the API rooted at `base_url`
    /// (e.g. `http://localhost:8000/api`).
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a client reusing an existing `reqwest::Client`, for callers
    /// that configure timeouts or proxies themselves.
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> ApiResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        check_status(response).await
    }
}

/// Turn a non-success response into `ApiError::Rejected`, preferring the
/// server's own error message over a generic one.
async fn check_status(response: reqwest::Response) -> ApiResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let status = status.as_u16();
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| format!("HTTP error: status {}", status));
    Err(ApiError::Rejected { status, message })
}

async fn parse_body<T>(response: reqwest::Response) -> ApiResult<T>
where
    T: serde::de::DeserializeOwned,
{
    response
        .json()
        .await
        .map_err(|e| ApiError::MalformedResponse(e.to_string()))
}

#[async_trait]
impl Gateway for ApiClient {
    async fn list_wallets(&self) -> ApiResult<Vec<Wallet>> {
        let response = self.send(self.http.get(self.url("/wallets"))).await?;
        parse_body(response).await
    }

    async fn create_wallet(&self, name: &str) -> ApiResult<Wallet> {
        let request = self
            .http
            .post(self.url("/wallets"))
            .json(&json!({ "name": name }));
        let response = self.send(request).await?;
        parse_body(response).await
    }

    async fn update_wallet(&self, id: i64, name: &str) -> ApiResult<Wallet> {
        let request = self
            .http
            .put(self.url(&format!("/wallets/{}", id)))
            .json(&json!({ "name": name }));
        let response = self.send(request).await?;
        parse_body(response).await
    }

    async fn delete_wallet(&self, id: i64) -> ApiResult<()> {
        self.send(self.http.delete(self.url(&format!("/wallets/{}", id))))
            .await?;
        Ok(())
    }

    async fn list_tickets(&self, wallet_id: i64) -> ApiResult<Vec<Ticket>> {
        let response = self
            .send(self.http.get(self.url(&format!("/wallets/{}/tickets", wallet_id))))
            .await?;
        parse_body(response).await
    }

    async fn consume_ticket(&self, id: i64) -> ApiResult<()> {
        self.send(self.http.post(self.url(&format!("/tickets/{}/consume", id))))
            .await?;
        Ok(())
    }

    async fn list_ticket_types(&self) -> ApiResult<Vec<TicketType>> {
        let response = self.send(self.http.get(self.url("/ticket-types"))).await?;
        parse_body(response).await
    }

    async fn create_ticket_type(&self, draft: &TicketTypeDraft) -> ApiResult<TicketType> {
        let request = self.http.post(self.url("/ticket-types")).json(draft);
        let response = self.send(request).await?;
        parse_body(response).await
    }

    async fn update_ticket_type(&self, id: i64, draft: &TicketTypeDraft) -> ApiResult<TicketType> {
        let request = self
            .http
            .put(self.url(&format!("/ticket-types/{}", id)))
            .json(draft);
        let response = self.send(request).await?;
        parse_body(response).await
    }

    async fn delete_ticket_type(&self, id: i64) -> ApiResult<()> {
        self.send(self.http.delete(self.url(&format!("/ticket-types/{}", id))))
            .await?;
        Ok(())
    }
}
