//! Fetch coordination: failure taxonomy, generation tickets and per-kind
//! result slots.
//!
//! Every request is issued through a [`FetchSlot`], which hands out a
//! [`Ticket`] tagged with a monotonically increasing generation. A result is
//! applied only when its ticket is still the latest one for that slot, so a
//! slow response can never overwrite a newer one. Nothing is cancelled;
//! late results are dropped and reported as [`Applied::Stale`].

use std::fmt::{Display, Formatter};

use serde::Serialize;
use thiserror::Error;

use crate::http_client::HttpError;

/// Why a fetch produced no data.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchError {
    /// No server answered (refused connection, DNS failure, timeout).
    #[error("backend unreachable: {detail}")]
    NetworkUnreachable { detail: String },
    /// The server answered with a non-success status.
    #[error("backend returned status {status}")]
    ServerError { status: u16, detail: Option<String> },
    /// Anything else, including bodies that do not decode.
    #[error("unexpected fetch failure: {message}")]
    UnexpectedError { message: String },
}

impl FetchError {
    pub fn from_http(error: &HttpError) -> Self {
        if error.is_unreachable() {
            Self::NetworkUnreachable {
                detail: error.message().to_owned(),
            }
        } else {
            Self::UnexpectedError {
                message: error.message().to_owned(),
            }
        }
    }

    /// Non-success response. Picks up the `error` or `detail` field the
    /// backend puts in JSON error bodies.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["error", "detail"]
                    .iter()
                    .find_map(|field| value.get(*field).and_then(|v| v.as_str()).map(str::to_owned))
            });
        Self::ServerError { status, detail }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedError {
            message: message.into(),
        }
    }

    /// Message suitable for an error banner.
    pub fn banner_message(&self) -> String {
        match self {
            Self::NetworkUnreachable { .. } => String::from(
                "Cannot connect to server. Please ensure the backend service is running.",
            ),
            Self::ServerError {
                status,
                detail: Some(detail),
            } => format!("Server returned an error response (status {status}): {detail}"),
            Self::ServerError { status, detail: None } => {
                format!("Server returned an error response (status {status}).")
            }
            Self::UnexpectedError { message } => format!("Unexpected error: {message}"),
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::NetworkUnreachable { .. } => "fetch.network_unreachable",
            Self::ServerError { .. } => "fetch.server_error",
            Self::UnexpectedError { .. } => "fetch.unexpected",
        }
    }
}

/// Data set a slot holds. Used for log context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchKind {
    FilterOptions,
    Listing,
    Stats,
    SectorCounts,
    SectorDetail,
    SectorIndustries,
    SectorCompanies,
    IndustryDetail,
    IndustryCompanies,
    CompanyProfile,
    CompanyHistory,
}

impl FetchKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FilterOptions => "filter_options",
            Self::Listing => "listing",
            Self::Stats => "stats",
            Self::SectorCounts => "sector_counts",
            Self::SectorDetail => "sector_detail",
            Self::SectorIndustries => "sector_industries",
            Self::SectorCompanies => "sector_companies",
            Self::IndustryDetail => "industry_detail",
            Self::IndustryCompanies => "industry_companies",
            Self::CompanyProfile => "company_profile",
            Self::CompanyHistory => "company_history",
        }
    }
}

impl Display for FetchKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proof that a request was issued; required to apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    kind: FetchKind,
    generation: u64,
}

impl Ticket {
    pub const fn kind(&self) -> FetchKind {
        self.kind
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Issues tickets for one fetch kind and remembers the latest.
#[derive(Debug, Clone)]
pub struct RequestGate {
    kind: FetchKind,
    latest: u64,
}

impl RequestGate {
    pub const fn new(kind: FetchKind) -> Self {
        Self { kind, latest: 0 }
    }

    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket {
            kind: self.kind,
            generation: self.latest,
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.kind == self.kind && ticket.generation == self.latest
    }

    /// Makes every outstanding ticket stale.
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }
}

/// Outcome of [`FetchSlot::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Data replaced, error cleared.
    Updated,
    /// Data kept, error set.
    Failed,
    /// A newer request was issued (or the slot was invalidated); nothing changed.
    Stale,
}

/// Latest data, loading flag and error for one fetch kind.
#[derive(Debug, Clone)]
pub struct FetchSlot<T> {
    gate: RequestGate,
    data: Option<T>,
    loading: bool,
    error: Option<FetchError>,
    pending_key: Option<String>,
    loaded_key: Option<String>,
}

impl<T> FetchSlot<T> {
    pub const fn new(kind: FetchKind) -> Self {
        Self {
            gate: RequestGate::new(kind),
            data: None,
            loading: false,
            error: None,
            pending_key: None,
            loaded_key: None,
        }
    }

    pub const fn kind(&self) -> FetchKind {
        self.gate.kind
    }

    /// Marks the slot loading and issues a ticket for the new request.
    pub fn begin(&mut self) -> Ticket {
        self.pending_key = None;
        self.start()
    }

    /// Like [`begin`](Self::begin), remembering which query the data will
    /// belong to once applied.
    pub fn begin_keyed(&mut self, key: impl Into<String>) -> Ticket {
        self.pending_key = Some(key.into());
        self.start()
    }

    fn start(&mut self) -> Ticket {
        let ticket = self.gate.issue();
        self.loading = true;
        tracing::debug!(
            kind = %ticket.kind,
            generation = ticket.generation,
            "fetch issued"
        );
        ticket
    }

    /// Applies a result if `ticket` is still current.
    pub fn apply(&mut self, ticket: Ticket, result: Result<T, FetchError>) -> Applied {
        if !self.gate.is_current(&ticket) {
            tracing::debug!(
                kind = %ticket.kind,
                generation = ticket.generation,
                latest = self.gate.latest,
                "discarding stale fetch result"
            );
            return Applied::Stale;
        }

        self.loading = false;
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
                self.loaded_key = self.pending_key.take();
                Applied::Updated
            }
            Err(error) => {
                tracing::warn!(
                    kind = %ticket.kind,
                    code = error.code(),
                    error = %error,
                    "fetch failed"
                );
                self.error = Some(error);
                self.pending_key = None;
                Applied::Failed
            }
        }
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub const fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// True when the held data was loaded for `key` and has not been
    /// marked stale since.
    pub fn is_loaded_for(&self, key: &str) -> bool {
        self.data.is_some() && self.loaded_key.as_deref() == Some(key)
    }

    /// Forgets which query the data belongs to, forcing the next keyed
    /// check to refetch.
    pub fn mark_stale(&mut self) {
        self.loaded_key = None;
    }

    /// Drops outstanding requests without touching held data.
    pub fn invalidate(&mut self) {
        self.gate.invalidate();
        self.loading = false;
        self.pending_key = None;
    }

    /// Drops outstanding requests and clears data and error.
    pub fn reset(&mut self) {
        self.invalidate();
        self.data = None;
        self.error = None;
        self.loaded_key = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::HttpErrorKind;

    #[test]
    fn only_latest_ticket_applies() {
        let mut slot = FetchSlot::new(FetchKind::Listing);
        let first = slot.begin();
        let second = slot.begin();

        assert_eq!(slot.apply(second, Ok("q2")), Applied::Updated);
        assert_eq!(slot.apply(first, Ok("q1")), Applied::Stale);
        assert_eq!(slot.data(), Some(&"q2"));
        assert!(!slot.loading());
    }

    #[test]
    fn failure_keeps_previous_data() {
        let mut slot = FetchSlot::new(FetchKind::Stats);
        let ticket = slot.begin();
        slot.apply(ticket, Ok(10));

        let ticket = slot.begin();
        let outcome = slot.apply(ticket, Err(FetchError::unexpected("boom")));

        assert_eq!(outcome, Applied::Failed);
        assert_eq!(slot.data(), Some(&10));
        assert!(slot.error().is_some());

        slot.dismiss_error();
        assert!(slot.error().is_none());
    }

    #[test]
    fn success_clears_previous_error() {
        let mut slot = FetchSlot::new(FetchKind::Stats);
        let ticket = slot.begin();
        slot.apply(ticket, Err(FetchError::unexpected("boom")));
        let ticket = slot.begin();
        slot.apply(ticket, Ok(1));
        assert!(slot.error().is_none());
    }

    #[test]
    fn invalidate_turns_outstanding_tickets_stale() {
        let mut slot: FetchSlot<u32> = FetchSlot::new(FetchKind::SectorDetail);
        let ticket = slot.begin();
        slot.invalidate();

        assert_eq!(slot.apply(ticket, Ok(1)), Applied::Stale);
        assert!(slot.data().is_none());
        assert!(!slot.loading());
    }

    #[test]
    fn keyed_slots_track_loaded_query() {
        let mut slot = FetchSlot::new(FetchKind::SectorCompanies);
        let ticket = slot.begin_keyed("sector=Energy");
        assert!(!slot.is_loaded_for("sector=Energy"));
        slot.apply(ticket, Ok(vec![1, 2]));

        assert!(slot.is_loaded_for("sector=Energy"));
        assert!(!slot.is_loaded_for("sector=Energy&exchange=TASE"));

        slot.mark_stale();
        assert!(!slot.is_loaded_for("sector=Energy"));
    }

    #[test]
    fn tickets_from_other_kinds_never_apply() {
        let mut listing: FetchSlot<u8> = FetchSlot::new(FetchKind::Listing);
        let mut stats: FetchSlot<u8> = FetchSlot::new(FetchKind::Stats);
        let stats_ticket = stats.begin();
        listing.begin();

        assert_eq!(listing.apply(stats_ticket, Ok(1)), Applied::Stale);
    }

    #[test]
    fn error_taxonomy_and_banners() {
        let refused = FetchError::from_http(&HttpError::connect("connection refused"));
        assert!(matches!(refused, FetchError::NetworkUnreachable { .. }));
        assert_eq!(
            refused.banner_message(),
            "Cannot connect to server. Please ensure the backend service is running."
        );

        let body = FetchError::from_http(&HttpError::new(HttpErrorKind::Body, "eof"));
        assert_eq!(body.code(), "fetch.unexpected");

        let missing = FetchError::from_status(404, r#"{"error": "Sector not found"}"#);
        assert_eq!(
            missing,
            FetchError::ServerError {
                status: 404,
                detail: Some(String::from("Sector not found"))
            }
        );

        let plain = FetchError::from_status(502, "<html>bad gateway</html>");
        assert_eq!(
            plain.banner_message(),
            "Server returned an error response (status 502)."
        );
    }
}
