//! Provider implementation for the Seoul open-data public reservation API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use yeyak_core::{
    config::FetchConfig,
    model::{ListingPage, PageRange, RawRecord},
    ports::{ListingPort, PortError, SourceMeta},
};

/// Dataset serving education-category reservations.
pub const DATASET: &str = "ListPublicReservationEducation";

const USER_AGENT: &str = "yeyak/0.1";

/// Listing source backed by the Seoul open-data HTTP API.
pub struct SeoulListingPort {
    client: Client,
    api_base: String,
    api_key: String,
    meta: SourceMeta,
}

impl SeoulListingPort {
    /// Create a port bound to the given HTTP client, API base URL and key.
    #[must_use]
    pub fn new(client: Client, api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            meta: source_meta(),
        }
    }

    /// Request URL for the given row range.
    #[must_use]
    pub fn page_url(&self, range: PageRange) -> String {
        listing_url(&self.api_base, &self.api_key, range)
    }

    // Same URL with the key masked, for error messages and logs.
    fn display_url(&self, range: PageRange) -> String {
        listing_url(&self.api_base, "***", range)
    }
}

#[async_trait]
impl ListingPort for SeoulListingPort {
    fn source(&self) -> &SourceMeta {
        &self.meta
    }

    async fn fetch_page(&self, range: PageRange) -> Result<ListingPage, PortError> {
        let resp = self
            .client
            .get(self.page_url(range))
            .send()
            .await
            .map_err(|err| PortError::Network(err.without_url()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PortError::Status {
                status: status.as_u16(),
                url: self.display_url(range),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|err| PortError::Network(err.without_url()))?;

        let payload: Value =
            serde_json::from_str(&body).map_err(|err| PortError::Decode(err.to_string()))?;

        Ok(parse_listing(&payload))
    }
}

/// Build the HTTP client used for listing requests.
///
/// # Errors
///
/// Returns the [`reqwest::Error`] raised when the client cannot be initialised.
pub fn client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

/// Build the listing port for a fetcher configuration.
#[must_use]
pub fn port(client: Client, config: &FetchConfig) -> Arc<dyn ListingPort> {
    Arc::new(SeoulListingPort::new(
        client,
        config.api_base.clone(),
        config.api_key.clone(),
    ))
}

/// Extract the declared total and the object rows from a listing payload.
///
/// Anything missing or malformed degrades to zero rows and an unknown total.
#[must_use]
pub fn parse_listing(payload: &Value) -> ListingPage {
    let Some(listing) = payload.get(DATASET).and_then(Value::as_object) else {
        if let Some(result) = payload.get("RESULT") {
            tracing::debug!(%result, "listing payload without data section");
        }
        return ListingPage::default();
    };

    let total_count = listing.get("list_total_count").map_or(0, parse_count);

    let rows = listing
        .get("row")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_object)
                .map(|fields| RawRecord(fields.clone()))
                .collect()
        })
        .unwrap_or_default();

    ListingPage { total_count, rows }
}

fn parse_count(value: &Value) -> u64 {
    match value {
        Value::Number(number) => number.as_u64().unwrap_or(0),
        Value::String(text) => text.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}

fn listing_url(api_base: &str, api_key: &str, range: PageRange) -> String {
    format!(
        "{api_base}/{api_key}/json/{DATASET}/{start}/{end}/",
        start = range.start,
        end = range.end
    )
}

fn source_meta() -> SourceMeta {
    SourceMeta {
        dataset: DATASET.to_owned(),
    }
}
