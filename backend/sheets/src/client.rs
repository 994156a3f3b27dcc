use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::{
    RowSource,
    auth::{ServiceAccount, TOKEN_URL, ensure_success, fetch_access_token},
    error::SheetsError::{self, InvalidUrl, MissingCredential},
};

pub const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Body of `spreadsheets.values.get`.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: String,
    #[serde(default)]
    pub major_dimension: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

#[derive(Clone, Debug)]
pub struct SheetsClient {
    http: Client,
    account: ServiceAccount,
    spreadsheet_id: String,
    token_url: String,
    api_base: String,
}

impl SheetsClient {
    pub fn new(account: ServiceAccount, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            account,
            spreadsheet_id: spreadsheet_id.into(),
            token_url: TOKEN_URL.to_string(),
            api_base: API_BASE.to_string(),
        }
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn values_url(&self, range: &str) -> Result<Url, SheetsError> {
        let mut url = Url::parse(&self.api_base).map_err(|e| InvalidUrl(e.to_string()))?;

        url.path_segments_mut()
            .map_err(|_| InvalidUrl(self.api_base.clone()))?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .push("values")
            .push(range);

        Ok(url)
    }

    pub async fn get_values(&self, range: &str) -> Result<ValueRange, SheetsError> {
        if self.spreadsheet_id.is_empty() {
            return Err(MissingCredential("spreadsheet id"));
        }

        let token = fetch_access_token(&self.http, &self.account, &self.token_url).await?;
        let url = self.values_url(range)?;

        debug!("Fetching {url}");

        let response = self.http.get(url).bearer_auth(token).send().await?;
        let body = ensure_success(response).await?.text().await?;

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl RowSource for SheetsClient {
    async fn fetch_rows(&self, range: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        Ok(self.get_values(range).await?.values)
    }
}
