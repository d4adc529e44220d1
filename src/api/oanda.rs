//! OANDA v1 REST client implementing the `Broker` trait.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::models::{InstrumentMeta, OrderIntent, Quote, Side};

use super::broker::{AccountSummary, Broker, OrderConfirmation};
use super::types::{
    AccountResponse, CandlesResponse, InstrumentListResponse, InstrumentMetaResponse,
    OrderCreateResponse, PricesResponse,
};

const PRACTICE_API_BASE: &str = "https://api-fxpractice.oanda.com";
const LIVE_API_BASE: &str = "https://api-fxtrade.oanda.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Instrument fields requested alongside the halted flag.
const INSTRUMENT_FIELDS: &str =
    "displayName,pip,maxTradeUnits,precision,maxTrailingStop,minTrailingStop,marginRate,halted";

/// Client for one OANDA account, authenticated with a bearer token.
pub struct OandaClient {
    client: Client,
    base_url: String,
    api_token: String,
    account_id: String,
}

impl OandaClient {
    /// Create a client against the named environment (`practice` or `live`).
    pub fn new(environment: &str, api_token: &str, account_id: &str) -> Result<Self> {
        let base_url = match environment {
            "practice" => PRACTICE_API_BASE,
            "live" => LIVE_API_BASE,
            other => anyhow::bail!("unknown OANDA environment: {other}"),
        };
        Self::with_base_url(base_url.to_string(), api_token, account_id)
    }

    /// Create with a custom base URL (for testing).
    pub fn with_base_url(base_url: String, api_token: &str, account_id: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            api_token: api_token.to_string(),
            account_id: account_id.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path_and_query);
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {path_and_query}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Request {} failed: {} - {}", path_and_query, status, body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response for {path_and_query}"))
    }
}

#[async_trait]
impl Broker for OandaClient {
    async fn account(&self) -> Result<AccountSummary> {
        let account: AccountResponse = self
            .get_json(&format!("/v1/accounts/{}", self.account_id))
            .await?;
        Ok(AccountSummary {
            currency: account.account_currency,
            margin_avail: account.margin_avail,
            margin_used: account.margin_used,
        })
    }

    async fn instrument_list(&self) -> Result<Vec<String>> {
        let response: InstrumentListResponse = self
            .get_json(&format!(
                "/v1/instruments?accountId={}&fields=instrument",
                self.account_id
            ))
            .await?;
        Ok(response
            .instruments
            .into_iter()
            .map(|i| i.instrument)
            .collect())
    }

    async fn instrument_meta(&self, instrument: &str) -> Result<InstrumentMeta> {
        let response: InstrumentMetaResponse = self
            .get_json(&format!(
                "/v1/instruments?accountId={}&instruments={}&fields={}",
                self.account_id, instrument, INSTRUMENT_FIELDS
            ))
            .await?;
        response
            .instruments
            .into_iter()
            .next()
            .with_context(|| format!("instrument {instrument} not found"))?
            .into_meta()
    }

    async fn quotes(&self, instruments: &[String]) -> Result<HashMap<String, Quote>> {
        let response: PricesResponse = self
            .get_json(&format!(
                "/v1/prices?accountId={}&instruments={}",
                self.account_id,
                instruments.join(",")
            ))
            .await?;
        Ok(response
            .prices
            .into_iter()
            .map(|p| (p.instrument.clone(), Quote::new(p.instrument, p.bid, p.ask)))
            .collect())
    }

    async fn midpoint_history(
        &self,
        instrument: &str,
        granularity: &str,
        count: usize,
    ) -> Result<Vec<f64>> {
        let response: CandlesResponse = self
            .get_json(&format!(
                "/v1/candles?accountId={}&instrument={}&granularity={}&count={}&candleFormat=midpoint",
                self.account_id, instrument, granularity, count
            ))
            .await?;
        Ok(response.candles.into_iter().map(|c| c.close_mid).collect())
    }

    async fn submit_order(&self, intent: &OrderIntent) -> Result<OrderConfirmation> {
        let url = format!("{}/v1/accounts/{}/orders", self.base_url, self.account_id);
        let params = [
            ("instrument", intent.instrument.clone()),
            ("units", intent.units.to_string()),
            ("side", intent.side.as_str().to_string()),
            ("type", "market".to_string()),
            ("stopLoss", intent.stop_loss.to_string()),
            ("takeProfit", intent.take_profit.to_string()),
            ("trailingStop", intent.trailing_stop.to_string()),
        ];
        debug!(
            instrument = %intent.instrument,
            side = %intent.side,
            units = intent.units,
            "Submitting market order"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .form(&params)
            .send()
            .await
            .context("Failed to submit order")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Order submission failed: {} - {}", status, body);
        }

        let created: OrderCreateResponse = response
            .json()
            .await
            .context("Failed to parse order response")?;

        // A side the broker echoes outside buy/sell violates the order
        // contract and is fatal.
        if let Some(trade) = &created.trade_opened {
            let echoed: Side = trade.side.parse()?;
            if echoed != intent.side {
                anyhow::bail!(
                    "broker echoed side {} for a {} order",
                    echoed,
                    intent.side
                );
            }
        }

        Ok(OrderConfirmation {
            instrument: created.instrument,
            side: intent.side,
            units: intent.units,
            price: created.price,
            time: created.time,
            trade_id: created.trade_opened.map(|t| t.id),
        })
    }
}
