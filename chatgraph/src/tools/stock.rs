use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::Tool;
use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};

/// Tool name for the stock quote lookup.
pub const TOOL_GET_STOCK_PRICE: &str = "get_stock_price";

/// Public Alpha Vantage endpoint.
pub const ALPHAVANTAGE_BASE_URL: &str = "https://www.alphavantage.co";

/// Latest quote for a ticker symbol from Alpha Vantage (`GLOBAL_QUOTE`).
///
/// The response body is returned unmodified, whatever the provider sends (including its own
/// error or rate-limit notes). Only transport failures are errors.
pub struct StockPriceTool {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl StockPriceTool {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), ALPHAVANTAGE_BASE_URL, api_key)
    }

    /// Custom client and base URL (e.g. a proxy, or a local server in tests).
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Tool for StockPriceTool {
    fn name(&self) -> &str {
        TOOL_GET_STOCK_PRICE
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_GET_STOCK_PRICE.to_string(),
            description: Some(
                "Fetch the latest stock price for a ticker symbol (e.g. 'AAPL', 'TSLA').".to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "symbol": { "type": "string", "description": "Ticker symbol." }
                },
                "required": ["symbol"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError> {
        let symbol = args
            .get("symbol")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolSourceError::InvalidInput("symbol must be a string".into()))?;
        debug!(symbol, "stock quote request");

        let response = self
            .client
            .get(format!("{}/query", self.base_url))
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ToolSourceError::Transport(e.to_string()))?;
        let text = response
            .text()
            .await
            .map_err(|e| ToolSourceError::Transport(e.to_string()))?;
        Ok(ToolCallContent { text })
    }
}
