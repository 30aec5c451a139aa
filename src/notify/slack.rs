use std::time::Duration;

use eyre::{eyre, Result};
use reqwest::Client;
use serde_json::json;

use crate::arb::Opportunity;
use crate::models::TokenList;

/// Slack Web API endpoint for posting messages
const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Slack notifier
#[derive(Debug)]
pub struct SlackNotifier {
    /// The Slack OAuth token
    token: String,
    /// The HTTP client
    client: Client,
    /// `chat.postMessage` URL
    url: String,
}

impl SlackNotifier {
    /// Create a new Slack notifier
    ///
    /// # Errors
    /// * If the HTTP client cannot be built
    pub fn new(token: &str) -> Result<Self> {
        Self::with_endpoint(token, POST_MESSAGE_URL)
    }

    /// Create a notifier posting to `url` instead of the Slack API
    ///
    /// # Errors
    /// * If the HTTP client cannot be built
    pub fn with_endpoint(token: &str, url: &str) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            token: token.to_string(),
            client,
            url: url.to_string(),
        })
    }

    /// Send a message to a specific channel
    ///
    /// # Errors
    /// * If the request fails or Slack rejects the message
    pub async fn send_to(&self, msg: &str, channel: &str) -> Result<()> {
        let payload = json!({
            "channel": channel,
            "text": msg,
            "username": "Limit Scout",
            "icon_emoji": ":mag:"
        });

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?
            .json::<serde_json::Value>()
            .await?;

        if !response["ok"].as_bool().unwrap_or(false) {
            return Err(eyre!(
                "Slack API error: {}",
                response["error"].as_str().unwrap_or("unknown error")
            ));
        }

        Ok(())
    }

    /// Send a message to the default channel
    ///
    /// # Errors
    /// * If the request fails or Slack rejects the message
    pub async fn send(&self, msg: &str) -> Result<()> {
        self.send_to(msg, "#limit-scout").await
    }

    /// Send an error message to the error channel
    ///
    /// # Errors
    /// * If the request fails or Slack rejects the message
    pub async fn send_error(&self, error: &str) -> Result<()> {
        self.send_to(&format!(":warning: Error: {error}"), "#limit-scout-errors")
            .await
    }

    /// Report a profitable order to the default channel
    ///
    /// # Errors
    /// * If the request fails or Slack rejects the message
    pub async fn report(&self, opportunity: &Opportunity, tokens: &TokenList) -> Result<()> {
        self.send(&describe(opportunity, tokens)).await
    }
}

/// One-message summary of an opportunity
#[must_use]
pub fn describe(opportunity: &Opportunity, tokens: &TokenList) -> String {
    let order = &opportunity.order;
    let quote = &opportunity.quote;
    format!(
        ":moneybag: Order {} sells {} {} for {} {}\n\
         Uniswap {} via {}: {} in, {} out\n\
         Profit: {} {} over {}",
        order.hash,
        order.send_amount,
        tokens.symbol(&order.send_asset),
        order.receive_amount,
        tokens.symbol(&order.receive_asset),
        quote.kind,
        quote.route,
        quote.amount_in,
        quote.amount_out,
        opportunity.profit,
        tokens.symbol(&opportunity.profit_token),
        opportunity.required,
    )
}
