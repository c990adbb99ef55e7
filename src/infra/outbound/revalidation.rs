use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{error, info};
use unevent_api_types::RevalidateRequest;

use crate::application::effect::{DeliveryError, EffectOutcome};
use crate::application::notify::TagNotifier;

use super::{post_json, record_skip};

const TARGET: &str = "revalidate";

/// Posts affected tags to the frontend's `/api/revalidate`.
#[derive(Clone)]
pub struct RevalidationClient {
    client: Client,
    url: Option<Url>,
    token: Option<String>,
}

impl RevalidationClient {
    pub fn new(client: Client, url: Option<Url>, token: Option<String>) -> Self {
        Self {
            client,
            url,
            token: token.filter(|token| !token.trim().is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.token.is_some()
    }
}

#[async_trait]
impl TagNotifier for RevalidationClient {
    fn name(&self) -> &'static str {
        TARGET
    }

    async fn notify(&self, tags: &[String]) -> EffectOutcome<DeliveryError> {
        let (Some(url), Some(token)) = (&self.url, &self.token) else {
            error!(
                target = "unevent::outbound::revalidate",
                url_configured = self.url.is_some(),
                token_configured = self.token.is_some(),
                "revalidation target or token missing; skipping"
            );
            record_skip(TARGET);
            return EffectOutcome::skipped("revalidation not configured");
        };
        if tags.is_empty() {
            record_skip(TARGET);
            return EffectOutcome::skipped("no tags");
        }

        let body = RevalidateRequest {
            tags: tags.to_vec(),
        };
        let outcome = post_json(&self.client, TARGET, url.clone(), token, &body, tags.len()).await;
        if outcome.is_succeeded() {
            info!(
                target = "unevent::outbound::revalidate",
                count = tags.len(),
                tags = ?tags,
                "frontend revalidated"
            );
        }
        outcome
    }
}
