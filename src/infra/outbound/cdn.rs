use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;
use unevent_api_types::PurgeByTagRequest;

use crate::application::effect::{DeliveryError, EffectOutcome};
use crate::application::notify::TagNotifier;

use super::{post_json, record_skip};

const TARGET: &str = "cdn";

/// Purge-by-tag fanout to the CDN zone.
#[derive(Clone)]
pub struct CdnPurger {
    client: Client,
    api_base: Url,
    api_token: Option<String>,
    zone_id: Option<String>,
}

impl CdnPurger {
    pub fn new(
        client: Client,
        api_base: Url,
        api_token: Option<String>,
        zone_id: Option<String>,
    ) -> Self {
        Self {
            client,
            api_base,
            api_token: api_token.filter(|value| !value.trim().is_empty()),
            zone_id: zone_id.filter(|value| !value.trim().is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_token.is_some() && self.zone_id.is_some()
    }

    /// `{api_base}/zones/{zone}/purge_cache`
    fn purge_url(&self, zone: &str) -> Result<Url, DeliveryError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| DeliveryError::Request(format!("invalid CDN api base `{}`", self.api_base)))?
            .pop_if_empty()
            .extend(["zones", zone, "purge_cache"]);
        Ok(url)
    }
}

#[async_trait]
impl TagNotifier for CdnPurger {
    fn name(&self) -> &'static str {
        TARGET
    }

    async fn notify(&self, tags: &[String]) -> EffectOutcome<DeliveryError> {
        let (Some(token), Some(zone)) = (&self.api_token, &self.zone_id) else {
            debug!(target = "unevent::outbound::cdn", "CDN credentials absent; skipping purge");
            record_skip(TARGET);
            return EffectOutcome::skipped("cdn not configured");
        };
        if tags.is_empty() {
            record_skip(TARGET);
            return EffectOutcome::skipped("no tags");
        }

        let url = match self.purge_url(zone) {
            Ok(url) => url,
            Err(err) => return EffectOutcome::Failed(err),
        };
        let body = PurgeByTagRequest {
            tags: tags.to_vec(),
        };
        post_json(&self.client, TARGET, url, token, &body, tags.len()).await
    }
}
