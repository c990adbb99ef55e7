//! Outbound tag notifications: frontend revalidation and CDN purge.

mod cdn;
mod revalidation;

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{Unit, counter, describe_counter, describe_histogram, histogram};
use reqwest::{Client, Url};
use serde::Serialize;
use tracing::{info, warn};

use crate::application::effect::{DeliveryError, EffectOutcome};
use crate::application::notify::{TagFanout, TagNotifier};
use crate::config::Settings;
use crate::infra::error::InfraError;

pub use cdn::CdnPurger;
pub use revalidation::RevalidationClient;

const METRIC_OUTBOUND_TOTAL: &str = "unevent_outbound_total";
const METRIC_OUTBOUND_MS: &str = "unevent_outbound_ms";

pub fn describe_metrics() {
    describe_counter!(
        METRIC_OUTBOUND_TOTAL,
        Unit::Count,
        "Outbound tag notifications by target and outcome."
    );
    describe_histogram!(
        METRIC_OUTBOUND_MS,
        Unit::Milliseconds,
        "Outbound tag notification latency in milliseconds."
    );
}

/// Longest peer response body kept in error reports.
const MAX_ERROR_BODY: usize = 512;

pub fn user_agent() -> &'static str {
    concat!("unevent/", env!("CARGO_PKG_VERSION"))
}

/// HTTP client shared by every outbound notifier.
pub fn build_client(timeout: Duration) -> Result<Client, InfraError> {
    Client::builder()
        .user_agent(user_agent())
        .timeout(timeout)
        .build()
        .map_err(|err| InfraError::http_client(err.to_string()))
}

/// Revalidation trigger followed by the CDN purger, sharing one client.
pub fn fanout_from_settings(settings: &Settings) -> Result<TagFanout, InfraError> {
    let client = build_client(settings.outbound.timeout)?;
    let revalidation = RevalidationClient::new(
        client.clone(),
        settings.revalidate.url.clone(),
        settings.revalidate.token.clone(),
    );
    let cdn = CdnPurger::new(
        client,
        settings.cdn.api_base.clone(),
        settings.cdn.api_token.clone(),
        settings.cdn.zone_id.clone(),
    );
    info!(
        target = "unevent::outbound",
        revalidate = revalidation.is_configured(),
        cdn = cdn.is_configured(),
        "tag notifiers configured"
    );
    let notifiers: Vec<Arc<dyn TagNotifier>> = vec![Arc::new(revalidation), Arc::new(cdn)];
    Ok(TagFanout::new(notifiers))
}

/// POST `body` to `url` with bearer `token`, recording metrics under `target`.
async fn post_json<B: Serialize + ?Sized>(
    client: &Client,
    target: &'static str,
    url: Url,
    token: &str,
    body: &B,
    tag_count: usize,
) -> EffectOutcome<DeliveryError> {
    let started = Instant::now();
    let outcome = match client.post(url).bearer_auth(token).json(body).send().await {
        Ok(response) if response.status().is_success() => EffectOutcome::Succeeded,
        Ok(response) => {
            let status = response.status().as_u16();
            let mut text = response.text().await.unwrap_or_default();
            truncate_on_char_boundary(&mut text, MAX_ERROR_BODY);
            EffectOutcome::Failed(DeliveryError::Status { status, body: text })
        }
        Err(err) => EffectOutcome::Failed(DeliveryError::Transport(err.to_string())),
    };
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    histogram!(METRIC_OUTBOUND_MS, "target" => target).record(elapsed_ms);
    counter!(METRIC_OUTBOUND_TOTAL, "target" => target, "outcome" => outcome.label()).increment(1);

    match &outcome {
        EffectOutcome::Failed(err) => warn!(
            target = "unevent::outbound",
            peer = target,
            tag_count,
            elapsed_ms,
            error = %err,
            "tag notification failed"
        ),
        _ => info!(
            target = "unevent::outbound",
            peer = target,
            tag_count,
            elapsed_ms,
            "tag notification delivered"
        ),
    }
    outcome
}

/// Record a notification that was not attempted.
fn record_skip(target: &'static str) {
    counter!(METRIC_OUTBOUND_TOTAL, "target" => target, "outcome" => "skipped").increment(1);
}

fn truncate_on_char_boundary(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}
