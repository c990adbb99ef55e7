//! Tag fanout to the revalidation endpoint and the CDN.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::application::effect::{DeliveryError, EffectOutcome};

/// Receiver of affected cache tags after a content write.
#[async_trait]
pub trait TagNotifier: Send + Sync {
    /// Stable name used in logs and metric labels.
    fn name(&self) -> &'static str;

    async fn notify(&self, tags: &[String]) -> EffectOutcome<DeliveryError>;
}

/// Outcome of one notifier for one fanout.
#[derive(Debug)]
pub struct Delivery {
    pub target: &'static str,
    pub outcome: EffectOutcome<DeliveryError>,
}

/// Sends the same tag list to every configured notifier.
#[derive(Clone, Default)]
pub struct TagFanout {
    notifiers: Vec<Arc<dyn TagNotifier>>,
}

impl TagFanout {
    pub fn new(notifiers: Vec<Arc<dyn TagNotifier>>) -> Self {
        Self { notifiers }
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// Notify all targets concurrently. Outcomes are logged, never propagated.
    pub async fn fan_out(&self, tags: &[String]) -> Vec<Delivery> {
        let calls = self.notifiers.iter().map(|notifier| async move {
            let outcome = notifier.notify(tags).await;
            outcome.log(notifier.name());
            Delivery {
                target: notifier.name(),
                outcome,
            }
        });
        join_all(calls).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Notifier double recording every tag list it receives.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub calls: Mutex<Vec<Vec<String>>>,
        pub fail: bool,
    }

    impl RecordingNotifier {
        pub fn failing() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl TagNotifier for RecordingNotifier {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn notify(&self, tags: &[String]) -> EffectOutcome<DeliveryError> {
            self.calls.lock().expect("calls lock").push(tags.to_vec());
            if self.fail {
                EffectOutcome::Failed(DeliveryError::Transport("refused".to_string()))
            } else {
                EffectOutcome::Succeeded
            }
        }
    }
}
