//! Frontend side of tag revalidation: page cache eviction and the shared stamp.

use metrics::{Unit, counter, describe_counter};
use tracing::{debug, info, warn};

use crate::cache::{HomeStamp, PageCache, tags};
use crate::util::clock::now_millis;

const METRIC_TAGS: &str = "unevent_revalidate_tags_total";
const METRIC_STAMP_WRITES: &str = "unevent_revalidate_stamp_writes_total";
const METRIC_STAMP_FAILURES: &str = "unevent_revalidate_stamp_failures_total";

pub fn describe_metrics() {
    describe_counter!(
        METRIC_TAGS,
        Unit::Count,
        "Total number of tags processed by the revalidation endpoint."
    );
    describe_counter!(
        METRIC_STAMP_WRITES,
        Unit::Count,
        "Total number of home stamp writes triggered by revalidation."
    );
    describe_counter!(
        METRIC_STAMP_FAILURES,
        Unit::Count,
        "Total number of home stamp writes that failed."
    );
}

/// Summary of one revalidation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevalidationReport {
    /// Number of tags processed, equal to the submitted list length.
    pub count: usize,
    pub pages_evicted: usize,
    pub stamp_writes: usize,
    pub stamp_failures: usize,
}

#[derive(Clone)]
pub struct RevalidationService {
    pages: PageCache,
    stamp: HomeStamp,
}

impl RevalidationService {
    pub fn new(pages: PageCache, stamp: HomeStamp) -> Self {
        Self { pages, stamp }
    }

    /// Invalidate every tag; stamp the shared timestamp for home and hub tags.
    ///
    /// Store failures are logged per tag and never fail the call.
    pub async fn revalidate(&self, tag_list: &[String]) -> RevalidationReport {
        let mut report = RevalidationReport {
            count: tag_list.len(),
            pages_evicted: 0,
            stamp_writes: 0,
            stamp_failures: 0,
        };

        for tag in tag_list {
            let evicted = self.pages.revalidate_tag(tag);
            report.pages_evicted += evicted;
            debug!(
                target = "unevent::revalidate",
                tag = %tag,
                evicted,
                "tag revalidated"
            );

            if !tags::is_stamp_tag(tag) {
                continue;
            }
            match self.stamp.touch().await {
                Ok(stamp) => {
                    report.stamp_writes += 1;
                    counter!(METRIC_STAMP_WRITES).increment(1);
                    debug!(target = "unevent::revalidate", tag = %tag, stamp, "home stamp updated");
                }
                Err(err) => {
                    report.stamp_failures += 1;
                    counter!(METRIC_STAMP_FAILURES).increment(1);
                    warn!(
                        target = "unevent::revalidate",
                        tag = %tag,
                        error = %err,
                        "failed to update home stamp"
                    );
                }
            }
        }

        counter!(METRIC_TAGS).increment(tag_list.len() as u64);
        info!(
            target = "unevent::revalidate",
            count = report.count,
            pages_evicted = report.pages_evicted,
            tags = ?tag_list,
            "revalidated tags"
        );
        report
    }

    /// The shared timestamp, or the current time when absent or unreadable.
    pub async fn last_update(&self) -> i64 {
        match self.stamp.read().await {
            Ok(Some(stamp)) => stamp,
            Ok(None) => now_millis(),
            Err(err) => {
                warn!(
                    target = "unevent::revalidate",
                    error = %err,
                    "failed to read home stamp; using current time"
                );
                now_millis()
            }
        }
    }
}
