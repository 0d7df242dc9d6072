// ── Scrape orchestration ──
//
// login → enumerate → enrich (concurrent, guard-bounded) → assemble.
// Authentication and enumeration failures abort the run; a failure
// enriching one device is recorded and never touches its siblings.
// Enrichment results are written back by enumeration index, so the
// snapshot keeps service order regardless of completion order.

use futures_util::future::join_all;
use tracing::{debug, info, warn};
use wyzescope_api::WyzeClient;

use crate::error::CoreError;
use crate::model::{DeviceRecord, FetchFailure, FetchOptions, FetchStage, Snapshot};
use crate::rate_guard::RateGuard;

/// Events attached per device when `include_events` is set.
const EVENT_SAMPLE_LEN: u32 = 5;

struct EnrichOutcome {
    idx: usize,
    info: Option<wyzescope_api::DeviceInfo>,
    events: Option<Vec<serde_json::Value>>,
    failures: Vec<FetchFailure>,
}

/// Capture one full snapshot of the account's device fleet.
///
/// Owns its [`RateGuard`] for the duration of the run; two concurrent
/// scrapes never share a rate budget.
#[allow(clippy::too_many_lines)]
pub async fn scrape(client: &WyzeClient, options: FetchOptions) -> Result<Snapshot, CoreError> {
    let guard = RateGuard::new(options.max_concurrent);

    guard
        .run(|| client.login())
        .await
        .map_err(as_auth_failure)?;

    let summaries = guard
        .run(|| client.get_object_list())
        .await
        .map_err(|e| match e {
            CoreError::Api(wyzescope_api::Error::Authentication { message }) => {
                CoreError::Auth { message }
            }
            other => CoreError::Enumeration {
                message: other.to_string(),
            },
        })?;

    info!(device_count = summaries.len(), "enumerated devices");

    let mut devices: Vec<DeviceRecord> = summaries.into_iter().map(DeviceRecord::from).collect();
    let mut failures: Vec<FetchFailure> = Vec::new();

    let include_info = options.include_device_info;
    let include_events = options.include_events;

    if include_info || include_events {
        let jobs: Vec<(String, String)> = devices
            .iter()
            .map(|d| (d.mac.clone(), d.product_model.clone()))
            .collect();

        let futs = jobs.into_iter().enumerate().map(|(idx, (mac, model))| {
            let guard = &guard;
            async move {
                let mut outcome = EnrichOutcome {
                    idx,
                    info: None,
                    events: None,
                    failures: Vec::new(),
                };

                if include_info {
                    if model.is_empty() {
                        outcome.failures.push(FetchFailure {
                            mac: mac.clone(),
                            stage: FetchStage::DeviceInfo,
                            error: "missing product_model".into(),
                        });
                    } else {
                        match guard.run(|| client.get_device_info(&mac, &model)).await {
                            Ok(info) => outcome.info = Some(info),
                            Err(e) => {
                                warn!(mac = %mac, error = %e, "device info fetch failed");
                                outcome.failures.push(FetchFailure {
                                    mac: mac.clone(),
                                    stage: FetchStage::DeviceInfo,
                                    error: e.to_string(),
                                });
                            }
                        }
                    }
                }

                if include_events {
                    match guard
                        .run(|| client.get_event_list(&mac, EVENT_SAMPLE_LEN))
                        .await
                    {
                        Ok(events) => outcome.events = Some(events),
                        Err(e) => {
                            warn!(mac = %mac, error = %e, "event list fetch failed");
                            outcome.failures.push(FetchFailure {
                                mac: mac.clone(),
                                stage: FetchStage::Events,
                                error: e.to_string(),
                            });
                        }
                    }
                }

                outcome
            }
        });

        for outcome in join_all(futs).await {
            let device = &mut devices[outcome.idx];
            if let Some(info) = outcome.info {
                device.property_list = info.properties_by_pid();
                if let Some(params) = info.device_params {
                    // Detail-call params are fresher than the listing's.
                    device.device_params.extend(params);
                }
                debug!(mac = %device.mac, pids = device.property_list.len(), "device enriched");
            }
            if let Some(events) = outcome.events {
                device.events = Some(events);
            }
            failures.extend(outcome.failures);
        }
    }

    if !failures.is_empty() {
        warn!(
            failure_count = failures.len(),
            "scrape completed with per-device failures"
        );
    }

    Snapshot::build(devices, options, failures)
}

/// Reclassify login-step failures: credential rejections and envelope
/// errors from the auth exchange are authentication failures, while
/// transport problems keep their own identity.
fn as_auth_failure(err: CoreError) -> CoreError {
    match err {
        CoreError::Api(inner) => match inner {
            wyzescope_api::Error::Authentication { message } => CoreError::Auth { message },
            expired @ wyzescope_api::Error::AccessTokenExpired => CoreError::Auth {
                message: expired.to_string(),
            },
            wyzescope_api::Error::Api { code, message } => CoreError::Auth {
                message: format!("login rejected (code={code}): {message}"),
            },
            other => CoreError::Api(other),
        },
        other => other,
    }
}
