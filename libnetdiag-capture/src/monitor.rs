use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration as StdDuration;

use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use libnetdiag_tools::{Duration, Error};
use serde::Serialize;
use tracing::{debug, info};

use crate::probe::{probe_tcp, ProbeOutcome};

/// Rolling history kept per monitored target.
pub const MONITOR_HISTORY: usize = 1000;

/// One round-trip measurement from a monitor tick.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RttSample {
    pub timestamp: Duration,
    /// round-trip time in microseconds, 0 on failure
    pub rtt: u64,
    pub success: bool,
    pub error: String,
    pub ip: String,
}

impl From<ProbeOutcome> for RttSample {
    fn from(outcome: ProbeOutcome) -> Self {
        RttSample {
            timestamp: outcome.timestamp,
            rtt: outcome.connect_time,
            success: outcome.success,
            error: outcome.error,
            ip: outcome.ip,
        }
    }
}

type SampleHistory = Arc<Mutex<VecDeque<RttSample>>>;

struct MonitorTask {
    stop: Sender<()>,
    results: SampleHistory,
}

/// Ticker-driven round-trip monitoring, one background task per target.
///
/// Each task probes its target once per interval and appends the sample to a
/// bounded rolling history. All operations are safe concurrently with
/// running tasks.
#[derive(Default)]
pub struct MonitorManager {
    tasks: Mutex<HashMap<String, MonitorTask>>,
}

impl MonitorManager {
    pub fn new() -> Self {
        MonitorManager::default()
    }

    fn lock_tasks(&self) -> MutexGuard<'_, HashMap<String, MonitorTask>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start monitoring a target. A target already being monitored is left
    /// untouched.
    pub fn start(
        &self,
        target: &str,
        port: u16,
        interval: StdDuration,
        timeout: StdDuration,
    ) -> Result<(), Error> {
        let mut tasks = self.lock_tasks();
        if tasks.contains_key(target) {
            return Ok(());
        }

        let (stop_tx, stop_rx) = bounded(1);
        let results: SampleHistory = Arc::new(Mutex::new(VecDeque::new()));
        let loop_results = Arc::clone(&results);
        let loop_target = target.to_owned();
        thread::Builder::new()
            .name(format!("monitor-{target}"))
            .spawn(move || monitor_loop(loop_target, port, interval, timeout, stop_rx, loop_results))?;

        tasks.insert(
            target.to_owned(),
            MonitorTask {
                stop: stop_tx,
                results,
            },
        );
        info!("monitoring {target}:{port} every {interval:?}");
        Ok(())
    }

    /// Stop monitoring a target and drop its history. Unknown targets are a
    /// no-op.
    pub fn stop(&self, target: &str) {
        let mut tasks = self.lock_tasks();
        if let Some(task) = tasks.remove(target) {
            let _ = task.stop.send(());
            info!("monitor for {target} stopped");
        }
    }

    /// Independent copy of a target's sample history, empty if the target is
    /// not monitored.
    pub fn results(&self, target: &str) -> Vec<RttSample> {
        let tasks = self.lock_tasks();
        match tasks.get(target) {
            Some(task) => {
                let history = task.results.lock().unwrap_or_else(PoisonError::into_inner);
                history.iter().cloned().collect()
            }
            None => Vec::new(),
        }
    }

    /// Targets currently being monitored.
    pub fn targets(&self) -> Vec<String> {
        self.lock_tasks().keys().cloned().collect()
    }
}

fn record_sample(results: &SampleHistory, sample: RttSample) {
    let mut history = results.lock().unwrap_or_else(PoisonError::into_inner);
    if history.len() >= MONITOR_HISTORY {
        history.pop_front();
    }
    history.push_back(sample);
}

fn monitor_loop(
    target: String,
    port: u16,
    interval: StdDuration,
    timeout: StdDuration,
    stop: Receiver<()>,
    results: SampleHistory,
) {
    let ticker = tick(interval);
    debug!("monitor loop for {target} started");
    loop {
        select! {
            recv(stop) -> _ => break,
            recv(ticker) -> _ => {
                let outcome = probe_tcp(&target, port, timeout);
                if !outcome.success {
                    debug!("monitor {target}: {}", outcome.error);
                }
                record_sample(&results, RttSample::from(outcome));
            }
        }
    }
    debug!("monitor loop for {target} stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn history_is_bounded() {
        let results: SampleHistory = Arc::new(Mutex::new(VecDeque::new()));
        for i in 0..(MONITOR_HISTORY + 5) {
            record_sample(
                &results,
                RttSample {
                    timestamp: Duration::new(i as u32, 0),
                    rtt: 0,
                    success: true,
                    error: String::new(),
                    ip: String::new(),
                },
            );
        }
        let history = results.lock().unwrap();
        assert_eq!(history.len(), MONITOR_HISTORY);
        // oldest entries were evicted
        assert_eq!(history.front().map(|s| s.timestamp.secs), Some(5));
    }

    #[test]
    fn monitor_collects_samples_until_stopped() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let manager = MonitorManager::new();
        manager
            .start(
                "127.0.0.1",
                port,
                StdDuration::from_millis(10),
                StdDuration::from_millis(500),
            )
            .unwrap();
        assert_eq!(manager.targets(), vec!["127.0.0.1".to_owned()]);

        // starting the same target again is a no-op
        manager
            .start(
                "127.0.0.1",
                port,
                StdDuration::from_millis(10),
                StdDuration::from_millis(500),
            )
            .unwrap();

        let mut samples = Vec::new();
        for _ in 0..200 {
            samples = manager.results("127.0.0.1");
            if samples.len() >= 2 {
                break;
            }
            thread::sleep(StdDuration::from_millis(5));
        }
        assert!(samples.len() >= 2, "no samples collected");
        assert!(samples[0].success, "probe failed: {}", samples[0].error);

        manager.stop("127.0.0.1");
        assert!(manager.results("127.0.0.1").is_empty());
        assert!(manager.targets().is_empty());
    }
}
