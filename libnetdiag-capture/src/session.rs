use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration as StdDuration;

use libnetdiag_tools::{Config, Error};
use tracing::{debug, info, warn};

use crate::buffer::{CaptureBuffer, DEFAULT_MAX_PACKETS};
use crate::decode::decode_frame;
use crate::record::{CaptureStats, PacketRecord};
use crate::source::{FrameSource, FrameSourceProvider};

struct SessionControl {
    running: bool,
    interface: String,
    filter: String,
    stop: Arc<AtomicBool>,
}

/// Capture orchestrator: owns the frame source lifecycle and the background
/// loop feeding the rolling packet history.
///
/// One session per application; at most one capture runs at a time. The
/// control state has its own lock, taken by `start`/`stop` only — the hot
/// loop touches nothing but the buffer, whose lock is independent, so capture
/// throughput does not contend with control-plane calls. `snapshot` and
/// `stats` are valid in any state.
pub struct CaptureSession {
    provider: Box<dyn FrameSourceProvider>,
    config: Config,
    control: Mutex<SessionControl>,
    buffer: Arc<CaptureBuffer>,
    sleep_interval: u64,
}

impl CaptureSession {
    pub fn new(provider: Box<dyn FrameSourceProvider>, config: &Config) -> Self {
        let max_packets = config
            .get_usize("capture.max_packets")
            .unwrap_or(DEFAULT_MAX_PACKETS);
        let sleep_interval = config.get_usize("capture.sleep").unwrap_or(500) as u64;
        CaptureSession {
            provider,
            config: config.clone(),
            control: Mutex::new(SessionControl {
                running: false,
                interface: String::new(),
                filter: String::new(),
                stop: Arc::new(AtomicBool::new(false)),
            }),
            buffer: Arc::new(CaptureBuffer::new(max_packets)),
            sleep_interval,
        }
    }

    fn lock_control(&self) -> MutexGuard<'_, SessionControl> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open the interface, apply the filter and start the capture loop.
    ///
    /// Fails without any state change when a capture is already running, the
    /// interface cannot be opened, or the filter is rejected (the just-opened
    /// source is released before returning).
    pub fn start(&self, interface: &str, filter: &str) -> Result<(), Error> {
        let mut control = self.lock_control();
        if control.running {
            return Err(Error::AlreadyRunning);
        }

        let mut source = self.provider.open(interface, &self.config)?;
        if !filter.is_empty() {
            if let Err(e) = source.set_filter(filter) {
                drop(source);
                return Err(e);
            }
        }

        self.buffer.clear();
        let stop = Arc::new(AtomicBool::new(false));
        let buffer = Arc::clone(&self.buffer);
        let loop_stop = Arc::clone(&stop);
        let sleep_interval = self.sleep_interval;
        thread::Builder::new()
            .name(format!("capture-{interface}"))
            .spawn(move || capture_loop(source, buffer, loop_stop, sleep_interval))?;

        control.running = true;
        control.interface = interface.to_owned();
        control.filter = filter.to_owned();
        control.stop = stop;
        info!("capture started on {interface}");
        Ok(())
    }

    /// Signal the capture loop to terminate and return to idle.
    ///
    /// Cancellation is cooperative: this does not wait for loop exit, so one
    /// in-flight frame may still land in the buffer after the call returns.
    /// The loop closes the frame source after observing the signal.
    pub fn stop(&self) -> Result<(), Error> {
        let mut control = self.lock_control();
        if !control.running {
            return Err(Error::NotRunning);
        }
        control.stop.store(true, Ordering::SeqCst);
        control.running = false;
        control.interface.clear();
        control.filter.clear();
        info!("capture stopped");
        Ok(())
    }

    /// Independent copy of the current packet history.
    pub fn snapshot(&self) -> Vec<PacketRecord> {
        self.buffer.snapshot()
    }

    /// Aggregate statistics over the current packet history.
    pub fn stats(&self) -> CaptureStats {
        self.buffer.stats()
    }

    pub fn is_running(&self) -> bool {
        self.lock_control().running
    }

    /// Name of the interface being captured, if running.
    pub fn interface(&self) -> Option<String> {
        let control = self.lock_control();
        if control.running {
            Some(control.interface.clone())
        } else {
            None
        }
    }

    /// Active filter expression, if running and non-empty.
    pub fn filter(&self) -> Option<String> {
        let control = self.lock_control();
        if control.running && !control.filter.is_empty() {
            Some(control.filter.clone())
        } else {
            None
        }
    }
}

fn capture_loop(
    mut source: Box<dyn FrameSource>,
    buffer: Arc<CaptureBuffer>,
    stop: Arc<AtomicBool>,
    sleep_interval: u64,
) {
    debug!("capture loop: waiting for frames");
    let link_type = source.link_type();
    while !stop.load(Ordering::SeqCst) {
        match source.next_frame() {
            Ok(Some(frame)) => {
                let record =
                    decode_frame(&frame.data, link_type, frame.caplen, frame.ts, frame.origlen);
                buffer.insert(record);
            }
            Ok(None) => thread::sleep(StdDuration::from_micros(sleep_interval)),
            Err(e) => {
                // transient: skip the frame, keep the session alive
                warn!("capture loop: {e}");
            }
        }
    }
    debug!("capture loop: stop signal observed, closing source");
    // dropping the source closes the handle; `stop` never touches it, so
    // exactly one close occurs
}
