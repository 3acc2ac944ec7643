//! Periodic refresh of a light entity.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::device::Device;
use crate::light::LightEntity;
use crate::runtime::{self, JoinHandle, Mutex};

/// How often the integration polls a light by default.
pub const SCAN_INTERVAL: Duration = Duration::from_secs(30);

/// A light entity shared between the poller and command callers.
pub type SharedLight<D> = Arc<Mutex<LightEntity<D>>>;

/// Background task calling [`LightEntity::update`] on a fixed interval.
///
/// The task stops when [`Poller::stop`] is called or the poller is dropped.
pub struct Poller {
    running: Arc<AtomicBool>,
    interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn start<D: Device + 'static>(light: SharedLight<D>, interval: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = runtime::spawn(async move {
            while flag.load(Ordering::SeqCst) {
                runtime::sleep(interval).await;
                if !flag.load(Ordering::SeqCst) {
                    break;
                }
                let mut light = light.lock().await;
                light.update().await;
                light
                    .logger()
                    .debug(format_args!("scheduled poll of {} done", light.entity_id()));
            }
        });

        Poller {
            running,
            interval,
            handle: Some(handle),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(mut handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}
