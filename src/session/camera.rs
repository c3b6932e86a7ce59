use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Camera (or other capture hardware) owned by the session UI
///
/// The backend does the actual frame grabbing; the client still holds the
/// local device handle so the OS indicator and exclusive-access semantics
/// behave. Implementations must tolerate `close` being called from Drop.
pub trait CaptureDevice: Send + Sync {
    /// Acquire the hardware handle
    fn open(&self) -> Result<()>;

    /// Release the hardware handle
    fn close(&self);

    fn name(&self) -> &str;
}

/// Lease over a [`CaptureDevice`], released exactly once
///
/// Held for the whole lifetime of a session controller, whether or not a
/// session is ever started. Dropping the lease releases the device on
/// every exit path.
pub struct CameraLease {
    device: Arc<dyn CaptureDevice>,
    released: AtomicBool,
}

impl CameraLease {
    pub fn acquire(device: Arc<dyn CaptureDevice>) -> Result<Self> {
        device.open()?;
        info!("Capture device acquired: {}", device.name());

        Ok(Self {
            device,
            released: AtomicBool::new(false),
        })
    }

    /// Release early; harmless if the lease is dropped afterwards
    pub fn release(&self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            info!("Capture device released: {}", self.device.name());
            self.device.close();
        } else {
            warn!("Capture device already released");
        }
    }
}

impl Drop for CameraLease {
    fn drop(&mut self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            info!("Capture device released: {}", self.device.name());
            self.device.close();
        }
    }
}

/// Device stub for hosts where the backend owns the physical camera
pub struct RemoteCamera;

impl CaptureDevice for RemoteCamera {
    fn open(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) {}

    fn name(&self) -> &str {
        "backend-owned camera"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CountingDevice {
        opens: AtomicUsize,
        closes: AtomicUsize,
    }

    impl CaptureDevice for CountingDevice {
        fn open(&self) -> Result<()> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_lease_releases_once_on_drop() {
        let device = Arc::new(CountingDevice {
            opens: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        });

        {
            let _lease = CameraLease::acquire(device.clone()).unwrap();
        }

        assert_eq!(device.opens.load(Ordering::SeqCst), 1);
        assert_eq!(device.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_explicit_release_then_drop_closes_once() {
        let device = Arc::new(CountingDevice {
            opens: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        });

        let lease = CameraLease::acquire(device.clone()).unwrap();
        lease.release();
        drop(lease);

        assert_eq!(device.closes.load(Ordering::SeqCst), 1);
    }
}
