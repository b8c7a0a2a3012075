//! Serialized access to the capture device
//!
//! Starting a capture session while one is running, or stopping one that
//! was never started, leaves the device in a bad state. Every start and stop
//! request therefore goes through one queue served by a single worker task,
//! which awaits each action before taking the next.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, warn};

/// A camera (or other source) that decodes barcodes while running
pub trait CaptureDevice: Send + 'static {
    fn start(&mut self) -> BoxFuture<'_, anyhow::Result<()>>;
    fn stop(&mut self) -> BoxFuture<'_, anyhow::Result<()>>;
}

#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("Capture device unavailable: {0:#}")]
    Unavailable(anyhow::Error),

    #[error("Failed to stop capture: {0:#}")]
    StopFailed(anyhow::Error),

    #[error("Scanner queue is closed")]
    Closed,
}

pub type ScannerResult<T> = std::result::Result<T, ScannerError>;

enum Action {
    Start,
    Stop,
}

struct Command {
    action: Action,
    reply: oneshot::Sender<ScannerResult<()>>,
}

/// Handle to the scanner queue
///
/// Cloning shares the same queue and device.
#[derive(Clone)]
pub struct ScannerController {
    commands: mpsc::UnboundedSender<Command>,
    wanted: Arc<AtomicBool>,
    active: watch::Receiver<bool>,
}

impl ScannerController {
    /// Take ownership of a device and spawn its worker
    pub fn spawn<D: CaptureDevice>(device: D) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let wanted = Arc::new(AtomicBool::new(false));
        let (active_tx, active) = watch::channel(false);

        tokio::spawn(run_worker(device, rx, wanted.clone(), active_tx));

        Self {
            commands,
            wanted,
            active,
        }
    }

    /// Start capturing; no-op if already active
    pub async fn start(&self) -> ScannerResult<()> {
        self.wanted.store(true, Ordering::SeqCst);
        self.submit(Action::Start).await
    }

    /// Stop capturing; no-op if not active
    pub async fn stop(&self) -> ScannerResult<()> {
        self.wanted.store(false, Ordering::SeqCst);
        self.submit(Action::Stop).await
    }

    /// Whether a capture session is running
    pub fn is_active(&self) -> bool {
        *self.active.borrow()
    }

    async fn submit(&self, action: Action) -> ScannerResult<()> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command { action, reply })
            .map_err(|_| ScannerError::Closed)?;
        rx.await.map_err(|_| ScannerError::Closed)?
    }
}

async fn run_worker<D: CaptureDevice>(
    mut device: D,
    mut commands: mpsc::UnboundedReceiver<Command>,
    wanted: Arc<AtomicBool>,
    active: watch::Sender<bool>,
) {
    let mut running = false;

    while let Some(Command { action, reply }) = commands.recv().await {
        let result = match action {
            Action::Start => start(&mut device, &mut running, &wanted).await,
            Action::Stop => stop(&mut device, &mut running).await,
        };
        active.send_replace(running);
        let _ = reply.send(result);
    }

    // Every handle is gone: release the device
    if running {
        if let Err(e) = device.stop().await {
            warn!("Failed to stop capture on shutdown: {:#}", e);
        }
    }
}

async fn start<D: CaptureDevice>(
    device: &mut D,
    running: &mut bool,
    wanted: &AtomicBool,
) -> ScannerResult<()> {
    if *running {
        return Ok(());
    }

    if let Err(e) = device.start().await {
        error!("Capture device failed to start: {:#}", e);
        return Err(ScannerError::Unavailable(e));
    }
    *running = true;
    debug!("Capture started");

    // A stop was requested while the device was starting up
    if !wanted.load(Ordering::SeqCst) {
        stop(device, running).await?;
    }
    Ok(())
}

async fn stop<D: CaptureDevice>(device: &mut D, running: &mut bool) -> ScannerResult<()> {
    if !*running {
        return Ok(());
    }

    match device.stop().await {
        Ok(()) => {
            *running = false;
            debug!("Capture stopped");
            Ok(())
        }
        Err(e) => {
            warn!("Capture device failed to stop: {:#}", e);
            Err(ScannerError::StopFailed(e))
        }
    }
}
