//! Fusion system: sequence loading overlapped with tracking.
//!
//! A loader thread reads frame bundles from disk and sends them over a
//! bounded channel. The tracker runs in the calling thread, one step per
//! [`FusionSystem::next_step`] call.

use std::thread::{self, JoinHandle};

use anyhow::Result;
use crossbeam_channel::{Receiver, Sender, bounded};
use tracing::{debug, warn};

use crate::config::FusionConfig;
use crate::frame::FrameBundle;
use crate::io::sequence::SequenceDataset;
use crate::tracking::{FusionTracker, StepResult};

/// Capacity of the bundle channel between the loader and the tracker.
/// When the channel is full the loader blocks.
const BUNDLE_CHANNEL_CAPACITY: usize = 4;

pub struct FusionSystem {
    tracker: FusionTracker,

    /// Bundles from the loader thread. `None` after shutdown.
    receiver: Option<Receiver<Result<FrameBundle>>>,

    loader_handle: Option<JoinHandle<()>>,

    n_frames: usize,
}

impl FusionSystem {
    /// Build the tracker from the sequence's calibration and start loading.
    pub fn new(dataset: SequenceDataset, config: FusionConfig) -> Result<Self> {
        let tracker = FusionTracker::new(&dataset.calibration, config)?;
        let n_frames = dataset.len();

        let (sender, receiver) = bounded(BUNDLE_CHANNEL_CAPACITY);
        let loader_handle = Self::spawn_loader(dataset, sender);

        Ok(Self {
            tracker,
            receiver: Some(receiver),
            loader_handle: Some(loader_handle),
            n_frames,
        })
    }

    /// Spawn the loader thread. It stops after the last frame, after the
    /// first load error, or once the receiving side is gone.
    fn spawn_loader(
        dataset: SequenceDataset,
        sender: Sender<Result<FrameBundle>>,
    ) -> JoinHandle<()> {
        thread::spawn(move || {
            for idx in 0..dataset.len() {
                let bundle = dataset.load_bundle(idx);
                let failed = bundle.is_err();
                if sender.send(bundle).is_err() {
                    debug!(idx, "bundle receiver dropped, loader exiting");
                    return;
                }
                if failed {
                    warn!(idx, "loader stopped after a failed frame");
                    return;
                }
            }
            debug!(n_frames = dataset.len(), "loader finished");
        })
    }

    /// Process the next frame of the sequence.
    ///
    /// Returns `None` once the sequence is exhausted. A failed step does not
    /// end the sequence; a failed load does.
    pub fn next_step(&mut self) -> Option<Result<StepResult>> {
        let bundle = self.receiver.as_ref()?.recv().ok()?;
        Some(bundle.and_then(|b| Ok(self.tracker.process_step(b)?)))
    }

    pub fn tracker(&self) -> &FusionTracker {
        &self.tracker
    }

    /// Number of frames in the sequence.
    pub fn len(&self) -> usize {
        self.n_frames
    }

    pub fn is_empty(&self) -> bool {
        self.n_frames == 0
    }

    /// Stop the loader and wait for it.
    pub fn shutdown(&mut self) {
        // dropping the receiver makes a blocked send return
        self.receiver = None;
        if let Some(handle) = self.loader_handle.take() {
            if handle.join().is_err() {
                warn!("loader thread panicked");
            }
        }
    }
}

impl Iterator for FusionSystem {
    type Item = Result<StepResult>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_step()
    }
}

impl Drop for FusionSystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}
