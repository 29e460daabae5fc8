//! Frame sequence sources and load-state tracking.
//!
//! Every frame of a sequence is requested up front. Loads finish in any
//! order and a failed frame still counts as settled, so the sequence
//! becomes ready once every request has resolved one way or the other.

use crate::error::{MotionError, MotionResult};

/// Default file name prefix for sequence frames.
pub const DEFAULT_FILE_PREFIX: &str = "frame_";

/// Default file extension for sequence frames.
pub const DEFAULT_FILE_EXTENSION: &str = "jpg";

/// Where the frames of a sequence live and how they are named.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameSource {
    /// Folder URL containing the frames
    pub folder: String,
    /// File name prefix before the index
    pub file_prefix: String,
    /// File extension without the dot
    pub file_extension: String,
    /// Number of frames, indexed from 0
    pub frame_count: usize,
}

impl FrameSource {
    /// Create a source using the default prefix and extension.
    pub fn new(folder: impl Into<String>, frame_count: usize) -> Self {
        Self {
            folder: folder.into(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            frame_count,
        }
    }

    /// Replace the file name prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// Replace the extension; a leading dot is dropped.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.file_extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// URL of the frame at `index`, zero-padded to four digits.
    ///
    /// ```rust
    /// use exo_motion::FrameSource;
    ///
    /// let source = FrameSource::new("/media/hero/", 150).with_extension("webp");
    /// assert_eq!(source.url(7), "/media/hero/frame_0007.webp");
    /// ```
    pub fn url(&self, index: usize) -> String {
        format!(
            "{}/{}{:04}.{}",
            self.folder.trim_end_matches('/'),
            self.file_prefix,
            index,
            self.file_extension
        )
    }

    /// URLs of every frame in order.
    pub fn urls(&self) -> Vec<String> {
        (0..self.frame_count).map(|i| self.url(i)).collect()
    }
}

/// Load state of one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    /// Request in flight
    Pending,
    /// Decoded with its natural size in pixels
    Loaded { width: u32, height: u32 },
    /// Failed; drawn as blank
    Failed,
}

impl FrameStatus {
    #[inline]
    pub fn is_settled(self) -> bool {
        !matches!(self, FrameStatus::Pending)
    }
}

/// Loading phase of a sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadingPhase {
    /// Some frames still pending
    Loading,
    /// Every frame settled
    Ready,
}

/// Tally of settled frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SettleProgress {
    pub loaded: usize,
    pub failed: usize,
    pub total: usize,
}

impl SettleProgress {
    /// Nothing settled out of `total`.
    pub fn new(total: usize) -> Self {
        Self {
            loaded: 0,
            failed: 0,
            total,
        }
    }

    /// Frames loaded or failed.
    #[inline]
    pub fn settled(&self) -> usize {
        self.loaded + self.failed
    }

    /// Settled percentage (0-100)
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            0
        } else {
            ((self.settled() as f32 / self.total as f32) * 100.0) as u8
        }
    }

    /// True once every frame settled.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.settled() >= self.total
    }

    /// Human readable status line.
    pub fn message(&self) -> String {
        if self.failed > 0 {
            format!(
                "Loading frames... {} / {} ({}%, {} failed)",
                self.settled(),
                self.total,
                self.percent(),
                self.failed
            )
        } else {
            format!(
                "Loading frames... {} / {} ({}%)",
                self.settled(),
                self.total,
                self.percent()
            )
        }
    }
}

/// Per-frame load state for a whole sequence.
#[derive(Clone, Debug)]
pub struct FrameSequence {
    statuses: Vec<FrameStatus>,
    progress: SettleProgress,
    phase: LoadingPhase,
}

impl FrameSequence {
    /// Create a sequence with every frame pending.
    pub fn new(frame_count: usize) -> MotionResult<Self> {
        if frame_count == 0 {
            return Err(MotionError::EmptySequence);
        }
        Ok(Self {
            statuses: vec![FrameStatus::Pending; frame_count],
            progress: SettleProgress::new(frame_count),
            phase: LoadingPhase::Loading,
        })
    }

    /// Record a decoded frame. Returns true if this completed the sequence.
    pub fn mark_loaded(&mut self, index: usize, width: u32, height: u32) -> MotionResult<bool> {
        self.settle(index, FrameStatus::Loaded { width, height })
    }

    /// Record a failed frame. Returns true if this completed the sequence.
    pub fn mark_failed(&mut self, index: usize) -> MotionResult<bool> {
        self.settle(index, FrameStatus::Failed)
    }

    fn settle(&mut self, index: usize, status: FrameStatus) -> MotionResult<bool> {
        let count = self.statuses.len();
        let slot = self
            .statuses
            .get_mut(index)
            .ok_or(MotionError::FrameOutOfRange { index, count })?;
        if slot.is_settled() {
            return Ok(false);
        }
        *slot = status;
        match status {
            FrameStatus::Loaded { .. } => self.progress.loaded += 1,
            FrameStatus::Failed => self.progress.failed += 1,
            FrameStatus::Pending => {}
        }
        if self.progress.is_complete() && self.phase != LoadingPhase::Ready {
            self.phase = LoadingPhase::Ready;
            tracing::debug!(
                loaded = self.progress.loaded,
                failed = self.progress.failed,
                "frame sequence ready"
            );
            return Ok(true);
        }
        Ok(false)
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.phase == LoadingPhase::Ready
    }

    #[inline]
    pub fn phase(&self) -> LoadingPhase {
        self.phase
    }

    #[inline]
    pub fn progress(&self) -> SettleProgress {
        self.progress
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.statuses.len()
    }

    /// Status of frame `index`, if it exists.
    pub fn status(&self, index: usize) -> Option<FrameStatus> {
        self.statuses.get(index).copied()
    }
}
