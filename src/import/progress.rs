//! Bounded, fire-and-forget progress notifications for one import.

use serde::Serialize;
use std::sync::mpsc::Sender;

pub const DEFAULT_PROGRESS_UPDATES: u32 = 20;

/// Declarations between ticks when the input size is unknown.
const DECLARATIONS_PER_TICK: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportProgress {
    pub folders: usize,
    pub puzzles: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<u8>,
}

pub trait ProgressListener {
    fn on_progress(&mut self, progress: ImportProgress);
}

impl ProgressListener for Sender<ImportProgress> {
    fn on_progress(&mut self, progress: ImportProgress) {
        // Nobody listening is fine.
        let _ = self.send(progress);
    }
}

/// Listener that drops every tick.
pub struct Silent;

impl ProgressListener for Silent {
    fn on_progress(&mut self, _progress: ImportProgress) {}
}

/// Decides when a tick is due. Never emits more than `max_updates` ticks.
#[derive(Debug, Clone)]
pub struct ProgressMeter {
    max_updates: u32,
    total_bytes: Option<u64>,
    position: u64,
    declarations: u64,
    emitted: u32,
}

impl ProgressMeter {
    pub fn new(max_updates: u32) -> Self {
        Self {
            max_updates,
            total_bytes: None,
            position: 0,
            declarations: 0,
            emitted: 0,
        }
    }

    pub fn set_total(&mut self, total_bytes: Option<u64>) {
        self.total_bytes = total_bytes.filter(|t| *t > 0);
    }

    #[cfg(test)]
    pub fn emitted(&self) -> u32 {
        self.emitted
    }

    /// Byte position reported by a decoder. Returns the percentage if a tick is due.
    pub fn on_position(&mut self, position: u64) -> Option<Option<u8>> {
        let total = self.total_bytes?;
        self.position = position.min(total);
        if self.emitted >= self.max_updates {
            return None;
        }
        let step = (total / u64::from(self.max_updates)).max(1);
        let reached = (self.position / step).min(u64::from(self.max_updates));
        if reached > u64::from(self.emitted) {
            self.emitted = reached as u32;
            let percent = (self.position.saturating_mul(100) / total) as u8;
            return Some(Some(percent));
        }
        None
    }

    /// One declaration applied. Drives ticks only when the input size is unknown.
    pub fn on_declaration(&mut self) -> Option<Option<u8>> {
        self.declarations += 1;
        if self.total_bytes.is_some() || self.emitted >= self.max_updates {
            return None;
        }
        if self.declarations % DECLARATIONS_PER_TICK == 0 {
            self.emitted += 1;
            return Some(None);
        }
        None
    }
}
