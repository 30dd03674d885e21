// ============================================================================
// HISTORY LOG — linear undo over full-buffer encoded snapshots
// ============================================================================

use crate::surface::EncodedImage;

/// One immutable point in the drawing's history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    description: String,
    image: EncodedImage,
}

impl HistoryEntry {
    pub fn new(description: impl Into<String>, image: EncodedImage) -> Self {
        Self {
            description: description.into(),
            image,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn image(&self) -> &EncodedImage {
        &self.image
    }

    pub fn memory_size(&self) -> usize {
        self.image.len() + self.description.len()
    }
}

/// Ordered entries plus a cursor at the state currently on screen.
///
/// Pushing discards everything after the cursor, so once the user undoes
/// and then draws, the undone states are gone. There is no redo.
#[derive(Debug, Default)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
    cursor: usize,
    /// Oldest entries are pruned beyond this count; 0 means unlimited.
    max_entries: usize,
    total_memory: usize,
}

impl HistoryLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            max_entries,
            total_memory: 0,
        }
    }

    /// Rebuild a log from stored entries. `None` if the cursor is invalid.
    pub fn from_parts(entries: Vec<HistoryEntry>, cursor: usize, max_entries: usize) -> Option<Self> {
        if entries.is_empty() || cursor >= entries.len() {
            return None;
        }
        let total_memory = entries.iter().map(HistoryEntry::memory_size).sum();
        Some(Self {
            entries,
            cursor,
            max_entries,
            total_memory,
        })
    }

    /// Truncate after the cursor, append, and move the cursor to the end.
    pub fn push(&mut self, entry: HistoryEntry) {
        if !self.entries.is_empty() {
            for dropped in self.entries.drain(self.cursor + 1..) {
                self.total_memory = self.total_memory.saturating_sub(dropped.memory_size());
            }
        }
        self.total_memory += entry.memory_size();
        self.entries.push(entry);
        self.cursor = self.entries.len() - 1;
        self.prune();
    }

    /// The entry [`undo`](Self::undo) would step back to, without moving.
    pub fn previous(&self) -> Option<&HistoryEntry> {
        self.cursor.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    /// Step back one entry and return it; `None` at the initial entry.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if self.cursor == 0 || self.entries.is_empty() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Replace the whole log with a single ground-truth entry.
    pub fn reset(&mut self, entry: HistoryEntry) {
        self.entries.clear();
        self.cursor = 0;
        self.total_memory = entry.memory_size();
        self.entries.push(entry);
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Descriptions of the reachable states, most recent first.
    pub fn descriptions(&self) -> Vec<&str> {
        self.entries[..self.entries.len().min(self.cursor + 1)]
            .iter()
            .rev()
            .map(HistoryEntry::description)
            .collect()
    }

    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Drop the oldest entries past the cap. Entry 0 is the ground truth and
    /// always survives, so pruning starts at index 1.
    fn prune(&mut self) {
        if self.max_entries == 0 {
            return;
        }
        let cap = self.max_entries.max(2);
        while self.entries.len() > cap && self.cursor > 1 {
            let removed = self.entries.remove(1);
            self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
            self.cursor -= 1;
        }
    }
}
