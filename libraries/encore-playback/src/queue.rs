//! Ordered playback queue with a current-track pointer
//!
//! The queue owns the songs and the index of the current one. Every edit
//! keeps the pointer on the same logical song when that song survives the
//! edit, and keeps it in bounds otherwise:
//!
//! ```text
//! songs:   [S1] [S2] [S3] [S4]
//!                ^
//!             current = 1
//! ```
//!
//! An empty queue always reports `current_index() == 0` and no current song.

use encore_core::Song;

/// Result of removing an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    /// The removed song
    pub song: Song,

    /// Whether the removed entry was the current one
    pub was_current: bool,
}

/// Playback queue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Queue {
    songs: Vec<Song>,
    current: usize,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue from persisted parts, clamping the index into bounds
    pub fn from_parts(songs: Vec<Song>, current: usize) -> Self {
        let current = current.min(songs.len().saturating_sub(1));
        Self { songs, current }
    }

    /// All songs in playback order
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    /// Song at `index`
    pub fn get(&self, index: usize) -> Option<&Song> {
        self.songs.get(index)
    }

    /// Total number of songs
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Index of the current song (0 when empty)
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The current song, if any
    pub fn current(&self) -> Option<&Song> {
        self.songs.get(self.current)
    }

    /// Replace every song and point at `start` (clamped)
    ///
    /// Returns `false` and leaves the queue untouched when `songs` is empty.
    pub fn replace(&mut self, songs: Vec<Song>, start: usize) -> bool {
        if songs.is_empty() {
            return false;
        }
        self.current = start.min(songs.len() - 1);
        self.songs = songs;
        true
    }

    /// Append songs at the end; the current pointer does not move
    pub fn append(&mut self, songs: Vec<Song>) {
        self.songs.extend(songs);
    }

    /// Point at `index`
    ///
    /// Returns `false` when `index` is out of range.
    pub fn set_current(&mut self, index: usize) -> bool {
        if index >= self.songs.len() {
            return false;
        }
        self.current = index;
        true
    }

    /// Remove the entry at `index`
    ///
    /// Removing an entry before the current one shifts the pointer back so
    /// it keeps denoting the same song. Removing the current entry leaves the
    /// pointer on the following song (or the new last song).
    pub fn remove(&mut self, index: usize) -> Option<Removal> {
        if index >= self.songs.len() {
            return None;
        }

        let song = self.songs.remove(index);
        let was_current = index == self.current;

        if index < self.current {
            self.current -= 1;
        }
        self.current = self.current.min(self.songs.len().saturating_sub(1));

        Some(Removal { song, was_current })
    }

    /// Swap the entry at `index` with the one above it
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.songs.len() {
            return false;
        }
        self.swap_adjacent(index - 1, index);
        true
    }

    /// Swap the entry at `index` with the one below it
    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.songs.len() {
            return false;
        }
        self.swap_adjacent(index, index + 1);
        true
    }

    /// Move the entry at `from` so it ends up at `to`
    ///
    /// Entries between the two positions shift by one. Returns `false` when
    /// either index is out of range or nothing would move.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        let len = self.songs.len();
        if from >= len || to >= len || from == to {
            return false;
        }

        let song = self.songs.remove(from);
        self.songs.insert(to, song);

        if self.current == from {
            self.current = to;
        } else if from < self.current && self.current <= to {
            self.current -= 1;
        } else if to <= self.current && self.current < from {
            self.current += 1;
        }
        true
    }

    /// Remove every song
    pub fn clear(&mut self) {
        self.songs.clear();
        self.current = 0;
    }

    /// Index that follows the current one in queue order
    ///
    /// Past the last entry this wraps to 0 when `wrap` is set and yields
    /// `None` otherwise (end of queue).
    pub fn step_forward(&self, wrap: bool) -> Option<usize> {
        if self.songs.is_empty() {
            return None;
        }
        let next = self.current + 1;
        if next < self.songs.len() {
            Some(next)
        } else if wrap {
            Some(0)
        } else {
            None
        }
    }

    /// Index before the current one, clamped at 0
    pub fn step_back(&self) -> usize {
        self.current.saturating_sub(1)
    }

    fn swap_adjacent(&mut self, upper: usize, lower: usize) {
        self.songs.swap(upper, lower);
        if self.current == upper {
            self.current = lower;
        } else if self.current == lower {
            self.current = upper;
        }
    }
}
