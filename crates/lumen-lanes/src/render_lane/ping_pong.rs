// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Double-buffered targets: within a frame for iterative passes, across frames
//! for temporal history.

use lumen_core::renderer::TextureId;

/// A pair of equally sized targets used by an iterative pass.
///
/// Each pass reads [`read`](Self::read), writes [`write`](Self::write) and then
/// calls [`flip`](Self::flip). The two never alias within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingPongTarget {
    textures: [TextureId; 2],
    write_index: usize,
    passes: u32,
}

impl PingPongTarget {
    /// Wraps two distinct textures of identical size and format.
    pub fn new(first: TextureId, second: TextureId) -> Self {
        debug_assert_ne!(first, second, "ping-pong textures must be distinct");
        Self {
            textures: [first, second],
            write_index: 0,
            passes: 0,
        }
    }

    /// The texture the next pass samples.
    pub fn read(&self) -> TextureId {
        self.textures[1 - self.write_index]
    }

    /// The texture the next pass renders into.
    pub fn write(&self) -> TextureId {
        self.textures[self.write_index]
    }

    /// Marks the current pass as complete and swaps the roles.
    pub fn flip(&mut self) {
        self.write_index = 1 - self.write_index;
        self.passes += 1;
    }

    /// Restores the initial roles before a new chain of passes.
    pub fn reset(&mut self) {
        self.write_index = 0;
        self.passes = 0;
    }

    /// The texture a producer must fill so that the first pass after
    /// [`reset`](Self::reset) reads it.
    pub fn seed_target(&self) -> TextureId {
        self.textures[1]
    }

    /// Number of passes completed since the last reset.
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// The texture holding the result of the last completed pass, or the seed
    /// when no pass ran. Derived from the pass count, independent of the axis
    /// the passes alternated over.
    pub fn final_read(&self) -> TextureId {
        match self.passes {
            0 => self.seed_target(),
            n => self.textures[((n - 1) % 2) as usize],
        }
    }

    /// Both textures, in creation order.
    pub fn textures(&self) -> [TextureId; 2] {
        self.textures
    }
}

/// The two TAA history textures, alternated once per frame.
///
/// Frame `f` writes `current(f) = f % 2` and reads `previous(f) = (f + 1) % 2`,
/// which is the slot frame `f - 1` wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryBuffer {
    textures: [TextureId; 2],
    written_by: [Option<u64>; 2],
}

impl HistoryBuffer {
    /// Wraps two distinct textures of identical size and format.
    pub fn new(first: TextureId, second: TextureId) -> Self {
        debug_assert_ne!(first, second, "history textures must be distinct");
        Self {
            textures: [first, second],
            written_by: [None; 2],
        }
    }

    /// Slot written by frame `frame`.
    pub const fn current_index(frame: u64) -> usize {
        (frame % 2) as usize
    }

    /// Slot read as history by frame `frame`.
    pub const fn previous_index(frame: u64) -> usize {
        ((frame + 1) % 2) as usize
    }

    /// Texture written by frame `frame`.
    pub fn current(&self, frame: u64) -> TextureId {
        self.textures[Self::current_index(frame)]
    }

    /// Texture read as history by frame `frame`.
    pub fn previous(&self, frame: u64) -> TextureId {
        self.textures[Self::previous_index(frame)]
    }

    /// Records that frame `frame` finished its temporal resolve.
    pub fn mark_written(&mut self, frame: u64) {
        self.written_by[Self::current_index(frame)] = Some(frame);
    }

    /// Whether the history read by frame `frame` is the output of frame `frame - 1`.
    pub fn previous_is_valid(&self, frame: u64) -> bool {
        frame > 0 && self.written_by[Self::previous_index(frame)] == Some(frame - 1)
    }

    /// The frame that last wrote slot `index`, if any.
    pub fn written_by(&self, index: usize) -> Option<u64> {
        self.written_by.get(index).copied().flatten()
    }

    /// Forgets every recorded write, e.g. after the textures were recreated.
    pub fn invalidate(&mut self) {
        self.written_by = [None; 2];
    }

    /// Both textures, in slot order.
    pub fn textures(&self) -> [TextureId; 2] {
        self.textures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: TextureId = TextureId(10);
    const B: TextureId = TextureId(11);

    #[test]
    fn read_and_write_never_alias() {
        let mut target = PingPongTarget::new(A, B);
        for _ in 0..10 {
            assert_ne!(target.read(), target.write());
            target.flip();
        }
    }

    #[test]
    fn first_pass_reads_the_seed() {
        let target = PingPongTarget::new(A, B);
        assert_eq!(target.read(), target.seed_target());
        assert_eq!(target.final_read(), target.seed_target());
    }

    #[test]
    fn final_read_tracks_last_write_for_any_parity() {
        for iterations in 0..12 {
            let mut target = PingPongTarget::new(A, B);
            let mut last_written = target.seed_target();
            for _ in 0..iterations {
                last_written = target.write();
                target.flip();
            }
            assert_eq!(target.final_read(), last_written, "{iterations} iterations");
            assert_eq!(target.final_read(), target.read());
        }
    }

    #[test]
    fn reset_restores_initial_roles() {
        let mut target = PingPongTarget::new(A, B);
        target.flip();
        target.flip();
        target.flip();
        target.reset();
        assert_eq!(target.passes(), 0);
        assert_eq!(target.write(), A);
        assert_eq!(target.read(), B);
    }

    #[test]
    fn history_parity_over_ten_frames() {
        let mut history = HistoryBuffer::new(A, B);
        for frame in 0..10u64 {
            assert_ne!(history.current(frame), history.previous(frame));
            if frame > 0 {
                assert_eq!(history.previous(frame), history.current(frame - 1));
                assert!(history.previous_is_valid(frame));
            } else {
                assert!(!history.previous_is_valid(frame));
            }
            history.mark_written(frame);
            assert_eq!(history.written_by(HistoryBuffer::current_index(frame)), Some(frame));
            assert_eq!(history.current(frame), history.previous(frame + 1));
        }
    }

    #[test]
    fn skipped_frame_invalidates_history() {
        let mut history = HistoryBuffer::new(A, B);
        history.mark_written(4);
        assert!(history.previous_is_valid(5));
        // Frame 5 skipped its resolve.
        assert!(!history.previous_is_valid(6));
        history.invalidate();
        assert!(!history.previous_is_valid(5));
    }
}
