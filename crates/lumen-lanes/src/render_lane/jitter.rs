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

//! Low-discrepancy sub-pixel jitter for temporal anti-aliasing.

/// A Halton sequence cycled over a fixed number of frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterSequence {
    cycle: u32,
}

impl JitterSequence {
    /// Creates a sequence repeating every `cycle` frames. A zero cycle is treated as one.
    pub fn new(cycle: u32) -> Self {
        Self {
            cycle: cycle.max(1),
        }
    }

    /// Length of the pattern, in frames.
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Radical inverse of `index` in `base`, in `[0, 1)`.
    pub fn offset(index: u64, base: u32) -> f32 {
        let base = base.max(2) as u64;
        let mut index = index;
        let mut fraction = 1.0f64;
        let mut result = 0.0f64;
        while index > 0 {
            fraction /= base as f64;
            result += fraction * (index % base) as f64;
            index /= base;
        }
        result as f32
    }

    /// The `(x, y)` pair for `frame_index`, using bases 2 and 3 on the cycled index.
    pub fn sample(&self, frame_index: u64) -> [f32; 2] {
        let index = frame_index % self.cycle as u64;
        [Self::offset(index, 2), Self::offset(index, 3)]
    }
}

impl Default for JitterSequence {
    fn default() -> Self {
        Self::new(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn known_halton_values() {
        assert_eq!(JitterSequence::offset(0, 2), 0.0);
        assert_relative_eq!(JitterSequence::offset(1, 2), 0.5);
        assert_relative_eq!(JitterSequence::offset(2, 2), 0.25);
        assert_relative_eq!(JitterSequence::offset(3, 2), 0.75);
        assert_relative_eq!(JitterSequence::offset(1, 3), 1.0 / 3.0);
        assert_relative_eq!(JitterSequence::offset(5, 3), 7.0 / 9.0);
    }

    #[test]
    fn offsets_are_bounded_and_deterministic() {
        for i in 0..8u64 {
            for base in [2, 3] {
                let value = JitterSequence::offset(i, base);
                assert!((0.0..1.0).contains(&value), "offset({i}, {base}) = {value}");
                assert_eq!(value.to_bits(), JitterSequence::offset(i, base).to_bits());
            }
        }
    }

    #[test]
    fn sample_repeats_every_cycle() {
        let jitter = JitterSequence::new(8);
        for frame in 0..16u64 {
            assert_eq!(jitter.sample(frame), jitter.sample(frame + 8));
        }
        assert_eq!(jitter.sample(0), [0.0, 0.0]);
        assert_eq!(JitterSequence::new(0).cycle(), 1);
    }
}
