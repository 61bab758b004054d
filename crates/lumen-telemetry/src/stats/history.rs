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

//! Fixed-capacity rolling window of timing samples.

/// A circular buffer of `f32` samples whose capacity is chosen at runtime.
///
/// Once full, every push evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct StatsHistory {
    data: Vec<f32>,
    capacity: usize,
    // Slot the next push writes.
    index: usize,
    count: usize,
}

impl StatsHistory {
    /// Creates an empty history holding at most `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: vec![0.0; capacity],
            capacity,
            index: 0,
            count: 0,
        }
    }

    /// Pushes a new sample, overwriting the oldest if full.
    pub fn push(&mut self, value: f32) {
        self.data[self.index] = value;
        self.index = (self.index + 1) % self.capacity;
        if self.count < self.capacity {
            self.count += 1;
        }
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns `true` if no sample has been pushed.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Maximum number of samples held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every sample.
    pub fn clear(&mut self) {
        self.index = 0;
        self.count = 0;
    }

    /// Iterates over the samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &f32> {
        let (left, right) = self.data.split_at(self.index);
        let older = if self.count < self.capacity {
            &right[..0]
        } else {
            right
        };
        older.iter().chain(left.iter())
    }

    /// The most recent sample.
    pub fn latest(&self) -> Option<f32> {
        if self.count == 0 {
            return None;
        }
        let last = (self.index + self.capacity - 1) % self.capacity;
        Some(self.data[last])
    }

    /// Arithmetic mean, or 0.0 if empty.
    pub fn average(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        self.iter().sum::<f32>() / self.count as f32
    }

    /// Smallest sample.
    pub fn min(&self) -> Option<f32> {
        self.iter().copied().reduce(f32::min)
    }

    /// Largest sample.
    pub fn max(&self) -> Option<f32> {
        self.iter().copied().reduce(f32::max)
    }

    /// Difference between the mean of the newest half and the mean of the oldest half.
    /// Positive when timings are growing.
    pub fn trend(&self) -> f32 {
        if self.count < 2 {
            return 0.0;
        }
        let half = self.count / 2;
        let first: f32 = self.iter().take(half).sum::<f32>() / half as f32;
        let last: f32 = self.iter().skip(self.count - half).sum::<f32>() / half as f32;
        last - first
    }
}

impl Default for StatsHistory {
    fn default() -> Self {
        Self::new(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn oldest_sample_is_evicted() {
        let mut history = StatsHistory::new(3);
        for value in [1.0, 2.0, 3.0, 4.0] {
            history.push(value);
        }
        let values: Vec<f32> = history.iter().copied().collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
        assert_eq!(history.len(), 3);
        assert_eq!(history.latest(), Some(4.0));
    }

    #[test]
    fn partial_history_iterates_in_order() {
        let mut history = StatsHistory::new(5);
        history.push(7.0);
        history.push(8.0);
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![7.0, 8.0]);
        assert_eq!(history.min(), Some(7.0));
        assert_eq!(history.max(), Some(8.0));
    }

    #[test]
    fn empty_history_has_no_extremes() {
        let history = StatsHistory::new(0);
        assert_eq!(history.capacity(), 1);
        assert!(history.is_empty());
        assert_eq!(history.latest(), None);
        assert_eq!(history.min(), None);
        assert_eq!(history.average(), 0.0);
        assert_eq!(history.trend(), 0.0);
    }

    #[test]
    fn average_and_trend() {
        let mut history = StatsHistory::new(4);
        for value in [1.0, 1.0, 3.0, 3.0] {
            history.push(value);
        }
        assert_relative_eq!(history.average(), 2.0);
        assert_relative_eq!(history.trend(), 2.0);

        history.clear();
        assert!(history.is_empty());
        history.push(5.0);
        assert_eq!(history.latest(), Some(5.0));
    }
}
