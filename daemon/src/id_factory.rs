// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Monotonic identifiers for sessions, watches, observers and interfaces.

use std::ops::Add;

/// Hands out `start`, `start + step`, `start + 2 * step`, ...
pub struct IdFactory<T> {
    next_id: T,
    step: T,
}

impl<T> IdFactory<T>
where
    T: Add<Output = T> + Copy,
{
    pub fn new(start: T, step: T) -> Self {
        IdFactory { next_id: start, step }
    }

    pub fn next_id(&mut self) -> T {
        let id = self.next_id;
        self.next_id = self.next_id + self.step;
        id
    }
}

/// Counts 1, 2, 3, ...
impl<T> Default for IdFactory<T>
where
    T: Add<Output = T> + Copy + From<u8>,
{
    fn default() -> Self {
        Self::new(T::from(1), T::from(1))
    }
}

impl<T> Iterator for IdFactory<T>
where
    T: Add<Output = T> + Copy,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        Some(self.next_id())
    }
}
