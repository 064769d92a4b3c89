//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! The call table: outstanding requests awaiting replies.
//!
//! Keyed by call id, which the coordinator assigns from a monotone 64-bit
//! counter starting at 1. An id is present iff a reply is still awaited.
//! Entries are inserted only by the coordinator before the request reaches a
//! writer, and removed only by the coordinator on reply, routing failure,
//! endpoint teardown, or router stop.
//!
//! Id wraparound is not handled; at any realistic call rate the 64-bit space
//! is effectively infinite, and on overflow the duplicate-id panic flags the
//! condition instead of silently aliasing two calls.

use crate::router::RouteMessage;
use std::collections::HashMap;

pub(crate) struct CallTable<P> {
    entries: HashMap<u64, RouteMessage<P>>,
    next_id: u64,
}

impl<P> CallTable<P> {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 1,
        }
    }

    /// Hands out the next call id.
    pub(crate) fn assign_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Records an outstanding request under its assigned id.
    ///
    /// # Panics
    ///
    /// Panics if the id is already outstanding, which is unreachable unless
    /// the id counter wrapped with the table still saturated.
    pub(crate) fn insert(&mut self, message: RouteMessage<P>) {
        let id = message.call_id();
        if self.entries.insert(id, message).is_some() {
            panic!("call id {} already outstanding", id);
        }
    }

    /// Removes and returns the request awaiting `id`, if any.
    pub(crate) fn remove(&mut self, id: u64) -> Option<RouteMessage<P>> {
        self.entries.remove(&id)
    }

    /// Removes every request targeting `ep_name`.
    pub(crate) fn reap_endpoint(&mut self, ep_name: &str) -> Vec<RouteMessage<P>> {
        let ids: Vec<u64> = self
            .entries
            .iter()
            .filter(|(_, message)| message.ep_name() == ep_name)
            .map(|(id, _)| *id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.entries.remove(&id))
            .collect()
    }

    /// Removes every outstanding request.
    pub(crate) fn drain_all(&mut self) -> Vec<RouteMessage<P>> {
        self.entries.drain().map(|(_, message)| message).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    fn force_next_id(&mut self, id: u64) {
        self.next_id = id;
    }
}
