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

//! Endpoint layer: one connection, one reader, one writer.
//!
//! An [`Endpoint`] binds a named byte-stream connection to a pair of
//! workers. The writer drains the endpoint's private outbound queue onto
//! the wire; the reader decodes frames and feeds the router's shared
//! inbound queue. The router admits, starts, and stops endpoints from its
//! coordinator loop; workers signal teardown back to the coordinator when
//! the stream dies.
//!
//! ```text
//!            outbound queue           wire
//! router ---------------------> writer ----->
//!            inbound queue             wire
//! router <--------------------- reader <-----
//! ```

#[allow(clippy::module_inception)]
mod endpoint;
mod reader;
mod writer;

pub use endpoint::Endpoint;
