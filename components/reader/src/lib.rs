// Copyright 2026 seam
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

pub mod chunk;
pub mod config;
pub mod err;
pub mod format;
pub mod slice;
pub mod walker;

pub use chunk::read_slice;
pub use config::ReaderConfig;
pub use err::{Error, Result};
pub use format::{parse_records, Format};
pub use slice::{plan_slices, Slice};
pub use walker::plan_ranges;
