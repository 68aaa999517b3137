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

pub mod append;
pub mod chunker;
pub mod config;
pub mod err;
pub mod rotation;

pub use append::{AppendCoordinator, RecordChunk};
pub use chunker::{RecordChunker, Timeseries};
pub use config::WriterConfig;
pub use err::{Error, Result};
pub use rotation::RotationTracker;
