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

pub const SEAM: &str = "seam";

/// Record separator used by every line-delimited file we touch.
pub const LINE_DELIMITER: u8 = b'\n';

/// Default byte size of one read slice.
pub const DEFAULT_SLICE_SIZE: u64 = 100_000; // 100 KB

/// Default record count per write chunk.
pub const DEFAULT_RECORDS_PER_CHUNK: usize = 50_000;

/// Default cap on the rotation index before a file is abandoned.
pub const DEFAULT_MAX_ROTATIONS: u32 = 100;

/// Margin reads cover this many average-sized records past the slice end.
pub const MARGIN_SAFETY_FACTOR: u64 = 2;

pub fn cal_slice_count(length: u64, slice_size: u64) -> u64 { (length + slice_size - 1) / slice_size }

pub type RotationIndex = u32;
