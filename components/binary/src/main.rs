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

mod cmd;

use clap::{Parser, Subcommand};
use snafu::Whatever;

use crate::cmd::{append::AppendArgs, read::ReadArgs};

#[derive(Debug, Parser)]
#[clap(
    name = "seam",
    about = "chunked reader and rotating appender for line-delimited dfs files",
    version
)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Read(ReadArgs),
    Append(AppendArgs),
}

fn main() -> Result<(), Whatever> {
    let cli = Cli::parse();
    match cli.commands {
        Commands::Read(read_args) => read_args.run(),
        Commands::Append(append_args) => append_args.run(),
    }
}
