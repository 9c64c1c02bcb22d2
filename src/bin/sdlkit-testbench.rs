// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
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

//! sdlkit test bench entry point
//!
//! Runs one of the sample applications (`sprite`, `controller`, `camera`,
//! `info`) on the headless native library. `RUST_LOG` may be set in a
//! `.env` file.

use clap::Parser;
use sdlkit::testbench::{self, Cli};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging
    testbench::logger().init();

    let cli = Cli::parse();
    log::info!("Starting sdlkit test bench...");

    testbench::run(&cli)?;

    Ok(())
}
