// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Tracing subscriber initialization.

use std::env;

use tracing_subscriber::EnvFilter;

/// The environment variable holding the tracing filter directives.
pub const LOG_ENV_VAR: &str = "RUST_LOG";

/// Initialize tracing.
///
/// Filter directives are taken from the `RUST_LOG` environment variable, falling back to
/// `default_directives` when it is unset or empty. Output goes to stderr so it never
/// interleaves with command output on stdout.
///
/// # Safety
///
/// Should only be called once during an applications run, ideally at the
/// beginning of the run.
///
/// # Errors
///
/// Returns an error if the directives are invalid or a subscriber is already installed.
pub fn init_tracing(default_directives: &str) -> anyhow::Result<()> {
    let directives = resolve_directives(env::var(LOG_ENV_VAR).ok(), default_directives);
    let env_filter = EnvFilter::try_new(&directives)
        .map_err(|e| anyhow::anyhow!("Invalid tracing directives '{directives}': {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))?;

    tracing::debug!(%directives, "Initialized tracing");
    Ok(())
}

fn resolve_directives(from_env: Option<String>, default_directives: &str) -> String {
    from_env
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default_directives.to_string())
}
