// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use harbor_bot::config::{DEFAULT_CONFIG_PATH, parse_config};
use harbor_bot::discord::{run_bot, set_up_client};
use harbor_bot::logging::init_logging;
use std::sync::Arc;

#[tokio::main]
async fn main() -> miette::Result<()> {
	let config_path = std::env::args().nth(1).unwrap_or_else(|| String::from(DEFAULT_CONFIG_PATH));
	let config = Arc::new(parse_config(&config_path).await?);

	let http_client = set_up_client(&config);
	init_logging(&config.logging, Arc::clone(&http_client))?;
	tracing::info!(config = %config_path, "Starting Harbor Bot");

	run_bot(config, http_client).await
}
