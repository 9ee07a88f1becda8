// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::platform::DiscordTicketPlatform;
use crate::apis::{ChatCompletionClient, StockClient};
use crate::model::Settings;
use crate::suggestions::SuggestionTally;
use crate::tickets::TicketLifecycle;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use twilight_cache_inmemory::DefaultInMemoryCache;
use twilight_http::client::{Client, InteractionClient};
use twilight_model::id::Id;
use twilight_model::id::marker::{ApplicationMarker, UserMarker};

mod cooldowns;

pub use cooldowns::{Cooldowns, STOCK_COOLDOWN, seconds_left};

/// The bot's own user, as shown on the embeds it sends
#[derive(Clone, Debug)]
pub struct BotIdentity {
	pub id: Id<UserMarker>,
	pub name: String,
	pub avatar_url: String,
}

/// Everything event handlers share
pub struct BotState {
	pub http_client: Arc<Client>,
	pub application_id: Id<ApplicationMarker>,
	pub cache: Arc<DefaultInMemoryCache>,
	pub bot_user: BotIdentity,
	pub started_at: Instant,
	pub settings: RwLock<Settings>,
	pub tickets: TicketLifecycle<DiscordTicketPlatform>,
	/// Vote buttons are rendered under this lock, from the tally the vote produced
	pub suggestions: Mutex<SuggestionTally>,
	pub stock_cooldowns: Mutex<Cooldowns>,
	pub chat_client: ChatCompletionClient,
	pub stock_client: StockClient,
}

impl BotState {
	pub fn interaction_client(&self) -> InteractionClient<'_> {
		self.http_client.interaction(self.application_id)
	}
}
