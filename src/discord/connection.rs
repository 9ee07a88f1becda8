// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::commands::{command_definitions, route_command};
use super::events::handle_member_add;
use super::incoming_messages::handle_message;
use super::interactions::route_interaction;
use super::platform::DiscordTicketPlatform;
use super::state::{BotIdentity, BotState, Cooldowns, STOCK_COOLDOWN};
use super::utils::users::avatar_url;
use crate::apis::{ChatCompletionClient, StockClient};
use crate::config::ConfigData;
use crate::model::Settings;
use crate::suggestions::SuggestionTally;
use crate::tickets::TicketLifecycle;
use miette::IntoDiagnostic;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use twilight_cache_inmemory::{DefaultInMemoryCache, ResourceType};
use twilight_gateway::{EventTypeFlags, Intents, Shard, ShardId, StreamExt};
use twilight_http::client::Client;
use twilight_model::application::interaction::InteractionData;
use twilight_model::gateway::event::Event;

pub fn set_up_client(config: &ConfigData) -> Arc<Client> {
	Arc::new(Client::new(config.discord.bot_token.clone()))
}

pub async fn run_bot(config: Arc<ConfigData>, http_client: Arc<Client>) -> miette::Result<()> {
	let intents = Intents::GUILDS | Intents::GUILD_MEMBERS | Intents::GUILD_MESSAGES | Intents::MESSAGE_CONTENT;

	let mut shard = Shard::new(ShardId::ONE, config.discord.bot_token.clone(), intents);

	let cache = Arc::new(
		DefaultInMemoryCache::builder()
			.resource_types(ResourceType::all())
			.build(),
	);

	let application_id = {
		let application_response = http_client.current_user_application().await.into_diagnostic()?;
		application_response.model().await.into_diagnostic()?.id
	};

	{
		let interaction_client = http_client.interaction(application_id);
		let commands = command_definitions();
		interaction_client
			.set_global_commands(&commands)
			.await
			.into_diagnostic()?;
		tracing::info!(count = commands.len(), "Registered slash commands");
	}

	let bot_user = {
		let user = http_client
			.current_user()
			.await
			.into_diagnostic()?
			.model()
			.await
			.into_diagnostic()?;
		BotIdentity {
			id: user.id,
			name: user.name,
			avatar_url: avatar_url(user.id, user.avatar.as_ref(), user.discriminator, 256),
		}
	};

	let api_client = reqwest::Client::new();
	let platform = Arc::new(DiscordTicketPlatform::new(
		Arc::clone(&http_client),
		Arc::clone(&cache),
		bot_user.id,
	));
	let bot_state = Arc::new(BotState {
		http_client: Arc::clone(&http_client),
		application_id,
		cache: Arc::clone(&cache),
		bot_user,
		started_at: Instant::now(),
		settings: RwLock::new(Settings::from_config(&config)),
		tickets: TicketLifecycle::new(platform),
		suggestions: Mutex::new(SuggestionTally::new()),
		stock_cooldowns: Mutex::new(Cooldowns::new(STOCK_COOLDOWN)),
		chat_client: ChatCompletionClient::new(api_client.clone(), &config.apis),
		stock_client: StockClient::new(api_client, &config.apis),
	});

	while let Some(event) = shard.next_event(EventTypeFlags::all()).await {
		let event = match event {
			Ok(event) => event,
			Err(error) => {
				tracing::warn!(source = ?error, "error receiving event");
				continue;
			}
		};
		cache.update(&event);

		tokio::spawn(handle_event(event, Arc::clone(&bot_state)));
	}

	Ok(())
}

async fn handle_event(event: Event, state: Arc<BotState>) {
	let event_result = handle_event_route(event, &state).await;
	if let Err(error) = event_result {
		tracing::error!(source = ?error, "An error occurred handling a gateway event");
	}
}

async fn handle_event_route(event: Event, state: &BotState) -> miette::Result<()> {
	tracing::trace!("Incoming gateway message: {:?}", event);
	match event {
		Event::InteractionCreate(interaction) => match &interaction.data {
			Some(InteractionData::ApplicationCommand(command_data)) => {
				route_command(&interaction, command_data, state).await?;
			}
			Some(InteractionData::MessageComponent(interaction_data)) => {
				route_interaction(&interaction, interaction_data, state).await?;
			}
			_ => (),
		},
		Event::MemberAdd(member_add) => handle_member_add(&member_add, state).await,
		Event::MessageCreate(message) => handle_message(&message, state).await?,
		Event::Ready(ready) => {
			tracing::info!(user = %ready.user.name, guilds = ready.guilds.len(), "Discord gateway is ready");
		}
		_ => (),
	}
	Ok(())
}
