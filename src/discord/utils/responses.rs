// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::state::BotState;
use miette::IntoDiagnostic;
use twilight_model::channel::message::component::Component;
use twilight_model::channel::message::embed::Embed;
use twilight_model::channel::message::{AllowedMentions, MessageFlags};
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_util::builder::InteractionResponseDataBuilder;

pub const MANAGE_GUILD_REQUIRED: &str = "You need `Manage Guild` permission to use this command!";
pub const GUILD_ONLY: &str = "This command can only be used in a server!";

/// Generates the message to send when the bot is missing embed permissions in a channel.
pub fn missing_embed_permissions_message(channel_mention: impl std::fmt::Display) -> String {
	format!(
		"I need permissions to view, send messages, and embed links in {}!",
		channel_mention
	)
}

/// Replies with a message only the interacting user can see.
pub async fn respond_ephemeral(
	state: &BotState,
	interaction: &InteractionCreate,
	content: impl Into<String>,
) -> miette::Result<()> {
	let response = InteractionResponseDataBuilder::new()
		.content(content)
		.allowed_mentions(AllowedMentions::default())
		.flags(MessageFlags::EPHEMERAL)
		.build();
	let response = InteractionResponse {
		kind: InteractionResponseType::ChannelMessageWithSource,
		data: Some(response),
	};
	state
		.interaction_client()
		.create_response(interaction.id, &interaction.token, &response)
		.await
		.into_diagnostic()?;
	Ok(())
}

/// Replies with a message visible to the whole channel.
pub async fn respond_public(
	state: &BotState,
	interaction: &InteractionCreate,
	content: impl Into<String>,
) -> miette::Result<()> {
	let response = InteractionResponseDataBuilder::new()
		.content(content)
		.allowed_mentions(AllowedMentions::default())
		.build();
	let response = InteractionResponse {
		kind: InteractionResponseType::ChannelMessageWithSource,
		data: Some(response),
	};
	state
		.interaction_client()
		.create_response(interaction.id, &interaction.token, &response)
		.await
		.into_diagnostic()?;
	Ok(())
}

pub async fn respond_embed(
	state: &BotState,
	interaction: &InteractionCreate,
	embed: Embed,
	ephemeral: bool,
) -> miette::Result<()> {
	let mut response = InteractionResponseDataBuilder::new().embeds([embed]);
	if ephemeral {
		response = response.flags(MessageFlags::EPHEMERAL);
	}
	let response = InteractionResponse {
		kind: InteractionResponseType::ChannelMessageWithSource,
		data: Some(response.build()),
	};
	state
		.interaction_client()
		.create_response(interaction.id, &interaction.token, &response)
		.await
		.into_diagnostic()?;
	Ok(())
}

/// Acknowledges the interaction so the real response can be sent with [update_deferred] after slow work.
pub async fn defer(state: &BotState, interaction: &InteractionCreate, ephemeral: bool) -> miette::Result<()> {
	let data = if ephemeral {
		Some(InteractionResponseDataBuilder::new().flags(MessageFlags::EPHEMERAL).build())
	} else {
		None
	};
	let response = InteractionResponse {
		kind: InteractionResponseType::DeferredChannelMessageWithSource,
		data,
	};
	state
		.interaction_client()
		.create_response(interaction.id, &interaction.token, &response)
		.await
		.into_diagnostic()?;
	Ok(())
}

/// Fills in a deferred response with text.
pub async fn update_deferred(state: &BotState, interaction: &InteractionCreate, content: &str) -> miette::Result<()> {
	state
		.interaction_client()
		.update_response(&interaction.token)
		.content(Some(content))
		.allowed_mentions(Some(&AllowedMentions::default()))
		.await
		.into_diagnostic()?;
	Ok(())
}

/// Replaces the components on the message a button was clicked on, as the response to that click.
pub async fn update_components(
	state: &BotState,
	interaction: &InteractionCreate,
	components: Vec<Component>,
) -> miette::Result<()> {
	let response = InteractionResponse {
		kind: InteractionResponseType::UpdateMessage,
		data: Some(InteractionResponseDataBuilder::new().components(components).build()),
	};
	state
		.interaction_client()
		.create_response(interaction.id, &interaction.token, &response)
		.await
		.into_diagnostic()?;
	Ok(())
}

/// Sends an additional message only the interacting user can see, after the interaction has been responded to.
pub async fn followup_ephemeral(state: &BotState, interaction: &InteractionCreate, content: &str) -> miette::Result<()> {
	state
		.interaction_client()
		.create_followup(&interaction.token)
		.content(content)
		.allowed_mentions(Some(&AllowedMentions::default()))
		.flags(MessageFlags::EPHEMERAL)
		.await
		.into_diagnostic()?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_permissions_message() {
		assert_eq!(
			missing_embed_permissions_message("<#5>"),
			"I need permissions to view, send messages, and embed links in <#5>!"
		);
	}
}
