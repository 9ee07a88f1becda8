// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::state::BotState;
use crate::discord::utils::options::Subcommand;
use crate::discord::utils::permissions::{CHAT_CHANNEL_PERMISSIONS, bot_channel_permissions, member_is_manager};
use crate::discord::utils::responses::{MANAGE_GUILD_REQUIRED, respond_ephemeral};
use crate::discord::utils::users::interaction_author_name;
use miette::bail;
use twilight_mention::fmt::Mention;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::channel::ChannelType;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_util::builder::command::{ChannelBuilder, CommandBuilder, SubCommandBuilder};

pub fn command_definition() -> Command {
	let channel = ChannelBuilder::new("channel", "Channel for ChatGPT responses")
		.channel_types([ChannelType::GuildText])
		.required(true)
		.build();

	CommandBuilder::new("chatbot", "ChatGPT chatbot management", CommandType::ChatInput)
		.contexts([InteractionContextType::Guild])
		.option(
			SubCommandBuilder::new("channel", "Set the channel for ChatGPT responses")
				.option(channel)
				.build(),
		)
		.option(SubCommandBuilder::new("reset", "Reset the ChatGPT channel to default").build())
		.build()
}

pub async fn handle_command(
	interaction: &InteractionCreate,
	command_data: &CommandData,
	state: &BotState,
) -> miette::Result<()> {
	if !member_is_manager(interaction) {
		return respond_ephemeral(state, interaction, MANAGE_GUILD_REQUIRED).await;
	}
	let subcommand = Subcommand::from_command(command_data)?;
	match subcommand.name {
		"channel" => {
			let Some(guild_id) = interaction.guild_id else {
				bail!("Chatbot channel set outside of a guild");
			};
			let channel_id = subcommand.require_channel("channel")?;
			let channel_permissions = bot_channel_permissions(state, guild_id, channel_id).await?;
			if !channel_permissions.contains(CHAT_CHANNEL_PERMISSIONS) {
				return respond_ephemeral(
					state,
					interaction,
					format!(
						"I need permissions to view, send messages, and read message history in {}!",
						channel_id.mention()
					),
				)
				.await;
			}

			{
				let mut settings = state.settings.write().await;
				settings.chatbot.enabled = true;
				settings.chatbot.channel = Some(channel_id);
			}
			tracing::info!(channel = %channel_id, by = %interaction_author_name(interaction), "Chatbot channel set");
			respond_ephemeral(
				state,
				interaction,
				format!(
					"✅ ChatGPT responses will now be active in {}! Users can chat naturally and I'll respond.",
					channel_id.mention()
				),
			)
			.await
		}
		"reset" => {
			{
				let mut settings = state.settings.write().await;
				settings.chatbot.enabled = false;
				settings.chatbot.channel = None;
			}
			tracing::info!(by = %interaction_author_name(interaction), "Chatbot channel reset");
			respond_ephemeral(
				state,
				interaction,
				"✅ ChatGPT channel has been reset. The chatbot is now disabled.",
			)
			.await
		}
		_ => bail!("Unknown chatbot subcommand: {}", subcommand.name),
	}
}
