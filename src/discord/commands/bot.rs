// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::state::BotState;
use crate::discord::utils::embeds::bot_embed;
use crate::discord::utils::options::Subcommand;
use crate::discord::utils::responses::respond_embed;
use crate::discord::utils::timestamp::format_uptime;
use crate::discord::utils::users::interaction_author_name;
use miette::{IntoDiagnostic, bail};
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;
use twilight_util::builder::command::{CommandBuilder, SubCommandBuilder};
use twilight_util::builder::embed::EmbedFieldBuilder;

/// Permissions requested by the invite link: Send Messages and Use Application Commands
const INVITE_PERMISSIONS: u64 = 2147485696;

pub fn command_definition() -> Command {
	CommandBuilder::new("bot", "Bot related commands", CommandType::ChatInput)
		.option(SubCommandBuilder::new("invite", "Get bot's invite link").build())
		.option(SubCommandBuilder::new("stats", "Get bot's statistics").build())
		.option(SubCommandBuilder::new("uptime", "Get bot's uptime").build())
		.build()
}

pub async fn handle_command(
	interaction: &InteractionCreate,
	command_data: &CommandData,
	state: &BotState,
) -> miette::Result<()> {
	let subcommand = Subcommand::from_command(command_data)?;
	let uptime = format_uptime(state.started_at.elapsed());
	let embed = match subcommand.name {
		"invite" => bot_embed(&state.bot_user)?
			.title("Bot Invite Link")
			.description(format!(
				"[Click here to invite me to your server!]({})",
				invite_url(state.bot_user.id)
			)),
		"stats" => {
			let servers = state.cache.stats().guilds();
			let users: u64 = state
				.cache
				.iter()
				.guilds()
				.filter_map(|guild| guild.member_count())
				.sum();
			bot_embed(&state.bot_user)?
				.title("Bot Statistics")
				.field(EmbedFieldBuilder::new("Servers", servers.to_string()).inline())
				.field(EmbedFieldBuilder::new("Users", users.to_string()).inline())
				.field(EmbedFieldBuilder::new("Uptime", uptime).inline())
		}
		"uptime" => bot_embed(&state.bot_user)?
			.title("Bot Uptime")
			.description(format!("I've been online for: **{}**", uptime)),
		_ => bail!("Unknown bot subcommand: {}", subcommand.name),
	};
	let embed = embed.validate().into_diagnostic()?.build();
	tracing::info!(user = %interaction_author_name(interaction), "Bot {} command used", subcommand.name);
	respond_embed(state, interaction, embed, false).await
}

pub fn invite_url(bot_id: Id<UserMarker>) -> String {
	format!(
		"https://discord.com/api/oauth2/authorize?client_id={}&permissions={}&scope=bot%20applications.commands",
		bot_id, INVITE_PERMISSIONS
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn invite_link() {
		assert_eq!(
			invite_url(Id::new(1234)),
			"https://discord.com/api/oauth2/authorize?client_id=1234&permissions=2147485696&scope=bot%20applications.commands"
		);
	}
}
