// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::state::BotState;
use crate::discord::utils::embeds::bot_embed;
use crate::discord::utils::options::Subcommand;
use crate::discord::utils::permissions::{BotGuildStanding, bot_guild_standing, member_is_manager};
use crate::discord::utils::responses::{MANAGE_GUILD_REQUIRED, respond_embed, respond_ephemeral};
use crate::discord::utils::users::interaction_author_name;
use miette::{IntoDiagnostic, bail};
use twilight_mention::fmt::Mention;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::guild::Permissions;
use twilight_model::id::Id;
use twilight_model::id::marker::{GuildMarker, RoleMarker};
use twilight_util::builder::command::{CommandBuilder, RoleBuilder, StringBuilder, SubCommandBuilder};
use twilight_util::builder::embed::EmbedFieldBuilder;

pub fn command_definition() -> Command {
	let role = RoleBuilder::new("role", "The role to be given").build();
	let role_id = StringBuilder::new("role_id", "The role ID to be given").build();

	CommandBuilder::new(
		"autorole",
		"Setup role to be given when a member joins the server",
		CommandType::ChatInput,
	)
	.contexts([InteractionContextType::Guild])
	.option(
		SubCommandBuilder::new("add", "Setup the autorole")
			.option(role)
			.option(role_id)
			.build(),
	)
	.option(SubCommandBuilder::new("remove", "Disable the autorole").build())
	.option(SubCommandBuilder::new("list", "List current autorole configuration").build())
	.build()
}

pub async fn handle_command(
	interaction: &InteractionCreate,
	command_data: &CommandData,
	state: &BotState,
) -> miette::Result<()> {
	let subcommand = Subcommand::from_command(command_data)?;
	match subcommand.name {
		"add" => add(interaction, &subcommand, state).await,
		"remove" => {
			if !member_is_manager(interaction) {
				return respond_ephemeral(state, interaction, MANAGE_GUILD_REQUIRED).await;
			}
			state.settings.write().await.autorole.disable();
			tracing::info!(by = %interaction_author_name(interaction), "Autorole disabled");
			respond_ephemeral(state, interaction, "✅ Autorole has been disabled!").await
		}
		"list" => list(interaction, state).await,
		_ => bail!("Unknown autorole subcommand: {}", subcommand.name),
	}
}

async fn add(interaction: &InteractionCreate, subcommand: &Subcommand<'_>, state: &BotState) -> miette::Result<()> {
	if !member_is_manager(interaction) {
		return respond_ephemeral(state, interaction, MANAGE_GUILD_REQUIRED).await;
	}
	let Some(guild_id) = interaction.guild_id else {
		bail!("Autorole used outside of a guild");
	};

	let role_id = match subcommand.role("role") {
		Some(role_id) => Some(role_id),
		None => match subcommand.string("role_id") {
			Some(role_id) => match role_id.trim().parse::<u64>().ok().and_then(Id::new_checked) {
				Some(role_id) => Some(role_id),
				None => return respond_ephemeral(state, interaction, "No role found with that ID!").await,
			},
			None => None,
		},
	};
	let Some(role_id) = role_id else {
		return respond_ephemeral(state, interaction, "Please provide a role or role ID!").await;
	};

	let standing = bot_guild_standing(state, guild_id).await?;
	let Some(role) = standing.role(role_id) else {
		return respond_ephemeral(state, interaction, "No role found with that ID!").await;
	};
	let candidate = RoleCandidate {
		id: role.id,
		position: role.position,
		managed: role.managed,
	};
	if let Some(rejection) = autorole_rejection(guild_id, &candidate, &standing) {
		return respond_ephemeral(state, interaction, rejection).await;
	}

	let role_name = role.name.clone();
	{
		let mut settings = state.settings.write().await;
		settings.autorole.enabled = true;
		settings.autorole.role = Some(role_id);
	}
	tracing::info!(role = %role_name, by = %interaction_author_name(interaction), "Autorole set");
	respond_ephemeral(
		state,
		interaction,
		format!(
			"✅ Autorole has been set to **{}**! New members will automatically receive this role.",
			role_name
		),
	)
	.await
}

async fn list(interaction: &InteractionCreate, state: &BotState) -> miette::Result<()> {
	let Some(role_id) = state.settings.read().await.autorole.active_role() else {
		return respond_ephemeral(state, interaction, "Autorole is currently disabled.").await;
	};
	if state.cache.role(role_id).is_none() {
		state.settings.write().await.autorole.disable();
		tracing::warn!(role = %role_id, "Configured autorole no longer exists; autorole disabled");
		return respond_ephemeral(
			state,
			interaction,
			"The configured autorole no longer exists. Autorole has been disabled.",
		)
		.await;
	}

	let embed = bot_embed(&state.bot_user)?
		.title("🤖 Autorole Configuration")
		.field(EmbedFieldBuilder::new("Status", "✅ Enabled").inline())
		.field(EmbedFieldBuilder::new("Role", role_id.mention().to_string()).inline())
		.field(EmbedFieldBuilder::new("Role ID", role_id.to_string()).inline())
		.validate()
		.into_diagnostic()?
		.build();
	respond_embed(state, interaction, embed, true).await
}

/// The parts of a role that decide whether it can be given out automatically
pub struct RoleCandidate {
	pub id: Id<RoleMarker>,
	pub position: i64,
	pub managed: bool,
}

/// Checks whether a role can be used as the autorole, returning the reason it can't if not.
pub fn autorole_rejection(
	guild_id: Id<GuildMarker>,
	role: &RoleCandidate,
	standing: &BotGuildStanding,
) -> Option<&'static str> {
	if role.id == guild_id.cast() {
		return Some("You cannot set `@everyone` as the autorole!");
	}
	if !standing.permissions.contains(Permissions::MANAGE_ROLES) {
		return Some("I don't have the `ManageRoles` permission!");
	}
	if !standing.can_assign(role.position) {
		return Some("I don't have the permissions to assign this role! The role must be below my highest role.");
	}
	if role.managed {
		return Some("Oops! This role is managed by an integration and cannot be assigned!");
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;

	fn standing(permissions: Permissions) -> BotGuildStanding {
		BotGuildStanding {
			permissions,
			highest_role_position: 5,
			roles: Vec::new(),
		}
	}

	fn candidate(id: u64, position: i64, managed: bool) -> RoleCandidate {
		RoleCandidate {
			id: Id::new(id),
			position,
			managed,
		}
	}

	#[test]
	fn assignable_role() {
		assert_eq!(
			autorole_rejection(Id::new(1), &candidate(2, 3, false), &standing(Permissions::MANAGE_ROLES)),
			None
		);
	}

	#[test]
	fn rejected_roles() {
		let guild_id = Id::new(1);
		let manage_roles = standing(Permissions::MANAGE_ROLES);
		assert_eq!(
			autorole_rejection(guild_id, &candidate(1, 0, false), &manage_roles),
			Some("You cannot set `@everyone` as the autorole!")
		);
		assert_eq!(
			autorole_rejection(guild_id, &candidate(2, 3, false), &standing(Permissions::empty())),
			Some("I don't have the `ManageRoles` permission!")
		);
		assert!(
			autorole_rejection(guild_id, &candidate(2, 5, false), &manage_roles)
				.is_some_and(|message| message.contains("below my highest role"))
		);
		assert!(
			autorole_rejection(guild_id, &candidate(2, 3, true), &manage_roles)
				.is_some_and(|message| message.contains("managed by an integration"))
		);
	}
}
