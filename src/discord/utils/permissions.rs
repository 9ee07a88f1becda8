// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::state::BotState;
use miette::IntoDiagnostic;
use std::collections::HashMap;
use std::future::IntoFuture;
use twilight_http::error::ErrorType;
use twilight_http::response::StatusCode;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::guild::{Permissions, Role};
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, RoleMarker};
use twilight_util::permission_calculator::PermissionCalculator;

/// What the bot needs in a channel it posts embeds to
pub const EMBED_CHANNEL_PERMISSIONS: Permissions = Permissions::VIEW_CHANNEL
	.union(Permissions::SEND_MESSAGES)
	.union(Permissions::EMBED_LINKS);

/// What the bot needs in the chatbot channel
pub const CHAT_CHANNEL_PERMISSIONS: Permissions = Permissions::VIEW_CHANNEL
	.union(Permissions::SEND_MESSAGES)
	.union(Permissions::READ_MESSAGE_HISTORY);

pub const SUGGESTION_CHANNEL_PERMISSIONS: Permissions = EMBED_CHANNEL_PERMISSIONS
	.union(Permissions::ADD_REACTIONS)
	.union(Permissions::READ_MESSAGE_HISTORY);

/// The bot's roles and permissions across a whole guild
pub struct BotGuildStanding {
	pub permissions: Permissions,
	pub highest_role_position: i64,
	pub roles: Vec<Role>,
}

impl BotGuildStanding {
	pub fn role(&self, role_id: Id<RoleMarker>) -> Option<&Role> {
		self.roles.iter().find(|role| role.id == role_id)
	}

	/// Whether the bot can give out a role: it needs Manage Roles and a higher role than the one it's assigning.
	pub fn can_assign(&self, role_position: i64) -> bool {
		self.permissions.contains(Permissions::MANAGE_ROLES) && self.highest_role_position > role_position
	}
}

/// Whether the member who sent an interaction can manage the guild's bot settings
pub fn member_is_manager(interaction: &InteractionCreate) -> bool {
	interaction
		.member
		.as_ref()
		.and_then(|member| member.permissions)
		.is_some_and(is_manager)
}

fn is_manager(permissions: Permissions) -> bool {
	permissions.intersects(Permissions::MANAGE_GUILD | Permissions::ADMINISTRATOR)
}

/// Whether the member who sent an interaction counts as staff for a feature with the given staff roles
pub fn member_is_staff(interaction: &InteractionCreate, staff_roles: &[Id<RoleMarker>]) -> bool {
	let Some(member) = interaction.member.as_ref() else {
		return false;
	};
	is_staff(member.permissions.unwrap_or_else(Permissions::empty), &member.roles, staff_roles)
}

/// Managers are always staff. Otherwise, a member is staff if they have any of the staff roles.
pub fn is_staff(permissions: Permissions, member_roles: &[Id<RoleMarker>], staff_roles: &[Id<RoleMarker>]) -> bool {
	is_manager(permissions) || member_roles.iter().any(|role| staff_roles.contains(role))
}

/// Gets the highest position among a member's roles. Members with no roles are at the bottom.
pub fn highest_role_position(
	member_roles: &[Id<RoleMarker>],
	role_positions: impl IntoIterator<Item = (Id<RoleMarker>, i64)>,
) -> i64 {
	role_positions
		.into_iter()
		.filter(|(role_id, _)| member_roles.contains(role_id))
		.map(|(_, position)| position)
		.max()
		.unwrap_or(0)
}

/// Lists permissions as a bulleted list of names for error messages.
pub fn permission_list(permissions: Permissions) -> String {
	permissions
		.iter_names()
		.map(|(name, _)| format!("• {}", name))
		.collect::<Vec<_>>()
		.join("\n")
}

/// Gets the bot's guild-wide permissions and role standing.
pub async fn bot_guild_standing(state: &BotState, guild_id: Id<GuildMarker>) -> miette::Result<BotGuildStanding> {
	let self_member_future = state
		.http_client
		.guild_member(guild_id, state.bot_user.id)
		.into_future();
	let guild_roles_future = state.http_client.roles(guild_id).into_future();
	let (self_member, guild_roles) = tokio::join!(self_member_future, guild_roles_future);

	let self_member = self_member.into_diagnostic()?.model().await.into_diagnostic()?;
	let guild_roles = guild_roles.into_diagnostic()?.models().await.into_diagnostic()?;

	let everyone_role_permissions = everyone_permissions(guild_id, &guild_roles);
	let member_roles = member_role_permissions(&self_member.roles, &guild_roles);
	let calculator = PermissionCalculator::new(guild_id, state.bot_user.id, everyone_role_permissions, &member_roles);

	Ok(BotGuildStanding {
		permissions: calculator.root(),
		highest_role_position: highest_role_position(
			&self_member.roles,
			guild_roles.iter().map(|role| (role.id, role.position)),
		),
		roles: guild_roles,
	})
}

/// Gets the list of permissions the bot has in the passed-in channel. The channel ID must reference a channel on the
/// passed-in guild.
pub async fn bot_channel_permissions(
	state: &BotState,
	guild_id: Id<GuildMarker>,
	channel_id: Id<ChannelMarker>,
) -> miette::Result<Permissions> {
	let http_client = &state.http_client;
	let self_member_future = http_client.guild_member(guild_id, state.bot_user.id).into_future();
	let channel_data_future = http_client.channel(channel_id).into_future();
	let guild_roles_future = http_client.roles(guild_id).into_future();
	let (self_member, channel_data, guild_roles) =
		tokio::join!(self_member_future, channel_data_future, guild_roles_future);

	let self_member = self_member.into_diagnostic()?.model().await.into_diagnostic()?;
	let guild_roles = guild_roles.into_diagnostic()?.models().await.into_diagnostic()?;

	let channel_data = match channel_data {
		Ok(response) => response.model().await.into_diagnostic()?,
		Err(error) => {
			if let ErrorType::Response { status, .. } = error.kind() {
				if *status == StatusCode::FORBIDDEN {
					return Ok(Permissions::empty());
				}
			}
			return Err(error).into_diagnostic();
		}
	};

	let everyone_role_permissions = everyone_permissions(guild_id, &guild_roles);
	let member_roles = member_role_permissions(&self_member.roles, &guild_roles);
	let channel_permission_overwrites = channel_data.permission_overwrites.unwrap_or_default();

	let calculator = PermissionCalculator::new(guild_id, state.bot_user.id, everyone_role_permissions, &member_roles);
	Ok(calculator.in_channel(channel_data.kind, &channel_permission_overwrites))
}

fn everyone_permissions(guild_id: Id<GuildMarker>, guild_roles: &[Role]) -> Permissions {
	let guild_everyone_role_id: Id<RoleMarker> = guild_id.cast();
	guild_roles
		.iter()
		.find(|role| role.id == guild_everyone_role_id)
		.map(|role| role.permissions)
		.unwrap_or_else(Permissions::empty)
}

fn member_role_permissions(member_roles: &[Id<RoleMarker>], guild_roles: &[Role]) -> Vec<(Id<RoleMarker>, Permissions)> {
	let role_permissions: HashMap<Id<RoleMarker>, Permissions> =
		guild_roles.iter().map(|role| (role.id, role.permissions)).collect();
	member_roles
		.iter()
		.map(|role_id| {
			(
				*role_id,
				role_permissions
					.get(role_id)
					.copied()
					.unwrap_or_else(Permissions::empty),
			)
		})
		.collect()
}
