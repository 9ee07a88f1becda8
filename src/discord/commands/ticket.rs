// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::staff_role_change_message;
use crate::discord::state::BotState;
use crate::discord::utils::components::open_ticket_button;
use crate::discord::utils::embeds::INFO_COLOR;
use crate::discord::utils::options::{Subcommand, resolved_role_name};
use crate::discord::utils::permissions::{
	EMBED_CHANNEL_PERMISSIONS, bot_channel_permissions, bot_guild_standing, member_is_manager, member_is_staff,
};
use crate::discord::utils::responses::{
	MANAGE_GUILD_REQUIRED, missing_embed_permissions_message, respond_ephemeral, respond_public,
};
use crate::discord::utils::timestamp::current_timestamp;
use crate::discord::utils::users::interaction_author_name;
use crate::tickets::{CloseRequest, TicketError};
use miette::{IntoDiagnostic, bail};
use twilight_mention::fmt::Mention;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::channel::ChannelType;
use twilight_model::channel::message::embed::Embed;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::guild::Permissions;
use twilight_model::id::Id;
use twilight_model::id::marker::ChannelMarker;
use twilight_model::util::datetime::Timestamp;
use twilight_util::builder::command::{
	ChannelBuilder, CommandBuilder, IntegerBuilder, RoleBuilder, StringBuilder, SubCommandBuilder, UserBuilder,
};
use twilight_util::builder::embed::{EmbedBuilder, EmbedFooterBuilder};

/// Sent (publicly) when a ticket starts closing
pub const CLOSING_MESSAGE: &str = "Ticket will be closed in 5 seconds...";
pub const CLOSE_FAILED_MESSAGE: &str = "Failed to close ticket.";
const NOT_IN_TICKET_MESSAGE: &str = "This command can only be used in ticket channels!";

pub fn command_definition() -> Command {
	let setup_channel = ChannelBuilder::new("channel", "Channel to send ticket creation message")
		.channel_types([ChannelType::GuildText])
		.required(true)
		.build();
	let close_reason = StringBuilder::new("reason", "Reason for closing the ticket").build();
	let add_user = UserBuilder::new("user", "User to add to the ticket").required(true).build();
	let remove_user = UserBuilder::new("user", "User to remove from the ticket")
		.required(true)
		.build();
	let log_channel = ChannelBuilder::new("channel", "Channel for ticket logs")
		.channel_types([ChannelType::GuildText])
		.required(true)
		.build();
	let limit = IntegerBuilder::new("limit", "Maximum number of tickets open at once")
		.min_value(1)
		.required(true)
		.build();
	let category = ChannelBuilder::new("category", "Category to create ticket channels in")
		.channel_types([ChannelType::GuildCategory])
		.required(true)
		.build();
	let staff_add_role = RoleBuilder::new("role", "Role to add as ticket staff").required(true).build();
	let staff_remove_role = RoleBuilder::new("role", "Role to remove from ticket staff")
		.required(true)
		.build();

	let subcommands = [
		SubCommandBuilder::new("setup", "Setup ticket creation message in a channel").option(setup_channel),
		SubCommandBuilder::new("close", "Close the current ticket").option(close_reason),
		SubCommandBuilder::new("add", "Add a user to the ticket").option(add_user),
		SubCommandBuilder::new("remove", "Remove a user from the ticket").option(remove_user),
		SubCommandBuilder::new("log", "Set ticket log channel").option(log_channel),
		SubCommandBuilder::new("limit", "Set the maximum number of open tickets").option(limit),
		SubCommandBuilder::new("category", "Set the category new tickets are created in").option(category),
		SubCommandBuilder::new("staffadd", "Add a ticket staff role").option(staff_add_role),
		SubCommandBuilder::new("staffremove", "Remove a ticket staff role").option(staff_remove_role),
	];

	subcommands
		.into_iter()
		.fold(
			CommandBuilder::new("ticket", "Ticket system management", CommandType::ChatInput)
				.contexts([InteractionContextType::Guild]),
			|command, subcommand| command.option(subcommand.build()),
		)
		.build()
}

pub async fn handle_command(
	interaction: &InteractionCreate,
	command_data: &CommandData,
	state: &BotState,
) -> miette::Result<()> {
	let subcommand = Subcommand::from_command(command_data)?;
	match subcommand.name {
		"setup" => setup(interaction, &subcommand, state).await,
		"close" => close(interaction, &subcommand, state).await,
		"add" | "remove" => change_member(interaction, &subcommand, state).await,
		"log" => set_log_channel(interaction, &subcommand, state).await,
		"limit" => set_limit(interaction, &subcommand, state).await,
		"category" => set_category(interaction, &subcommand, state).await,
		"staffadd" | "staffremove" => change_staff_role(interaction, command_data, &subcommand, state).await,
		_ => bail!("Unknown ticket subcommand: {}", subcommand.name),
	}
}

async fn setup(interaction: &InteractionCreate, subcommand: &Subcommand<'_>, state: &BotState) -> miette::Result<()> {
	if !member_is_manager(interaction) {
		return respond_ephemeral(state, interaction, MANAGE_GUILD_REQUIRED).await;
	}
	let Some(guild_id) = interaction.guild_id else {
		bail!("Ticket setup used outside of a guild");
	};
	let channel_id = subcommand.require_channel("channel")?;

	let standing = bot_guild_standing(state, guild_id).await?;
	if !standing.permissions.contains(Permissions::MANAGE_CHANNELS) {
		return respond_ephemeral(
			state,
			interaction,
			"I need `Manage Channels` permission to create ticket channels!",
		)
		.await;
	}
	let channel_permissions = bot_channel_permissions(state, guild_id, channel_id).await?;
	if !channel_permissions.contains(EMBED_CHANNEL_PERMISSIONS) {
		return respond_ephemeral(state, interaction, missing_embed_permissions_message(channel_id.mention())).await;
	}

	let embed = ticket_panel_embed(current_timestamp()?)?;
	let components = [open_ticket_button()];
	let send_result = state
		.http_client
		.create_message(channel_id)
		.embeds(&[embed])
		.components(&components)
		.await;
	match send_result {
		Ok(_) => {
			tracing::info!(channel = %channel_id, by = %interaction_author_name(interaction), "Ticket system set up");
			respond_ephemeral(
				state,
				interaction,
				format!("✅ Ticket system has been successfully set up in {}!", channel_id.mention()),
			)
			.await
		}
		Err(error) => {
			tracing::error!(source = ?error, "Error setting up ticket system");
			respond_ephemeral(
				state,
				interaction,
				"Failed to set up ticket system. Please check my permissions and try again.",
			)
			.await
		}
	}
}

async fn close(interaction: &InteractionCreate, subcommand: &Subcommand<'_>, state: &BotState) -> miette::Result<()> {
	let Some(channel_id) = interaction.channel.as_ref().map(|channel| channel.id) else {
		bail!("Ticket close used without a channel");
	};
	let request = CloseRequest {
		channel_id,
		actor_name: interaction_author_name(interaction),
		reason: subcommand.string("reason").map(String::from),
	};
	let ticket_settings = state.settings.read().await.tickets.clone();
	match state.tickets.close_ticket(request, &ticket_settings).await {
		Ok(_) => respond_public(state, interaction, CLOSING_MESSAGE).await,
		Err(TicketError::NotATicket) => respond_ephemeral(state, interaction, NOT_IN_TICKET_MESSAGE).await,
		Err(_) => respond_ephemeral(state, interaction, CLOSE_FAILED_MESSAGE).await,
	}
}

async fn change_member(
	interaction: &InteractionCreate,
	subcommand: &Subcommand<'_>,
	state: &BotState,
) -> miette::Result<()> {
	let Some(channel_id) = interaction.channel.as_ref().map(|channel| channel.id) else {
		bail!("Ticket {} used without a channel", subcommand.name);
	};
	let user_id = subcommand.require_user("user")?;
	let staff_roles = state.settings.read().await.tickets.staff_roles.clone();
	let actor_is_staff = member_is_staff(interaction, &staff_roles);

	let adding = subcommand.name == "add";
	let result = if adding {
		state.tickets.add_member(channel_id, actor_is_staff, user_id).await
	} else {
		state.tickets.remove_member(channel_id, actor_is_staff, user_id).await
	};

	let (verb, preposition, failure) = if adding {
		("add", "to", "Failed to add user to ticket.")
	} else {
		("remove", "from", "Failed to remove user from ticket.")
	};
	match result {
		Ok(()) => {
			tracing::info!(
				user = %user_id,
				channel = %channel_id,
				by = %interaction_author_name(interaction),
				action = verb,
				"Ticket membership changed"
			);
			let past_tense = if adding { "Added" } else { "Removed" };
			respond_public(
				state,
				interaction,
				format!("{} {} {} the ticket!", past_tense, user_id.mention(), preposition),
			)
			.await
		}
		Err(TicketError::NotATicket) => respond_ephemeral(state, interaction, NOT_IN_TICKET_MESSAGE).await,
		Err(TicketError::MissingPermission) => {
			respond_ephemeral(
				state,
				interaction,
				format!("You need staff permissions to {} users {} tickets!", verb, preposition),
			)
			.await
		}
		Err(_) => respond_ephemeral(state, interaction, failure).await,
	}
}

async fn set_log_channel(
	interaction: &InteractionCreate,
	subcommand: &Subcommand<'_>,
	state: &BotState,
) -> miette::Result<()> {
	if !member_is_manager(interaction) {
		return respond_ephemeral(state, interaction, MANAGE_GUILD_REQUIRED).await;
	}
	let Some(guild_id) = interaction.guild_id else {
		bail!("Ticket log used outside of a guild");
	};
	let channel_id = subcommand.require_channel("channel")?;
	let channel_permissions = bot_channel_permissions(state, guild_id, channel_id).await?;
	if !channel_permissions.contains(EMBED_CHANNEL_PERMISSIONS) {
		return respond_ephemeral(state, interaction, missing_embed_permissions_message(channel_id.mention())).await;
	}

	state.settings.write().await.tickets.log_channel = Some(channel_id);
	tracing::info!(channel = %channel_id, by = %interaction_author_name(interaction), "Ticket log channel set");
	respond_ephemeral(
		state,
		interaction,
		format!("Ticket logs will now be sent to {}!", channel_id.mention()),
	)
	.await
}

async fn set_limit(interaction: &InteractionCreate, subcommand: &Subcommand<'_>, state: &BotState) -> miette::Result<()> {
	if !member_is_manager(interaction) {
		return respond_ephemeral(state, interaction, MANAGE_GUILD_REQUIRED).await;
	}
	let Some(limit) = subcommand.integer("limit").and_then(|limit| usize::try_from(limit).ok()) else {
		bail!("Ticket limit used without a valid limit");
	};
	if limit == 0 {
		return respond_ephemeral(state, interaction, "The ticket limit must be at least 1!").await;
	}

	state.settings.write().await.tickets.limit = limit;
	tracing::info!(limit, by = %interaction_author_name(interaction), "Ticket limit set");
	let open = state.tickets.open_ticket_count().await;
	respond_ephemeral(
		state,
		interaction,
		format!("Up to {} tickets can now be open at once ({} currently open).", limit, open),
	)
	.await
}

async fn set_category(
	interaction: &InteractionCreate,
	subcommand: &Subcommand<'_>,
	state: &BotState,
) -> miette::Result<()> {
	if !member_is_manager(interaction) {
		return respond_ephemeral(state, interaction, MANAGE_GUILD_REQUIRED).await;
	}
	let category_id: Id<ChannelMarker> = subcommand.require_channel("category")?;
	state.settings.write().await.tickets.category = Some(category_id);
	tracing::info!(category = %category_id, by = %interaction_author_name(interaction), "Ticket category set");
	respond_ephemeral(
		state,
		interaction,
		format!("New tickets will now be created in {}!", category_id.mention()),
	)
	.await
}

async fn change_staff_role(
	interaction: &InteractionCreate,
	command_data: &CommandData,
	subcommand: &Subcommand<'_>,
	state: &BotState,
) -> miette::Result<()> {
	if !member_is_manager(interaction) {
		return respond_ephemeral(state, interaction, MANAGE_GUILD_REQUIRED).await;
	}
	let role_id = subcommand.require_role("role")?;
	let role_name = resolved_role_name(command_data, role_id);

	let message = {
		let mut settings = state.settings.write().await;
		let staff_roles = &mut settings.tickets.staff_roles;
		staff_role_change_message(subcommand.name == "staffadd", staff_roles, role_id, &role_name)
	};
	respond_ephemeral(state, interaction, message).await
}

/// The embed posted above the "Open Ticket" button
pub fn ticket_panel_embed(timestamp: Timestamp) -> miette::Result<Embed> {
	EmbedBuilder::new()
		.title("🎫 Support Ticket")
		.description(
			"Need help? Click the button below to create a support ticket!\n\nOur staff will assist you as soon as possible.",
		)
		.footer(EmbedFooterBuilder::new("You can only have 1 open ticket at a time!"))
		.color(INFO_COLOR)
		.timestamp(timestamp)
		.validate()
		.into_diagnostic()
		.map(|builder| builder.build())
}
