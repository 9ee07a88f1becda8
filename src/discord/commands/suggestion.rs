// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::staff_role_change_message;
use crate::discord::state::{BotIdentity, BotState};
use crate::discord::utils::components::vote_buttons;
use crate::discord::utils::embeds::{FAILURE_COLOR, SUCCESS_COLOR, bot_embed, bot_embed_at};
use crate::discord::utils::options::{Subcommand, resolved_role_name};
use crate::discord::utils::permissions::{
	SUGGESTION_CHANNEL_PERMISSIONS, bot_channel_permissions, member_is_manager, member_is_staff, permission_list,
};
use crate::discord::utils::responses::{MANAGE_GUILD_REQUIRED, defer, respond_ephemeral, update_deferred};
use crate::discord::utils::timestamp::{current_timestamp, relative_time};
use crate::discord::utils::users::interaction_author_name;
use crate::suggestions::{SuggestionTally, Tally};
use chrono::{DateTime, Utc};
use miette::{IntoDiagnostic, bail};
use tokio::sync::Mutex;
use twilight_mention::fmt::Mention;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::channel::ChannelType;
use twilight_model::channel::message::embed::Embed;
use twilight_model::channel::thread::AutoArchiveDuration;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, MessageMarker, UserMarker};
use twilight_model::util::datetime::Timestamp;
use twilight_util::builder::command::{ChannelBuilder, CommandBuilder, RoleBuilder, StringBuilder, SubCommandBuilder};
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder};

/// Marks the title of a suggestion that hasn't been approved or rejected yet
const OPEN_SUGGESTION_TITLE_MARKER: &str = "New Suggestion";
const NO_REASON: &str = "No reason provided";

pub fn command_definition() -> Command {
	let text = StringBuilder::new("text", "Your suggestion").required(true).build();
	let enabled = StringBuilder::new("enabled", "Enable or disable")
		.required(true)
		.choices([("ON", "ON"), ("OFF", "OFF")])
		.build();
	let settings_channel = |description: &str| {
		ChannelBuilder::new("channel_name", description)
			.channel_types([ChannelType::GuildText])
			.build()
	};
	let resolution_options = |verb: &str| {
		[
			ChannelBuilder::new("channel_name", "Channel where the suggestion is")
				.channel_types([ChannelType::GuildText])
				.required(true)
				.build(),
			StringBuilder::new("message_id", "Message ID of the suggestion")
				.required(true)
				.build(),
			StringBuilder::new("reason", format!("Reason for {}", verb)).build(),
		]
	};
	let staff_role = |description: &str| RoleBuilder::new("role", description).required(true).build();

	let subcommands = [
		SubCommandBuilder::new("submit", "Submit a suggestion").option(text),
		SubCommandBuilder::new("status", "Enable or disable suggestion system").option(enabled),
		SubCommandBuilder::new("channel", "Set suggestion channel")
			.option(settings_channel("Channel for suggestions (leave empty to disable)")),
		SubCommandBuilder::new("appch", "Set approved suggestions channel")
			.option(settings_channel("Channel for approved suggestions")),
		SubCommandBuilder::new("rejch", "Set rejected suggestions channel")
			.option(settings_channel("Channel for rejected suggestions")),
		resolution_options("approval")
			.into_iter()
			.fold(SubCommandBuilder::new("approve", "Approve a suggestion"), |subcommand, option| {
				subcommand.option(option)
			}),
		resolution_options("rejection")
			.into_iter()
			.fold(SubCommandBuilder::new("reject", "Reject a suggestion"), |subcommand, option| {
				subcommand.option(option)
			}),
		SubCommandBuilder::new("staffadd", "Add a staff role").option(staff_role("Role to add as staff")),
		SubCommandBuilder::new("staffremove", "Remove a staff role").option(staff_role("Role to remove from staff")),
	];

	subcommands
		.into_iter()
		.fold(
			CommandBuilder::new(
				"suggestion",
				"Configure suggestion system or submit suggestions",
				CommandType::ChatInput,
			)
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
		"submit" => submit(interaction, &subcommand, state).await,
		"status" => set_status(interaction, &subcommand, state).await,
		"channel" => set_suggestion_channel(interaction, &subcommand, state).await,
		"appch" => set_resolution_channel(interaction, &subcommand, state, Resolution::Approved).await,
		"rejch" => set_resolution_channel(interaction, &subcommand, state, Resolution::Rejected).await,
		"approve" => resolve(interaction, &subcommand, state, Resolution::Approved).await,
		"reject" => resolve(interaction, &subcommand, state, Resolution::Rejected).await,
		"staffadd" | "staffremove" => {
			if !member_is_manager(interaction) {
				return respond_ephemeral(state, interaction, MANAGE_GUILD_REQUIRED).await;
			}
			let role_id = subcommand.require_role("role")?;
			let role_name = resolved_role_name(command_data, role_id);
			let message = {
				let mut settings = state.settings.write().await;
				staff_role_change_message(
					subcommand.name == "staffadd",
					&mut settings.suggestions.staff_roles,
					role_id,
					&role_name,
				)
			};
			respond_ephemeral(state, interaction, message).await
		}
		_ => bail!("Unknown suggestion subcommand: {}", subcommand.name),
	}
}

async fn submit(interaction: &InteractionCreate, subcommand: &Subcommand<'_>, state: &BotState) -> miette::Result<()> {
	let (enabled, channel) = {
		let settings = state.settings.read().await;
		(settings.suggestions.enabled, settings.suggestions.channel)
	};
	if !enabled {
		return respond_ephemeral(state, interaction, "Suggestion system is currently disabled!").await;
	}
	let Some(channel_id) = channel else {
		return respond_ephemeral(state, interaction, "No suggestion channel has been configured!").await;
	};
	if state.cache.channel(channel_id).is_none() {
		return respond_ephemeral(state, interaction, "Configured suggestion channel no longer exists!").await;
	}
	let Some(author_id) = interaction.author_id() else {
		bail!("Suggestion submitted with no author");
	};
	let text = subcommand.require_string("text")?;
	let author_name = interaction_author_name(interaction);

	defer(state, interaction, true).await?;

	let suggestion_id = state.suggestions.lock().await.next_suggestion_id();
	let submission = Submission {
		suggestion_id,
		channel_id,
		author_id,
		author_name: &author_name,
		text,
	};
	match post_suggestion(state, &submission).await {
		Ok(()) => {
			tracing::info!(suggestion = suggestion_id, author = %author_name, "Suggestion submitted");
			update_deferred(
				state,
				interaction,
				&format!(
					"Your suggestion has been submitted to {} with a discussion thread created!",
					channel_id.mention()
				),
			)
			.await
		}
		Err(error) => {
			tracing::error!(source = ?error, suggestion = suggestion_id, "Failed to submit suggestion");
			update_deferred(state, interaction, "Failed to submit your suggestion. Please try again later.").await
		}
	}
}

struct Submission<'a> {
	suggestion_id: u64,
	channel_id: Id<ChannelMarker>,
	author_id: Id<UserMarker>,
	author_name: &'a str,
	text: &'a str,
}

/// Posts the suggestion with its vote buttons, then opens its discussion thread.
async fn post_suggestion(state: &BotState, submission: &Submission<'_>) -> miette::Result<()> {
	let embed = submission_embed(
		bot_embed(&state.bot_user)?,
		submission.suggestion_id,
		submission.text,
		submission.author_id,
		Utc::now(),
	)?;
	let components = [vote_buttons(submission.suggestion_id, None)];
	let message = state
		.http_client
		.create_message(submission.channel_id)
		.embeds(&[embed])
		.components(&components)
		.await
		.into_diagnostic()?
		.model()
		.await
		.into_diagnostic()?;

	let thread_name = format!("Suggestion {} - {}", submission.suggestion_id, submission.author_name);
	let thread = state
		.http_client
		.create_thread_from_message(submission.channel_id, message.id, &thread_name)
		.auto_archive_duration(AutoArchiveDuration::Week)
		.await
		.into_diagnostic()?
		.model()
		.await
		.into_diagnostic()?;

	state
		.http_client
		.add_thread_member(thread.id, submission.author_id)
		.await
		.into_diagnostic()?;

	let thread_message = discussion_message(submission.suggestion_id, submission.author_id, submission.text);
	state
		.http_client
		.create_message(thread.id)
		.content(&thread_message)
		.await
		.into_diagnostic()?;
	Ok(())
}

async fn set_status(interaction: &InteractionCreate, subcommand: &Subcommand<'_>, state: &BotState) -> miette::Result<()> {
	if !member_is_manager(interaction) {
		return respond_ephemeral(state, interaction, MANAGE_GUILD_REQUIRED).await;
	}
	let Some(enabled) = subcommand.switch("enabled") else {
		bail!("Suggestion status used without a status");
	};
	state.settings.write().await.suggestions.enabled = enabled;
	let status = if enabled { "enabled" } else { "disabled" };
	tracing::info!(by = %interaction_author_name(interaction), "Suggestion system {}", status);
	respond_ephemeral(state, interaction, format!("Suggestion system is now {}!", status)).await
}

async fn set_suggestion_channel(
	interaction: &InteractionCreate,
	subcommand: &Subcommand<'_>,
	state: &BotState,
) -> miette::Result<()> {
	if !member_is_manager(interaction) {
		return respond_ephemeral(state, interaction, MANAGE_GUILD_REQUIRED).await;
	}
	let Some(channel_id) = subcommand.channel("channel_name") else {
		state.settings.write().await.suggestions.channel = None;
		return respond_ephemeral(state, interaction, "Suggestion channel has been disabled!").await;
	};
	let Some(guild_id) = interaction.guild_id else {
		bail!("Suggestion channel set outside of a guild");
	};

	let channel_permissions = bot_channel_permissions(state, guild_id, channel_id).await?;
	if !channel_permissions.contains(SUGGESTION_CHANNEL_PERMISSIONS) {
		return respond_ephemeral(
			state,
			interaction,
			format!(
				"I need the following permissions in {}:\n{}",
				channel_id.mention(),
				permission_list(SUGGESTION_CHANNEL_PERMISSIONS)
			),
		)
		.await;
	}

	state.settings.write().await.suggestions.channel = Some(channel_id);
	tracing::info!(channel = %channel_id, by = %interaction_author_name(interaction), "Suggestion channel set");
	respond_ephemeral(
		state,
		interaction,
		format!("Suggestions will now be sent to {}!", channel_id.mention()),
	)
	.await
}

async fn set_resolution_channel(
	interaction: &InteractionCreate,
	subcommand: &Subcommand<'_>,
	state: &BotState,
	resolution: Resolution,
) -> miette::Result<()> {
	if !member_is_manager(interaction) {
		return respond_ephemeral(state, interaction, MANAGE_GUILD_REQUIRED).await;
	}
	let channel_id = subcommand.channel("channel_name");
	{
		let mut settings = state.settings.write().await;
		match resolution {
			Resolution::Approved => settings.suggestions.approved_channel = channel_id,
			Resolution::Rejected => settings.suggestions.rejected_channel = channel_id,
		}
	}
	let message = match channel_id {
		Some(channel_id) => format!(
			"{} suggestions will now be sent to {}!",
			resolution.word(),
			channel_id.mention()
		),
		None => format!("{} suggestions channel has been disabled!", resolution.word()),
	};
	respond_ephemeral(state, interaction, message).await
}

async fn resolve(
	interaction: &InteractionCreate,
	subcommand: &Subcommand<'_>,
	state: &BotState,
	resolution: Resolution,
) -> miette::Result<()> {
	let (staff_roles, mirror_channel) = {
		let settings = state.settings.read().await;
		let mirror_channel = match resolution {
			Resolution::Approved => settings.suggestions.approved_channel,
			Resolution::Rejected => settings.suggestions.rejected_channel,
		};
		(settings.suggestions.staff_roles.clone(), mirror_channel)
	};
	if !member_is_staff(interaction, &staff_roles) {
		return respond_ephemeral(
			state,
			interaction,
			format!("You need staff permissions to {} suggestions!", resolution.verb()),
		)
		.await;
	}
	let Some(actor_id) = interaction.author_id() else {
		bail!("Suggestion {} used with no author", resolution.verb());
	};
	let channel_id = subcommand.require_channel("channel_name")?;
	let reason = subcommand.string("reason").unwrap_or(NO_REASON);

	let Some(message_id) = parse_message_id(subcommand.require_string("message_id")?) else {
		return respond_ephemeral(state, interaction, "Could not find that message!").await;
	};
	let message = match state.http_client.message(channel_id, message_id).await {
		Ok(response) => response.model().await.into_diagnostic()?,
		Err(error) => {
			tracing::debug!(source = ?error, "Couldn't fetch suggestion message");
			return respond_ephemeral(state, interaction, "Could not find that message!").await;
		}
	};
	let Some(original) = message
		.embeds
		.first()
		.filter(|embed| is_open_suggestion(embed))
	else {
		return respond_ephemeral(state, interaction, "That message is not a valid suggestion!").await;
	};

	let resolved = resolution_embed(
		original,
		resolution,
		actor_id,
		reason,
		&state.bot_user,
		current_timestamp()?,
	)?;

	let remove_buttons = async {
		state
			.http_client
			.update_message(channel_id, message_id)
			.embeds(Some(&[resolved.clone()]))
			.components(Some(&[]))
			.await
			.into_diagnostic()?;
		Ok::<_, miette::Report>(())
	};
	let suggestion_id = original.title.as_deref().and_then(parse_suggestion_id);
	let final_tally = close_voting(&state.suggestions, suggestion_id, remove_buttons).await?;

	if let Some(mirror_channel) = mirror_channel {
		if state.cache.channel(mirror_channel).is_some() {
			if let Err(error) = state.http_client.create_message(mirror_channel).embeds(&[resolved]).await {
				tracing::warn!(source = ?error, channel = %mirror_channel, "Failed to mirror resolved suggestion");
			}
		}
	}

	tracing::info!(
		suggestion_message = %message_id,
		by = %interaction_author_name(interaction),
		?final_tally,
		"Suggestion {}",
		resolution.word().to_lowercase()
	);
	respond_ephemeral(
		state,
		interaction,
		format!("Suggestion {} successfully!", resolution.word().to_lowercase()),
	)
	.await
}

/// Runs the edit that takes the vote buttons off a suggestion, then retires its votes.
///
/// If the edit fails the suggestion stays open and keeps its votes.
pub async fn close_voting<F>(
	suggestions: &Mutex<SuggestionTally>,
	suggestion_id: Option<u64>,
	remove_buttons: F,
) -> miette::Result<Option<Tally>>
where
	F: Future<Output = miette::Result<()>>,
{
	remove_buttons.await?;
	match suggestion_id {
		Some(suggestion_id) => Ok(Some(suggestions.lock().await.retire(suggestion_id))),
		None => Ok(None),
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Resolution {
	Approved,
	Rejected,
}

impl Resolution {
	pub fn word(&self) -> &'static str {
		match self {
			Self::Approved => "Approved",
			Self::Rejected => "Rejected",
		}
	}

	fn verb(&self) -> &'static str {
		match self {
			Self::Approved => "approve",
			Self::Rejected => "reject",
		}
	}

	fn emoji(&self) -> &'static str {
		match self {
			Self::Approved => "✅",
			Self::Rejected => "❌",
		}
	}

	fn color(&self) -> u32 {
		match self {
			Self::Approved => SUCCESS_COLOR,
			Self::Rejected => FAILURE_COLOR,
		}
	}
}

fn parse_message_id(value: &str) -> Option<Id<MessageMarker>> {
	value.trim().parse::<u64>().ok().and_then(Id::new_checked)
}

fn is_open_suggestion(embed: &Embed) -> bool {
	embed
		.title
		.as_deref()
		.is_some_and(|title| title.contains(OPEN_SUGGESTION_TITLE_MARKER))
}

/// Gets the suggestion ID out of a title like `📬 New Suggestion (ID: 12)`.
pub fn parse_suggestion_id(title: &str) -> Option<u64> {
	let (_, after) = title.split_once("(ID: ")?;
	let (id, _) = after.split_once(')')?;
	id.trim().parse().ok()
}

pub fn submission_embed(
	builder: EmbedBuilder,
	suggestion_id: u64,
	text: &str,
	author_id: Id<UserMarker>,
	submitted_at: DateTime<Utc>,
) -> miette::Result<Embed> {
	builder
		.title(format!("📬 New Suggestion (ID: {})", suggestion_id))
		.description(text)
		.field(EmbedFieldBuilder::new("Author", author_id.mention().to_string()).inline())
		.field(EmbedFieldBuilder::new("Submitted", relative_time(submitted_at)).inline())
		.validate()
		.into_diagnostic()
		.map(|builder| builder.build())
}

pub fn discussion_message(suggestion_id: u64, author_id: Id<UserMarker>, text: &str) -> String {
	format!(
		"**Discussion thread for suggestion {}**\n\nOriginal suggestion by {}:\n> {}\n\nFeel free to discuss this suggestion here! 💬",
		suggestion_id,
		author_id.mention(),
		text
	)
}

/// Rewrites a suggestion embed to show it's been approved or rejected, keeping its existing fields.
pub fn resolution_embed(
	original: &Embed,
	resolution: Resolution,
	actor_id: Id<UserMarker>,
	reason: &str,
	bot: &BotIdentity,
	timestamp: Timestamp,
) -> miette::Result<Embed> {
	let title = original.title.as_deref().unwrap_or_default();
	let title = format!("{} {}", resolution.emoji(), title.replace("📬 New", resolution.word()));
	let mut builder = bot_embed_at(bot, timestamp)?.title(title).color(resolution.color());
	if let Some(description) = original.description.as_deref() {
		builder = builder.description(description);
	}
	for field in original.fields.iter().cloned() {
		builder = builder.field(field);
	}
	builder
		.field(EmbedFieldBuilder::new("Status", format!("{} {}", resolution.emoji(), resolution.word())).inline())
		.field(EmbedFieldBuilder::new(format!("{} by", resolution.word()), actor_id.mention().to_string()).inline())
		.field(EmbedFieldBuilder::new("Reason", reason))
		.validate()
		.into_diagnostic()
		.map(|builder| builder.build())
}
