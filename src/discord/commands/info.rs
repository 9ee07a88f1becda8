// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::state::BotState;
use crate::discord::utils::embeds::{bot_embed, yes_no};
use crate::discord::utils::options::Subcommand;
use crate::discord::utils::responses::{GUILD_ONLY, respond_embed, respond_ephemeral};
use crate::discord::utils::timestamp::{datetime_from_timestamp, relative_time, relative_time_from_id};
use crate::discord::utils::users::{display_discriminator, emoji_url, guild_icon_url, interaction_author_name, user_avatar_url};
use miette::{IntoDiagnostic, bail};
use twilight_mention::fmt::Mention;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::channel::ChannelType;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, EmojiMarker, RoleMarker, UserMarker};
use twilight_model::user::User;
use twilight_model::util::datetime::Timestamp;
use twilight_util::builder::command::{ChannelBuilder, CommandBuilder, StringBuilder, SubCommandBuilder, UserBuilder};
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder, ImageSource};

pub fn command_definition() -> Command {
	let user_name = UserBuilder::new("name", "Name of the user").build();
	let channel_name = ChannelBuilder::new("name", "Name of the channel").build();
	let avatar_name = UserBuilder::new("name", "Name of the user").build();
	let emoji_name = StringBuilder::new("name", "Name of the emoji").required(true).build();

	CommandBuilder::new("info", "Show various information", CommandType::ChatInput)
		.option(SubCommandBuilder::new("user", "Get user information").option(user_name).build())
		.option(SubCommandBuilder::new("channel", "Get channel information").option(channel_name).build())
		.option(SubCommandBuilder::new("guild", "Get guild information").build())
		.option(SubCommandBuilder::new("avatar", "Display avatar information").option(avatar_name).build())
		.option(SubCommandBuilder::new("emoji", "Display emoji information").option(emoji_name).build())
		.build()
}

pub async fn handle_command(
	interaction: &InteractionCreate,
	command_data: &CommandData,
	state: &BotState,
) -> miette::Result<()> {
	let subcommand = Subcommand::from_command(command_data)?;
	let embed = match subcommand.name {
		"user" => {
			let user = target_user(interaction, command_data, &subcommand)?;
			let member = target_member(interaction, command_data, user.id);
			user_embed(bot_embed(&state.bot_user)?, user, member.as_ref())?
		}
		"channel" => {
			let Some(channel) = target_channel(interaction, command_data, &subcommand, state) else {
				bail!("Channel info used without a channel to describe");
			};
			channel_embed(bot_embed(&state.bot_user)?, &channel)
		}
		"guild" => {
			let Some(guild_id) = interaction.guild_id else {
				return respond_ephemeral(state, interaction, GUILD_ONLY).await;
			};
			let Some(guild) = state.cache.guild(guild_id) else {
				bail!("Guild {} isn't in the cache", guild_id);
			};
			let channel_count = state.cache.guild_channels(guild_id).map_or(0, |channels| channels.len());
			let role_count = state.cache.guild_roles(guild_id).map_or(0, |roles| roles.len());
			let mut builder = bot_embed(&state.bot_user)?
				.title(format!("Guild Information: {}", guild.name()))
				.field(EmbedFieldBuilder::new("Name", guild.name()).inline())
				.field(EmbedFieldBuilder::new("ID", guild.id().to_string()).inline())
				.field(EmbedFieldBuilder::new("Owner", guild.owner_id().mention().to_string()).inline())
				.field(
					EmbedFieldBuilder::new("Members", guild.member_count().unwrap_or_default().to_string()).inline(),
				)
				.field(EmbedFieldBuilder::new("Channels", channel_count.to_string()).inline())
				.field(EmbedFieldBuilder::new("Roles", role_count.to_string()).inline())
				.field(EmbedFieldBuilder::new("Created", relative_time_from_id(guild.id())).inline())
				.field(
					EmbedFieldBuilder::new("Verification Level", u8::from(guild.verification_level()).to_string())
						.inline(),
				);
			if let Some(icon) = guild.icon() {
				builder = builder.thumbnail(ImageSource::url(guild_icon_url(guild.id(), icon, 256)).into_diagnostic()?);
			}
			if let Some(description) = guild.description() {
				builder = builder.field(EmbedFieldBuilder::new("Description", description));
			}
			builder
		}
		"avatar" => {
			let user = target_user(interaction, command_data, &subcommand)?;
			bot_embed(&state.bot_user)?
				.title(format!("Avatar: {}", user.name))
				.image(ImageSource::url(user_avatar_url(user, 512)).into_diagnostic()?)
				.description(format!("[Download Avatar]({})", user_avatar_url(user, 1024)))
		}
		"emoji" => {
			let Some(guild_id) = interaction.guild_id else {
				return respond_ephemeral(state, interaction, GUILD_ONLY).await;
			};
			let name = subcommand.require_string("name")?;
			let emojis = state
				.http_client
				.emojis(guild_id)
				.await
				.into_diagnostic()?
				.models()
				.await
				.into_diagnostic()?;
			let Some(emoji) = emojis.into_iter().find(|emoji| emoji.name == name) else {
				return respond_ephemeral(state, interaction, format!("Emoji \"{}\" not found in this server!", name))
					.await;
			};
			emoji_embed(bot_embed(&state.bot_user)?, &emoji.name, emoji.id, emoji.animated)?
		}
		_ => bail!("Unknown info subcommand: {}", subcommand.name),
	};

	let embed = embed.validate().into_diagnostic()?.build();
	tracing::info!(user = %interaction_author_name(interaction), "Info {} command used", subcommand.name);
	respond_embed(state, interaction, embed, false).await
}

/// The user named in the command, or the user who used it
fn target_user<'a>(
	interaction: &'a InteractionCreate,
	command_data: &'a CommandData,
	subcommand: &Subcommand<'_>,
) -> miette::Result<&'a User> {
	let resolved_user = subcommand.user("name").and_then(|user_id| {
		command_data
			.resolved
			.as_ref()
			.and_then(|resolved| resolved.users.get(&user_id))
	});
	match resolved_user.or_else(|| interaction.author()) {
		Some(user) => Ok(user),
		None => bail!("Info command used with no user to describe"),
	}
}

/// What's shown about a user's membership in the server
pub struct MemberSummary {
	pub joined_at: Option<Timestamp>,
	pub roles: Vec<Id<RoleMarker>>,
}

fn target_member(
	interaction: &InteractionCreate,
	command_data: &CommandData,
	user_id: Id<UserMarker>,
) -> Option<MemberSummary> {
	if let Some(member) = command_data
		.resolved
		.as_ref()
		.and_then(|resolved| resolved.members.get(&user_id))
	{
		return Some(MemberSummary {
			joined_at: member.joined_at,
			roles: member.roles.clone(),
		});
	}
	if interaction.author_id() == Some(user_id) {
		return interaction.member.as_ref().map(|member| MemberSummary {
			joined_at: member.joined_at,
			roles: member.roles.clone(),
		});
	}
	None
}

pub fn user_embed(builder: EmbedBuilder, user: &User, member: Option<&MemberSummary>) -> miette::Result<EmbedBuilder> {
	let discriminator = display_discriminator(user.discriminator).unwrap_or_else(|| String::from("None"));
	let mut builder = builder
		.title(format!("User Information: {}", user.name))
		.thumbnail(ImageSource::url(user_avatar_url(user, 256)).into_diagnostic()?)
		.field(EmbedFieldBuilder::new("Username", user.name.clone()).inline())
		.field(EmbedFieldBuilder::new("Discriminator", discriminator).inline())
		.field(EmbedFieldBuilder::new("ID", user.id.to_string()).inline())
		.field(EmbedFieldBuilder::new("Bot", yes_no(user.bot)).inline())
		.field(EmbedFieldBuilder::new("Created", relative_time_from_id(user.id)).inline());
	if let Some(member) = member {
		let joined = member
			.joined_at
			.as_ref()
			.and_then(datetime_from_timestamp)
			.map(relative_time)
			.unwrap_or_else(|| String::from("Unknown"));
		builder = builder
			.field(EmbedFieldBuilder::new("Joined Server", joined).inline())
			.field(EmbedFieldBuilder::new("Roles", member.roles.len().to_string()).inline());
	}
	Ok(builder)
}

/// What's shown about a channel
pub struct ChannelSummary {
	pub id: Id<ChannelMarker>,
	pub name: String,
	pub kind: ChannelType,
	pub topic: Option<String>,
}

/// Finds the channel named in the command (or the one it was used in), preferring the cache's full copy.
fn target_channel(
	interaction: &InteractionCreate,
	command_data: &CommandData,
	subcommand: &Subcommand<'_>,
	state: &BotState,
) -> Option<ChannelSummary> {
	let channel_id = subcommand
		.channel("name")
		.or_else(|| interaction.channel.as_ref().map(|channel| channel.id))?;
	if let Some(channel) = state.cache.channel(channel_id) {
		return Some(ChannelSummary {
			id: channel.id,
			name: channel.name.clone().unwrap_or_default(),
			kind: channel.kind,
			topic: channel.topic.clone(),
		});
	}
	if let Some(channel) = command_data
		.resolved
		.as_ref()
		.and_then(|resolved| resolved.channels.get(&channel_id))
	{
		return Some(ChannelSummary {
			id: channel.id,
			name: channel.name.clone(),
			kind: channel.kind,
			topic: None,
		});
	}
	interaction
		.channel
		.as_ref()
		.filter(|channel| channel.id == channel_id)
		.map(|channel| ChannelSummary {
			id: channel.id,
			name: channel.name.clone().unwrap_or_default(),
			kind: channel.kind,
			topic: channel.topic.clone(),
		})
}

pub fn channel_embed(builder: EmbedBuilder, channel: &ChannelSummary) -> EmbedBuilder {
	let builder = builder
		.title(format!("Channel Information: {}", channel.name))
		.field(EmbedFieldBuilder::new("Name", channel.name.clone()).inline())
		.field(EmbedFieldBuilder::new("Type", u8::from(channel.kind).to_string()).inline())
		.field(EmbedFieldBuilder::new("ID", channel.id.to_string()).inline())
		.field(EmbedFieldBuilder::new("Created", relative_time_from_id(channel.id)).inline());
	match channel.topic.as_deref().filter(|topic| !topic.is_empty()) {
		Some(topic) => builder.field(EmbedFieldBuilder::new("Topic", topic)),
		None => builder,
	}
}

pub fn emoji_embed(
	builder: EmbedBuilder,
	name: &str,
	emoji_id: Id<EmojiMarker>,
	animated: bool,
) -> miette::Result<EmbedBuilder> {
	let url = emoji_url(emoji_id, animated);
	Ok(builder
		.title(format!("Emoji Information: {}", name))
		.thumbnail(ImageSource::url(&url).into_diagnostic()?)
		.field(EmbedFieldBuilder::new("Name", name).inline())
		.field(EmbedFieldBuilder::new("ID", emoji_id.to_string()).inline())
		.field(EmbedFieldBuilder::new("Animated", yes_no(animated)).inline())
		.field(EmbedFieldBuilder::new("Created", relative_time_from_id(emoji_id)).inline())
		.field(EmbedFieldBuilder::new("URL", format!("[Link]({})", url)).inline())
		.description(format!("Usage: `<:{}:{}>`", name, emoji_id)))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn channel_fields() {
		let channel = ChannelSummary {
			id: Id::new(1 << 22),
			name: String::from("general"),
			kind: ChannelType::GuildText,
			topic: Some(String::from("Chat here")),
		};
		let embed = channel_embed(EmbedBuilder::new(), &channel).build();
		assert_eq!(embed.title.as_deref(), Some("Channel Information: general"));
		let fields: Vec<(&str, &str)> = embed
			.fields
			.iter()
			.map(|field| (field.name.as_str(), field.value.as_str()))
			.collect();
		assert_eq!(
			fields,
			[
				("Name", "general"),
				("Type", "0"),
				("ID", "4194304"),
				("Created", "<t:1420070400:R>"),
				("Topic", "Chat here"),
			]
		);

		let no_topic = ChannelSummary { topic: None, ..channel };
		assert_eq!(channel_embed(EmbedBuilder::new(), &no_topic).build().fields.len(), 4);
	}

	#[test]
	fn emoji_fields() {
		let embed = emoji_embed(EmbedBuilder::new(), "blobwave", Id::new(77), true)
			.unwrap()
			.build();
		assert_eq!(embed.description.as_deref(), Some("Usage: `<:blobwave:77>`"));
		assert_eq!(embed.fields[2].value, "Yes");
		assert_eq!(embed.fields[4].value, "[Link](https://cdn.discordapp.com/emojis/77.gif)");
	}
}
