// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::state::BotState;
use crate::discord::utils::options::Subcommand;
use crate::discord::utils::permissions::{EMBED_CHANNEL_PERMISSIONS, bot_channel_permissions, member_is_manager};
use crate::discord::utils::responses::{MANAGE_GUILD_REQUIRED, missing_embed_permissions_message, respond_ephemeral};
use crate::discord::utils::timestamp::current_timestamp;
use crate::discord::utils::users::{interaction_author_name, user_avatar_url};
use crate::model::{WelcomeEmbedSettings, WelcomeTemplateValues, parse_hex_color, render_welcome_description};
use miette::{IntoDiagnostic, bail};
use twilight_mention::fmt::Mention;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::channel::ChannelType;
use twilight_model::channel::message::embed::Embed;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::id::Id;
use twilight_model::id::marker::{GuildMarker, UserMarker};
use twilight_model::util::datetime::Timestamp;
use twilight_util::builder::command::{ChannelBuilder, CommandBuilder, StringBuilder, SubCommandBuilder};
use twilight_util::builder::embed::{EmbedBuilder, EmbedFooterBuilder, ImageSource};
use twilight_validate::embed::{DESCRIPTION_LENGTH, FOOTER_TEXT_LENGTH};

const PLACEHOLDER_HELP: &str = "Welcome message description updated!\n\nAvailable placeholders:\n• `{user}` - Mentions the user\n• `{username}` - User's username\n• `{server}` - Server name\n• `{membercount}` - Total member count";

pub fn command_definition() -> Command {
	let on_off = |name: &str, description: &str| {
		StringBuilder::new(name, description)
			.required(true)
			.choices([("ON", "ON"), ("OFF", "OFF")])
			.build()
	};
	let channel = ChannelBuilder::new("channel", "Channel for welcome messages")
		.channel_types([ChannelType::GuildText])
		.required(true)
		.build();
	let description = StringBuilder::new(
		"content",
		"Description content (use {user}, {username}, {server}, {membercount})",
	)
	.required(true)
	.build();
	let color = StringBuilder::new("hex-code", "Hex color code (e.g., #ff0000)")
		.required(true)
		.build();
	let footer = StringBuilder::new("content", "Footer content").required(true).build();
	let image = StringBuilder::new("url", "Image URL").required(true).build();

	let subcommands = [
		SubCommandBuilder::new("status", "Enable or disable welcome message")
			.option(on_off("status", "Enable or disable")),
		SubCommandBuilder::new("preview", "Preview the configured welcome message"),
		SubCommandBuilder::new("channel", "Set welcome channel").option(channel),
		SubCommandBuilder::new("desc", "Set embed description").option(description),
		SubCommandBuilder::new("thumbnail", "Configure embed thumbnail")
			.option(on_off("status", "Show user avatar as thumbnail")),
		SubCommandBuilder::new("color", "Set embed color").option(color),
		SubCommandBuilder::new("footer", "Set embed footer").option(footer),
		SubCommandBuilder::new("image", "Set embed image").option(image),
	];

	subcommands
		.into_iter()
		.fold(
			CommandBuilder::new("welcome", "Setup welcome message system", CommandType::ChatInput)
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
	if subcommand.name == "preview" {
		return preview(interaction, state).await;
	}
	if !member_is_manager(interaction) {
		return respond_ephemeral(state, interaction, MANAGE_GUILD_REQUIRED).await;
	}

	let reply = match subcommand.name {
		"status" => {
			let Some(enabled) = subcommand.switch("status") else {
				bail!("Welcome status used without a status");
			};
			state.settings.write().await.welcome.enabled = enabled;
			let status = if enabled { "enabled" } else { "disabled" };
			tracing::info!(by = %interaction_author_name(interaction), "Welcome system {}", status);
			format!("Welcome message system is now {}!", status)
		}
		"channel" => {
			let Some(guild_id) = interaction.guild_id else {
				bail!("Welcome channel set outside of a guild");
			};
			let channel_id = subcommand.require_channel("channel")?;
			let channel_permissions = bot_channel_permissions(state, guild_id, channel_id).await?;
			if !channel_permissions.contains(EMBED_CHANNEL_PERMISSIONS) {
				missing_embed_permissions_message(channel_id.mention())
			} else {
				state.settings.write().await.welcome.channel = Some(channel_id);
				tracing::info!(channel = %channel_id, by = %interaction_author_name(interaction), "Welcome channel set");
				format!("Welcome messages will now be sent to {}!", channel_id.mention())
			}
		}
		"desc" => {
			let description = subcommand.require_string("content")?;
			if description.chars().count() > DESCRIPTION_LENGTH {
				format!("The description can be at most {} characters long!", DESCRIPTION_LENGTH)
			} else {
				state.settings.write().await.welcome.embed.description = description.to_string();
				String::from(PLACEHOLDER_HELP)
			}
		}
		"thumbnail" => {
			let Some(thumbnail) = subcommand.switch("status") else {
				bail!("Welcome thumbnail used without a status");
			};
			state.settings.write().await.welcome.embed.thumbnail = thumbnail;
			format!(
				"Welcome message thumbnail {}!",
				if thumbnail { "enabled" } else { "disabled" }
			)
		}
		"color" => {
			let hex = subcommand.require_string("hex-code")?;
			match parse_hex_color(hex) {
				Some(color) => {
					state.settings.write().await.welcome.embed.color = color;
					format!("Welcome message color updated to {}!", hex)
				}
				None => String::from("Invalid hex color! Please use format like #ff0000"),
			}
		}
		"footer" => {
			let footer = subcommand.require_string("content")?;
			if footer.chars().count() > FOOTER_TEXT_LENGTH {
				format!("The footer can be at most {} characters long!", FOOTER_TEXT_LENGTH)
			} else {
				state.settings.write().await.welcome.embed.footer = Some(footer.to_string());
				String::from("Welcome message footer updated!")
			}
		}
		"image" => {
			let url = subcommand.require_string("url")?;
			if is_valid_image_url(url) {
				state.settings.write().await.welcome.embed.image = Some(url.to_string());
				String::from("Welcome message image updated!")
			} else {
				String::from("Invalid URL provided!")
			}
		}
		_ => bail!("Unknown welcome subcommand: {}", subcommand.name),
	};
	respond_ephemeral(state, interaction, reply).await
}

async fn preview(interaction: &InteractionCreate, state: &BotState) -> miette::Result<()> {
	let welcome = state.settings.read().await.welcome.clone();
	if !welcome.enabled {
		return respond_ephemeral(state, interaction, "Welcome message system is not enabled!").await;
	}
	let Some(channel_id) = welcome.channel else {
		return respond_ephemeral(state, interaction, "No welcome channel has been configured!").await;
	};
	if state.cache.channel(channel_id).is_none() {
		return respond_ephemeral(state, interaction, "Configured welcome channel no longer exists!").await;
	}
	let (Some(guild_id), Some(user)) = (interaction.guild_id, interaction.author()) else {
		bail!("Welcome preview used outside of a guild");
	};

	let target = WelcomeTarget {
		user_id: user.id,
		username: user.name.clone(),
		avatar_url: user_avatar_url(user, 256),
	};
	let send_result = match welcome_embed_for_guild(state, guild_id, &welcome.embed, &target) {
		Ok(embed) => state
			.http_client
			.create_message(channel_id)
			.embeds(&[embed])
			.await
			.into_diagnostic()
			.map(|_| ()),
		Err(error) => Err(error),
	};
	match send_result {
		Ok(()) => {
			tracing::info!(by = %user.name, "Welcome preview sent");
			respond_ephemeral(
				state,
				interaction,
				format!("Welcome preview sent to {}!", channel_id.mention()),
			)
			.await
		}
		Err(error) => {
			tracing::warn!(source = ?error, "Failed to send welcome preview");
			respond_ephemeral(state, interaction, "Failed to send preview message!").await
		}
	}
}

/// The member a welcome message is for
pub struct WelcomeTarget {
	pub user_id: Id<UserMarker>,
	pub username: String,
	pub avatar_url: String,
}

/// Builds the welcome embed using the guild's name and member count from the cache.
pub fn welcome_embed_for_guild(
	state: &BotState,
	guild_id: Id<GuildMarker>,
	settings: &WelcomeEmbedSettings,
	target: &WelcomeTarget,
) -> miette::Result<Embed> {
	let (server, member_count) = match state.cache.guild(guild_id) {
		Some(guild) => (guild.name().to_string(), guild.member_count().unwrap_or_default()),
		None => (String::from("the server"), 0),
	};
	welcome_embed(settings, target, &server, member_count, current_timestamp()?)
}

pub fn welcome_embed(
	settings: &WelcomeEmbedSettings,
	target: &WelcomeTarget,
	server: &str,
	member_count: u64,
	timestamp: Timestamp,
) -> miette::Result<Embed> {
	let user_mention = target.user_id.mention().to_string();
	let values = WelcomeTemplateValues {
		user_mention: &user_mention,
		username: &target.username,
		server,
		member_count,
	};
	let mut builder = EmbedBuilder::new()
		.title(format!("Welcome to {}!", server))
		.description(render_welcome_description(&settings.description, &values))
		.color(settings.color)
		.timestamp(timestamp);
	if settings.thumbnail {
		builder = builder.thumbnail(ImageSource::url(&target.avatar_url).into_diagnostic()?);
	}
	if let Some(footer) = settings.footer.as_ref() {
		builder = builder.footer(EmbedFooterBuilder::new(footer.clone()));
	}
	if let Some(image) = settings.image.as_ref() {
		builder = builder.image(ImageSource::url(image).into_diagnostic()?);
	}
	builder.validate().into_diagnostic().map(|builder| builder.build())
}

/// Whether a URL can be used as an embed image.
pub fn is_valid_image_url(url: &str) -> bool {
	reqwest::Url::parse(url).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn target() -> WelcomeTarget {
		WelcomeTarget {
			user_id: Id::new(42),
			username: String::from("alice"),
			avatar_url: String::from("https://cdn.discordapp.com/embed/avatars/1.png"),
		}
	}

	fn timestamp() -> Timestamp {
		Timestamp::from_secs(1_700_000_000).unwrap()
	}

	#[test]
	fn default_welcome_embed() {
		let embed = welcome_embed(&WelcomeEmbedSettings::default(), &target(), "Harbor", 10, timestamp()).unwrap();
		assert_eq!(embed.title.as_deref(), Some("Welcome to Harbor!"));
		assert_eq!(
			embed.description.as_deref(),
			Some("Welcome to Harbor! We're glad to have you here, <@42>!")
		);
		assert_eq!(embed.color, Some(0x0099ff));
		assert_eq!(
			embed.thumbnail.map(|thumbnail| thumbnail.url).as_deref(),
			Some("https://cdn.discordapp.com/embed/avatars/1.png")
		);
		assert_eq!(
			embed.footer.map(|footer| footer.text).as_deref(),
			Some("Welcome to our community!")
		);
		assert!(embed.image.is_none());
	}

	#[test]
	fn customized_welcome_embed() {
		let settings = WelcomeEmbedSettings {
			description: String::from("{username} is member {membercount}"),
			thumbnail: false,
			color: 0xff0000,
			footer: None,
			image: Some(String::from("https://example.com/banner.png")),
		};
		let embed = welcome_embed(&settings, &target(), "Harbor", 1200, timestamp()).unwrap();
		assert_eq!(embed.description.as_deref(), Some("alice is member 1200"));
		assert!(embed.thumbnail.is_none());
		assert!(embed.footer.is_none());
		assert_eq!(
			embed.image.map(|image| image.url).as_deref(),
			Some("https://example.com/banner.png")
		);
	}

	#[test]
	fn image_urls() {
		assert!(is_valid_image_url("https://example.com/banner.png"));
		assert!(!is_valid_image_url("not a url"));
		assert!(!is_valid_image_url("ftp://example.com/banner.png"));
	}
}
