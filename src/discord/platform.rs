// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::utils::components::close_ticket_button;
use super::utils::embeds::{FAILURE_COLOR, SUCCESS_COLOR};
use super::utils::timestamp::current_timestamp;
use crate::tickets::{ChannelRequest, ClosureNotice, MemberAccess, TicketLogEntry, TicketPlatform};
use async_trait::async_trait;
use miette::IntoDiagnostic;
use std::sync::Arc;
use twilight_cache_inmemory::DefaultInMemoryCache;
use twilight_http::client::Client;
use twilight_mention::fmt::Mention;
use twilight_model::channel::ChannelType;
use twilight_model::channel::permission_overwrite::{
	PermissionOverwrite as ChannelOverwrite, PermissionOverwriteType as ChannelOverwriteType,
};
use twilight_model::channel::message::embed::Embed;
use twilight_model::guild::Permissions;
use twilight_model::http::permission_overwrite::{PermissionOverwrite, PermissionOverwriteType};
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, UserMarker};
use twilight_model::util::datetime::Timestamp;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder};

/// What ticket members (the owner and anyone added) can do in the ticket channel
pub const TICKET_MEMBER_PERMISSIONS: Permissions = Permissions::VIEW_CHANNEL
	.union(Permissions::SEND_MESSAGES)
	.union(Permissions::READ_MESSAGE_HISTORY);

/// Ticket operations carried out against Discord
pub struct DiscordTicketPlatform {
	http_client: Arc<Client>,
	cache: Arc<DefaultInMemoryCache>,
	bot_user_id: Id<UserMarker>,
}

impl DiscordTicketPlatform {
	pub fn new(http_client: Arc<Client>, cache: Arc<DefaultInMemoryCache>, bot_user_id: Id<UserMarker>) -> Self {
		Self {
			http_client,
			cache,
			bot_user_id,
		}
	}

	async fn send_embed(&self, channel_id: Id<ChannelMarker>, embed: Embed) -> miette::Result<()> {
		self.http_client
			.create_message(channel_id)
			.embeds(&[embed])
			.await
			.into_diagnostic()?;
		Ok(())
	}
}

#[async_trait]
impl TicketPlatform for DiscordTicketPlatform {
	fn channel_name(&self, channel_id: Id<ChannelMarker>) -> Option<String> {
		self.cache.channel(channel_id).and_then(|channel| channel.name.clone())
	}

	async fn provision_channel(&self, request: &ChannelRequest) -> miette::Result<Id<ChannelMarker>> {
		let overwrites = ticket_channel_overwrites(request.guild_id, request.owner, self.bot_user_id);
		let mut create_request = self
			.http_client
			.create_guild_channel(request.guild_id, &request.name)
			.kind(ChannelType::GuildText)
			.permission_overwrites(&overwrites);
		if let Some(category) = request.category {
			create_request = create_request.parent_id(category);
		}
		let channel = create_request.await.into_diagnostic()?.model().await.into_diagnostic()?;
		Ok(channel.id)
	}

	async fn post_introduction(&self, channel_id: Id<ChannelMarker>, owner: Id<UserMarker>) -> miette::Result<()> {
		let content = owner.mention().to_string();
		let embed = introduction_embed(owner, current_timestamp()?)?;
		let components = [close_ticket_button()];
		self.http_client
			.create_message(channel_id)
			.content(&content)
			.embeds(&[embed])
			.components(&components)
			.await
			.into_diagnostic()?;
		Ok(())
	}

	async fn post_closure_notice(&self, notice: &ClosureNotice) -> miette::Result<()> {
		let embed = closure_notice_embed(notice, current_timestamp()?)?;
		self.send_embed(notice.channel_id, embed).await
	}

	async fn post_log(&self, log_channel: Id<ChannelMarker>, entry: &TicketLogEntry) -> miette::Result<()> {
		let embed = log_entry_embed(entry, current_timestamp()?)?;
		self.send_embed(log_channel, embed).await
	}

	async fn set_member_access(
		&self,
		channel_id: Id<ChannelMarker>,
		user_id: Id<UserMarker>,
		access: MemberAccess,
	) -> miette::Result<()> {
		let overwrite = member_overwrite(user_id, access);
		self.http_client
			.update_channel_permission(channel_id, &overwrite)
			.await
			.into_diagnostic()?;
		Ok(())
	}

	async fn delete_channel(&self, channel_id: Id<ChannelMarker>) -> miette::Result<()> {
		self.http_client.delete_channel(channel_id).await.into_diagnostic()?;
		Ok(())
	}
}

/// Hides the channel from everyone except the owner and the bot.
pub fn ticket_channel_overwrites(
	guild_id: Id<GuildMarker>,
	owner: Id<UserMarker>,
	bot_user_id: Id<UserMarker>,
) -> Vec<ChannelOverwrite> {
	vec![
		ChannelOverwrite {
			allow: Permissions::empty(),
			deny: Permissions::VIEW_CHANNEL,
			id: guild_id.cast(),
			kind: ChannelOverwriteType::Role,
		},
		ChannelOverwrite {
			allow: TICKET_MEMBER_PERMISSIONS,
			deny: Permissions::empty(),
			id: owner.cast(),
			kind: ChannelOverwriteType::Member,
		},
		ChannelOverwrite {
			allow: TICKET_MEMBER_PERMISSIONS | Permissions::MANAGE_CHANNELS,
			deny: Permissions::empty(),
			id: bot_user_id.cast(),
			kind: ChannelOverwriteType::Member,
		},
	]
}

/// Used when editing an existing channel's overwrites
pub fn member_overwrite(user_id: Id<UserMarker>, access: MemberAccess) -> PermissionOverwrite {
	let (allow, deny) = match access {
		MemberAccess::Granted => (Some(TICKET_MEMBER_PERMISSIONS), None),
		MemberAccess::Revoked => (None, Some(TICKET_MEMBER_PERMISSIONS)),
	};
	PermissionOverwrite {
		allow,
		deny,
		id: user_id.cast(),
		kind: PermissionOverwriteType::Member,
	}
}

pub fn introduction_embed(owner: Id<UserMarker>, timestamp: Timestamp) -> miette::Result<Embed> {
	let description = format!(
		"Hello {}, welcome to your support ticket!\n\nPlease describe your issue and our staff will assist you shortly.",
		owner.mention()
	);
	EmbedBuilder::new()
		.title("🎫 Support Ticket")
		.description(description)
		.color(SUCCESS_COLOR)
		.timestamp(timestamp)
		.validate()
		.into_diagnostic()
		.map(|builder| builder.build())
}

pub fn closure_notice_embed(notice: &ClosureNotice, timestamp: Timestamp) -> miette::Result<Embed> {
	EmbedBuilder::new()
		.title("🔒 Ticket Closed")
		.description(format!("This ticket has been closed by {}", notice.closed_by))
		.field(EmbedFieldBuilder::new("Reason", notice.reason.clone()))
		.color(FAILURE_COLOR)
		.timestamp(timestamp)
		.validate()
		.into_diagnostic()
		.map(|builder| builder.build())
}

pub fn log_entry_embed(entry: &TicketLogEntry, timestamp: Timestamp) -> miette::Result<Embed> {
	let builder = match entry {
		TicketLogEntry::Opened {
			channel_id,
			user_id,
			user_name,
		} => EmbedBuilder::new()
			.title("📋 New Ticket Created")
			.description(format!("Ticket created by {}", user_name))
			.field(EmbedFieldBuilder::new("User", user_id.mention().to_string()).inline())
			.field(EmbedFieldBuilder::new("Channel", channel_id.mention().to_string()).inline())
			.color(SUCCESS_COLOR),
		TicketLogEntry::Closed(notice) => EmbedBuilder::new()
			.title("📋 Ticket Closed")
			.description(format!("Ticket {} was closed", notice.channel_name))
			.field(EmbedFieldBuilder::new("Channel", notice.channel_name.clone()).inline())
			.field(EmbedFieldBuilder::new("Closed by", notice.closed_by.clone()).inline())
			.field(EmbedFieldBuilder::new("Reason", notice.reason.clone()))
			.color(FAILURE_COLOR),
	};
	builder
		.timestamp(timestamp)
		.validate()
		.into_diagnostic()
		.map(|builder| builder.build())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn timestamp() -> Timestamp {
		Timestamp::from_secs(1_700_000_000).unwrap()
	}

	#[test]
	fn channel_overwrites() {
		let overwrites = ticket_channel_overwrites(Id::new(10), Id::new(20), Id::new(30));
		assert_eq!(overwrites.len(), 3);

		let everyone = &overwrites[0];
		assert_eq!(everyone.id.get(), 10);
		assert_eq!(everyone.kind, ChannelOverwriteType::Role);
		assert_eq!(everyone.allow, Permissions::empty());
		assert_eq!(everyone.deny, Permissions::VIEW_CHANNEL);

		let owner = &overwrites[1];
		assert_eq!(owner.id.get(), 20);
		assert_eq!(owner.kind, ChannelOverwriteType::Member);
		assert_eq!(owner.allow, TICKET_MEMBER_PERMISSIONS);
		assert!(owner.deny.is_empty());

		let bot = &overwrites[2];
		assert_eq!(bot.id.get(), 30);
		assert!(bot.allow.contains(Permissions::MANAGE_CHANNELS | Permissions::SEND_MESSAGES));
		assert!(bot.deny.is_empty());
	}

	#[test]
	fn revoked_members_are_denied() {
		let overwrite = member_overwrite(Id::new(5), MemberAccess::Revoked);
		assert_eq!(overwrite.allow, None);
		assert_eq!(overwrite.deny, Some(TICKET_MEMBER_PERMISSIONS));
		assert_eq!(overwrite.kind, PermissionOverwriteType::Member);
	}

	#[test]
	fn ticket_embeds() {
		let intro = introduction_embed(Id::new(42), timestamp()).unwrap();
		assert_eq!(intro.title.as_deref(), Some("🎫 Support Ticket"));
		assert!(intro.description.unwrap().starts_with("Hello <@42>, welcome"));

		let notice = ClosureNotice {
			channel_id: Id::new(7),
			channel_name: String::from("ticket-alice"),
			closed_by: String::from("bob"),
			reason: String::from("Resolved"),
		};
		let closed = closure_notice_embed(&notice, timestamp()).unwrap();
		assert_eq!(closed.description.as_deref(), Some("This ticket has been closed by bob"));
		assert_eq!(closed.color, Some(FAILURE_COLOR));

		let log = log_entry_embed(&TicketLogEntry::Closed(notice), timestamp()).unwrap();
		let field_names: Vec<&str> = log.fields.iter().map(|field| field.name.as_str()).collect();
		assert_eq!(field_names, ["Channel", "Closed by", "Reason"]);

		let opened = TicketLogEntry::Opened {
			channel_id: Id::new(7),
			user_id: Id::new(42),
			user_name: String::from("alice"),
		};
		let log = log_entry_embed(&opened, timestamp()).unwrap();
		assert_eq!(log.fields[1].value, "<#7>");
		assert!(log.fields.iter().all(|field| field.inline));
	}
}
