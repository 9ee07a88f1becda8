// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, UserMarker};

/// Channel, message, and permission operations the ticket lifecycle needs from the chat platform
#[async_trait]
pub trait TicketPlatform: Send + Sync + 'static {
	/// Looks up the current name of a channel, if it's known.
	fn channel_name(&self, channel_id: Id<ChannelMarker>) -> Option<String>;

	/// Creates a text channel visible only to the ticket owner and the bot.
	async fn provision_channel(&self, request: &ChannelRequest) -> miette::Result<Id<ChannelMarker>>;

	/// Posts the opening message (with the close button) in a new ticket channel.
	async fn post_introduction(&self, channel_id: Id<ChannelMarker>, owner: Id<UserMarker>) -> miette::Result<()>;

	async fn post_closure_notice(&self, notice: &ClosureNotice) -> miette::Result<()>;

	async fn post_log(&self, log_channel: Id<ChannelMarker>, entry: &TicketLogEntry) -> miette::Result<()>;

	async fn set_member_access(
		&self,
		channel_id: Id<ChannelMarker>,
		user_id: Id<UserMarker>,
		access: MemberAccess,
	) -> miette::Result<()>;

	async fn delete_channel(&self, channel_id: Id<ChannelMarker>) -> miette::Result<()>;
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChannelRequest {
	pub guild_id: Id<GuildMarker>,
	pub name: String,
	pub owner: Id<UserMarker>,
	pub category: Option<Id<ChannelMarker>>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClosureNotice {
	pub channel_id: Id<ChannelMarker>,
	pub channel_name: String,
	pub closed_by: String,
	pub reason: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TicketLogEntry {
	Opened {
		channel_id: Id<ChannelMarker>,
		user_id: Id<UserMarker>,
		user_name: String,
	},
	Closed(ClosureNotice),
}

/// Whether a user is being let into or shut out of a ticket channel
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MemberAccess {
	Granted,
	Revoked,
}
