// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::timestamp::current_timestamp;
use crate::discord::state::BotIdentity;
use miette::IntoDiagnostic;
use twilight_model::util::datetime::Timestamp;
use twilight_util::builder::embed::{EmbedAuthorBuilder, EmbedBuilder, ImageSource};

/// The color used by informational embeds
pub const INFO_COLOR: u32 = 0x0099ff;
pub const SUCCESS_COLOR: u32 = 0x00ff00;
pub const FAILURE_COLOR: u32 = 0xff0000;

/// Starts an informational embed with the bot as the author, the info color, and the current time.
pub fn bot_embed(bot: &BotIdentity) -> miette::Result<EmbedBuilder> {
	bot_embed_at(bot, current_timestamp()?)
}

pub fn bot_embed_at(bot: &BotIdentity, timestamp: Timestamp) -> miette::Result<EmbedBuilder> {
	let author = EmbedAuthorBuilder::new(bot.name.clone())
		.icon_url(ImageSource::url(&bot.avatar_url).into_diagnostic()?)
		.build();
	Ok(EmbedBuilder::new().author(author).color(INFO_COLOR).timestamp(timestamp))
}

pub fn yes_no(value: bool) -> &'static str {
	if value { "Yes" } else { "No" }
}

#[cfg(test)]
mod tests {
	use super::*;
	use twilight_model::id::Id;

	#[test]
	fn bot_author() {
		let bot = BotIdentity {
			id: Id::new(1),
			name: String::from("Harbor"),
			avatar_url: String::from("https://cdn.discordapp.com/embed/avatars/0.png"),
		};
		let embed = bot_embed_at(&bot, Timestamp::from_secs(1_700_000_000).unwrap())
			.unwrap()
			.build();
		let author = embed.author.unwrap();
		assert_eq!(author.name, "Harbor");
		assert_eq!(author.icon_url.as_deref(), Some(bot.avatar_url.as_str()));
		assert_eq!(embed.color, Some(INFO_COLOR));
	}
}
