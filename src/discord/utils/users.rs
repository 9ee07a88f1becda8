// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::id::Id;
use twilight_model::id::marker::{EmojiMarker, GuildMarker, UserMarker};
use twilight_model::user::User;
use twilight_model::util::ImageHash;

const CDN_BASE: &str = "https://cdn.discordapp.com";

/// Gets the URL of a user's avatar, falling back to Discord's default avatar if they haven't set one.
pub fn avatar_url(user_id: Id<UserMarker>, avatar: Option<&ImageHash>, discriminator: u16, size: u16) -> String {
	match avatar {
		Some(hash) => {
			let extension = if hash.is_animated() { "gif" } else { "png" };
			format!(
				"{}/avatars/{}/{}.{}?size={}",
				CDN_BASE, user_id, hash, extension, size
			)
		}
		None => {
			// Users on the new username system have no discriminator and get their default avatar from their ID.
			let index = if discriminator == 0 {
				(user_id.get() >> 22) % 6
			} else {
				u64::from(discriminator % 5)
			};
			format!("{}/embed/avatars/{}.png", CDN_BASE, index)
		}
	}
}

pub fn user_avatar_url(user: &User, size: u16) -> String {
	avatar_url(user.id, user.avatar.as_ref(), user.discriminator, size)
}

pub fn guild_icon_url(guild_id: Id<GuildMarker>, icon: &ImageHash, size: u16) -> String {
	let extension = if icon.is_animated() { "gif" } else { "png" };
	format!("{}/icons/{}/{}.{}?size={}", CDN_BASE, guild_id, icon, extension, size)
}

pub fn emoji_url(emoji_id: Id<EmojiMarker>, animated: bool) -> String {
	let extension = if animated { "gif" } else { "png" };
	format!("{}/emojis/{}.{}", CDN_BASE, emoji_id, extension)
}

/// Gets the username of whoever sent an interaction.
pub fn interaction_author_name(interaction: &InteractionCreate) -> String {
	interaction
		.author()
		.map(|user| user.name.clone())
		.unwrap_or_else(|| String::from("Unknown user"))
}

/// Gets the discriminator as shown to users, if the user still has one.
pub fn display_discriminator(discriminator: u16) -> Option<String> {
	if discriminator == 0 {
		None
	} else {
		Some(format!("{:04}", discriminator))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn custom_avatars() {
		let hash = ImageHash::parse(b"a_1269e74af4df7417b13759eae50c83dc").unwrap();
		assert_eq!(
			avatar_url(Id::new(80351110224678912), Some(&hash), 0, 256),
			"https://cdn.discordapp.com/avatars/80351110224678912/a_1269e74af4df7417b13759eae50c83dc.gif?size=256"
		);
		let hash = ImageHash::parse(b"1269e74af4df7417b13759eae50c83dc").unwrap();
		assert!(avatar_url(Id::new(1), Some(&hash), 0, 512).ends_with("83dc.png?size=512"));
	}

	#[test]
	fn default_avatars() {
		assert_eq!(
			avatar_url(Id::new(80351110224678912), None, 1337, 256),
			"https://cdn.discordapp.com/embed/avatars/2.png"
		);
		let id = Id::new(5 << 22);
		assert_eq!(avatar_url(id, None, 0, 256), "https://cdn.discordapp.com/embed/avatars/5.png");
	}

	#[test]
	fn discriminators() {
		assert_eq!(display_discriminator(0), None);
		assert_eq!(display_discriminator(7), Some(String::from("0007")));
	}
}
