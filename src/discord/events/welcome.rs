// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::commands::{WelcomeTarget, welcome_embed_for_guild};
use crate::discord::state::BotState;
use crate::discord::utils::permissions::{EMBED_CHANNEL_PERMISSIONS, bot_channel_permissions};
use crate::discord::utils::users::user_avatar_url;
use miette::IntoDiagnostic;
use twilight_model::gateway::payload::incoming::MemberAdd;

pub async fn send_welcome(member_add: &MemberAdd, state: &BotState) -> miette::Result<()> {
	let (channel_id, embed_settings) = {
		let settings = state.settings.read().await;
		let Some(channel_id) = settings.welcome.active_channel() else {
			return Ok(());
		};
		(channel_id, settings.welcome.embed.clone())
	};
	if state.cache.channel(channel_id).is_none() {
		state.settings.write().await.welcome.disable();
		tracing::warn!(channel = %channel_id, "Welcome channel no longer exists; welcome messages disabled");
		return Ok(());
	}
	let permissions = bot_channel_permissions(state, member_add.guild_id, channel_id).await?;
	if !permissions.contains(EMBED_CHANNEL_PERMISSIONS) {
		tracing::warn!(channel = %channel_id, "Missing permissions to send welcome messages");
		return Ok(());
	}

	let user = &member_add.member.user;
	let target = WelcomeTarget {
		user_id: user.id,
		username: user.name.clone(),
		avatar_url: user_avatar_url(user, 256),
	};
	let embed = welcome_embed_for_guild(state, member_add.guild_id, &embed_settings, &target)?;
	state
		.http_client
		.create_message(channel_id)
		.embeds(&[embed])
		.await
		.into_diagnostic()?;
	tracing::info!(user = %user.name, channel = %channel_id, "Welcome message sent");
	Ok(())
}
