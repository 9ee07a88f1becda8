// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::state::BotState;
use crate::discord::utils::permissions::bot_guild_standing;
use miette::IntoDiagnostic;
use twilight_model::gateway::payload::incoming::MemberAdd;

pub async fn assign_autorole(member_add: &MemberAdd, state: &BotState) -> miette::Result<()> {
	let Some(role_id) = state.settings.read().await.autorole.active_role() else {
		return Ok(());
	};
	let standing = bot_guild_standing(state, member_add.guild_id).await?;
	let Some(role) = standing.role(role_id) else {
		state.settings.write().await.autorole.disable();
		tracing::warn!(role = %role_id, "Configured autorole no longer exists; autorole disabled");
		return Ok(());
	};
	if !standing.can_assign(role.position) {
		tracing::warn!(role = %role.name, "Can't assign the autorole; check my permissions and role position");
		return Ok(());
	}

	let user = &member_add.member.user;
	state
		.http_client
		.add_guild_member_role(member_add.guild_id, user.id, role_id)
		.await
		.into_diagnostic()?;
	tracing::info!(user = %user.name, role = %role.name, "Autorole assigned");
	Ok(())
}
