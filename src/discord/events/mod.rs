// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::state::BotState;
use twilight_model::gateway::payload::incoming::MemberAdd;

mod autorole;
mod welcome;

/// Runs the member join features. Each feature's failure is logged without stopping the others.
pub async fn handle_member_add(member_add: &MemberAdd, state: &BotState) {
	let (autorole_result, welcome_result) = tokio::join!(
		autorole::assign_autorole(member_add, state),
		welcome::send_welcome(member_add, state)
	);
	if let Err(error) = autorole_result {
		tracing::error!(source = ?error, user = %member_add.member.user.name, "Failed to assign autorole");
	}
	if let Err(error) = welcome_result {
		tracing::error!(source = ?error, user = %member_add.member.user.name, "Failed to send welcome message");
	}
}
