// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::state::BotState;
use crate::model::{add_staff_role, remove_staff_role};
use miette::bail;
use twilight_model::application::command::Command;
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::id::Id;
use twilight_model::id::marker::RoleMarker;

mod autorole;
mod bot;
mod chatbot;
mod info;
mod stock;
mod suggestion;
mod ticket;
mod welcome;

pub use ticket::{CLOSE_FAILED_MESSAGE, CLOSING_MESSAGE};
pub use welcome::{WelcomeTarget, welcome_embed_for_guild};

pub fn command_definitions() -> Vec<Command> {
	vec![
		autorole::command_definition(),
		bot::command_definition(),
		chatbot::command_definition(),
		info::command_definition(),
		stock::command_definition(),
		suggestion::command_definition(),
		ticket::command_definition(),
		welcome::command_definition(),
	]
}

pub async fn route_command(
	interaction: &InteractionCreate,
	command_data: &CommandData,
	state: &BotState,
) -> miette::Result<()> {
	match command_data.name.as_str() {
		"autorole" => autorole::handle_command(interaction, command_data, state).await,
		"bot" => bot::handle_command(interaction, command_data, state).await,
		"chatbot" => chatbot::handle_command(interaction, command_data, state).await,
		"info" => info::handle_command(interaction, command_data, state).await,
		"stock" => stock::handle_command(interaction, state).await,
		"suggestion" => suggestion::handle_command(interaction, command_data, state).await,
		"ticket" => ticket::handle_command(interaction, command_data, state).await,
		"welcome" => welcome::handle_command(interaction, command_data, state).await,
		_ => bail!("Unknown command encountered: {}\n{:?}", command_data.name, command_data),
	}
}

/// Adds or removes a staff role, returning the reply for the user who changed it.
pub fn staff_role_change_message(
	adding: bool,
	staff_roles: &mut Vec<Id<RoleMarker>>,
	role_id: Id<RoleMarker>,
	role_name: &str,
) -> String {
	match (adding, adding && add_staff_role(staff_roles, role_id)) {
		(true, true) => format!("`{}` is now a staff role!", role_name),
		(true, false) => format!("`{}` is already a staff role!", role_name),
		(false, _) => {
			if remove_staff_role(staff_roles, role_id) {
				format!("`{}` is no longer a staff role!", role_name)
			} else {
				format!("`{}` is not a staff role!", role_name)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn staff_role_changes() {
		let mut staff_roles = Vec::new();
		let role = Id::new(10);
		assert_eq!(
			staff_role_change_message(true, &mut staff_roles, role, "Helpers"),
			"`Helpers` is now a staff role!"
		);
		assert_eq!(
			staff_role_change_message(true, &mut staff_roles, role, "Helpers"),
			"`Helpers` is already a staff role!"
		);
		assert_eq!(staff_roles, [role]);
		assert_eq!(
			staff_role_change_message(false, &mut staff_roles, role, "Helpers"),
			"`Helpers` is no longer a staff role!"
		);
		assert_eq!(
			staff_role_change_message(false, &mut staff_roles, role, "Helpers"),
			"`Helpers` is not a staff role!"
		);
		assert!(staff_roles.is_empty());
	}

	#[test]
	fn command_names_are_unique() {
		let mut names: Vec<String> = command_definitions().into_iter().map(|command| command.name).collect();
		names.sort();
		names.dedup();
		assert_eq!(names.len(), 8);
	}
}
