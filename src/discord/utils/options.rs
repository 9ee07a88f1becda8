// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use miette::bail;
use twilight_model::application::interaction::application_command::{
	CommandData, CommandDataOption, CommandOptionValue,
};
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, RoleMarker, UserMarker};

/// The subcommand a command was invoked with, along with its options
pub struct Subcommand<'a> {
	pub name: &'a str,
	options: &'a [CommandDataOption],
}

impl<'a> Subcommand<'a> {
	/// Gets the subcommand from a command made up only of subcommands.
	pub fn from_command(command_data: &'a CommandData) -> miette::Result<Self> {
		let Some(subcommand_data) = command_data.options.first() else {
			bail!("`/{}` command invoked with no subcommand", command_data.name);
		};
		let CommandOptionValue::SubCommand(options) = &subcommand_data.value else {
			bail!(
				"Command data is malformed; expected `/{} {}` to get subcommand data",
				command_data.name,
				subcommand_data.name
			);
		};
		Ok(Self {
			name: subcommand_data.name.as_str(),
			options,
		})
	}

	fn value(&self, name: &str) -> Option<&'a CommandOptionValue> {
		self.options
			.iter()
			.find(|option| option.name == name)
			.map(|option| &option.value)
	}

	pub fn string(&self, name: &str) -> Option<&'a str> {
		match self.value(name) {
			Some(CommandOptionValue::String(value)) => Some(value.as_str()),
			_ => None,
		}
	}

	pub fn integer(&self, name: &str) -> Option<i64> {
		match self.value(name) {
			Some(CommandOptionValue::Integer(value)) => Some(*value),
			_ => None,
		}
	}

	pub fn user(&self, name: &str) -> Option<Id<UserMarker>> {
		match self.value(name) {
			Some(CommandOptionValue::User(value)) => Some(*value),
			_ => None,
		}
	}

	pub fn channel(&self, name: &str) -> Option<Id<ChannelMarker>> {
		match self.value(name) {
			Some(CommandOptionValue::Channel(value)) => Some(*value),
			_ => None,
		}
	}

	pub fn role(&self, name: &str) -> Option<Id<RoleMarker>> {
		match self.value(name) {
			Some(CommandOptionValue::Role(value)) => Some(*value),
			_ => None,
		}
	}

	/// Gets an `ON`/`OFF` choice option as a bool.
	pub fn switch(&self, name: &str) -> Option<bool> {
		self.string(name).map(|value| value == "ON")
	}

	pub fn require_string(&self, name: &str) -> miette::Result<&'a str> {
		match self.string(name) {
			Some(value) => Ok(value),
			None => bail!("Command data is malformed; expected `{}` to have required option `{}`", self.name, name),
		}
	}

	pub fn require_user(&self, name: &str) -> miette::Result<Id<UserMarker>> {
		match self.user(name) {
			Some(value) => Ok(value),
			None => bail!("Command data is malformed; expected `{}` to have required option `{}`", self.name, name),
		}
	}

	pub fn require_channel(&self, name: &str) -> miette::Result<Id<ChannelMarker>> {
		match self.channel(name) {
			Some(value) => Ok(value),
			None => bail!("Command data is malformed; expected `{}` to have required option `{}`", self.name, name),
		}
	}

	pub fn require_role(&self, name: &str) -> miette::Result<Id<RoleMarker>> {
		match self.role(name) {
			Some(value) => Ok(value),
			None => bail!("Command data is malformed; expected `{}` to have required option `{}`", self.name, name),
		}
	}
}

/// Gets the name of a role from the command's resolved data, falling back to its ID.
pub fn resolved_role_name(command_data: &CommandData, role_id: Id<RoleMarker>) -> String {
	command_data
		.resolved
		.as_ref()
		.and_then(|resolved| resolved.roles.get(&role_id))
		.map(|role| role.name.clone())
		.unwrap_or_else(|| role_id.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use twilight_model::application::command::CommandType;

	fn option(name: &str, value: CommandOptionValue) -> CommandDataOption {
		CommandDataOption {
			name: name.to_string(),
			value,
		}
	}

	fn command(subcommand: &str, options: Vec<CommandDataOption>) -> CommandData {
		CommandData {
			guild_id: None,
			id: Id::new(1),
			kind: CommandType::ChatInput,
			name: String::from("ticket"),
			options: vec![option(subcommand, CommandOptionValue::SubCommand(options))],
			resolved: None,
			target_id: None,
		}
	}

	#[test]
	fn reads_subcommand_options() {
		let data = command(
			"close",
			vec![
				option("reason", CommandOptionValue::String(String::from("done"))),
				option("count", CommandOptionValue::Integer(3)),
				option("user", CommandOptionValue::User(Id::new(7))),
				option("status", CommandOptionValue::String(String::from("OFF"))),
			],
		);
		let subcommand = Subcommand::from_command(&data).unwrap();
		assert_eq!(subcommand.name, "close");
		assert_eq!(subcommand.string("reason"), Some("done"));
		assert_eq!(subcommand.integer("count"), Some(3));
		assert_eq!(subcommand.user("user"), Some(Id::new(7)));
		assert_eq!(subcommand.switch("status"), Some(false));
		assert_eq!(subcommand.string("count"), None);
		assert_eq!(subcommand.channel("missing"), None);
		assert!(subcommand.require_role("role").is_err());
		assert_eq!(resolved_role_name(&data, Id::new(9)), "9");
	}

	#[test]
	fn rejects_missing_subcommand() {
		let mut data = command("close", Vec::new());
		data.options.clear();
		assert!(Subcommand::from_command(&data).is_err());
	}
}
