// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::ConfigData;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, RoleMarker};

pub const DEFAULT_WELCOME_DESCRIPTION: &str = "Welcome to {server}! We're glad to have you here, {user}!";
pub const DEFAULT_WELCOME_COLOR: u32 = 0x0099ff;
pub const DEFAULT_WELCOME_FOOTER: &str = "Welcome to our community!";

/// All of the runtime-mutable settings for the bot's features.
#[derive(Clone, Debug)]
pub struct Settings {
	pub tickets: TicketSettings,
	pub suggestions: SuggestionSettings,
	pub autorole: AutoroleSettings,
	pub welcome: WelcomeSettings,
	pub chatbot: ChatbotSettings,
}

impl Settings {
	/// Builds the initial settings from the config file. Anything not in the config file starts at its default.
	pub fn from_config(config: &ConfigData) -> Self {
		let tickets = TicketSettings {
			log_channel: config.tickets.log_channel,
			limit: config.tickets.limit,
			staff_roles: config.tickets.staff_roles.clone(),
			category: config.tickets.category,
		};
		let suggestions = SuggestionSettings {
			enabled: true,
			channel: config.suggestions.channel,
			approved_channel: config.suggestions.approved_channel,
			rejected_channel: config.suggestions.rejected_channel,
			staff_roles: config.suggestions.staff_roles.clone(),
		};
		Self {
			tickets,
			suggestions,
			autorole: AutoroleSettings::default(),
			welcome: WelcomeSettings::default(),
			chatbot: ChatbotSettings::default(),
		}
	}
}

#[derive(Clone, Debug)]
pub struct TicketSettings {
	/// The channel to which ticket open/close entries are posted.
	pub log_channel: Option<Id<ChannelMarker>>,
	/// The maximum number of tickets that may be open at once.
	pub limit: usize,
	/// Roles whose members may add and remove users from tickets.
	pub staff_roles: Vec<Id<RoleMarker>>,
	/// The category under which new ticket channels are created.
	pub category: Option<Id<ChannelMarker>>,
}

impl Default for TicketSettings {
	fn default() -> Self {
		Self {
			log_channel: None,
			limit: crate::config::DEFAULT_TICKET_LIMIT,
			staff_roles: Vec::new(),
			category: None,
		}
	}
}

#[derive(Clone, Debug)]
pub struct SuggestionSettings {
	pub enabled: bool,
	pub channel: Option<Id<ChannelMarker>>,
	pub approved_channel: Option<Id<ChannelMarker>>,
	pub rejected_channel: Option<Id<ChannelMarker>>,
	/// Roles whose members may approve and reject suggestions.
	pub staff_roles: Vec<Id<RoleMarker>>,
}

impl Default for SuggestionSettings {
	fn default() -> Self {
		Self {
			enabled: true,
			channel: None,
			approved_channel: None,
			rejected_channel: None,
			staff_roles: Vec::new(),
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct AutoroleSettings {
	pub enabled: bool,
	pub role: Option<Id<RoleMarker>>,
}

impl AutoroleSettings {
	/// Gets the role to assign, if the feature is enabled and a role is set.
	pub fn active_role(&self) -> Option<Id<RoleMarker>> {
		if self.enabled { self.role } else { None }
	}

	pub fn disable(&mut self) {
		self.enabled = false;
		self.role = None;
	}
}

#[derive(Clone, Debug, Default)]
pub struct WelcomeSettings {
	pub enabled: bool,
	pub channel: Option<Id<ChannelMarker>>,
	pub embed: WelcomeEmbedSettings,
}

impl WelcomeSettings {
	/// Gets the channel to welcome new members in, if the feature is enabled and a channel is set.
	pub fn active_channel(&self) -> Option<Id<ChannelMarker>> {
		if self.enabled { self.channel } else { None }
	}

	pub fn disable(&mut self) {
		self.enabled = false;
		self.channel = None;
	}
}

#[derive(Clone, Debug)]
pub struct WelcomeEmbedSettings {
	/// Description template. See [render_welcome_description] for the placeholders.
	pub description: String,
	/// Whether the new member's avatar is shown as the thumbnail.
	pub thumbnail: bool,
	pub color: u32,
	pub footer: Option<String>,
	pub image: Option<String>,
}

impl Default for WelcomeEmbedSettings {
	fn default() -> Self {
		Self {
			description: String::from(DEFAULT_WELCOME_DESCRIPTION),
			thumbnail: true,
			color: DEFAULT_WELCOME_COLOR,
			footer: Some(String::from(DEFAULT_WELCOME_FOOTER)),
			image: None,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct ChatbotSettings {
	pub enabled: bool,
	pub channel: Option<Id<ChannelMarker>>,
}

impl ChatbotSettings {
	pub fn active_channel(&self) -> Option<Id<ChannelMarker>> {
		if self.enabled { self.channel } else { None }
	}
}

/// Adds a role to a staff role list. Returns false if the role was already in the list.
pub fn add_staff_role(staff_roles: &mut Vec<Id<RoleMarker>>, role: Id<RoleMarker>) -> bool {
	if staff_roles.contains(&role) {
		return false;
	}
	staff_roles.push(role);
	true
}

/// Removes a role from a staff role list. Returns false if the role wasn't in the list.
pub fn remove_staff_role(staff_roles: &mut Vec<Id<RoleMarker>>, role: Id<RoleMarker>) -> bool {
	let original_len = staff_roles.len();
	staff_roles.retain(|staff_role| *staff_role != role);
	staff_roles.len() != original_len
}

/// Values substituted into the welcome description template
pub struct WelcomeTemplateValues<'a> {
	pub user_mention: &'a str,
	pub username: &'a str,
	pub server: &'a str,
	pub member_count: u64,
}

/// Fills in the `{user}`, `{username}`, `{server}`, and `{membercount}` placeholders.
pub fn render_welcome_description(template: &str, values: &WelcomeTemplateValues<'_>) -> String {
	template
		.replace("{user}", values.user_mention)
		.replace("{username}", values.username)
		.replace("{server}", values.server)
		.replace("{membercount}", &values.member_count.to_string())
}

/// Parses `#RGB` or `#RRGGBB` into an embed color.
pub fn parse_hex_color(hex: &str) -> Option<u32> {
	let digits = hex.strip_prefix('#')?;
	if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
		return None;
	}
	match digits.len() {
		6 => u32::from_str_radix(digits, 16).ok(),
		3 => {
			let expanded: String = digits.chars().flat_map(|c| [c, c]).collect();
			u32::from_str_radix(&expanded, 16).ok()
		}
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hex_colors() {
		assert_eq!(parse_hex_color("#ff0000"), Some(0xff0000));
		assert_eq!(parse_hex_color("#0099FF"), Some(0x0099ff));
		assert_eq!(parse_hex_color("#f0a"), Some(0xff00aa));
		assert_eq!(parse_hex_color("ff0000"), None);
		assert_eq!(parse_hex_color("#ff00"), None);
		assert_eq!(parse_hex_color("#gg0000"), None);
		assert_eq!(parse_hex_color("#+f0000"), None);
	}

	#[test]
	fn welcome_placeholders() {
		let values = WelcomeTemplateValues {
			user_mention: "<@42>",
			username: "alice",
			server: "Harbor",
			member_count: 1200,
		};
		assert_eq!(
			render_welcome_description(DEFAULT_WELCOME_DESCRIPTION, &values),
			"Welcome to Harbor! We're glad to have you here, <@42>!"
		);
		assert_eq!(
			render_welcome_description("{username} is member #{membercount} ({user}, {user})", &values),
			"alice is member #1200 (<@42>, <@42>)"
		);
	}

	#[test]
	fn staff_role_list() {
		let mut roles = Vec::new();
		assert!(add_staff_role(&mut roles, Id::new(5)));
		assert!(!add_staff_role(&mut roles, Id::new(5)));
		assert!(add_staff_role(&mut roles, Id::new(6)));
		assert!(remove_staff_role(&mut roles, Id::new(5)));
		assert!(!remove_staff_role(&mut roles, Id::new(5)));
		assert_eq!(roles, vec![Id::new(6)]);
	}

	#[test]
	fn disabling_features_clears_targets() {
		let mut autorole = AutoroleSettings {
			enabled: true,
			role: Some(Id::new(9)),
		};
		assert_eq!(autorole.active_role(), Some(Id::new(9)));
		autorole.disable();
		assert_eq!(autorole.active_role(), None);
		assert_eq!(autorole.role, None);

		let welcome = WelcomeSettings {
			enabled: false,
			channel: Some(Id::new(3)),
			embed: WelcomeEmbedSettings::default(),
		};
		assert_eq!(welcome.active_channel(), None);
	}
}
