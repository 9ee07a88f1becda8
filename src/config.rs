// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use kdl::{KdlDocument, KdlNode, KdlValue};
use miette::{Diagnostic, IntoDiagnostic, Result};
use std::fmt;
use tokio::fs::read_to_string;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, RoleMarker};

pub const DEFAULT_CONFIG_PATH: &str = "config.kdl";
pub const DEFAULT_TICKET_LIMIT: usize = 5;
pub const DEFAULT_CHAT_COMPLETION_URL: &str = "https://text.pollinations.ai/";
pub const DEFAULT_CHAT_MODEL: &str = "openai";
pub const DEFAULT_STOCK_URL: &str = "https://api.joshlei.com/v2/growagarden/stock";

pub async fn parse_config(config_path: &str) -> Result<ConfigData> {
	let config_file_contents = read_to_string(config_path).await.into_diagnostic()?;
	parse_config_document(&config_file_contents)
}

/// Parses the contents of a KDL config document.
pub fn parse_config_document(contents: &str) -> Result<ConfigData> {
	let document: KdlDocument = contents.parse()?;

	let discord = section(&document, "discord");
	let Some(bot_token) = string_value(discord, "discord", "bot-token")? else {
		return Err(ConfigError::Missing("discord.bot-token").into());
	};

	let logging = section(&document, "logging");
	let level = string_value(logging, "logging", "level")?.unwrap_or_else(|| String::from("info"));
	let webhook_url = string_value(logging, "logging", "webhook-url")?;

	let tickets = section(&document, "tickets");
	let limit = match integer_value(tickets, "tickets", "limit")? {
		Some(limit) => usize::try_from(limit).map_err(|_| ConfigError::Invalid {
			key: String::from("tickets.limit"),
			expected: "a non-negative integer",
		})?,
		None => DEFAULT_TICKET_LIMIT,
	};
	let tickets = TicketConfig {
		limit,
		category: id_value(tickets, "tickets", "category")?,
		log_channel: id_value(tickets, "tickets", "log-channel")?,
		staff_roles: id_values(tickets, "tickets", "staff-role")?,
	};

	let suggestions = section(&document, "suggestions");
	let suggestions = SuggestionConfig {
		channel: id_value(suggestions, "suggestions", "channel")?,
		approved_channel: id_value(suggestions, "suggestions", "approved-channel")?,
		rejected_channel: id_value(suggestions, "suggestions", "rejected-channel")?,
		staff_roles: id_values(suggestions, "suggestions", "staff-role")?,
	};

	let apis = section(&document, "apis");
	let apis = ApiConfig {
		chat_completion_url: string_value(apis, "apis", "chat-completion-url")?
			.unwrap_or_else(|| String::from(DEFAULT_CHAT_COMPLETION_URL)),
		chat_model: string_value(apis, "apis", "chat-model")?.unwrap_or_else(|| String::from(DEFAULT_CHAT_MODEL)),
		stock_url: string_value(apis, "apis", "stock-url")?.unwrap_or_else(|| String::from(DEFAULT_STOCK_URL)),
	};

	Ok(ConfigData {
		discord: DiscordConfig { bot_token },
		logging: LoggingConfig { level, webhook_url },
		tickets,
		suggestions,
		apis,
	})
}

#[derive(Debug)]
pub struct ConfigData {
	pub discord: DiscordConfig,
	pub logging: LoggingConfig,
	pub tickets: TicketConfig,
	pub suggestions: SuggestionConfig,
	pub apis: ApiConfig,
}

pub struct DiscordConfig {
	pub bot_token: String,
}

impl fmt::Debug for DiscordConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DiscordConfig").field("bot_token", &"<redacted>").finish()
	}
}

#[derive(Debug)]
pub struct LoggingConfig {
	/// Filter directive used when `RUST_LOG` isn't set
	pub level: String,
	/// Discord webhook to which log lines are mirrored
	pub webhook_url: Option<String>,
}

/// Initial values for the ticket settings
#[derive(Debug)]
pub struct TicketConfig {
	pub limit: usize,
	pub category: Option<Id<ChannelMarker>>,
	pub log_channel: Option<Id<ChannelMarker>>,
	pub staff_roles: Vec<Id<RoleMarker>>,
}

/// Initial values for the suggestion settings
#[derive(Debug)]
pub struct SuggestionConfig {
	pub channel: Option<Id<ChannelMarker>>,
	pub approved_channel: Option<Id<ChannelMarker>>,
	pub rejected_channel: Option<Id<ChannelMarker>>,
	pub staff_roles: Vec<Id<RoleMarker>>,
}

#[derive(Debug)]
pub struct ApiConfig {
	pub chat_completion_url: String,
	pub chat_model: String,
	pub stock_url: String,
}

#[derive(Debug, Diagnostic)]
pub enum ConfigError {
	Missing(&'static str),
	Invalid { key: String, expected: &'static str },
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Missing(key) => write!(f, "required config value `{}` is missing", key),
			Self::Invalid { key, expected } => write!(f, "config value `{}` must be {}", key, expected),
		}
	}
}

impl std::error::Error for ConfigError {}

fn section<'a>(document: &'a KdlDocument, name: &str) -> Option<&'a KdlDocument> {
	document.get(name).and_then(KdlNode::children)
}

fn first_argument<'a>(section: Option<&'a KdlDocument>, key: &str) -> Option<&'a KdlValue> {
	section.and_then(|section| section.get_arg(key))
}

fn string_value(section: Option<&KdlDocument>, section_name: &str, key: &str) -> Result<Option<String>, ConfigError> {
	match first_argument(section, key) {
		Some(value) => match value.as_string() {
			Some(value) => Ok(Some(value.to_string())),
			None => Err(ConfigError::Invalid {
				key: format!("{}.{}", section_name, key),
				expected: "a string",
			}),
		},
		None => Ok(None),
	}
}

fn integer_value(section: Option<&KdlDocument>, section_name: &str, key: &str) -> Result<Option<i128>, ConfigError> {
	match first_argument(section, key) {
		Some(value) => match value.as_integer() {
			Some(value) => Ok(Some(value)),
			None => Err(ConfigError::Invalid {
				key: format!("{}.{}", section_name, key),
				expected: "an integer",
			}),
		},
		None => Ok(None),
	}
}

fn snowflake<T>(value: &KdlValue, section_name: &str, key: &str) -> Result<Id<T>, ConfigError> {
	value
		.as_integer()
		.and_then(|value| u64::try_from(value).ok())
		.and_then(Id::new_checked)
		.ok_or_else(|| ConfigError::Invalid {
			key: format!("{}.{}", section_name, key),
			expected: "a Discord ID",
		})
}

fn id_value<T>(section: Option<&KdlDocument>, section_name: &str, key: &str) -> Result<Option<Id<T>>, ConfigError> {
	match first_argument(section, key) {
		Some(value) => snowflake(value, section_name, key).map(Some),
		None => Ok(None),
	}
}

/// Collects the first argument of every node named `key`, so repeated nodes build a list
fn id_values<T>(section: Option<&KdlDocument>, section_name: &str, key: &str) -> Result<Vec<Id<T>>, ConfigError> {
	let Some(section) = section else {
		return Ok(Vec::new());
	};
	let mut ids = Vec::new();
	for node in section.nodes().iter().filter(|node| node.name().value() == key) {
		for entry in node.entries().iter().filter(|entry| entry.name().is_none()) {
			ids.push(snowflake(entry.value(), section_name, key)?);
		}
	}
	Ok(ids)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_full_document() {
		let config = parse_config_document(
			r#"
			discord {
				bot-token "abc.def"
			}
			logging {
				level "debug"
				webhook-url "https://discord.com/api/webhooks/1/token"
			}
			tickets {
				limit 3
				category 1001
				log-channel 1002
				staff-role 2001
				staff-role 2002
			}
			suggestions {
				channel 3001
				staff-role 4001 4002
			}
			apis {
				chat-model "mistral"
			}
			"#,
		)
		.unwrap();

		assert_eq!(config.discord.bot_token, "abc.def");
		assert_eq!(config.logging.level, "debug");
		assert!(config.logging.webhook_url.is_some());
		assert_eq!(config.tickets.limit, 3);
		assert_eq!(config.tickets.category, Some(Id::new(1001)));
		assert_eq!(config.tickets.log_channel, Some(Id::new(1002)));
		assert_eq!(config.tickets.staff_roles, vec![Id::new(2001), Id::new(2002)]);
		assert_eq!(config.suggestions.channel, Some(Id::new(3001)));
		assert_eq!(config.suggestions.approved_channel, None);
		assert_eq!(config.suggestions.staff_roles, vec![Id::new(4001), Id::new(4002)]);
		assert_eq!(config.apis.chat_model, "mistral");
		assert_eq!(config.apis.stock_url, DEFAULT_STOCK_URL);
	}

	#[test]
	fn applies_defaults() {
		let config = parse_config_document("discord {\n\tbot-token \"token\"\n}\n").unwrap();
		assert_eq!(config.logging.level, "info");
		assert_eq!(config.logging.webhook_url, None);
		assert_eq!(config.tickets.limit, DEFAULT_TICKET_LIMIT);
		assert!(config.tickets.staff_roles.is_empty());
		assert_eq!(config.apis.chat_completion_url, DEFAULT_CHAT_COMPLETION_URL);
	}

	#[test]
	fn requires_bot_token() {
		let error = parse_config_document("logging {\n\tlevel \"info\"\n}\n").unwrap_err();
		assert!(error.to_string().contains("discord.bot-token"));
	}

	#[test]
	fn rejects_invalid_ids() {
		let error = parse_config_document("discord {\n\tbot-token \"token\"\n}\ntickets {\n\tcategory 0\n}\n").unwrap_err();
		assert!(error.to_string().contains("tickets.category"));

		let error =
			parse_config_document("discord {\n\tbot-token \"token\"\n}\ntickets {\n\tlimit \"many\"\n}\n").unwrap_err();
		assert!(error.to_string().contains("tickets.limit"));
	}

	#[test]
	fn redacts_token_in_debug_output() {
		let config = DiscordConfig {
			bot_token: String::from("secret"),
		};
		assert!(!format!("{:?}", config).contains("secret"));
	}
}
