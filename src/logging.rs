// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::LoggingConfig;
use crate::text::{MESSAGE_LENGTH_LIMIT, truncate_with_ellipsis};
use chrono::{DateTime, Utc};
use miette::{IntoDiagnostic, bail};
use std::fmt::{self, Write};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};
use twilight_http::client::Client;
use twilight_model::id::Id;
use twilight_model::id::marker::WebhookMarker;

pub const WEBHOOK_USERNAME: &str = "Bot Logger";

const FORWARDED_TARGET: &str = "harbor_bot";
const CODE_FENCE_OVERHEAD: usize = "```\n\n```".len();

/// Sets up the global tracing subscriber: console output, plus a Discord webhook if one is configured.
///
/// `RUST_LOG` takes priority over the configured level.
pub fn init_logging(config: &LoggingConfig, http_client: Arc<Client>) -> miette::Result<()> {
	let env_filter = match EnvFilter::try_from_default_env() {
		Ok(filter) => filter,
		Err(_) => EnvFilter::try_new(&config.level).into_diagnostic()?,
	};

	let webhook_layer = match &config.webhook_url {
		Some(url) => Some(WebhookLayer::spawn(url, http_client)?),
		None => None,
	};

	Registry::default()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.with(webhook_layer)
		.try_init()
		.into_diagnostic()?;

	Ok(())
}

/// Forwards the bot's own INFO, WARN, and ERROR events to a Discord webhook.
///
/// Events are queued and posted by a background task, so logging never waits on Discord.
pub struct WebhookLayer {
	sender: mpsc::UnboundedSender<String>,
}

impl WebhookLayer {
	pub fn spawn(webhook_url: &str, http_client: Arc<Client>) -> miette::Result<Self> {
		let (webhook_id, token) = match twilight_util::link::webhook::parse(webhook_url) {
			Ok((id, Some(token))) => (id, token.to_string()),
			Ok((_, None)) => bail!("The logging webhook URL is missing its token"),
			Err(error) => bail!("The logging webhook URL is invalid: {}", error),
		};

		let (sender, receiver) = mpsc::unbounded_channel();
		tokio::spawn(post_log_messages(receiver, http_client, webhook_id, token));
		Ok(Self { sender })
	}
}

impl<S: Subscriber> Layer<S> for WebhookLayer {
	fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
		let metadata = event.metadata();
		if !is_forwarded(metadata) {
			return;
		}

		let mut visitor = MessageVisitor::default();
		event.record(&mut visitor);
		let content = format_webhook_message(Utc::now(), metadata.level(), &visitor.finish());
		// The receiver only goes away when the runtime shuts down.
		let _ = self.sender.send(content);
	}
}

async fn post_log_messages(
	mut receiver: mpsc::UnboundedReceiver<String>,
	http_client: Arc<Client>,
	webhook_id: Id<WebhookMarker>,
	token: String,
) {
	while let Some(content) = receiver.recv().await {
		let result = http_client
			.execute_webhook(webhook_id, &token)
			.content(&content)
			.username(WEBHOOK_USERNAME)
			.await;
		// Logging this through tracing would feed it straight back into the webhook.
		if let Err(error) = result {
			eprintln!("Failed to send log message to webhook: {}", error);
		}
	}
}

fn is_forwarded(metadata: &Metadata<'_>) -> bool {
	*metadata.level() <= Level::INFO && metadata.target().starts_with(FORWARDED_TARGET)
}

/// Formats a log line for the webhook as a code block, keeping it within Discord's message limit.
pub fn format_webhook_message(time: DateTime<Utc>, level: &Level, message: &str) -> String {
	let line = format!("{} {} {}", time.format("%Y-%m-%d %H:%M:%S"), level, message);
	let line = truncate_with_ellipsis(&line, MESSAGE_LENGTH_LIMIT - CODE_FENCE_OVERHEAD);
	format!("```\n{}\n```", line)
}

/// Collects an event's message and fields into one line
#[derive(Default)]
struct MessageVisitor {
	message: String,
	fields: String,
}

impl MessageVisitor {
	fn finish(self) -> String {
		if self.fields.is_empty() {
			self.message
		} else if self.message.is_empty() {
			self.fields.trim_start().to_string()
		} else {
			format!("{}{}", self.message, self.fields)
		}
	}
}

impl Visit for MessageVisitor {
	fn record_str(&mut self, field: &Field, value: &str) {
		if field.name() == "message" {
			self.message.push_str(value);
		} else {
			let _ = write!(self.fields, " {}={}", field.name(), value);
		}
	}

	fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
		if field.name() == "message" {
			let _ = write!(self.message, "{:?}", value);
		} else {
			let _ = write!(self.fields, " {}={:?}", field.name(), value);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	#[test]
	fn webhook_message_format() {
		let time = Utc.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
		assert_eq!(
			format_webhook_message(time, &Level::WARN, "Ticket closed"),
			"```\n2025-03-09 14:05:07 WARN Ticket closed\n```"
		);
	}

	#[test]
	fn long_messages_fit_in_one_discord_message() {
		let time = Utc.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
		let message = format_webhook_message(time, &Level::ERROR, &"x".repeat(5000));
		assert_eq!(message.chars().count(), MESSAGE_LENGTH_LIMIT);
		assert!(message.starts_with("```\n2025-03-09 14:05:07 ERROR x"));
		assert!(message.ends_with("...\n```"));
	}

	#[test]
	fn forwards_only_own_important_events() {
		let (sender, mut receiver) = mpsc::unbounded_channel();
		let layer = WebhookLayer { sender };
		let subscriber = Registry::default().with(layer);
		tracing::subscriber::with_default(subscriber, || {
			tracing::info!(target: "harbor_bot::tickets", channel = 5, "Ticket created");
			tracing::debug!(target: "harbor_bot::tickets", "too verbose");
			tracing::error!(target: "twilight_http::client", "not ours");
		});

		let forwarded = receiver.try_recv().unwrap();
		assert!(forwarded.contains(" INFO Ticket created channel=5"));
		assert!(receiver.try_recv().is_err());
	}
}
