// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::state::BotState;
use crate::apis::{CHATBOT_SYSTEM_PROMPT, ChatMessage, ChatRole};
use crate::text::{MESSAGE_LENGTH_LIMIT, truncate_with_ellipsis};
use miette::IntoDiagnostic;
use twilight_model::channel::message::Message;
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;

/// How many recent channel messages are sent along as conversation context
const HISTORY_LENGTH: u16 = 15;
const CHATBOT_ERROR_REPLY: &str = "Sorry, I encountered an error while processing your message.";

/// A message from the chatbot channel's recent history
pub struct HistoryMessage {
	pub author_id: Id<UserMarker>,
	pub author_is_bot: bool,
	pub content: String,
}

impl From<&Message> for HistoryMessage {
	fn from(message: &Message) -> Self {
		Self {
			author_id: message.author.id,
			author_is_bot: message.author.bot,
			content: message.content.clone(),
		}
	}
}

pub async fn handle_message(message: &Message, state: &BotState) -> miette::Result<()> {
	if message.author.bot {
		return Ok(());
	}
	let chatbot_channel = state.settings.read().await.chatbot.active_channel();
	if chatbot_channel != Some(message.channel_id) {
		return Ok(());
	}
	if is_command_like(&message.content) {
		return Ok(());
	}

	match chatbot_reply(message, state).await {
		Ok(reply) => {
			send_reply(message, state, &reply).await?;
			tracing::info!(user = %message.author.name, channel = %message.channel_id, "Chatbot responded");
		}
		Err(error) => {
			tracing::error!(source = ?error, user = %message.author.name, "Chatbot error");
			send_reply(message, state, CHATBOT_ERROR_REPLY).await?;
		}
	}
	Ok(())
}

async fn chatbot_reply(message: &Message, state: &BotState) -> miette::Result<String> {
	state
		.http_client
		.create_typing_trigger(message.channel_id)
		.await
		.into_diagnostic()?;
	let recent_messages = state
		.http_client
		.channel_messages(message.channel_id)
		.limit(HISTORY_LENGTH)
		.await
		.into_diagnostic()?
		.models()
		.await
		.into_diagnostic()?;
	// Discord returns the newest message first.
	let history: Vec<HistoryMessage> = recent_messages.iter().rev().map(HistoryMessage::from).collect();

	let conversation = build_conversation(
		&history,
		state.bot_user.id,
		message.author.id,
		&state.bot_user.name,
		&message.author.name,
	);
	let reply = state.chat_client.complete(&conversation).await?;
	Ok(truncate_with_ellipsis(&reply, MESSAGE_LENGTH_LIMIT))
}

async fn send_reply(message: &Message, state: &BotState, content: &str) -> miette::Result<()> {
	state
		.http_client
		.create_message(message.channel_id)
		.content(content)
		.reply(message.id)
		.await
		.into_diagnostic()?;
	Ok(())
}

fn is_command_like(content: &str) -> bool {
	content.starts_with('!') || content.starts_with('/')
}

/// Builds the completion conversation from channel history (oldest first).
///
/// Only the bot's own messages and the current author's messages are kept; other users and other bots are left out.
pub fn build_conversation(
	history: &[HistoryMessage],
	bot_id: Id<UserMarker>,
	author_id: Id<UserMarker>,
	bot_name: &str,
	author_name: &str,
) -> Vec<ChatMessage> {
	let mut conversation = vec![ChatMessage::new(ChatRole::System, CHATBOT_SYSTEM_PROMPT)];
	for message in history {
		if is_command_like(&message.content) {
			continue;
		}
		if message.author_id == bot_id {
			conversation.push(ChatMessage::named(ChatRole::Assistant, message.content.clone(), bot_name));
		} else if message.author_id == author_id && !message.author_is_bot {
			conversation.push(ChatMessage::named(ChatRole::User, message.content.clone(), author_name));
		}
	}
	conversation
}
