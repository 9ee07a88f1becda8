// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::ApiConfig;
use miette::IntoDiagnostic;
use serde::Serialize;
use serde_json::Value;

pub const CHATBOT_SYSTEM_PROMPT: &str = "You are a friendly chatbot.";
pub const UNEXPECTED_RESPONSE_REPLY: &str = "Sorry, I received an unexpected response format.";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
	System,
	User,
	Assistant,
}

impl ChatRole {
	fn prompt_label(&self) -> &'static str {
		match self {
			Self::System => "System",
			Self::User => "User",
			Self::Assistant => "Assistant",
		}
	}
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ChatMessage {
	pub role: ChatRole,
	pub content: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

impl ChatMessage {
	pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
		Self {
			role,
			content: content.into(),
			name: None,
		}
	}

	pub fn named(role: ChatRole, content: impl Into<String>, name: &str) -> Self {
		Self {
			role,
			content: content.into(),
			name: Some(sanitize_name(name)),
		}
	}
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
	messages: [ChatMessage; 1],
	model: &'a str,
}

/// Client for the text completion endpoint used by the chatbot channel
#[derive(Clone, Debug)]
pub struct ChatCompletionClient {
	http: reqwest::Client,
	url: String,
	model: String,
}

impl ChatCompletionClient {
	pub fn new(http: reqwest::Client, config: &ApiConfig) -> Self {
		Self {
			http,
			url: config.chat_completion_url.clone(),
			model: config.chat_model.clone(),
		}
	}

	/// Sends the conversation (flattened into a single user prompt) and returns the reply text.
	pub async fn complete(&self, conversation: &[ChatMessage]) -> miette::Result<String> {
		let prompt = flatten_conversation(conversation);
		let request = CompletionRequest {
			messages: [ChatMessage::new(ChatRole::User, prompt)],
			model: &self.model,
		};
		let response = self
			.http
			.post(&self.url)
			.json(&request)
			.send()
			.await
			.into_diagnostic()?
			.error_for_status()
			.into_diagnostic()?;
		let body = response.text().await.into_diagnostic()?;
		Ok(extract_reply(&body))
	}
}

/// Turns a conversation into one prompt, one `Role: content` line per message.
pub fn flatten_conversation(conversation: &[ChatMessage]) -> String {
	conversation
		.iter()
		.map(|message| format!("{}: {}", message.role.prompt_label(), message.content))
		.collect::<Vec<_>>()
		.join("\n")
}

/// Pulls the reply text out of a completion response body.
///
/// The endpoint answers with plain text, a JSON string, an OpenAI-style `choices` object, or an object with a
/// `message` field.
pub fn extract_reply(body: &str) -> String {
	let Ok(value) = serde_json::from_str::<Value>(body) else {
		return body.to_string();
	};
	match value {
		Value::String(text) => text,
		Value::Object(object) => {
			let choice_content = object
				.get("choices")
				.and_then(|choices| choices.get(0))
				.and_then(|choice| choice.get("message"))
				.and_then(|message| message.get("content"))
				.and_then(Value::as_str);
			if let Some(content) = choice_content {
				return content.to_string();
			}
			match object.get("message") {
				Some(Value::String(message)) => message.clone(),
				_ => String::from(UNEXPECTED_RESPONSE_REPLY),
			}
		}
		// Bare numbers and the like are still text replies.
		Value::Number(number) => number.to_string(),
		_ => String::from(UNEXPECTED_RESPONSE_REPLY),
	}
}

/// Reduces a username to word characters, with whitespace runs turned into underscores.
pub fn sanitize_name(name: &str) -> String {
	let mut sanitized = String::with_capacity(name.len());
	let mut in_whitespace = false;
	for c in name.chars() {
		if c.is_whitespace() {
			if !in_whitespace {
				sanitized.push('_');
			}
			in_whitespace = true;
			continue;
		}
		in_whitespace = false;
		if c.is_ascii_alphanumeric() || c == '_' {
			sanitized.push(c);
		}
	}
	sanitized
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn flattens_with_role_labels() {
		let conversation = vec![
			ChatMessage::new(ChatRole::System, CHATBOT_SYSTEM_PROMPT),
			ChatMessage::named(ChatRole::User, "hi", "alice"),
			ChatMessage::named(ChatRole::Assistant, "hello!", "Harbor"),
		];
		assert_eq!(
			flatten_conversation(&conversation),
			"System: You are a friendly chatbot.\nUser: hi\nAssistant: hello!"
		);
	}

	#[test]
	fn request_body_shape() {
		let request = CompletionRequest {
			messages: [ChatMessage::new(ChatRole::User, "User: hi")],
			model: "openai",
		};
		let body = serde_json::to_value(&request).unwrap();
		assert_eq!(
			body,
			serde_json::json!({ "messages": [{ "role": "user", "content": "User: hi" }], "model": "openai" })
		);
	}

	#[test]
	fn reply_formats() {
		assert_eq!(extract_reply("Hello there"), "Hello there");
		assert_eq!(extract_reply("\"quoted\""), "quoted");
		assert_eq!(
			extract_reply(r#"{"choices":[{"message":{"role":"assistant","content":"from choices"}}]}"#),
			"from choices"
		);
		assert_eq!(extract_reply(r#"{"message":"from message"}"#), "from message");
		assert_eq!(extract_reply(r#"{"unexpected":true}"#), UNEXPECTED_RESPONSE_REPLY);
		assert_eq!(extract_reply("[1, 2]"), UNEXPECTED_RESPONSE_REPLY);
	}

	#[test]
	fn sanitized_names() {
		assert_eq!(sanitize_name("Cool  User"), "Cool_User");
		assert_eq!(sanitize_name("ünï-code!"), "ncode");
		assert_eq!(sanitize_name("snake_case42"), "snake_case42");
	}
}
