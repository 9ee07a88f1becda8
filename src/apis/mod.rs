// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Clients for the third-party HTTP services the bot talks to.

mod chat_completion;
mod stock;

pub use chat_completion::{
	CHATBOT_SYSTEM_PROMPT, ChatCompletionClient, ChatMessage, ChatRole, UNEXPECTED_RESPONSE_REPLY, extract_reply,
	flatten_conversation, sanitize_name,
};
pub use stock::{STOCK_SECTIONS, StockClient, StockData, StockItem, StockSection, format_stock_items};
