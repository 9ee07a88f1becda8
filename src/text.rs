// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Discord's maximum message length, in characters
pub const MESSAGE_LENGTH_LIMIT: usize = 2000;

const ELLIPSIS: &str = "...";

/// Shortens text to fit in `limit` characters, replacing the end with an ellipsis if it doesn't fit.
pub fn truncate_with_ellipsis(text: &str, limit: usize) -> String {
	if text.chars().count() <= limit {
		return text.to_string();
	}
	let keep = limit.saturating_sub(ELLIPSIS.len());
	let mut truncated: String = text.chars().take(keep).collect();
	truncated.push_str(ELLIPSIS);
	truncated
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn short_text_is_untouched() {
		assert_eq!(truncate_with_ellipsis("hello", MESSAGE_LENGTH_LIMIT), "hello");
		let exact = "a".repeat(MESSAGE_LENGTH_LIMIT);
		assert_eq!(truncate_with_ellipsis(&exact, MESSAGE_LENGTH_LIMIT), exact);
	}

	#[test]
	fn long_text_gets_ellipsis() {
		let long = "b".repeat(MESSAGE_LENGTH_LIMIT + 1);
		let truncated = truncate_with_ellipsis(&long, MESSAGE_LENGTH_LIMIT);
		assert_eq!(truncated.chars().count(), MESSAGE_LENGTH_LIMIT);
		assert!(truncated.ends_with("b..."));
		assert_eq!(&truncated[..1997], "b".repeat(1997));
	}

	#[test]
	fn counts_characters_not_bytes() {
		let text = "é".repeat(10);
		assert_eq!(truncate_with_ellipsis(&text, 10), text);
		assert_eq!(truncate_with_ellipsis(&text, 5), "éé...");
	}
}
