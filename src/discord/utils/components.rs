// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::suggestions::{Tally, VoteDirection};
use twilight_model::channel::message::component::{ActionRow, Button, ButtonStyle, Component};

pub const OPEN_TICKET_ID: &str = "ticket/create";
pub const CLOSE_TICKET_ID: &str = "ticket/close";

fn button(custom_id: String, label: String, style: ButtonStyle) -> Component {
	Component::Button(Button {
		custom_id: Some(custom_id),
		disabled: false,
		emoji: None,
		label: Some(label),
		style,
		url: None,
		sku_id: None,
	})
}

fn row(components: Vec<Component>) -> Component {
	Component::ActionRow(ActionRow { components })
}

/// The button on the ticket panel that opens a new ticket
pub fn open_ticket_button() -> Component {
	row(vec![button(
		String::from(OPEN_TICKET_ID),
		String::from("🎫 Open Ticket"),
		ButtonStyle::Success,
	)])
}

pub fn close_ticket_button() -> Component {
	row(vec![button(
		String::from(CLOSE_TICKET_ID),
		String::from("🔒 Close Ticket"),
		ButtonStyle::Danger,
	)])
}

pub fn vote_button_id(suggestion_id: u64, direction: VoteDirection) -> String {
	format!("suggestion/{}/{}", direction.as_id(), suggestion_id)
}

/// Builds the vote buttons for a suggestion. New suggestions have no counts shown.
pub fn vote_buttons(suggestion_id: u64, tally: Option<Tally>) -> Component {
	let (upvote_label, downvote_label) = match tally {
		Some(tally) => (
			format!("👍 Upvote ({})", tally.upvotes),
			format!("👎 Downvote ({})", tally.downvotes),
		),
		None => (String::from("👍 Upvote"), String::from("👎 Downvote")),
	};
	row(vec![
		button(
			vote_button_id(suggestion_id, VoteDirection::Up),
			upvote_label,
			ButtonStyle::Success,
		),
		button(
			vote_button_id(suggestion_id, VoteDirection::Down),
			downvote_label,
			ButtonStyle::Danger,
		),
	])
}

#[cfg(test)]
mod tests {
	use super::*;

	fn buttons(component: Component) -> Vec<Button> {
		let Component::ActionRow(row) = component else {
			panic!("expected an action row");
		};
		row.components
			.into_iter()
			.map(|component| match component {
				Component::Button(button) => button,
				_ => panic!("expected a button"),
			})
			.collect()
	}

	#[test]
	fn vote_button_labels() {
		let initial = buttons(vote_buttons(4, None));
		assert_eq!(initial[0].label.as_deref(), Some("👍 Upvote"));
		assert_eq!(initial[1].custom_id.as_deref(), Some("suggestion/downvote/4"));

		let counted = buttons(vote_buttons(
			4,
			Some(Tally {
				upvotes: 3,
				downvotes: 0,
			}),
		));
		assert_eq!(counted[0].label.as_deref(), Some("👍 Upvote (3)"));
		assert_eq!(counted[0].custom_id.as_deref(), Some("suggestion/upvote/4"));
		assert_eq!(counted[1].label.as_deref(), Some("👎 Downvote (0)"));
	}

	#[test]
	fn ticket_buttons() {
		let open = buttons(open_ticket_button());
		assert_eq!(open[0].custom_id.as_deref(), Some(OPEN_TICKET_ID));
		assert_eq!(open[0].style, ButtonStyle::Success);
		let close = buttons(close_ticket_button());
		assert_eq!(close[0].label.as_deref(), Some("🔒 Close Ticket"));
		assert_eq!(close[0].style, ButtonStyle::Danger);
	}
}
