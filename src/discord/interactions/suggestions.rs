// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::state::BotState;
use crate::discord::utils::components::vote_buttons;
use crate::discord::utils::responses::{followup_ephemeral, respond_ephemeral, update_components};
use crate::discord::utils::users::interaction_author_name;
use crate::suggestions::{SuggestionTally, VoteDirection, VoteOutcome};
use miette::bail;
use twilight_model::channel::message::component::Component;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;

pub const VOTING_CLOSED_MESSAGE: &str = "This suggestion is no longer open for voting.";

pub async fn vote(
	interaction: &InteractionCreate,
	direction: &str,
	suggestion_id: &str,
	state: &BotState,
) -> miette::Result<()> {
	let Some(direction) = VoteDirection::from_id(direction) else {
		bail!("Unknown vote direction: {}", direction);
	};
	let Ok(suggestion_id) = suggestion_id.parse::<u64>() else {
		bail!("Invalid suggestion ID on vote button: {}", suggestion_id);
	};
	let Some(user_id) = interaction.author_id() else {
		bail!("Vote cast with no author");
	};

	let recorded = record_vote(&mut *state.suggestions.lock().await, suggestion_id, user_id, direction);
	let Some((outcome, buttons)) = recorded else {
		return respond_ephemeral(state, interaction, VOTING_CLOSED_MESSAGE).await;
	};

	tracing::debug!(
		suggestion = suggestion_id,
		user = %interaction_author_name(interaction),
		?outcome,
		"Suggestion vote recorded"
	);
	update_components(state, interaction, vec![buttons]).await?;
	followup_ephemeral(state, interaction, &vote_reply(outcome)).await
}

/// Applies a vote and renders the suggestion's buttons with the counts that vote produced.
///
/// Returns `None` if the suggestion has been resolved.
pub fn record_vote(
	suggestions: &mut SuggestionTally,
	suggestion_id: u64,
	user_id: Id<UserMarker>,
	direction: VoteDirection,
) -> Option<(VoteOutcome, Component)> {
	let outcome = suggestions.cast_vote(suggestion_id, user_id, direction)?;
	let buttons = vote_buttons(suggestion_id, Some(suggestions.tally(suggestion_id)));
	Some((outcome, buttons))
}

pub fn vote_reply(outcome: VoteOutcome) -> String {
	match outcome {
		VoteOutcome::Removed(direction) => format!("Your {} vote has been removed!", direction.emoji()),
		VoteOutcome::Cast(VoteDirection::Up) => format!("You upvoted {} this suggestion!", VoteDirection::Up.emoji()),
		VoteOutcome::Cast(VoteDirection::Down) => {
			format!("You downvoted {} this suggestion!", VoteDirection::Down.emoji())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use twilight_model::channel::message::component::Button;

	fn labels(component: Component) -> Vec<String> {
		let Component::ActionRow(row) = component else {
			panic!("expected an action row");
		};
		row.components
			.into_iter()
			.map(|component| match component {
				Component::Button(Button { label, .. }) => label.unwrap_or_default(),
				_ => panic!("expected a button"),
			})
			.collect()
	}

	#[test]
	fn vote_replies() {
		assert_eq!(
			vote_reply(VoteOutcome::Cast(VoteDirection::Up)),
			"You upvoted 👍 this suggestion!"
		);
		assert_eq!(
			vote_reply(VoteOutcome::Cast(VoteDirection::Down)),
			"You downvoted 👎 this suggestion!"
		);
		assert_eq!(
			vote_reply(VoteOutcome::Removed(VoteDirection::Down)),
			"Your 👎 vote has been removed!"
		);
	}

	#[test]
	fn buttons_show_counts_after_each_vote() {
		let mut suggestions = SuggestionTally::new();
		let id = suggestions.next_suggestion_id();

		let (outcome, buttons) = record_vote(&mut suggestions, id, Id::new(1), VoteDirection::Up).unwrap();
		assert_eq!(outcome, VoteOutcome::Cast(VoteDirection::Up));
		assert_eq!(labels(buttons), ["👍 Upvote (1)", "👎 Downvote (0)"]);

		let (_, buttons) = record_vote(&mut suggestions, id, Id::new(2), VoteDirection::Down).unwrap();
		assert_eq!(labels(buttons), ["👍 Upvote (1)", "👎 Downvote (1)"]);

		let (outcome, buttons) = record_vote(&mut suggestions, id, Id::new(1), VoteDirection::Down).unwrap();
		assert_eq!(outcome, VoteOutcome::Cast(VoteDirection::Down));
		assert_eq!(labels(buttons), ["👍 Upvote (0)", "👎 Downvote (2)"]);

		let (outcome, buttons) = record_vote(&mut suggestions, id, Id::new(2), VoteDirection::Down).unwrap();
		assert_eq!(outcome, VoteOutcome::Removed(VoteDirection::Down));
		assert_eq!(labels(buttons), ["👍 Upvote (0)", "👎 Downvote (1)"]);
	}

	#[test]
	fn resolved_suggestions_take_no_votes() {
		let mut suggestions = SuggestionTally::new();
		let id = suggestions.next_suggestion_id();
		record_vote(&mut suggestions, id, Id::new(1), VoteDirection::Up);
		suggestions.retire(id);

		assert!(record_vote(&mut suggestions, id, Id::new(2), VoteDirection::Up).is_none());
		assert!(record_vote(&mut suggestions, id, Id::new(1), VoteDirection::Up).is_none());
		assert_eq!(suggestions.tally(id), Default::default());
	}
}
