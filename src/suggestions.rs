// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::{HashMap, HashSet};
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum VoteDirection {
	Up,
	Down,
}

impl VoteDirection {
	/// Parses the direction part of a vote button's custom ID.
	pub fn from_id(id: &str) -> Option<Self> {
		match id {
			"upvote" => Some(Self::Up),
			"downvote" => Some(Self::Down),
			_ => None,
		}
	}

	pub fn as_id(&self) -> &'static str {
		match self {
			Self::Up => "upvote",
			Self::Down => "downvote",
		}
	}

	pub fn emoji(&self) -> &'static str {
		match self {
			Self::Up => "👍",
			Self::Down => "👎",
		}
	}

	fn opposite(&self) -> Self {
		match self {
			Self::Up => Self::Down,
			Self::Down => Self::Up,
		}
	}
}

/// What a vote did to the tally
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VoteOutcome {
	/// The vote was added (moving the user's vote from the other side if they had one).
	Cast(VoteDirection),
	/// The user clicked the side they'd already voted for, so their vote was withdrawn.
	Removed(VoteDirection),
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Tally {
	pub upvotes: usize,
	pub downvotes: usize,
}

#[derive(Debug, Default)]
struct VoteSets {
	up: HashSet<Id<UserMarker>>,
	down: HashSet<Id<UserMarker>>,
}

impl VoteSets {
	fn side_mut(&mut self, direction: VoteDirection) -> &mut HashSet<Id<UserMarker>> {
		match direction {
			VoteDirection::Up => &mut self.up,
			VoteDirection::Down => &mut self.down,
		}
	}
}

/// Per-suggestion vote sets. A user is on at most one side of any suggestion.
#[derive(Debug)]
pub struct SuggestionTally {
	next_id: u64,
	votes: HashMap<u64, VoteSets>,
	retired: HashSet<u64>,
}

impl Default for SuggestionTally {
	fn default() -> Self {
		Self {
			next_id: 1,
			votes: HashMap::new(),
			retired: HashSet::new(),
		}
	}
}

impl SuggestionTally {
	pub fn new() -> Self {
		Self::default()
	}

	/// Hands out the next suggestion ID. IDs start at 1 and are never reused.
	pub fn next_suggestion_id(&mut self) -> u64 {
		let id = self.next_id;
		self.next_id += 1;
		id
	}

	/// Records a click on a vote button.
	///
	/// Clicking the side you're already on withdraws the vote. Clicking the other side moves the vote there.
	/// Returns `None` for a suggestion that's been retired.
	pub fn cast_vote(
		&mut self,
		suggestion_id: u64,
		user_id: Id<UserMarker>,
		direction: VoteDirection,
	) -> Option<VoteOutcome> {
		if self.retired.contains(&suggestion_id) {
			return None;
		}
		let sets = self.votes.entry(suggestion_id).or_default();
		if sets.side_mut(direction).remove(&user_id) {
			return Some(VoteOutcome::Removed(direction));
		}
		sets.side_mut(direction.opposite()).remove(&user_id);
		sets.side_mut(direction).insert(user_id);
		Some(VoteOutcome::Cast(direction))
	}

	pub fn is_retired(&self, suggestion_id: u64) -> bool {
		self.retired.contains(&suggestion_id)
	}

	pub fn tally(&self, suggestion_id: u64) -> Tally {
		self.votes
			.get(&suggestion_id)
			.map(|sets| Tally {
				upvotes: sets.up.len(),
				downvotes: sets.down.len(),
			})
			.unwrap_or_default()
	}

	pub fn vote_of(&self, suggestion_id: u64, user_id: Id<UserMarker>) -> Option<VoteDirection> {
		let sets = self.votes.get(&suggestion_id)?;
		if sets.up.contains(&user_id) {
			Some(VoteDirection::Up)
		} else if sets.down.contains(&user_id) {
			Some(VoteDirection::Down)
		} else {
			None
		}
	}

	/// Drops the votes for a suggestion that's been approved or rejected, returning the final tally.
	/// Later votes on it are refused.
	pub fn retire(&mut self, suggestion_id: u64) -> Tally {
		let tally = self.tally(suggestion_id);
		self.votes.remove(&suggestion_id);
		self.retired.insert(suggestion_id);
		tally
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ids_are_sequential() {
		let mut tally = SuggestionTally::new();
		assert_eq!(tally.next_suggestion_id(), 1);
		assert_eq!(tally.next_suggestion_id(), 2);
		assert_eq!(tally.next_suggestion_id(), 3);
	}

	#[test]
	fn voting_toggles_and_switches() {
		let mut tally = SuggestionTally::new();
		let user = Id::new(1);

		assert_eq!(
			tally.cast_vote(7, user, VoteDirection::Up),
			Some(VoteOutcome::Cast(VoteDirection::Up))
		);
		assert_eq!(tally.tally(7), Tally { upvotes: 1, downvotes: 0 });

		assert_eq!(
			tally.cast_vote(7, user, VoteDirection::Down),
			Some(VoteOutcome::Cast(VoteDirection::Down))
		);
		assert_eq!(tally.tally(7), Tally { upvotes: 0, downvotes: 1 });
		assert_eq!(tally.vote_of(7, user), Some(VoteDirection::Down));

		assert_eq!(
			tally.cast_vote(7, user, VoteDirection::Down),
			Some(VoteOutcome::Removed(VoteDirection::Down))
		);
		assert_eq!(tally.tally(7), Tally::default());
		assert_eq!(tally.vote_of(7, user), None);
	}

	#[test]
	fn suggestions_are_independent() {
		let mut tally = SuggestionTally::new();
		tally.cast_vote(1, Id::new(1), VoteDirection::Up);
		tally.cast_vote(1, Id::new(2), VoteDirection::Up);
		tally.cast_vote(2, Id::new(1), VoteDirection::Down);

		assert_eq!(tally.tally(1), Tally { upvotes: 2, downvotes: 0 });
		assert_eq!(tally.tally(2), Tally { upvotes: 0, downvotes: 1 });
		assert_eq!(tally.tally(3), Tally::default());
	}

	#[test]
	fn retired_votes_are_dropped() {
		let mut tally = SuggestionTally::new();
		tally.cast_vote(1, Id::new(1), VoteDirection::Up);
		tally.cast_vote(1, Id::new(2), VoteDirection::Down);
		assert_eq!(tally.retire(1), Tally { upvotes: 1, downvotes: 1 });
		assert_eq!(tally.tally(1), Tally::default());
		assert_eq!(tally.vote_of(1, Id::new(1)), None);
	}

	#[test]
	fn retired_suggestions_refuse_votes() {
		let mut tally = SuggestionTally::new();
		tally.cast_vote(1, Id::new(1), VoteDirection::Up);
		tally.retire(1);

		assert_eq!(tally.cast_vote(1, Id::new(2), VoteDirection::Up), None);
		assert_eq!(tally.cast_vote(1, Id::new(1), VoteDirection::Down), None);
		assert_eq!(tally.tally(1), Tally::default());
		assert!(tally.is_retired(1));
		assert!(tally.votes.is_empty());

		assert_eq!(
			tally.cast_vote(2, Id::new(2), VoteDirection::Up),
			Some(VoteOutcome::Cast(VoteDirection::Up))
		);
		assert!(!tally.is_retired(2));
	}

	#[test]
	fn direction_ids() {
		assert_eq!(VoteDirection::from_id("upvote"), Some(VoteDirection::Up));
		assert_eq!(VoteDirection::from_id("downvote"), Some(VoteDirection::Down));
		assert_eq!(VoteDirection::from_id("sideways"), None);
		assert_eq!(VoteDirection::Down.as_id(), "downvote");
	}
}
