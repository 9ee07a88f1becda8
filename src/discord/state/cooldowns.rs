// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;

pub const STOCK_COOLDOWN: Duration = Duration::from_secs(5);

/// Per-user command cooldowns
#[derive(Debug)]
pub struct Cooldowns {
	duration: Duration,
	last_used: HashMap<Id<UserMarker>, Instant>,
}

impl Cooldowns {
	pub fn new(duration: Duration) -> Self {
		Self {
			duration,
			last_used: HashMap::new(),
		}
	}

	/// Records a use of the command if the user isn't on cooldown. Otherwise, returns how long is left.
	pub fn try_use(&mut self, user_id: Id<UserMarker>, now: Instant) -> Result<(), Duration> {
		if let Some(last_used) = self.last_used.get(&user_id) {
			let ready_at = *last_used + self.duration;
			if now < ready_at {
				return Err(ready_at - now);
			}
		}
		let duration = self.duration;
		self.last_used
			.retain(|_, last_used| now.saturating_duration_since(*last_used) < duration);
		self.last_used.insert(user_id, now);
		Ok(())
	}
}

/// Whole seconds left, rounded up
pub fn seconds_left(remaining: Duration) -> u64 {
	let seconds = remaining.as_secs();
	if remaining.subsec_nanos() > 0 { seconds + 1 } else { seconds }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cooldown_blocks_then_expires() {
		let mut cooldowns = Cooldowns::new(STOCK_COOLDOWN);
		let user = Id::new(1);
		let start = Instant::now();

		assert!(cooldowns.try_use(user, start).is_ok());
		let remaining = cooldowns.try_use(user, start + Duration::from_millis(1500)).unwrap_err();
		assert_eq!(remaining, Duration::from_millis(3500));
		assert_eq!(seconds_left(remaining), 4);

		assert!(cooldowns.try_use(Id::new(2), start + Duration::from_secs(1)).is_ok());
		assert!(cooldowns.try_use(user, start + STOCK_COOLDOWN).is_ok());
	}

	#[test]
	fn expired_entries_are_pruned() {
		let mut cooldowns = Cooldowns::new(STOCK_COOLDOWN);
		let start = Instant::now();
		cooldowns.try_use(Id::new(1), start).unwrap();
		cooldowns.try_use(Id::new(2), start + Duration::from_secs(10)).unwrap();
		assert_eq!(cooldowns.last_used.len(), 1);
	}

	#[test]
	fn whole_seconds_round_up() {
		assert_eq!(seconds_left(Duration::from_secs(2)), 2);
		assert_eq!(seconds_left(Duration::from_millis(1)), 1);
	}
}
