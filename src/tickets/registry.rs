// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::TicketError;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, UserMarker};

/// An open support ticket
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ticket {
	pub channel_id: Id<ChannelMarker>,
	pub user_id: Id<UserMarker>,
	pub created_at: DateTime<Utc>,
}

/// Directory of open tickets.
///
/// Users with a ticket channel still being provisioned hold a reservation. Reservations count toward both the limit
/// and the one-ticket-per-user rule.
#[derive(Debug, Default)]
pub struct TicketRegistry {
	tickets: HashMap<Id<ChannelMarker>, Ticket>,
	by_user: HashMap<Id<UserMarker>, Id<ChannelMarker>>,
	reservations: HashSet<Id<UserMarker>>,
}

impl TicketRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn find_open_ticket_for_user(&self, user_id: Id<UserMarker>) -> Option<&Ticket> {
		self.by_user
			.get(&user_id)
			.and_then(|channel_id| self.tickets.get(channel_id))
	}

	/// Number of open (registered) tickets
	pub fn count(&self) -> usize {
		self.tickets.len()
	}

	pub fn get(&self, channel_id: Id<ChannelMarker>) -> Option<&Ticket> {
		self.tickets.get(&channel_id)
	}

	pub fn is_tracked(&self, channel_id: Id<ChannelMarker>) -> bool {
		self.tickets.contains_key(&channel_id)
	}

	pub fn tickets(&self) -> impl Iterator<Item = &Ticket> {
		self.tickets.values()
	}

	pub fn has_reservation(&self, user_id: Id<UserMarker>) -> bool {
		self.reservations.contains(&user_id)
	}

	/// Holds a ticket slot for a user while their channel is created.
	pub fn reserve(&mut self, user_id: Id<UserMarker>, limit: usize) -> Result<(), TicketError> {
		if let Some(ticket) = self.find_open_ticket_for_user(user_id) {
			return Err(TicketError::AlreadyOpen {
				existing: Some(ticket.channel_id),
			});
		}
		if self.reservations.contains(&user_id) {
			return Err(TicketError::AlreadyOpen { existing: None });
		}
		if self.occupied_slots() >= limit {
			return Err(TicketError::LimitReached { limit });
		}
		self.reservations.insert(user_id);
		Ok(())
	}

	/// Drops a user's reservation. Returns whether there was one.
	pub fn release(&mut self, user_id: Id<UserMarker>) -> bool {
		self.reservations.remove(&user_id)
	}

	/// Adds an open ticket, consuming the user's reservation if they hold one.
	///
	/// Both invariants are checked again here; the user's own reservation doesn't count against them.
	pub fn register(
		&mut self,
		channel_id: Id<ChannelMarker>,
		user_id: Id<UserMarker>,
		created_at: DateTime<Utc>,
		limit: usize,
	) -> Result<(), TicketError> {
		if let Some(ticket) = self.find_open_ticket_for_user(user_id) {
			return Err(TicketError::AlreadyOpen {
				existing: Some(ticket.channel_id),
			});
		}
		if self.tickets.contains_key(&channel_id) {
			return Err(TicketError::AlreadyOpen {
				existing: Some(channel_id),
			});
		}
		let own_reservation = usize::from(self.reservations.contains(&user_id));
		if self.occupied_slots() - own_reservation >= limit {
			return Err(TicketError::LimitReached { limit });
		}

		self.reservations.remove(&user_id);
		self.by_user.insert(user_id, channel_id);
		self.tickets.insert(
			channel_id,
			Ticket {
				channel_id,
				user_id,
				created_at,
			},
		);
		Ok(())
	}

	pub fn unregister(&mut self, channel_id: Id<ChannelMarker>) -> Result<Ticket, TicketError> {
		let ticket = self.tickets.remove(&channel_id).ok_or(TicketError::NotFound)?;
		self.by_user.remove(&ticket.user_id);
		Ok(ticket)
	}

	fn occupied_slots(&self) -> usize {
		self.tickets.len() + self.reservations.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn registry_with(tickets: &[(u64, u64)], limit: usize) -> TicketRegistry {
		let mut registry = TicketRegistry::new();
		for (channel, user) in tickets {
			registry
				.register(Id::new(*channel), Id::new(*user), Utc::now(), limit)
				.unwrap();
		}
		registry
	}

	#[test]
	fn one_ticket_per_user() {
		let mut registry = registry_with(&[(100, 1)], 5);
		let result = registry.register(Id::new(101), Id::new(1), Utc::now(), 5);
		assert!(matches!(
			result,
			Err(TicketError::AlreadyOpen { existing: Some(channel) }) if channel == Id::new(100)
		));
		assert_eq!(registry.count(), 1);
		assert_eq!(
			registry.find_open_ticket_for_user(Id::new(1)).map(|ticket| ticket.channel_id),
			Some(Id::new(100))
		);
	}

	#[test]
	fn limit_is_enforced() {
		let mut registry = registry_with(&[(100, 1), (101, 2)], 2);
		assert!(matches!(
			registry.register(Id::new(102), Id::new(3), Utc::now(), 2),
			Err(TicketError::LimitReached { limit: 2 })
		));
		assert!(matches!(
			registry.reserve(Id::new(3), 2),
			Err(TicketError::LimitReached { limit: 2 })
		));
		assert_eq!(registry.count(), 2);
	}

	#[test]
	fn reservations_hold_slots() {
		let mut registry = TicketRegistry::new();
		registry.reserve(Id::new(1), 1).unwrap();
		assert!(matches!(
			registry.reserve(Id::new(1), 1),
			Err(TicketError::AlreadyOpen { existing: None })
		));
		assert!(matches!(
			registry.reserve(Id::new(2), 1),
			Err(TicketError::LimitReached { .. })
		));
		assert!(matches!(
			registry.register(Id::new(200), Id::new(2), Utc::now(), 1),
			Err(TicketError::LimitReached { .. })
		));

		registry.register(Id::new(100), Id::new(1), Utc::now(), 1).unwrap();
		assert!(!registry.has_reservation(Id::new(1)));
		assert_eq!(registry.count(), 1);
	}

	#[test]
	fn released_reservation_frees_slot() {
		let mut registry = TicketRegistry::new();
		registry.reserve(Id::new(1), 1).unwrap();
		assert!(registry.release(Id::new(1)));
		assert!(!registry.release(Id::new(1)));
		registry.reserve(Id::new(2), 1).unwrap();
	}

	#[test]
	fn unregister_removes_once() {
		let mut registry = registry_with(&[(100, 1)], 5);
		let ticket = registry.unregister(Id::new(100)).unwrap();
		assert_eq!(ticket.user_id, Id::new(1));
		assert!(matches!(registry.unregister(Id::new(100)), Err(TicketError::NotFound)));
		assert!(registry.find_open_ticket_for_user(Id::new(1)).is_none());
		assert!(!registry.is_tracked(Id::new(100)));

		registry.register(Id::new(101), Id::new(1), Utc::now(), 5).unwrap();
		assert_eq!(registry.tickets().count(), 1);
	}
}
