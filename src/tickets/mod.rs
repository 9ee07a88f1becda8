// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use miette::Diagnostic;
use std::fmt;
use twilight_mention::fmt::Mention;
use twilight_model::id::Id;
use twilight_model::id::marker::ChannelMarker;

mod lifecycle;
mod platform;
mod registry;

pub use lifecycle::{
	CloseRequest, DEFAULT_CLOSE_REASON, DELETION_DELAY, TICKET_CHANNEL_PREFIX, TicketLifecycle, TicketRequest,
	ticket_channel_name,
};
pub use platform::{ChannelRequest, ClosureNotice, MemberAccess, TicketLogEntry, TicketPlatform};
pub use registry::{Ticket, TicketRegistry};

/// The ways a ticket operation can be rejected or fail
#[derive(Debug, Diagnostic)]
pub enum TicketError {
	/// The user already has a ticket. If the ticket channel is still being created, there's no channel yet.
	AlreadyOpen { existing: Option<Id<ChannelMarker>> },
	/// The maximum number of open tickets has been reached.
	LimitReached { limit: usize },
	/// The channel isn't a ticket (or it's already being closed).
	NotATicket,
	/// The channel isn't tracked in the registry.
	NotFound,
	/// The acting user isn't staff.
	MissingPermission,
	/// A platform call failed.
	Platform(miette::Report),
}

impl TicketError {
	/// The short explanation to send back to the user whose request was rejected
	pub fn user_message(&self) -> String {
		match self {
			Self::AlreadyOpen { existing: Some(channel) } => {
				format!("You already have an open ticket: {}", channel.mention())
			}
			Self::AlreadyOpen { existing: None } => String::from("Your ticket is already being created."),
			Self::LimitReached { .. } => {
				String::from("Maximum number of tickets reached. Please wait for existing tickets to be closed.")
			}
			Self::NotATicket => String::from("This can only be used in ticket channels!"),
			Self::NotFound => String::from("That ticket couldn't be found."),
			Self::MissingPermission => String::from("You need staff permissions to manage ticket members!"),
			Self::Platform(_) => String::from("Something went wrong talking to Discord. Please try again later."),
		}
	}
}

impl fmt::Display for TicketError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::AlreadyOpen { existing: Some(channel) } => write!(f, "user already has an open ticket ({})", channel),
			Self::AlreadyOpen { existing: None } => write!(f, "user already has a ticket being created"),
			Self::LimitReached { limit } => write!(f, "ticket limit of {} reached", limit),
			Self::NotATicket => write!(f, "channel is not a ticket"),
			Self::NotFound => write!(f, "ticket not found"),
			Self::MissingPermission => write!(f, "missing staff permission"),
			Self::Platform(error) => write!(f, "platform error: {}", error),
		}
	}
}

impl std::error::Error for TicketError {}
