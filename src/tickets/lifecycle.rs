// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::platform::{ChannelRequest, ClosureNotice, MemberAccess, TicketLogEntry, TicketPlatform};
use super::registry::{Ticket, TicketRegistry};
use super::TicketError;
use crate::model::TicketSettings;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, UserMarker};

pub const TICKET_CHANNEL_PREFIX: &str = "ticket-";
pub const DEFAULT_CLOSE_REASON: &str = "No reason provided";
/// How long a closed ticket channel sticks around so the closure notice can be read
pub const DELETION_DELAY: Duration = Duration::from_secs(5);

const MAX_CHANNEL_NAME_LENGTH: usize = 100;

/// A user asking for a new ticket
#[derive(Clone, Debug)]
pub struct TicketRequest {
	pub guild_id: Id<GuildMarker>,
	pub requester_id: Id<UserMarker>,
	pub requester_name: String,
}

/// Someone closing a ticket
#[derive(Clone, Debug)]
pub struct CloseRequest {
	pub channel_id: Id<ChannelMarker>,
	pub actor_name: String,
	pub reason: Option<String>,
}

#[derive(Debug, Default)]
struct LifecycleState {
	registry: TicketRegistry,
	/// Channels that are being closed. Once the closure notice is out, the deletion task handle is stored here.
	closing: HashMap<Id<ChannelMarker>, Option<JoinHandle<()>>>,
}

/// Drives tickets through creation, membership changes, and closure.
///
/// Tickets go `OPEN -> CLOSING -> deleted`. A closing channel is no longer treated as a ticket, whether or not it's
/// named like one.
pub struct TicketLifecycle<P> {
	platform: Arc<P>,
	state: Arc<Mutex<LifecycleState>>,
	deletion_delay: Duration,
}

impl<P: TicketPlatform> TicketLifecycle<P> {
	pub fn new(platform: Arc<P>) -> Self {
		Self::with_deletion_delay(platform, DELETION_DELAY)
	}

	pub fn with_deletion_delay(platform: Arc<P>, deletion_delay: Duration) -> Self {
		Self {
			platform,
			state: Arc::new(Mutex::new(LifecycleState::default())),
			deletion_delay,
		}
	}

	pub async fn open_ticket_count(&self) -> usize {
		self.state.lock().await.registry.count()
	}

	pub async fn find_open_ticket_for_user(&self, user_id: Id<UserMarker>) -> Option<Ticket> {
		self.state.lock().await.registry.find_open_ticket_for_user(user_id).cloned()
	}

	pub async fn is_tracked(&self, channel_id: Id<ChannelMarker>) -> bool {
		self.state.lock().await.registry.is_tracked(channel_id)
	}

	/// Whether a channel counts as a ticket: it's tracked, or it's named like a ticket channel. Channels being
	/// closed never count.
	pub async fn is_ticket_channel(&self, channel_id: Id<ChannelMarker>) -> bool {
		let named_like_ticket = self.named_like_ticket(channel_id);
		let state = self.state.lock().await;
		!state.closing.contains_key(&channel_id) && (named_like_ticket || state.registry.is_tracked(channel_id))
	}

	pub async fn create_ticket(
		&self,
		request: TicketRequest,
		settings: &TicketSettings,
	) -> Result<Id<ChannelMarker>, TicketError> {
		let requester_id = request.requester_id;
		self.state.lock().await.registry.reserve(requester_id, settings.limit)?;

		let channel_request = ChannelRequest {
			guild_id: request.guild_id,
			name: ticket_channel_name(&request.requester_name),
			owner: requester_id,
			category: settings.category,
		};
		let channel_id = match self.platform.provision_channel(&channel_request).await {
			Ok(channel_id) => channel_id,
			Err(error) => {
				self.state.lock().await.registry.release(requester_id);
				tracing::error!(source = ?error, user = %requester_id, "Failed to create ticket channel");
				return Err(TicketError::Platform(error));
			}
		};

		let register_result = {
			let mut state = self.state.lock().await;
			let result = state
				.registry
				.register(channel_id, requester_id, Utc::now(), settings.limit);
			if result.is_err() {
				state.registry.release(requester_id);
			}
			result
		};
		if let Err(error) = register_result {
			// The limit can be lowered while the channel is being created.
			tracing::warn!(%error, channel = %channel_id, "Ticket rejected after its channel was created");
			if let Err(delete_error) = self.platform.delete_channel(channel_id).await {
				tracing::error!(source = ?delete_error, channel = %channel_id, "Failed to remove rejected ticket channel");
			}
			return Err(error);
		}

		if let Err(error) = self.platform.post_introduction(channel_id, requester_id).await {
			tracing::error!(source = ?error, channel = %channel_id, "Failed to post ticket introduction");
		}

		if let Some(log_channel) = settings.log_channel {
			let entry = TicketLogEntry::Opened {
				channel_id,
				user_id: requester_id,
				user_name: request.requester_name.clone(),
			};
			if let Err(error) = self.platform.post_log(log_channel, &entry).await {
				tracing::warn!(source = ?error, "Failed to log ticket creation");
			}
		}

		tracing::info!(user = %request.requester_name, channel = %channel_id, "Ticket created");
		Ok(channel_id)
	}

	/// Closes a ticket: posts the closure notice, unregisters the ticket, and schedules the channel for deletion.
	///
	/// Returns the registry record if the ticket was tracked.
	pub async fn close_ticket(
		&self,
		request: CloseRequest,
		settings: &TicketSettings,
	) -> Result<Option<Ticket>, TicketError> {
		let channel_id = request.channel_id;
		let channel_name = self.platform.channel_name(channel_id);
		let named_like_ticket = channel_name
			.as_deref()
			.is_some_and(|name| name.starts_with(TICKET_CHANNEL_PREFIX));

		{
			let mut state = self.state.lock().await;
			if state.closing.contains_key(&channel_id) {
				return Err(TicketError::NotATicket);
			}
			if !named_like_ticket && !state.registry.is_tracked(channel_id) {
				return Err(TicketError::NotATicket);
			}
			state.closing.insert(channel_id, None);
		}

		let notice = ClosureNotice {
			channel_id,
			channel_name: channel_name.unwrap_or_else(|| channel_id.to_string()),
			closed_by: request.actor_name,
			reason: request.reason.unwrap_or_else(|| String::from(DEFAULT_CLOSE_REASON)),
		};
		if let Err(error) = self.platform.post_closure_notice(&notice).await {
			self.state.lock().await.closing.remove(&channel_id);
			tracing::error!(source = ?error, channel = %channel_id, "Error closing ticket");
			return Err(TicketError::Platform(error));
		}

		if let Some(log_channel) = settings.log_channel {
			let entry = TicketLogEntry::Closed(notice.clone());
			if let Err(error) = self.platform.post_log(log_channel, &entry).await {
				tracing::warn!(source = ?error, "Failed to log ticket closure");
			}
		}

		let deletion = self.spawn_deletion(channel_id);
		let ticket = {
			let mut state = self.state.lock().await;
			if let Some(slot) = state.closing.get_mut(&channel_id) {
				*slot = Some(deletion);
			}
			state.registry.unregister(channel_id).ok()
		};

		tracing::info!(channel = %notice.channel_name, closed_by = %notice.closed_by, reason = %notice.reason, "Ticket closed");
		Ok(ticket)
	}

	/// Stops a scheduled deletion. The channel stays, untracked. Returns whether a deletion was pending.
	pub async fn cancel_deletion(&self, channel_id: Id<ChannelMarker>) -> bool {
		let mut state = self.state.lock().await;
		match state.closing.get(&channel_id) {
			Some(Some(_)) => {}
			_ => return false,
		}
		match state.closing.remove(&channel_id) {
			Some(Some(handle)) => {
				handle.abort();
				true
			}
			_ => false,
		}
	}

	pub async fn has_pending_deletion(&self, channel_id: Id<ChannelMarker>) -> bool {
		matches!(self.state.lock().await.closing.get(&channel_id), Some(Some(_)))
	}

	pub async fn add_member(
		&self,
		channel_id: Id<ChannelMarker>,
		actor_is_staff: bool,
		user_id: Id<UserMarker>,
	) -> Result<(), TicketError> {
		self.set_member_access(channel_id, actor_is_staff, user_id, MemberAccess::Granted)
			.await
	}

	pub async fn remove_member(
		&self,
		channel_id: Id<ChannelMarker>,
		actor_is_staff: bool,
		user_id: Id<UserMarker>,
	) -> Result<(), TicketError> {
		self.set_member_access(channel_id, actor_is_staff, user_id, MemberAccess::Revoked)
			.await
	}

	async fn set_member_access(
		&self,
		channel_id: Id<ChannelMarker>,
		actor_is_staff: bool,
		user_id: Id<UserMarker>,
		access: MemberAccess,
	) -> Result<(), TicketError> {
		if !self.is_ticket_channel(channel_id).await {
			return Err(TicketError::NotATicket);
		}
		if !actor_is_staff {
			return Err(TicketError::MissingPermission);
		}
		self.platform
			.set_member_access(channel_id, user_id, access)
			.await
			.map_err(|error| {
				tracing::error!(source = ?error, channel = %channel_id, user = %user_id, ?access, "Failed to update ticket member");
				TicketError::Platform(error)
			})
	}

	fn named_like_ticket(&self, channel_id: Id<ChannelMarker>) -> bool {
		self.platform
			.channel_name(channel_id)
			.is_some_and(|name| name.starts_with(TICKET_CHANNEL_PREFIX))
	}

	fn spawn_deletion(&self, channel_id: Id<ChannelMarker>) -> JoinHandle<()> {
		let platform = Arc::clone(&self.platform);
		let state = Arc::clone(&self.state);
		let delay = self.deletion_delay;
		tokio::spawn(async move {
			sleep(delay).await;
			if let Err(error) = platform.delete_channel(channel_id).await {
				tracing::error!(source = ?error, channel = %channel_id, "Failed to delete closed ticket channel");
			}
			state.lock().await.closing.remove(&channel_id);
		})
	}
}

/// Builds a ticket channel name from a username, following Discord's text channel naming rules.
pub fn ticket_channel_name(username: &str) -> String {
	let mut name = String::from(TICKET_CHANNEL_PREFIX);
	let mut last_was_separator = false;
	for c in username.trim().chars().flat_map(char::to_lowercase) {
		if c.is_whitespace() || c == '-' {
			if !last_was_separator {
				name.push('-');
			}
			last_was_separator = true;
		} else {
			name.push(c);
			last_was_separator = false;
		}
	}
	name.chars().take(MAX_CHANNEL_NAME_LENGTH).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use miette::miette;
	use std::sync::Mutex as StdMutex;
	use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

	const GUILD: u64 = 10;
	const STAFF: u64 = 99;

	#[derive(Default)]
	struct FakePlatform {
		next_channel: AtomicU64,
		names: StdMutex<HashMap<Id<ChannelMarker>, String>>,
		introductions: StdMutex<Vec<(Id<ChannelMarker>, Id<UserMarker>)>>,
		notices: StdMutex<Vec<ClosureNotice>>,
		logs: StdMutex<Vec<(Id<ChannelMarker>, TicketLogEntry)>>,
		access: StdMutex<Vec<(Id<ChannelMarker>, Id<UserMarker>, MemberAccess)>>,
		deleted: StdMutex<Vec<Id<ChannelMarker>>>,
		fail_provision: AtomicBool,
		fail_notice: AtomicBool,
	}

	impl FakePlatform {
		fn name_channel(&self, channel_id: u64, name: &str) {
			self.names
				.lock()
				.unwrap()
				.insert(Id::new(channel_id), name.to_string());
		}

		fn deleted(&self) -> Vec<Id<ChannelMarker>> {
			self.deleted.lock().unwrap().clone()
		}
	}

	#[async_trait]
	impl TicketPlatform for FakePlatform {
		fn channel_name(&self, channel_id: Id<ChannelMarker>) -> Option<String> {
			self.names.lock().unwrap().get(&channel_id).cloned()
		}

		async fn provision_channel(&self, request: &ChannelRequest) -> miette::Result<Id<ChannelMarker>> {
			// Suspend like a network round trip would.
			tokio::task::yield_now().await;
			if self.fail_provision.load(Ordering::SeqCst) {
				return Err(miette!("channel creation failed"));
			}
			let channel_id = Id::new(1000 + self.next_channel.fetch_add(1, Ordering::SeqCst));
			self.names.lock().unwrap().insert(channel_id, request.name.clone());
			Ok(channel_id)
		}

		async fn post_introduction(&self, channel_id: Id<ChannelMarker>, owner: Id<UserMarker>) -> miette::Result<()> {
			self.introductions.lock().unwrap().push((channel_id, owner));
			Ok(())
		}

		async fn post_closure_notice(&self, notice: &ClosureNotice) -> miette::Result<()> {
			tokio::task::yield_now().await;
			if self.fail_notice.load(Ordering::SeqCst) {
				return Err(miette!("send failed"));
			}
			self.notices.lock().unwrap().push(notice.clone());
			Ok(())
		}

		async fn post_log(&self, log_channel: Id<ChannelMarker>, entry: &TicketLogEntry) -> miette::Result<()> {
			self.logs.lock().unwrap().push((log_channel, entry.clone()));
			Ok(())
		}

		async fn set_member_access(
			&self,
			channel_id: Id<ChannelMarker>,
			user_id: Id<UserMarker>,
			access: MemberAccess,
		) -> miette::Result<()> {
			self.access.lock().unwrap().push((channel_id, user_id, access));
			Ok(())
		}

		async fn delete_channel(&self, channel_id: Id<ChannelMarker>) -> miette::Result<()> {
			self.deleted.lock().unwrap().push(channel_id);
			self.names.lock().unwrap().remove(&channel_id);
			Ok(())
		}
	}

	fn lifecycle() -> (Arc<FakePlatform>, TicketLifecycle<FakePlatform>) {
		let platform = Arc::new(FakePlatform::default());
		let lifecycle = TicketLifecycle::new(Arc::clone(&platform));
		(platform, lifecycle)
	}

	fn request(user: u64, name: &str) -> TicketRequest {
		TicketRequest {
			guild_id: Id::new(GUILD),
			requester_id: Id::new(user),
			requester_name: name.to_string(),
		}
	}

	fn close(channel_id: Id<ChannelMarker>, actor: &str, reason: Option<&str>) -> CloseRequest {
		CloseRequest {
			channel_id,
			actor_name: actor.to_string(),
			reason: reason.map(String::from),
		}
	}

	#[tokio::test(start_paused = true)]
	async fn create_duplicate_and_close() {
		let (platform, lifecycle) = lifecycle();
		let settings = TicketSettings::default();

		let channel = lifecycle.create_ticket(request(1, "Alice"), &settings).await.unwrap();
		assert_eq!(lifecycle.open_ticket_count().await, 1);
		assert_eq!(platform.channel_name(channel).as_deref(), Some("ticket-alice"));
		assert_eq!(platform.introductions.lock().unwrap().as_slice(), &[(channel, Id::new(1))]);

		let duplicate = lifecycle.create_ticket(request(1, "Alice"), &settings).await;
		assert!(matches!(
			duplicate,
			Err(TicketError::AlreadyOpen { existing: Some(existing) }) if existing == channel
		));
		assert_eq!(lifecycle.open_ticket_count().await, 1);

		let closed = lifecycle
			.close_ticket(close(channel, "staff", Some("resolved")), &settings)
			.await
			.unwrap();
		assert_eq!(closed.map(|ticket| ticket.user_id), Some(Id::new(1)));
		assert_eq!(lifecycle.open_ticket_count().await, 0);
		assert!(lifecycle.has_pending_deletion(channel).await);
		assert!(platform.deleted().is_empty());

		let notices = platform.notices.lock().unwrap().clone();
		assert_eq!(notices.len(), 1);
		assert_eq!(notices[0].closed_by, "staff");
		assert_eq!(notices[0].reason, "resolved");

		sleep(DELETION_DELAY + Duration::from_secs(1)).await;
		assert_eq!(platform.deleted(), vec![channel]);
		assert!(!lifecycle.has_pending_deletion(channel).await);
	}

	#[tokio::test]
	async fn concurrent_creation_for_one_user_yields_one_ticket() {
		let (platform, lifecycle) = lifecycle();
		let settings = TicketSettings::default();

		let (first, second) = tokio::join!(
			lifecycle.create_ticket(request(1, "alice"), &settings),
			lifecycle.create_ticket(request(1, "alice"), &settings),
		);

		assert!(first.is_ok());
		assert!(matches!(second, Err(TicketError::AlreadyOpen { .. })));
		assert_eq!(lifecycle.open_ticket_count().await, 1);
		assert_eq!(platform.introductions.lock().unwrap().len(), 1);
	}

	#[tokio::test]
	async fn limit_reached_leaves_registry_unchanged() {
		let (_, lifecycle) = lifecycle();
		let settings = TicketSettings {
			limit: 2,
			..TicketSettings::default()
		};
		lifecycle.create_ticket(request(1, "a"), &settings).await.unwrap();
		lifecycle.create_ticket(request(2, "b"), &settings).await.unwrap();

		let result = lifecycle.create_ticket(request(3, "c"), &settings).await;
		assert!(matches!(result, Err(TicketError::LimitReached { limit: 2 })));
		assert_eq!(lifecycle.open_ticket_count().await, 2);
		assert!(lifecycle.find_open_ticket_for_user(Id::new(3)).await.is_none());
	}

	#[tokio::test]
	async fn failed_provisioning_releases_reservation() {
		let (platform, lifecycle) = lifecycle();
		let settings = TicketSettings {
			limit: 1,
			..TicketSettings::default()
		};
		platform.fail_provision.store(true, Ordering::SeqCst);
		let result = lifecycle.create_ticket(request(1, "a"), &settings).await;
		assert!(matches!(result, Err(TicketError::Platform(_))));

		platform.fail_provision.store(false, Ordering::SeqCst);
		lifecycle.create_ticket(request(1, "a"), &settings).await.unwrap();
	}

	#[tokio::test]
	async fn creation_and_closure_are_logged() {
		let (platform, lifecycle) = lifecycle();
		let settings = TicketSettings {
			log_channel: Some(Id::new(77)),
			..TicketSettings::default()
		};
		let channel = lifecycle.create_ticket(request(1, "a"), &settings).await.unwrap();
		lifecycle.close_ticket(close(channel, "a", None), &settings).await.unwrap();

		let logs = platform.logs.lock().unwrap().clone();
		assert_eq!(logs.len(), 2);
		assert!(matches!(&logs[0], (log, TicketLogEntry::Opened { channel_id, .. }) if *log == Id::new(77) && *channel_id == channel));
		assert!(matches!(&logs[1], (_, TicketLogEntry::Closed(notice)) if notice.reason == DEFAULT_CLOSE_REASON));
	}

	#[tokio::test]
	async fn second_close_is_rejected() {
		let (platform, lifecycle) = lifecycle();
		let settings = TicketSettings::default();
		let channel = lifecycle.create_ticket(request(1, "a"), &settings).await.unwrap();

		let (first, second) = tokio::join!(
			lifecycle.close_ticket(close(channel, "a", None), &settings),
			lifecycle.close_ticket(close(channel, "b", None), &settings),
		);
		assert!(first.is_ok());
		assert!(matches!(second, Err(TicketError::NotATicket)));
		assert_eq!(platform.notices.lock().unwrap().len(), 1);

		let third = lifecycle.close_ticket(close(channel, "a", None), &settings).await;
		assert!(matches!(third, Err(TicketError::NotATicket)));
	}

	#[tokio::test]
	async fn untracked_channels_need_ticket_names() {
		let (platform, lifecycle) = lifecycle();
		let settings = TicketSettings::default();
		platform.name_channel(500, "general");
		platform.name_channel(501, "ticket-bob");

		let result = lifecycle.close_ticket(close(Id::new(500), "a", None), &settings).await;
		assert!(matches!(result, Err(TicketError::NotATicket)));

		let result = lifecycle.close_ticket(close(Id::new(501), "a", None), &settings).await;
		assert!(matches!(result, Ok(None)));
		assert_eq!(platform.notices.lock().unwrap().len(), 1);
	}

	#[tokio::test]
	async fn failed_notice_keeps_ticket_open() {
		let (platform, lifecycle) = lifecycle();
		let settings = TicketSettings::default();
		let channel = lifecycle.create_ticket(request(1, "a"), &settings).await.unwrap();

		platform.fail_notice.store(true, Ordering::SeqCst);
		let result = lifecycle.close_ticket(close(channel, "a", None), &settings).await;
		assert!(matches!(result, Err(TicketError::Platform(_))));
		assert!(lifecycle.is_tracked(channel).await);
		assert!(lifecycle.is_ticket_channel(channel).await);

		platform.fail_notice.store(false, Ordering::SeqCst);
		lifecycle.close_ticket(close(channel, "a", None), &settings).await.unwrap();
		assert!(!lifecycle.is_tracked(channel).await);
	}

	#[tokio::test(start_paused = true)]
	async fn cancelled_deletion_keeps_channel() {
		let (platform, lifecycle) = lifecycle();
		let settings = TicketSettings::default();
		let channel = lifecycle.create_ticket(request(1, "a"), &settings).await.unwrap();
		lifecycle.close_ticket(close(channel, "a", None), &settings).await.unwrap();

		assert!(lifecycle.cancel_deletion(channel).await);
		assert!(!lifecycle.cancel_deletion(channel).await);
		sleep(DELETION_DELAY * 2).await;
		assert!(platform.deleted().is_empty());
	}

	#[tokio::test]
	async fn member_changes_require_ticket_and_staff() {
		let (platform, lifecycle) = lifecycle();
		let settings = TicketSettings::default();
		let channel = lifecycle.create_ticket(request(1, "a"), &settings).await.unwrap();
		platform.name_channel(600, "general");

		let result = lifecycle.add_member(Id::new(600), true, Id::new(STAFF)).await;
		assert!(matches!(result, Err(TicketError::NotATicket)));
		let result = lifecycle.add_member(channel, false, Id::new(2)).await;
		assert!(matches!(result, Err(TicketError::MissingPermission)));

		lifecycle.add_member(channel, true, Id::new(2)).await.unwrap();
		lifecycle.remove_member(channel, true, Id::new(2)).await.unwrap();
		assert_eq!(
			platform.access.lock().unwrap().as_slice(),
			&[
				(channel, Id::new(2), MemberAccess::Granted),
				(channel, Id::new(2), MemberAccess::Revoked),
			]
		);
		assert_eq!(lifecycle.open_ticket_count().await, 1);
	}

	#[test]
	fn channel_names() {
		assert_eq!(ticket_channel_name("Alice"), "ticket-alice");
		assert_eq!(ticket_channel_name("  Big  Bob "), "ticket-big-bob");
		assert_eq!(ticket_channel_name(&"x".repeat(200)).len(), MAX_CHANNEL_NAME_LENGTH);
	}
}
