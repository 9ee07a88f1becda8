// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::commands::{CLOSE_FAILED_MESSAGE, CLOSING_MESSAGE};
use crate::discord::state::BotState;
use crate::discord::utils::responses::{GUILD_ONLY, defer, respond_ephemeral, update_deferred};
use crate::discord::utils::users::interaction_author_name;
use crate::tickets::{CloseRequest, TicketError, TicketRequest};
use miette::bail;
use twilight_mention::fmt::Mention;
use twilight_model::gateway::payload::incoming::InteractionCreate;

const CREATE_FAILED_MESSAGE: &str = "An error occurred while creating your ticket. Please try again later.";
const CLOSE_BUTTON_REASON: &str = "Closed via button";

pub async fn create_ticket(interaction: &InteractionCreate, state: &BotState) -> miette::Result<()> {
	let Some(guild_id) = interaction.guild_id else {
		return respond_ephemeral(state, interaction, GUILD_ONLY).await;
	};
	let Some(user) = interaction.author() else {
		bail!("Ticket button used with no author");
	};

	// Channel creation can take longer than the interaction response window.
	defer(state, interaction, true).await?;

	let request = TicketRequest {
		guild_id,
		requester_id: user.id,
		requester_name: user.name.clone(),
	};
	let ticket_settings = state.settings.read().await.tickets.clone();
	let reply = match state.tickets.create_ticket(request, &ticket_settings).await {
		Ok(channel_id) => format!("Your ticket has been created: {}", channel_id.mention()),
		Err(TicketError::Platform(_)) => String::from(CREATE_FAILED_MESSAGE),
		Err(error) => {
			tracing::info!(user = %user.name, %error, "Ticket creation rejected");
			error.user_message()
		}
	};
	update_deferred(state, interaction, &reply).await
}

pub async fn close_ticket(interaction: &InteractionCreate, state: &BotState) -> miette::Result<()> {
	let Some(channel_id) = interaction.channel.as_ref().map(|channel| channel.id) else {
		bail!("Close button used without a channel");
	};
	let request = CloseRequest {
		channel_id,
		actor_name: interaction_author_name(interaction),
		reason: Some(String::from(CLOSE_BUTTON_REASON)),
	};
	let ticket_settings = state.settings.read().await.tickets.clone();
	let reply = match state.tickets.close_ticket(request, &ticket_settings).await {
		Ok(_) => CLOSING_MESSAGE,
		Err(TicketError::NotATicket) => "This button can only be used in ticket channels!",
		Err(_) => CLOSE_FAILED_MESSAGE,
	};
	respond_ephemeral(state, interaction, reply).await
}
