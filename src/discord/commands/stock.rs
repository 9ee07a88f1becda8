// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::apis::StockData;
use crate::discord::state::{BotState, seconds_left};
use crate::discord::utils::embeds::bot_embed;
use crate::discord::utils::responses::{defer, respond_ephemeral, update_deferred};
use crate::discord::utils::users::interaction_author_name;
use miette::{IntoDiagnostic, bail};
use std::time::Instant;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::channel::message::embed::Embed;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_util::builder::command::CommandBuilder;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder, ImageSource};

pub fn command_definition() -> Command {
	CommandBuilder::new("stock", "Check the current stock information", CommandType::ChatInput).build()
}

pub async fn handle_command(interaction: &InteractionCreate, state: &BotState) -> miette::Result<()> {
	if interaction.guild_id.is_none() {
		return respond_ephemeral(state, interaction, "Cannot use command in DM").await;
	}
	let Some(user_id) = interaction.author_id() else {
		bail!("Stock command used with no author");
	};

	let cooldown = state.stock_cooldowns.lock().await.try_use(user_id, Instant::now());
	if let Err(remaining) = cooldown {
		return respond_ephemeral(
			state,
			interaction,
			format!("Please wait {} seconds!", seconds_left(remaining)),
		)
		.await;
	}

	defer(state, interaction, false).await?;
	tracing::info!(user = %interaction_author_name(interaction), "Stock command used");

	let embed = match state.stock_client.fetch().await {
		Ok(stock) => {
			tracing::info!("Stock data fetched successfully");
			stock_embed(bot_embed(&state.bot_user)?, &stock, &state.bot_user.avatar_url)
		}
		Err(error) => Err(error),
	};
	match embed {
		Ok(embed) => {
			state
				.interaction_client()
				.update_response(&interaction.token)
				.embeds(Some(&[embed]))
				.await
				.into_diagnostic()?;
			Ok(())
		}
		Err(error) => {
			tracing::error!(source = ?error, user = %interaction_author_name(interaction), "Error fetching stock data");
			update_deferred(state, interaction, "**There was an error! Please try again later**").await
		}
	}
}

/// Adds a field for each shop listing that has items in stock.
pub fn stock_embed(builder: EmbedBuilder, stock: &StockData, thumbnail_url: &str) -> miette::Result<Embed> {
	let builder = stock
		.fields()
		.into_iter()
		.fold(builder, |builder, (title, items)| {
			builder.field(EmbedFieldBuilder::new(title, items))
		});
	builder
		.thumbnail(ImageSource::url(thumbnail_url).into_diagnostic()?)
		.validate()
		.into_diagnostic()
		.map(|builder| builder.build())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stock_fields() {
		let stock: StockData = serde_json::from_str(
			r#"{
				"gear_stock": [{"item_id": "trowel", "quantity": 2}],
				"seed_stock": [],
				"egg_stock": [{"item_id": "common_egg", "quantity": 1}, {"item_id": "rare_egg", "quantity": 3}]
			}"#,
		)
		.unwrap();
		let embed = stock_embed(
			EmbedBuilder::new(),
			&stock,
			"https://cdn.discordapp.com/embed/avatars/0.png",
		)
		.unwrap();
		let fields: Vec<(&str, &str)> = embed
			.fields
			.iter()
			.map(|field| (field.name.as_str(), field.value.as_str()))
			.collect();
		assert_eq!(
			fields,
			[
				("**GEAR STOCK**", "trowel x2"),
				("**EGG STOCK**", "common_egg x1\nrare_egg x3"),
			]
		);
		assert!(embed.fields.iter().all(|field| !field.inline));
		assert!(embed.thumbnail.is_some());
	}
}
