// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::ApiConfig;
use miette::IntoDiagnostic;
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct StockData {
	#[serde(default)]
	pub gear_stock: Vec<StockItem>,
	#[serde(default)]
	pub seed_stock: Vec<StockItem>,
	#[serde(default)]
	pub egg_stock: Vec<StockItem>,
	#[serde(default)]
	pub cosmetic_stock: Vec<StockItem>,
	#[serde(default)]
	pub eventshop_stock: Vec<StockItem>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StockItem {
	pub item_id: String,
	pub quantity: u64,
}

/// One of the shop listings shown by `/stock`
#[derive(Clone, Copy, Debug)]
pub struct StockSection {
	pub title: &'static str,
	/// How many items from the listing are shown
	pub limit: usize,
	pub items: fn(&StockData) -> &[StockItem],
}

pub const STOCK_SECTIONS: [StockSection; 5] = [
	StockSection {
		title: "**GEAR STOCK**",
		limit: 11,
		items: gear_stock,
	},
	StockSection {
		title: "**SEEDS STOCK**",
		limit: 11,
		items: seed_stock,
	},
	StockSection {
		title: "**EGG STOCK**",
		limit: 4,
		items: egg_stock,
	},
	StockSection {
		title: "**COSMETICS STOCK**",
		limit: 11,
		items: cosmetic_stock,
	},
	StockSection {
		title: "**EVENT STOCK**",
		limit: 4,
		items: eventshop_stock,
	},
];

fn gear_stock(data: &StockData) -> &[StockItem] {
	&data.gear_stock
}

fn seed_stock(data: &StockData) -> &[StockItem] {
	&data.seed_stock
}

fn egg_stock(data: &StockData) -> &[StockItem] {
	&data.egg_stock
}

fn cosmetic_stock(data: &StockData) -> &[StockItem] {
	&data.cosmetic_stock
}

fn eventshop_stock(data: &StockData) -> &[StockItem] {
	&data.eventshop_stock
}

impl StockData {
	/// Gets the field title and body for each non-empty section, in display order.
	pub fn fields(&self) -> Vec<(&'static str, String)> {
		STOCK_SECTIONS
			.iter()
			.filter_map(|section| {
				let items = (section.items)(self);
				if items.is_empty() {
					None
				} else {
					Some((section.title, format_stock_items(items, section.limit)))
				}
			})
			.collect()
	}
}

/// Lists up to `limit` items as `name xN`, one per line.
pub fn format_stock_items(items: &[StockItem], limit: usize) -> String {
	items
		.iter()
		.take(limit)
		.map(|item| format!("{} x{}", item.item_id, item.quantity))
		.collect::<Vec<_>>()
		.join("\n")
}

#[derive(Clone, Debug)]
pub struct StockClient {
	http: reqwest::Client,
	url: String,
}

impl StockClient {
	pub fn new(http: reqwest::Client, config: &ApiConfig) -> Self {
		Self {
			http,
			url: config.stock_url.clone(),
		}
	}

	pub async fn fetch(&self) -> miette::Result<StockData> {
		self.http
			.get(&self.url)
			.send()
			.await
			.into_diagnostic()?
			.error_for_status()
			.into_diagnostic()?
			.json()
			.await
			.into_diagnostic()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn items(prefix: &str, count: usize) -> Vec<StockItem> {
		(0..count)
			.map(|index| StockItem {
				item_id: format!("{}{}", prefix, index),
				quantity: index as u64 + 1,
			})
			.collect()
	}

	#[test]
	fn parses_partial_payload() {
		let data: StockData = serde_json::from_str(
			r#"{"seed_stock":[{"item_id":"carrot","quantity":5,"icon":"x"}],"weather":{}}"#,
		)
		.unwrap();
		assert_eq!(data.seed_stock.len(), 1);
		assert!(data.gear_stock.is_empty());
		assert_eq!(data.fields(), vec![("**SEEDS STOCK**", String::from("carrot x5"))]);
	}

	#[test]
	fn sections_are_limited() {
		let data = StockData {
			gear_stock: items("gear", 20),
			egg_stock: items("egg", 6),
			eventshop_stock: items("event", 2),
			..StockData::default()
		};
		let fields = data.fields();
		let titles: Vec<&str> = fields.iter().map(|(title, _)| *title).collect();
		assert_eq!(titles, vec!["**GEAR STOCK**", "**EGG STOCK**", "**EVENT STOCK**"]);
		assert_eq!(fields[0].1.lines().count(), 11);
		assert_eq!(fields[1].1.lines().count(), 4);
		assert_eq!(fields[2].1, "event0 x1\nevent1 x2");
	}
}
