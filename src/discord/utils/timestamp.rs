// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, TimeZone, Utc};
use miette::IntoDiagnostic;
use std::time::Duration;
use twilight_model::util::datetime::Timestamp;
use twilight_util::snowflake::Snowflake;

/// Gets the timestamp from the ID snowflake. If any failures occur in the conversion, returns `None`.
pub fn datetime_from_id(id: impl Snowflake) -> Option<DateTime<Utc>> {
	let timestamp = id.timestamp();
	Utc.timestamp_millis_opt(timestamp).single()
}

/// Gets the [DateTime] object for a timestamp from Discord. If any failures occur in the conversion, returns `None`.
pub fn datetime_from_timestamp(timestamp: &Timestamp) -> Option<DateTime<Utc>> {
	let micros = timestamp.as_micros();
	Utc.timestamp_micros(micros).single()
}

/// The current time, for embed timestamps
pub fn current_timestamp() -> miette::Result<Timestamp> {
	Timestamp::from_secs(Utc::now().timestamp()).into_diagnostic()
}

/// Formats a time as a Discord relative timestamp (`<t:...:R>`).
pub fn relative_time(time: DateTime<Utc>) -> String {
	format!("<t:{}:R>", time.timestamp())
}

/// Formats a snowflake's creation time as a Discord relative timestamp, or "Unknown".
pub fn relative_time_from_id(id: impl Snowflake) -> String {
	datetime_from_id(id)
		.map(relative_time)
		.unwrap_or_else(|| String::from("Unknown"))
}

/// Formats a duration like `2d 3h 4m 5s`, skipping zero units.
pub fn format_uptime(uptime: Duration) -> String {
	let seconds = uptime.as_secs();
	let minutes = seconds / 60;
	let hours = minutes / 60;
	let days = hours / 24;

	let mut parts = Vec::new();
	if days > 0 {
		parts.push(format!("{}d", days));
	}
	if hours % 24 > 0 {
		parts.push(format!("{}h", hours % 24));
	}
	if minutes % 60 > 0 {
		parts.push(format!("{}m", minutes % 60));
	}
	if seconds % 60 > 0 {
		parts.push(format!("{}s", seconds % 60));
	}

	if parts.is_empty() {
		String::from("0s")
	} else {
		parts.join(" ")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use twilight_model::id::Id;
	use twilight_model::id::marker::UserMarker;

	#[test]
	fn uptime_formatting() {
		assert_eq!(format_uptime(Duration::from_millis(999)), "0s");
		assert_eq!(format_uptime(Duration::from_secs(59)), "59s");
		assert_eq!(format_uptime(Duration::from_secs(3600)), "1h");
		assert_eq!(format_uptime(Duration::from_secs(90061)), "1d 1h 1m 1s");
		assert_eq!(format_uptime(Duration::from_secs(2 * 86400 + 120)), "2d 2m");
	}

	#[test]
	fn snowflake_times() {
		// The snowflake epoch is 2015-01-01T00:00:00Z.
		let id: Id<UserMarker> = Id::new(1 << 22);
		let time = datetime_from_id(id).unwrap();
		assert_eq!(time.timestamp_millis(), 1_420_070_400_001);
		assert_eq!(relative_time_from_id(id), "<t:1420070400:R>");
	}
}
