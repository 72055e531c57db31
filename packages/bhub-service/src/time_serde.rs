//! RFC 3339 timestamps on the wire, always emitted in UTC.
//!
//! Inputs may also be a bare `YYYY-MM-DD` date, read as midnight UTC.

pub mod option;

use serde::{Deserialize, Deserializer, Serializer};
use time::{
	Date, OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339,
	macros::format_description,
};

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let formatted =
		value.to_offset(UtcOffset::UTC).format(&Rfc3339).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&formatted)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;

	parse(&raw).map_err(serde::de::Error::custom)
}

pub fn parse(raw: &str) -> Result<OffsetDateTime, String> {
	let raw = raw.trim();

	if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
		return Ok(value);
	}

	Date::parse(raw, format_description!("[year]-[month]-[day]"))
		.map(|date| date.midnight().assume_utc())
		.map_err(|_| format!("Expected an RFC 3339 timestamp or a YYYY-MM-DD date, got {raw:?}."))
}
