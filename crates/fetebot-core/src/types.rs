//! Shared identifiers and the anniversary date codec.

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FetebotError;

/// Discord snowflakes travel as strings. Newtypes keep guild, member, and
/// channel ids from being swapped at call sites.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuildId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

macro_rules! impl_id {
    ($name:ident) => {
        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

impl_id!(GuildId);
impl_id!(MemberId);
impl_id!(ChannelId);

/// Canonical day/month separator. Stored documents and user input share it;
/// mixed separators across records are not supported.
pub const DATE_SEPARATOR: char = '/';

// Non-leap year used to validate day/month pairs. Feb 29 is rejected so
// matching stays deterministic across years.
const REFERENCE_YEAR: i32 = 2023;

/// A day+month anniversary with no year component. Serializes as its
/// canonical "DD/MM" text so persisted documents stay human-readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AnniversaryDate {
    day: u32,
    month: u32,
}

impl AnniversaryDate {
    pub fn new(day: u32, month: u32) -> Result<Self, FetebotError> {
        if NaiveDate::from_ymd_opt(REFERENCE_YEAR, month, day).is_none() {
            return Err(FetebotError::InvalidFormat(format!(
                "{day:02}{DATE_SEPARATOR}{month:02} is not a valid calendar date"
            )));
        }
        Ok(Self { day, month })
    }

    /// Parse the fixed "DD/MM" pattern: two digits, separator, two digits.
    pub fn parse(text: &str) -> Result<Self, FetebotError> {
        let invalid =
            || FetebotError::InvalidFormat(format!("expected DD{DATE_SEPARATOR}MM, got '{text}'"));
        let (day, month) = text.split_once(DATE_SEPARATOR).ok_or_else(invalid)?;
        if day.len() != 2 || month.len() != 2 {
            return Err(invalid());
        }
        let day: u32 = day.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(day, month)
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            day: date.day(),
            month: date.month(),
        }
    }

    /// Today's day/month from the UTC reference clock. All "is it this
    /// person's day" comparisons go through this single time source.
    pub fn today_utc() -> Self {
        Self::from_date(Utc::now().date_naive())
    }

    /// Days until the next occurrence as seen from `from`; 0 on the day
    /// itself. Used for display ordering only, never for triggering.
    pub fn days_until_next(&self, from: NaiveDate) -> i64 {
        // Feb 29 cannot be stored, so the pair resolves in every year.
        let occurrence = NaiveDate::from_ymd_opt(from.year(), self.month, self.day)
            .filter(|d| *d >= from)
            .or_else(|| NaiveDate::from_ymd_opt(from.year() + 1, self.month, self.day))
            .unwrap_or(from);
        (occurrence - from).num_days()
    }
}

impl fmt::Display for AnniversaryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{}{:02}", self.day, DATE_SEPARATOR, self.month)
    }
}

impl FromStr for AnniversaryDate {
    type Err = FetebotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AnniversaryDate {
    type Error = FetebotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AnniversaryDate> for String {
    fn from(date: AnniversaryDate) -> Self {
        date.to_string()
    }
}

/// Who an announcement celebrates. The "no target" case is an explicit
/// variant, not a null check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnounceTarget {
    /// A real guild member, mentioned in the announcement.
    Member { guild: GuildId, member: MemberId },
    /// A test/placeholder celebration with nobody behind it.
    Placeholder,
}

/// Resolved identity of a platform user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberProfile {
    pub id: MemberId,
    pub display_name: String,
}

/// Id of a message the platform accepted for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageId(pub String);

/// Handle to a discussion thread attached to an announcement message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadHandle(pub String);
