//! Date helper functions

use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Timelike};
use chrono_tz::Tz;

use crate::i18n::I18n;

/// Parse a publication timestamp as sent by the content API
///
/// Accepts RFC 3339 (`2023-03-15T10:00:00Z`) and the `+0000` offset form the
/// API actually emits (`2021-03-25T19:25:28+0000`).
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }

    ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"]
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
}

/// Formats publication dates with a date-fns style pattern in a fixed
/// timezone and locale
///
/// # Examples
/// ```ignore
/// let formatter = DateFormatter::new("dd MMM yyyy", "", I18n::new("pt-BR"))?;
/// formatter.format(Some("2023-03-15T10:00:00Z")) // -> "15 mar 2023"
/// ```
#[derive(Debug, Clone)]
pub struct DateFormatter {
    tokens: Vec<Token>,
    timezone: Tz,
    i18n: I18n,
}

impl DateFormatter {
    /// An empty `timezone` means UTC
    pub fn new(pattern: &str, timezone: &str, i18n: I18n) -> Result<Self> {
        let timezone = if timezone.trim().is_empty() {
            Tz::UTC
        } else {
            timezone
                .trim()
                .parse::<Tz>()
                .map_err(|e| anyhow!("Invalid timezone {:?}: {}", timezone, e))?
        };

        Ok(Self {
            tokens: tokenize(pattern),
            timezone,
            i18n,
        })
    }

    /// Format a nullable timestamp; `None` renders as an empty string
    pub fn format(&self, timestamp: Option<&str>) -> String {
        let Some(raw) = timestamp.filter(|t| !t.trim().is_empty()) else {
            return String::new();
        };

        match parse_timestamp(raw) {
            Some(dt) => self.format_datetime(&dt),
            None => {
                tracing::debug!("Unparseable timestamp {:?}, rendering as-is", raw);
                raw.to_string()
            }
        }
    }

    /// Format an already parsed date
    pub fn format_datetime<Z: TimeZone>(&self, date: &DateTime<Z>) -> String {
        let date = date.with_timezone(&self.timezone);
        let mut out = String::new();

        for token in &self.tokens {
            match token {
                Token::Literal(s) => out.push_str(s),
                Token::Year4 => out.push_str(&format!("{:04}", date.year())),
                Token::Year2 => out.push_str(&format!("{:02}", date.year().rem_euclid(100))),
                Token::MonthLong => out.push_str(&self.i18n.month_long(date.month())),
                Token::MonthShort => out.push_str(&self.i18n.month_short(date.month())),
                Token::Month2 => out.push_str(&format!("{:02}", date.month())),
                Token::Month => out.push_str(&date.month().to_string()),
                Token::Day2 => out.push_str(&format!("{:02}", date.day())),
                Token::Day => out.push_str(&date.day().to_string()),
                Token::Hour2 => out.push_str(&format!("{:02}", date.hour())),
                Token::Minute2 => out.push_str(&format!("{:02}", date.minute())),
                Token::Second2 => out.push_str(&format!("{:02}", date.second())),
            }
        }

        out
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    Year4,
    Year2,
    MonthLong,
    MonthShort,
    Month2,
    Month,
    Day2,
    Day,
    Hour2,
    Minute2,
    Second2,
}

/// Split a date-fns / moment style pattern into tokens
///
/// Runs of the same letter form one field; text in single quotes is literal.
fn tokenize(pattern: &str) -> Vec<Token> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            let end = chars[i + 1..]
                .iter()
                .position(|&q| q == '\'')
                .map(|p| i + 1 + p)
                .unwrap_or(chars.len());
            literal.extend(&chars[i + 1..end]);
            i = end + 1;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&r| r == c).count();
        let field = match (c, run) {
            ('y' | 'Y', 4..) => Some(Token::Year4),
            ('y' | 'Y', 2) => Some(Token::Year2),
            ('M', 4..) => Some(Token::MonthLong),
            ('M', 3) => Some(Token::MonthShort),
            ('M', 2) => Some(Token::Month2),
            ('M', 1) => Some(Token::Month),
            ('d' | 'D', 2) => Some(Token::Day2),
            ('d' | 'D', 1) => Some(Token::Day),
            ('H', 2) => Some(Token::Hour2),
            ('m', 2) => Some(Token::Minute2),
            ('s', 2) => Some(Token::Second2),
            _ => None,
        };

        match field {
            Some(token) => {
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(token);
            }
            None => literal.extend(&chars[i..i + run]),
        }
        i += run;
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }

    tokens
}
