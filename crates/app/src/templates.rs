//! Built-in template expander for dynamic `{{...}}` tokens.
//!
//! | Token               | Expands to                         |
//! |---------------------|------------------------------------|
//! | `{{date}}`          | `2026-03-14`                       |
//! | `{{time}}`          | `09:30`                            |
//! | `{{datetime}}`      | `2026-03-14 09:30`                 |
//! | `{{date:<fmt>}}`    | `now` formatted with strftime      |
//! | `{{timestamp}}`     | epoch milliseconds                 |
//! | `{{random}}`        | 8 random hex characters            |
//! | `{{random:N}}`      | `N` random hex characters (≤ 32)   |

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use uuid::Uuid;

use formgate_domain::time::Timestamp;

use crate::ports::TemplateExpander;

const DEFAULT_RANDOM_LEN: usize = 8;

/// Expander for the tokens listed in the module docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTemplates;

impl BuiltinTemplates {
    fn expand_token(token: &str, now: &Timestamp) -> Option<String> {
        let (name, arg) = match token.split_once(':') {
            Some((name, arg)) => (name.trim(), Some(arg)),
            None => (token.trim(), None),
        };
        match (name, arg) {
            ("date", None) => Some(now.format("%Y-%m-%d").to_string()),
            ("time", None) => Some(now.format("%H:%M").to_string()),
            ("datetime", None) => Some(now.format("%Y-%m-%d %H:%M").to_string()),
            ("date", Some(fmt)) => format_with(now, fmt),
            ("timestamp", None) => Some(now.timestamp_millis().to_string()),
            ("random", None) => Some(random_hex(DEFAULT_RANDOM_LEN)),
            ("random", Some(len)) => len.trim().parse().ok().map(random_hex),
            _ => None,
        }
    }
}

impl TemplateExpander for BuiltinTemplates {
    fn expand(&self, text: &str, now: &Timestamp) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("{{") {
            let Some(len) = rest[start + 2..].find("}}") else {
                break;
            };
            let token = &rest[start + 2..start + 2 + len];
            out.push_str(&rest[..start]);
            match Self::expand_token(token, now) {
                Some(value) => out.push_str(&value),
                None => out.push_str(&rest[start..start + len + 4]),
            }
            rest = &rest[start + len + 4..];
        }
        out.push_str(rest);
        out
    }
}

/// Format with a user-supplied strftime pattern, `None` when it is invalid.
fn format_with(now: &Timestamp, fmt: &str) -> Option<String> {
    if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
        return None;
    }
    let mut out = String::new();
    write!(out, "{}", now.format_with_items(StrftimeItems::new(fmt))).ok()?;
    Some(out)
}

fn random_hex(len: usize) -> String {
    let mut token = Uuid::new_v4().simple().to_string();
    token.truncate(len.min(32));
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn at() -> Timestamp {
        Local.with_ymd_and_hms(2026, 3, 14, 9, 5, 0).unwrap()
    }

    #[test]
    fn should_expand_date_and_time_tokens() {
        let out = BuiltinTemplates.expand("{{date}} {{time}} / {{datetime}}", &at());
        assert_eq!(out, "2026-03-14 09:05 / 2026-03-14 09:05");
    }

    #[test]
    fn should_expand_custom_date_format() {
        let out = BuiltinTemplates.expand("notes/{{date:%Y/%m}}/log", &at());
        assert_eq!(out, "notes/2026/03/log");
    }

    #[test]
    fn should_keep_invalid_format_intact() {
        let out = BuiltinTemplates.expand("{{date:%Q%}}", &at());
        assert_eq!(out, "{{date:%Q%}}");
    }

    #[test]
    fn should_expand_random_tokens_to_requested_length() {
        let out = BuiltinTemplates.expand("{{random}}-{{random:4}}", &at());
        let (a, b) = out.split_once('-').unwrap();
        assert_eq!(a.len(), 8);
        assert_eq!(b.len(), 4);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn should_expand_timestamp() {
        let out = BuiltinTemplates.expand("{{timestamp}}", &at());
        assert_eq!(out, at().timestamp_millis().to_string());
    }

    #[test]
    fn should_leave_unknown_and_unterminated_tokens_intact() {
        let text = "{{@Title}} {{weather}} {{date";
        assert_eq!(BuiltinTemplates.expand(text, &at()), text);
    }

    #[test]
    fn should_be_identity_without_tokens() {
        assert_eq!(BuiltinTemplates.expand("plain text", &at()), "plain text");
    }
}
