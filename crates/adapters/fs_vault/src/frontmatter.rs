//! YAML front-matter reader.

use serde_json::{Map, Value};

/// The YAML between the leading `---` fences, if the text has any.
#[must_use]
pub fn split_front_matter(text: &str) -> Option<&str> {
    let text = text.trim_start_matches('\u{feff}');
    let rest = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))?;
    if let Some(stripped) = rest.strip_prefix("---") {
        return stripped
            .chars()
            .next()
            .is_none_or(|c| c == '\n' || c == '\r')
            .then_some("");
    }
    let end = rest.find("\n---")?;
    Some(&rest[..end])
}

/// Front-matter properties of a note; empty when it has none or when the
/// block is not a YAML mapping.
#[must_use]
pub fn parse(text: &str) -> Map<String, Value> {
    let Some(yaml) = split_front_matter(text) else {
        return Map::new();
    };
    let value = match serde_yaml::from_str::<serde_yaml::Value>(yaml) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(%error, "invalid front matter");
            return Map::new();
        }
    };
    match serde_json::to_value(value) {
        Ok(Value::Object(properties)) => properties,
        Ok(Value::Null) => Map::new(),
        Ok(other) => {
            tracing::debug!(kind = ?other, "front matter is not a mapping");
            Map::new()
        }
        Err(error) => {
            tracing::warn!(%error, "front matter does not convert to json");
            Map::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_split_front_matter_block() {
        let text = "---\nstatus: done\n---\nbody";
        assert_eq!(split_front_matter(text), Some("status: done"));
        assert_eq!(split_front_matter("no front matter"), None);
        assert_eq!(split_front_matter("---\n---\nbody"), Some(""));
    }

    #[test]
    fn should_parse_scalars() {
        let text = "---\nstatus: done\ncount: 3\nratio: 0.5\nflag: true\ntitle: \"Weekly: review\"\nempty:\n---\n";
        let props = parse(text);
        assert_eq!(props["status"], json!("done"));
        assert_eq!(props["count"], json!(3));
        assert_eq!(props["ratio"], json!(0.5));
        assert_eq!(props["flag"], json!(true));
        assert_eq!(props["title"], json!("Weekly: review"));
        assert_eq!(props["empty"], Value::Null);
    }

    #[test]
    fn should_parse_inline_and_block_lists() {
        let text = "---\ntags: [work, urgent]\naliases:\n  - one\n  - \"two\"\n---\n";
        let props = parse(text);
        assert_eq!(props["tags"], json!(["work", "urgent"]));
        assert_eq!(props["aliases"], json!(["one", "two"]));
    }

    #[test]
    fn should_parse_comments_nested_mappings_and_block_scalars() {
        let text = "---\nstatus: done # reviewed\nmeta:\n  owner: bob\nsummary: >\n  folded text\n---\nbody";
        let props = parse(text);
        assert_eq!(props["status"], json!("done"));
        assert_eq!(props["meta"], json!({ "owner": "bob" }));
        assert_eq!(props["meta"]["owner"], json!("bob"));
        assert_eq!(props["summary"].as_str().map(str::trim), Some("folded text"));
    }

    #[test]
    fn should_return_empty_map_for_invalid_or_scalar_front_matter() {
        assert!(parse("---\nstatus: [unclosed\n---\n").is_empty());
        assert!(parse("---\njust a sentence\n---\n").is_empty());
        assert!(parse("---\n---\nbody").is_empty());
    }

    #[test]
    fn should_return_empty_map_without_front_matter() {
        assert!(parse("# Title\n\nstatus: done").is_empty());
    }
}
