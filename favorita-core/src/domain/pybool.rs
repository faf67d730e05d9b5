//! Deserializers for boolean cells written by pandas (`True`/`False`).

use serde::{de::Error, Deserialize, Deserializer};

fn parse(raw: &str) -> Option<Result<bool, String>> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => None,
        "true" | "1" => Some(Ok(true)),
        "false" | "0" => Some(Ok(false)),
        other => Some(Err(format!("invalid boolean cell '{other}'"))),
    }
}

/// Required boolean. An empty cell is an error.
pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match parse(&raw) {
        Some(Ok(v)) => Ok(v),
        Some(Err(msg)) => Err(D::Error::custom(msg)),
        None => Err(D::Error::custom("empty boolean cell")),
    }
}

/// Optional boolean. An empty cell means unknown.
pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().and_then(parse) {
        Some(Ok(v)) => Ok(Some(v)),
        Some(Err(msg)) => Err(D::Error::custom(msg)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct Row {
        #[serde(deserialize_with = "deserialize")]
        required: bool,
        #[serde(default, deserialize_with = "deserialize_opt")]
        optional: Option<bool>,
    }

    fn rows(data: &str) -> Result<Vec<Row>, csv::Error> {
        csv::Reader::from_reader(data.as_bytes())
            .deserialize()
            .collect()
    }

    #[test]
    fn parses_pandas_spelling() {
        let parsed = rows("required,optional\nTrue,False\nfalse,TRUE\n").unwrap();
        assert!(parsed[0].required);
        assert_eq!(parsed[0].optional, Some(false));
        assert!(!parsed[1].required);
        assert_eq!(parsed[1].optional, Some(true));
    }

    #[test]
    fn empty_optional_cell_is_unknown() {
        let parsed = rows("required,optional\n1,\n").unwrap();
        assert!(parsed[0].required);
        assert_eq!(parsed[0].optional, None);
    }

    #[test]
    fn garbage_cell_is_rejected() {
        assert!(rows("required,optional\nmaybe,\n").is_err());
        assert!(rows("required,optional\n,True\n").is_err());
    }
}
