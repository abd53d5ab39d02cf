//! Serde adapters shared by resource configuration and state types
//!
//! Nested blocks are carried as lists of at most one element so that their
//! flattened keys read `block.0.field`. Users may still write a single object
//! in their configuration; both shapes deserialize to the same value.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrList<T> {
    List(Vec<T>),
    One(T),
}

fn at_most_one<'de, D, T>(value: Option<OneOrList<T>>) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
{
    match value {
        None => Ok(None),
        Some(OneOrList::One(item)) => Ok(Some(item)),
        Some(OneOrList::List(mut items)) => match items.len() {
            0 | 1 => Ok(items.pop()),
            n => Err(D::Error::custom(format!(
                "expected at most 1 block, found {}",
                n
            ))),
        },
    }
}

/// `Option<T>` stored as a block list with zero or one element
///
/// Use with `#[serde(default, with = "cirrus_core::serde_ext::optional_block")]`.
pub mod optional_block {
    use super::*;
    use serde::Serializer;
    use serde::Serialize;

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(block) => [block].serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        let value = Option::<OneOrList<T>>::deserialize(deserializer)?;
        at_most_one::<D, T>(value)
    }
}

/// `T` stored as a block list with exactly one element
pub mod required_block {
    use super::*;
    use serde::de::Error as _;
    use serde::Serializer;
    use serde::Serialize;

    pub fn serialize<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        [value].serialize(serializer)
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        let value = Option::<OneOrList<T>>::deserialize(deserializer)?;
        at_most_one::<D, T>(value)?.ok_or_else(|| D::Error::custom("expected exactly 1 block, found 0"))
    }
}

/// Deserialize an optional string, treating `""` as unset
pub fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Inner {
        uri: String,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Outer {
        #[serde(default, with = "optional_block", skip_serializing_if = "Option::is_none")]
        location: Option<Inner>,
        #[serde(with = "required_block")]
        required: Inner,
        #[serde(default, deserialize_with = "non_empty")]
        description: Option<String>,
    }

    #[test]
    fn test_blocks_serialize_as_single_element_lists() {
        let outer = Outer {
            location: Some(Inner { uri: "s3://a".into() }),
            required: Inner { uri: "s3://b".into() },
            description: None,
        };

        let value = serde_json::to_value(&outer).unwrap();
        assert_eq!(value["location"], json!([{ "uri": "s3://a" }]));
        assert_eq!(value["required"], json!([{ "uri": "s3://b" }]));
    }

    #[test]
    fn test_blocks_accept_object_or_list() {
        let outer: Outer = serde_json::from_value(json!({
            "location": { "uri": "s3://a" },
            "required": [{ "uri": "s3://b" }],
            "description": "",
        }))
        .unwrap();

        assert_eq!(outer.location, Some(Inner { uri: "s3://a".into() }));
        assert_eq!(outer.required.uri, "s3://b");
        assert_eq!(outer.description, None);
    }

    #[test]
    fn test_rejects_more_than_one_block() {
        let result: Result<Outer, _> = serde_json::from_value(json!({
            "location": [{ "uri": "s3://a" }, { "uri": "s3://c" }],
            "required": { "uri": "s3://b" },
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_required_block_fails() {
        let result: Result<Outer, _> = serde_json::from_value(json!({ "required": [] }));
        assert!(result.is_err());
    }
}
