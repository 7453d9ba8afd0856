//! 序列化/反序列化辅助模块

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 区分"字段缺省"与"字段显式为null"的双层Option
///
/// 缺省 -> None（不修改），null -> Some(None)（清除），值 -> Some(Some(v))。
pub mod double_option {
    use super::*;

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, with = "super::double_option")]
        collection: Option<Option<String>>,
    }

    #[test]
    fn test_double_option() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.collection, None);

        let null: Patch = serde_json::from_str(r#"{"collection": null}"#).unwrap();
        assert_eq!(null.collection, Some(None));

        let value: Patch = serde_json::from_str(r#"{"collection": "reading"}"#).unwrap();
        assert_eq!(value.collection, Some(Some("reading".to_string())));
    }
}
