use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// One of the four independent label dimensions.
///
/// Declaration order is the canonical field order used for every artifact.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    Subsystem,
    FailureMode,
    Impact,
    Cause,
}

impl Field {
    /// All fields in canonical order
    pub fn all() -> impl Iterator<Item = Field> {
        Field::iter()
    }

    pub fn as_str(&self) -> &str {
        self.as_ref()
    }
}

/// Mapping keyed by [`Field`], serialized as a JSON object with snake_case keys.
///
/// Unknown keys in input documents are dropped on deserialization, as are
/// `null` values, so records produced against a wider field set still load.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldMap<V>(BTreeMap<Field, V>);

impl<V> FieldMap<V> {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, field: Field) -> Option<&V> {
        self.0.get(&field)
    }

    pub fn get_mut(&mut self, field: Field) -> Option<&mut V> {
        self.0.get_mut(&field)
    }

    pub fn insert(&mut self, field: Field, value: V) -> Option<V> {
        self.0.insert(field, value)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &V)> {
        self.0.iter().map(|(field, value)| (*field, value))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V: Default> FieldMap<V> {
    /// Get the value for a field, inserting the default first if absent
    pub fn entry_or_default(&mut self, field: Field) -> &mut V {
        self.0.entry(field).or_default()
    }
}

impl<V> Default for FieldMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<(Field, V)> for FieldMap<V> {
    fn from_iter<I: IntoIterator<Item = (Field, V)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de, V: DeserializeOwned> Deserialize<'de> for FieldMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
        let mut map = BTreeMap::new();

        for (key, value) in raw.unwrap_or_default() {
            let Ok(field) = key.parse::<Field>() else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let value = serde_json::from_value(value).map_err(serde::de::Error::custom)?;
            map.insert(field, value);
        }

        Ok(Self(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names() {
        assert_eq!(Field::FailureMode.as_str(), "failure_mode");
        assert_eq!("cause".parse::<Field>().unwrap(), Field::Cause);
        assert!("incident_type".parse::<Field>().is_err());

        let names: Vec<String> = Field::all().map(|f| f.to_string()).collect();
        assert_eq!(names, ["subsystem", "failure_mode", "impact", "cause"]);
    }

    #[test]
    fn test_field_map_serializes_in_field_order() {
        let mut map = FieldMap::new();
        map.insert(Field::Cause, vec!["unknown".to_string()]);
        map.insert(Field::Subsystem, vec!["avionics".to_string()]);

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"subsystem":["avionics"],"cause":["unknown"]}"#);
    }

    #[test]
    fn test_field_map_drops_unknown_and_null_keys() {
        let json = r#"{"subsystem":["tanks"],"incident_type":["x"],"impact":null}"#;
        let map: FieldMap<Vec<String>> = serde_json::from_str(json).unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(Field::Subsystem).unwrap(), &vec!["tanks".to_string()]);
        assert!(!map.contains(Field::Impact));
    }

    #[test]
    fn test_field_map_null_document() {
        let map: FieldMap<Vec<String>> = serde_json::from_str("null").unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_field_map_rejects_malformed_values() {
        let json = r#"{"subsystem":"tanks"}"#;
        assert!(serde_json::from_str::<FieldMap<Vec<String>>>(json).is_err());
    }
}
