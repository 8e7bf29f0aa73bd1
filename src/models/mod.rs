mod entities;

pub(crate) use entities::{Attachment, Client, Contract, PortfolioEntry, Property};

use serde::{Deserialize, Serialize};

/// How a field is edited and displayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FieldKind {
    Text,
    /// Filled by the upload step; edited with a file picker, shown as a link.
    File,
}

/// One declared field of an entity: wire key, display label, kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

/// A record kind managed by the back-office.
///
/// Implementations are generated by `entity!`; `FIELDS` is the declaration
/// order used by forms, tables and exports.
pub(crate) trait Entity:
    Clone + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static
{
    /// Remote collection name.
    const COLLECTION: &'static str;
    /// Plural display name ("Contratos").
    const TITLE: &'static str;
    /// Shown in the delete confirmation ("este contrato").
    const NOUN: &'static str;
    const FIELDS: &'static [FieldSpec];

    fn get(&self, key: &str) -> Option<&str>;
    fn get_mut(&mut self, key: &str) -> Option<&mut String>;

    /// Sets a declared field. Returns false for unknown keys.
    fn set(&mut self, key: &str, value: impl Into<String>) -> bool {
        match self.get_mut(key) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// Field values in declaration order.
    fn values(&self) -> Vec<&str> {
        Self::FIELDS
            .iter()
            .map(|f| self.get(f.key).unwrap_or_default())
            .collect()
    }

    fn file_field() -> Option<&'static FieldSpec> {
        Self::FIELDS.iter().find(|f| f.kind == FieldKind::File)
    }
}

/// A stored record: store-assigned identifier plus its fields.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Doc<E> {
    pub id: String,
    pub data: E,
}

impl<E: Entity> Doc<E> {
    pub fn new(id: impl Into<String>, data: E) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Signed-in account as returned by the identity service.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct AuthUser {
    pub uid: String,
    pub email: String,
    pub id_token: String,
    pub refresh_token: String,
}

macro_rules! entity {
    (
        $(#[$meta:meta])*
        $name:ident {
            collection: $collection:literal,
            title: $title:literal,
            noun: $noun:literal,
            fields: { $( $field:ident : $label:literal $kind:ident ),* $(,)? }
        }
    ) => {
        $(#[$meta])*
        #[derive(::serde::Serialize, ::serde::Deserialize, Clone, Debug, Default, PartialEq, Eq)]
        pub(crate) struct $name {
            $(
                #[serde(default)]
                pub $field: String,
            )*
        }

        impl $crate::models::Entity for $name {
            const COLLECTION: &'static str = $collection;
            const TITLE: &'static str = $title;
            const NOUN: &'static str = $noun;
            const FIELDS: &'static [$crate::models::FieldSpec] = &[
                $(
                    $crate::models::FieldSpec {
                        key: stringify!($field),
                        label: $label,
                        kind: $crate::models::FieldKind::$kind,
                    },
                )*
            ];

            fn get(&self, key: &str) -> Option<&str> {
                match key {
                    $( stringify!($field) => Some(self.$field.as_str()), )*
                    _ => None,
                }
            }

            fn get_mut(&mut self, key: &str) -> Option<&mut String> {
                match key {
                    $( stringify!($field) => Some(&mut self.$field), )*
                    _ => None,
                }
            }
        }
    };
}

pub(crate) use entity;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_follow_declaration_order() {
        let keys: Vec<&str> = Client::FIELDS.iter().map(|f| f.key).collect();
        assert_eq!(
            keys,
            vec!["documento", "contrato", "nombre", "direccion", "correo", "celular", "fijo", "ciudad"]
        );
    }

    #[test]
    fn test_set_and_get_by_key() {
        let mut c = Contract::default();
        assert!(c.set("canon", "1200000"));
        assert_eq!(c.get("canon"), Some("1200000"));
        assert_eq!(c.canon, "1200000");
        assert!(!c.set("unknown", "x"));
        assert_eq!(c.get("unknown"), None);
    }

    #[test]
    fn test_values_match_fields() {
        let p = Property {
            contrato: "C-1".to_string(),
            direccion: "Calle 10".to_string(),
            ..Default::default()
        };
        let values = p.values();
        assert_eq!(values.len(), Property::FIELDS.len());
        assert_eq!(values[0], "C-1");
        assert_eq!(values[2], "Calle 10");
    }

    #[test]
    fn test_only_attachment_has_file_field() {
        assert_eq!(Attachment::file_field().map(|f| f.key), Some("url"));
        assert!(Property::file_field().is_none());
        assert!(Client::file_field().is_none());
        assert!(Contract::file_field().is_none());
        assert!(PortfolioEntry::file_field().is_none());
    }

    #[test]
    fn test_entity_deserializes_with_missing_fields() {
        let parsed: Attachment =
            serde_json::from_str(r#"{"contrato": "C-9"}"#).expect("attachment should parse");
        assert_eq!(parsed.contrato, "C-9");
        assert!(parsed.url.is_empty());
    }
}
