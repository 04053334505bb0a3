use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Contact {
    /// Assigned by the backend, absent until the contact has been created.
    #[serde(
        rename = "_id",
        alias = "id",
        default,
        deserialize_with = "deserialize_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub name_first: String,
    pub name_last: String,
    pub tel: String,
}

impl Contact {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::NameFirst => &self.name_first,
            Field::NameLast => &self.name_last,
            Field::Tel => &self.tel,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::NameFirst => self.name_first = value,
            Field::NameLast => self.name_last = value,
            Field::Tel => self.tel = value,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.name_last, self.name_first)
    }

    /// Checks whether the attribute values, joined without separator, contain `query`.
    ///
    /// The query is expected to be lower case already.
    pub fn matches(&self, query: &str) -> bool {
        let haystack = format!("{}{}{}", self.name_first, self.name_last, self.tel);

        haystack.to_lowercase().contains(query)
    }
}

impl From<NewContact> for Contact {
    fn from(val: NewContact) -> Self {
        Self {
            id: None,
            name_first: val.name_first,
            name_last: val.name_last,
            tel: val.tel,
        }
    }
}

/// The staged fields of a contact which has not been created yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewContact {
    pub name_first: String,
    pub name_last: String,
    pub tel: String,
}

impl NewContact {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::NameFirst => &self.name_first,
            Field::NameLast => &self.name_last,
            Field::Tel => &self.tel,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::NameFirst => self.name_first = value,
            Field::NameLast => self.name_last = value,
            Field::Tel => self.tel = value,
        }
    }

    /// Returns the first required field which is blank.
    pub fn missing(&self) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|field| self.get(*field).trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    NameFirst,
    NameLast,
    Tel,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::NameFirst, Field::NameLast, Field::Tel];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NameFirst => "name_first",
            Self::NameLast => "name_last",
            Self::Tel => "tel",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NameFirst => "First name",
            Self::NameLast => "Last name",
            Self::Tel => "Phone number",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(val: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == val)
            .ok_or_else(|| UnknownField(val.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "Unknown field {}, expected one of name_first, name_last or tel",
            self.0
        )
    }
}

impl std::error::Error for UnknownField {}

fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        String(String),
        Number(u64),
    }

    let val = Option::<Id>::deserialize(deserializer)?.map(|id| match id {
        Id::String(id) => id,
        Id::Number(id) => id.to_string(),
    });

    Ok(val)
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{from_str, json, to_value};

    fn jane() -> Contact {
        Contact {
            id: Some("1".to_owned()),
            name_first: "Jane".to_owned(),
            name_last: "Doe".to_owned(),
            tel: "555-0100".to_owned(),
        }
    }

    #[test]
    fn deserializes_backend_identifiers() {
        let contact = from_str::<Contact>(
            r#"{"_id":"1","name_first":"Jane","name_last":"Doe","tel":"555-0100","__v":0}"#,
        )
        .unwrap();
        assert_eq!(contact, jane());

        let contact = from_str::<Contact>(
            r#"{"id":1,"name_first":"Jane","name_last":"Doe","tel":"555-0100"}"#,
        )
        .unwrap();
        assert_eq!(contact, jane());

        let contact =
            from_str::<Contact>(r#"{"name_first":"Jane","name_last":"Doe","tel":"555-0100"}"#)
                .unwrap();
        assert_eq!(contact.id, None);
    }

    #[test]
    fn serializes_identifier_only_when_assigned() {
        assert_eq!(
            to_value(jane()).unwrap(),
            json!({"_id": "1", "name_first": "Jane", "name_last": "Doe", "tel": "555-0100"})
        );

        let contact = Contact {
            id: None,
            ..jane()
        };
        assert_eq!(
            to_value(contact).unwrap(),
            json!({"name_first": "Jane", "name_last": "Doe", "tel": "555-0100"})
        );
    }

    #[test]
    fn matches_joined_attributes_case_insensitively() {
        let contact = jane();

        assert!(contact.matches("doe"));
        assert!(contact.matches("janedoe"));
        assert!(contact.matches("doe555"));
        assert!(contact.matches("0100"));
        assert!(!contact.matches("jane doe"));
        assert!(!contact.matches("smith"));
    }

    #[test]
    fn identifier_is_not_searchable() {
        let contact = Contact {
            id: Some("abc123".to_owned()),
            ..jane()
        };

        assert!(!contact.matches("abc"));
    }

    #[test]
    fn fields_parse_from_wire_names() {
        assert_eq!("name_first".parse::<Field>().unwrap(), Field::NameFirst);
        assert_eq!("name_last".parse::<Field>().unwrap(), Field::NameLast);
        assert_eq!("tel".parse::<Field>().unwrap(), Field::Tel);
        assert_eq!(
            "phone".parse::<Field>().unwrap_err(),
            UnknownField("phone".to_owned())
        );
    }

    #[test]
    fn set_touches_only_the_named_field() {
        let mut contact = jane();
        contact.set(Field::Tel, "555-9999".to_owned());

        assert_eq!(contact.get(Field::Tel), "555-9999");
        assert_eq!(contact.get(Field::NameFirst), "Jane");
        assert_eq!(contact.get(Field::NameLast), "Doe");
    }

    #[test]
    fn missing_reports_first_blank_field() {
        let mut draft = NewContact::default();
        assert_eq!(draft.missing(), Some(Field::NameFirst));

        draft.set(Field::NameFirst, "Al".to_owned());
        draft.set(Field::NameLast, "  ".to_owned());
        assert_eq!(draft.missing(), Some(Field::NameLast));

        draft.set(Field::NameLast, "Lee".to_owned());
        draft.set(Field::Tel, "555-0101".to_owned());
        assert_eq!(draft.missing(), None);
    }
}
