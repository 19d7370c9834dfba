use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// CV snapshot as produced by the profile editing flows. Every field is optional
/// so partially filled drafts deserialize.
///
/// List sections are kept as opaque entries: scoring only asks whether a section
/// has entries and how many, so entry shapes are never inspected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CvData {
    #[serde(deserialize_with = "null_as_default")]
    pub personal_info: PersonalInfo,
    #[serde(deserialize_with = "section_entries")]
    pub experience: Vec<Value>,
    #[serde(deserialize_with = "section_entries")]
    pub education: Vec<Value>,
    #[serde(deserialize_with = "section_entries")]
    pub skills: Vec<Value>,
    #[serde(deserialize_with = "section_entries")]
    pub certifications: Vec<Value>,
    #[serde(deserialize_with = "section_entries")]
    pub languages: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub summary: Option<String>,
    pub photo_url: Option<String>,
    pub linkedin: Option<String>,
    pub portfolio: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A section that is `null` or not a list has no entries.
fn section_entries<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(entries) => entries,
        _ => Vec::new(),
    })
}

/// A field counts as present when it holds something other than whitespace.
pub(crate) fn is_present(field: &Option<String>) -> bool {
    field
        .as_deref()
        .map_or(false, |value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn camel_case_payload_with_missing_sections_deserializes() {
        let cv: CvData = serde_json::from_value(json!({
            "personalInfo": {
                "fullName": "Rina Hartono",
                "photoUrl": "https://cdn.example.com/rina.png"
            },
            "skills": [{ "name": "Rust" }]
        }))
        .expect("partial cv deserializes");

        assert_eq!(cv.personal_info.full_name.as_deref(), Some("Rina Hartono"));
        assert!(cv.personal_info.email.is_none());
        assert!(cv.experience.is_empty());
        assert_eq!(cv.skills.len(), 1);
    }

    #[test]
    fn section_entries_of_any_shape_are_counted() {
        let cv: CvData = serde_json::from_value(json!({
            "skills": ["Rust", { "name": "SQL", "level": 3 }, 42],
            "languages": [["id", "native"]]
        }))
        .expect("mixed entries deserialize");

        assert_eq!(cv.skills.len(), 3);
        assert_eq!(cv.languages.len(), 1);
    }

    #[test]
    fn null_sections_read_as_absent() {
        let cv: CvData = serde_json::from_value(json!({
            "personalInfo": null,
            "experience": null,
            "certifications": null,
            "education": "none yet"
        }))
        .expect("null sections deserialize");

        assert_eq!(cv, CvData::default());
    }

    #[test]
    fn blank_strings_are_not_present() {
        assert!(!is_present(&None));
        assert!(!is_present(&Some("   ".to_string())));
        assert!(is_present(&Some("x".to_string())));
    }
}
