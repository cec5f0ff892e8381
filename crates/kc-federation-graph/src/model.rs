//! Remote directory records.
//!
//! Records are owned by the fetch that produced them and never change
//! afterwards. Both serialise back to the same JSON shape they are read
//! from, which is how they are stored in the session cache.

use serde::{Deserialize, Deserializer, Serialize};

/// A user (or manager) profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphUser {
    /// Directory object ID.
    #[serde(default)]
    pub id: Option<String>,

    /// Given name.
    #[serde(default)]
    pub given_name: Option<String>,

    /// Surname.
    #[serde(default)]
    pub surname: Option<String>,

    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Job title.
    #[serde(default)]
    pub job_title: Option<String>,

    /// Business phone numbers.
    #[serde(default)]
    pub business_phones: Option<Vec<String>>,

    /// Primary mail address, lowercased on receipt.
    #[serde(default, deserialize_with = "lowercase")]
    pub mail: Option<String>,

    /// Mobile phone number.
    #[serde(default)]
    pub mobile_phone: Option<String>,

    /// Office location.
    #[serde(default)]
    pub office_location: Option<String>,

    /// Preferred language tag.
    #[serde(default)]
    pub preferred_language: Option<String>,

    /// User principal name.
    #[serde(default)]
    pub user_principal_name: Option<String>,
}

fn lowercase<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(|m| m.to_lowercase()))
}

/// A group the user is a transitive member of.
///
/// Only groups with a display name are ever constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphGroup {
    /// Directory object ID.
    pub id: String,

    /// Display name.
    pub display_name: String,

    /// Group description.
    #[serde(default)]
    pub description: Option<String>,

    /// Group mail address.
    #[serde(default)]
    pub mail: Option<String>,
}

/// A group as it appears on the wire, display name possibly null.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireGroup {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    mail: Option<String>,
}

impl WireGroup {
    /// Converts to a [`GraphGroup`], dropping groups without a display name.
    pub(crate) fn into_group(self) -> Option<GraphGroup> {
        Some(GraphGroup {
            id: self.id.unwrap_or_default(),
            display_name: self.display_name?,
            description: self.description,
            mail: self.mail,
        })
    }
}

/// One page of a collection response.
#[derive(Debug, Deserialize)]
pub(crate) struct GroupPage {
    #[serde(default)]
    pub(crate) value: Vec<WireGroup>,
    #[serde(default, rename = "@odata.nextLink")]
    pub(crate) next_link: Option<String>,
}
