//! Profile field extraction.
//!
//! Administrators pick a remote field by its display name, e.g.
//! `"User Mail"` or `"Manager Job Title"`. The name is resolved against a
//! fixed table of [`ProfileField`]s; a name not in the table is
//! unsupported.

use kc_federation::AttributeValue;

use crate::model::GraphUser;

/// A readable field of a [`GraphUser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    /// Directory object ID.
    Id,
    /// Given name.
    GivenName,
    /// Business phone numbers (multi-valued).
    BusinessPhones,
    /// Display name.
    DisplayName,
    /// Job title.
    JobTitle,
    /// Mail address.
    Mail,
    /// Mobile phone number.
    MobilePhone,
    /// Office location.
    OfficeLocation,
    /// Preferred language.
    PreferredLanguage,
    /// Surname.
    Surname,
    /// User principal name.
    UserPrincipalName,
}

impl ProfileField {
    /// Every field, in display order.
    pub const ALL: [Self; 11] = [
        Self::Id,
        Self::GivenName,
        Self::BusinessPhones,
        Self::DisplayName,
        Self::JobTitle,
        Self::Mail,
        Self::MobilePhone,
        Self::OfficeLocation,
        Self::PreferredLanguage,
        Self::Surname,
        Self::UserPrincipalName,
    ];

    /// Returns the field's name without a prefix.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::GivenName => "Given Name",
            Self::BusinessPhones => "Business Phones",
            Self::DisplayName => "Display Name",
            Self::JobTitle => "Job Title",
            Self::Mail => "Mail",
            Self::MobilePhone => "Mobile Phone",
            Self::OfficeLocation => "Office Location",
            Self::PreferredLanguage => "Preferred Language",
            Self::Surname => "Surname",
            Self::UserPrincipalName => "User Principal Name",
        }
    }

    /// Reads this field off a profile.
    #[must_use]
    pub fn extract(self, profile: &GraphUser) -> AttributeValue {
        match self {
            Self::BusinessPhones => profile.business_phones.clone().into(),
            Self::Id => profile.id.clone().into(),
            Self::GivenName => profile.given_name.clone().into(),
            Self::DisplayName => profile.display_name.clone().into(),
            Self::JobTitle => profile.job_title.clone().into(),
            Self::Mail => profile.mail.clone().into(),
            Self::MobilePhone => profile.mobile_phone.clone().into(),
            Self::OfficeLocation => profile.office_location.clone().into(),
            Self::PreferredLanguage => profile.preferred_language.clone().into(),
            Self::Surname => profile.surname.clone().into(),
            Self::UserPrincipalName => profile.user_principal_name.clone().into(),
        }
    }
}

/// Field names as offered for one kind of profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRegistry {
    prefix: &'static str,
}

impl FieldRegistry {
    /// Fields of the logged-in user's own profile.
    pub const USER: Self = Self { prefix: "User " };

    /// Fields of the user's manager's profile.
    pub const MANAGER: Self = Self { prefix: "Manager " };

    /// Resolves a configured field name.
    #[must_use]
    pub fn resolve(&self, field_name: &str) -> Option<ProfileField> {
        let base = field_name.trim().strip_prefix(self.prefix)?;
        ProfileField::ALL.into_iter().find(|f| f.name() == base)
    }

    /// Extracts a named field, or `None` if the name is unsupported.
    #[must_use]
    pub fn extract(&self, profile: &GraphUser, field_name: &str) -> Option<AttributeValue> {
        self.resolve(field_name).map(|field| field.extract(profile))
    }

    /// Returns every supported field name, prefixed.
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        ProfileField::ALL
            .iter()
            .map(|f| format!("{}{}", self.prefix, f.name()))
            .collect()
    }
}
