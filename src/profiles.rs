use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::attributes::{Field, FieldValue, FieldWrite};
use crate::classifier::PACKAGE_SETTINGS_INTELLIGENCE;

pub const GENERIC_PROPS: [(Field, &str); 2] = [(Field::TYPE, "user"), (Field::TAGS, "release-keys")];

const RECENT_PIXEL_PROPS: [(Field, &str); 8] = [
    (Field::BRAND, "google"),
    (Field::MANUFACTURER, "Google"),
    (Field::DEVICE, "komodo"),
    (Field::PRODUCT, "komodo"),
    (Field::HARDWARE, "komodo"),
    (Field::MODEL, "Pixel 9 Pro XL"),
    (Field::ID, "AP4A.241205.013"),
    (
        Field::FINGERPRINT,
        "google/komodo/komodo:15/AP4A.241205.013/12621605:user/release-keys",
    ),
];

const PIXEL_TABLET_PROPS: [(Field, &str); 8] = [
    (Field::BRAND, "google"),
    (Field::MANUFACTURER, "Google"),
    (Field::DEVICE, "tangorpro"),
    (Field::PRODUCT, "tangorpro"),
    (Field::HARDWARE, "tangorpro"),
    (Field::MODEL, "Pixel Tablet"),
    (Field::ID, "AP4A.241205.013"),
    (
        Field::FINGERPRINT,
        "google/tangorpro/tangorpro:15/AP4A.241205.013/12621605:user/release-keys",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinProfile {
    RecentPixelPhone,
    PixelTablet,
}

impl BuiltinProfile {
    pub fn for_form_factor(is_tablet: bool) -> Self {
        if is_tablet {
            BuiltinProfile::PixelTablet
        } else {
            BuiltinProfile::RecentPixelPhone
        }
    }

    pub fn profile(self) -> SubstitutionProfile {
        let (name, table) = match self {
            BuiltinProfile::RecentPixelPhone => ("RecentPixelPhone", &RECENT_PIXEL_PROPS),
            BuiltinProfile::PixelTablet => ("PixelTablet", &PIXEL_TABLET_PROPS),
        };
        SubstitutionProfile::from_pairs(Some(name.to_string()), table.iter().copied())
    }
}

/// A complete named set of identity values, applied in entry order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionProfile {
    pub name: Option<String>,
    entries: Vec<(Field, FieldValue)>,
}

impl SubstitutionProfile {
    pub fn new(name: Option<String>, entries: Vec<(Field, FieldValue)>) -> Self {
        Self { name, entries }
    }

    fn from_pairs<'a>(name: Option<String>, pairs: impl Iterator<Item = (Field, &'a str)>) -> Self {
        let entries = pairs.map(|(field, value)| (field, FieldValue::from(value))).collect();
        Self { name, entries }
    }

    pub fn generic() -> Self {
        Self::from_pairs(Some("Generic".to_string()), GENERIC_PROPS.iter().copied())
    }

    pub fn entries(&self) -> &[(Field, FieldValue)] {
        &self.entries
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.entries
            .iter()
            .rev()
            .find(|(f, _)| *f == field)
            .map(|(_, value)| value)
    }

    pub fn covers(&self, field: Field) -> bool {
        self.entries.iter().any(|(f, _)| *f == field)
    }

    pub fn to_writes(&self) -> Vec<FieldWrite> {
        self.entries
            .iter()
            .map(|(field, value)| FieldWrite {
                field: *field,
                value: value.clone(),
            })
            .collect()
    }
}

/// Fields a package must keep at their real value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionTable {
    keep: HashMap<String, BTreeSet<Field>>,
}

impl ExclusionTable {
    pub fn empty() -> Self {
        Self {
            keep: HashMap::new(),
        }
    }

    pub fn with_entry(mut self, package: &str, fields: &[Field]) -> Self {
        self.keep
            .entry(package.to_string())
            .or_default()
            .extend(fields.iter().copied());
        self
    }

    pub fn is_kept(&self, package: &str, field: Field) -> bool {
        self.keep
            .get(package)
            .map_or(false, |fields| fields.contains(&field))
    }
}

impl Default for ExclusionTable {
    fn default() -> Self {
        Self::empty().with_entry(PACKAGE_SETTINGS_INTELLIGENCE, &[Field::FINGERPRINT])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profiles_cover_the_same_fields() {
        let phone = BuiltinProfile::RecentPixelPhone.profile();
        let tablet = BuiltinProfile::PixelTablet.profile();
        for (field, _) in phone.entries() {
            assert!(tablet.covers(*field), "tablet profile lacks {}", field);
        }
        assert_eq!(phone.get(Field::MODEL), Some(&FieldValue::from("Pixel 9 Pro XL")));
        assert_eq!(tablet.get(Field::DEVICE), Some(&FieldValue::from("tangorpro")));
    }

    #[test]
    fn form_factor_selects_profile() {
        assert_eq!(BuiltinProfile::for_form_factor(true), BuiltinProfile::PixelTablet);
        assert_eq!(BuiltinProfile::for_form_factor(false), BuiltinProfile::RecentPixelPhone);
    }

    #[test]
    fn default_exclusions_keep_search_fingerprint() {
        let table = ExclusionTable::default();
        assert!(table.is_kept(PACKAGE_SETTINGS_INTELLIGENCE, Field::FINGERPRINT));
        assert!(!table.is_kept(PACKAGE_SETTINGS_INTELLIGENCE, Field::MODEL));
        assert!(!table.is_kept("com.android.chrome", Field::FINGERPRINT));
    }
}
