use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Raw contact and schedule input. Values are stored exactly as typed;
/// trimming only happens when the validation gate reads them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantFields {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub preferred_date: String,
    pub preferred_time: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantField {
    FullName,
    Email,
    Phone,
    Country,
    PreferredDate,
    PreferredTime,
}

impl ApplicantField {
    pub const CONTACT: [ApplicantField; 4] = [
        ApplicantField::FullName,
        ApplicantField::Email,
        ApplicantField::Phone,
        ApplicantField::Country,
    ];
    pub const SCHEDULE: [ApplicantField; 2] =
        [ApplicantField::PreferredDate, ApplicantField::PreferredTime];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullName => "full_name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Country => "country",
            Self::PreferredDate => "preferred_date",
            Self::PreferredTime => "preferred_time",
        }
    }
}

impl fmt::Display for ApplicantField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicantField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "full_name" | "fullname" => Ok(Self::FullName),
            "email" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            "country" => Ok(Self::Country),
            "preferred_date" => Ok(Self::PreferredDate),
            "preferred_time" => Ok(Self::PreferredTime),
            other => Err(format!("unknown applicant field `{other}`")),
        }
    }
}

impl ApplicantFields {
    pub fn get(&self, field: ApplicantField) -> &str {
        match field {
            ApplicantField::FullName => &self.full_name,
            ApplicantField::Email => &self.email,
            ApplicantField::Phone => &self.phone,
            ApplicantField::Country => &self.country,
            ApplicantField::PreferredDate => &self.preferred_date,
            ApplicantField::PreferredTime => &self.preferred_time,
        }
    }

    pub fn set(&mut self, field: ApplicantField, value: impl Into<String>) {
        let slot = match field {
            ApplicantField::FullName => &mut self.full_name,
            ApplicantField::Email => &mut self.email,
            ApplicantField::Phone => &mut self.phone,
            ApplicantField::Country => &mut self.country,
            ApplicantField::PreferredDate => &mut self.preferred_date,
            ApplicantField::PreferredTime => &mut self.preferred_time,
        };
        *slot = value.into();
    }

    pub fn is_blank(&self, field: ApplicantField) -> bool {
        self.get(field).trim().is_empty()
    }
}
