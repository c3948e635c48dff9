//! Data models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CatalogError;
use serde_helpers::*;

/// Hospital listed in the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub city: Option<String>,
    pub country: Option<String>,
    /// Average patient rating, 0.0 - 5.0
    pub rating: Option<f64>,
    pub accreditation: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Doctor practicing at a hospital
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: i64,
    pub hospital_id: i64,
    pub name: String,
    pub specialty: Option<String>,
    pub experience_years: Option<u16>,
}

/// Treatment offered by a hospital
///
/// Several hospitals usually offer the same treatment under slightly
/// different names, see [`crate::ranking`] for how they are collapsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentRecord {
    pub id: i64,
    /// Display name, seed data may carry a `[TEST]` marker
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    /// Success rate in percent, 0 - 100
    pub success_rate: Option<u8>,
    /// Lowest price in whole currency units
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub is_popular: Option<bool>,
    pub hospital_id: Option<i64>,
    pub hospital_name: Option<String>,
}

/// Bookable treatment package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRecord {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<u64>,
    pub duration_days: Option<u16>,
    pub hospital_id: Option<i64>,
    pub treatment_id: Option<i64>,
    /// Incremented once per detail-page fetch
    pub view_count: i64,
    /// Incremented once per inquiry referencing this package
    pub inquiry_count: i64,
    pub is_featured: bool,
    /// Derived from counters, or set directly by an administrator
    pub popularity_score: i64,
    pub created_at: DateTime<Utc>,
}

/// Package lookup by numeric id or by slug
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PackageKey {
    Id(i64),
    Slug(String),
}

impl From<&str> for PackageKey {
    fn from(value: &str) -> Self {
        let value = value.trim();
        match value.parse::<i64>() {
            Ok(id) => PackageKey::Id(id),
            Err(_) => PackageKey::Slug(value.to_string()),
        }
    }
}

impl std::fmt::Display for PackageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageKey::Id(id) => write!(f, "{id}"),
            PackageKey::Slug(slug) => f.write_str(slug),
        }
    }
}

/// Query parameters of the treatment listing
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentFilter {
    pub hospital_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_trimmed_string")]
    pub category: Option<String>,
    pub popular: Option<bool>,
    /// Collapse treatments by normalized name, on unless explicitly false
    pub dedupe: Option<bool>,
}

impl TreatmentFilter {
    pub fn dedupe(&self) -> bool {
        self.dedupe.unwrap_or(true)
    }
}

/// Query parameters of the package listing
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct PackageFilter {
    pub featured: Option<bool>,
}

/// Query parameters of the hospital listing
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct HospitalFilter {
    #[serde(default, deserialize_with = "deserialize_trimmed_string")]
    pub city: Option<String>,
}

/// Inquiry submitted from the public site
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInquiry {
    #[serde(deserialize_with = "deserialize_required_string")]
    pub name: String,
    #[serde(deserialize_with = "deserialize_required_string")]
    pub email: String,
    #[serde(default, deserialize_with = "deserialize_trimmed_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "deserialize_trimmed_string")]
    pub message: Option<String>,
    pub package_id: Option<i64>,
    pub treatment_id: Option<i64>,
    pub hospital_id: Option<i64>,
}

impl NewInquiry {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.is_empty() {
            return Err(CatalogError::InvalidInquiry("name is required".to_string()));
        }
        if !is_plausible_email(&self.email) {
            return Err(CatalogError::InvalidInquiry(format!(
                "invalid email address: {}",
                self.email
            )));
        }
        Ok(())
    }
}

/// Stored inquiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub package_id: Option<i64>,
    pub treatment_id: Option<i64>,
    pub hospital_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Appointment request from the booking wizard
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub hospital_id: i64,
    pub doctor_id: Option<i64>,
    #[serde(deserialize_with = "deserialize_required_string")]
    pub patient_name: String,
    #[serde(deserialize_with = "deserialize_required_string")]
    pub email: String,
    #[serde(default, deserialize_with = "deserialize_trimmed_string")]
    pub phone: Option<String>,
    pub preferred_date: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_trimmed_string")]
    pub notes: Option<String>,
}

impl NewAppointment {
    /// Validate against the current date, requests for past days are rejected
    pub fn validate(&self, today: NaiveDate) -> Result<(), CatalogError> {
        if self.patient_name.is_empty() {
            return Err(CatalogError::InvalidAppointment(
                "patient name is required".to_string(),
            ));
        }
        if !is_plausible_email(&self.email) {
            return Err(CatalogError::InvalidAppointment(format!(
                "invalid email address: {}",
                self.email
            )));
        }
        if self.preferred_date < today {
            return Err(CatalogError::InvalidAppointment(format!(
                "preferred date {} is in the past",
                self.preferred_date
            )));
        }
        Ok(())
    }
}

/// Appointment status, stored as text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<&str> for AppointmentStatus {
    type Error = CatalogError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(CatalogError::InvalidAppointment(format!(
                "unknown status: {other}"
            ))),
        }
    }
}

/// Stored appointment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    pub hospital_id: i64,
    pub doctor_id: Option<i64>,
    pub patient_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub preferred_date: NaiveDate,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

/// Body of the administrative popularity override
///
/// The score is kept as raw JSON so that floats, strings and negative
/// numbers reach validation instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularityOverride {
    #[serde(default)]
    pub popularity_score: serde_json::Value,
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

/// Custom deserializers
mod serde_helpers {
    use serde::{self, Deserialize, Deserializer};

    pub fn deserialize_trimmed_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        Ok(s.and_then(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }))
    }

    pub fn deserialize_required_string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.trim().to_string())
    }
}
