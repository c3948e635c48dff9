// src/database/models.rs
//! Row types as stored in PostgreSQL, converted into domain models

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;

use crate::models::{
    Appointment, AppointmentStatus, Doctor, Hospital, Inquiry, PackageRecord, TreatmentRecord,
};

/// Column list matching [`TreatmentRow`], `t` is treatments and `h` hospitals
pub(crate) const TREATMENT_COLUMNS: &str = "t.id, t.name, t.category, t.description, \
     t.success_rate, t.min_price, t.max_price, t.is_popular, t.hospital_id, \
     h.name AS hospital_name";

pub(crate) const PACKAGE_COLUMNS: &str = "id, slug, title, description, price, duration_days, \
     hospital_id, treatment_id, view_count, inquiry_count, is_featured, popularity_score, \
     created_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct HospitalRow {
    id: i64,
    name: String,
    slug: String,
    city: Option<String>,
    country: Option<String>,
    rating: Option<f64>,
    accreditation: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DoctorRow {
    id: i64,
    hospital_id: i64,
    name: String,
    specialty: Option<String>,
    experience_years: Option<i32>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TreatmentRow {
    id: i64,
    name: String,
    category: Option<String>,
    description: Option<String>,
    success_rate: Option<i32>, // CHECK constrained to 0..=100
    min_price: Option<i64>,
    max_price: Option<i64>,
    is_popular: Option<bool>,
    hospital_id: Option<i64>,
    hospital_name: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PackageRow {
    id: i64,
    slug: String,
    title: String,
    description: Option<String>,
    price: Option<i64>,
    duration_days: Option<i32>,
    hospital_id: Option<i64>,
    treatment_id: Option<i64>,
    view_count: i64,
    inquiry_count: i64,
    is_featured: bool,
    popularity_score: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct InquiryRow {
    id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    message: Option<String>,
    package_id: Option<i64>,
    treatment_id: Option<i64>,
    hospital_id: Option<i64>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AppointmentRow {
    id: i64,
    hospital_id: i64,
    doctor_id: Option<i64>,
    patient_name: String,
    email: String,
    phone: Option<String>,
    preferred_date: NaiveDate,
    notes: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

/// Counters returned by an atomic increment
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub(crate) struct CounterRow {
    pub id: i64,
    pub view_count: i64,
    pub inquiry_count: i64,
    pub is_featured: bool,
}

fn non_negative<T: TryFrom<i64>>(value: Option<i64>) -> Option<T> {
    value.and_then(|v| T::try_from(v.max(0)).ok())
}

impl From<HospitalRow> for Hospital {
    fn from(row: HospitalRow) -> Self {
        Hospital {
            id: row.id,
            name: row.name,
            slug: row.slug,
            city: row.city,
            country: row.country,
            rating: row.rating,
            accreditation: row.accreditation,
            created_at: row.created_at,
        }
    }
}

impl From<DoctorRow> for Doctor {
    fn from(row: DoctorRow) -> Self {
        Doctor {
            id: row.id,
            hospital_id: row.hospital_id,
            name: row.name,
            specialty: row.specialty,
            experience_years: non_negative(row.experience_years.map(i64::from)),
        }
    }
}

impl From<TreatmentRow> for TreatmentRecord {
    fn from(row: TreatmentRow) -> Self {
        TreatmentRecord {
            id: row.id,
            name: row.name,
            category: row.category,
            description: row.description,
            success_rate: row.success_rate.map(|rate| rate.clamp(0, 100) as u8),
            min_price: non_negative(row.min_price),
            max_price: non_negative(row.max_price),
            is_popular: row.is_popular,
            hospital_id: row.hospital_id,
            hospital_name: row.hospital_name,
        }
    }
}

impl From<PackageRow> for PackageRecord {
    fn from(row: PackageRow) -> Self {
        PackageRecord {
            id: row.id,
            slug: row.slug,
            title: row.title,
            description: row.description,
            price: non_negative(row.price),
            duration_days: non_negative(row.duration_days.map(i64::from)),
            hospital_id: row.hospital_id,
            treatment_id: row.treatment_id,
            view_count: row.view_count,
            inquiry_count: row.inquiry_count,
            is_featured: row.is_featured,
            popularity_score: row.popularity_score,
            created_at: row.created_at,
        }
    }
}

impl From<InquiryRow> for Inquiry {
    fn from(row: InquiryRow) -> Self {
        Inquiry {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            message: row.message,
            package_id: row.package_id,
            treatment_id: row.treatment_id,
            hospital_id: row.hospital_id,
            created_at: row.created_at,
        }
    }
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        let status = AppointmentStatus::try_from(row.status.as_str()).unwrap_or_else(|_| {
            warn!(
                "Appointment {} has unknown status {:?}, reporting as pending",
                row.id, row.status
            );
            AppointmentStatus::Pending
        });

        Appointment {
            id: row.id,
            hospital_id: row.hospital_id,
            doctor_id: row.doctor_id,
            patient_name: row.patient_name,
            email: row.email,
            phone: row.phone,
            preferred_date: row.preferred_date,
            notes: row.notes,
            status,
            created_at: row.created_at,
        }
    }
}
