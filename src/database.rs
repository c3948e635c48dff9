// src/database.rs
mod models;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::{debug, error, info, warn};

use crate::{
    config::DatabaseConfig,
    errors::CatalogError,
    models::{
        Appointment, AppointmentStatus, Doctor, Hospital, Inquiry, NewAppointment, NewInquiry,
        PackageKey, PackageRecord, TreatmentFilter, TreatmentRecord,
    },
    scoring::{popularity_score, PopularityScore},
};
use self::models::{
    AppointmentRow, CounterRow, DoctorRow, HospitalRow, InquiryRow, PackageRow, TreatmentRow,
    PACKAGE_COLUMNS, TREATMENT_COLUMNS,
};

/// Repository operations used by the HTTP layer
///
/// Passed explicitly into the router state, so handlers never reach for a
/// process-wide connection.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_hospitals(&self, city: Option<&str>) -> Result<Vec<Hospital>, CatalogError>;

    async fn get_hospital(&self, id: i64) -> Result<Option<Hospital>, CatalogError>;

    async fn list_doctors(&self, hospital_id: i64) -> Result<Vec<Doctor>, CatalogError>;

    /// Raw treatment rows matching the filter, unranked
    async fn list_treatments(
        &self,
        filter: &TreatmentFilter,
    ) -> Result<Vec<TreatmentRecord>, CatalogError>;

    async fn get_treatment(&self, id: i64) -> Result<Option<TreatmentRecord>, CatalogError>;

    /// Packages ordered by popularity score, highest first
    async fn list_packages(&self, featured: Option<bool>)
        -> Result<Vec<PackageRecord>, CatalogError>;

    /// Fetch a package for its detail page, counting one view
    async fn view_package(&self, key: &PackageKey)
        -> Result<Option<PackageRecord>, CatalogError>;

    /// Store an inquiry, counting it against the referenced package
    async fn create_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry, CatalogError>;

    async fn create_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<Appointment, CatalogError>;

    /// Persist an administrator-chosen score verbatim
    async fn override_popularity(
        &self,
        package_id: i64,
        score: PopularityScore,
    ) -> Result<Option<PackageRecord>, CatalogError>;
}

/// PostgreSQL backed catalog
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Wrap an existing pool and apply pending migrations
    pub async fn new(pool: PgPool) -> Result<Self, CatalogError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Connect with pool settings from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, CatalogError> {
        config.validate()?;

        info!(
            "Connecting to database: max_connections={}, acquire_timeout={:?}",
            config.max_connections, config.acquire_timeout
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| {
                error!("Failed to connect to database: {}", e);
                e
            })?;

        Self::new(pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Write the score derived from freshly incremented counters
///
/// Must run in the same transaction as the increment: the row lock taken by
/// that `UPDATE` keeps other writers out until commit.
async fn refresh_popularity(
    conn: &mut PgConnection,
    counters: CounterRow,
) -> Result<(), CatalogError> {
    let score = popularity_score(
        counters.view_count,
        counters.inquiry_count,
        counters.is_featured,
    );

    sqlx::query("UPDATE packages SET popularity_score = $1 WHERE id = $2")
        .bind(score)
        .bind(counters.id)
        .execute(&mut *conn)
        .await?;

    debug!("Package {} rescored to {}", counters.id, score);
    Ok(())
}

#[async_trait]
impl CatalogStore for Database {
    async fn list_hospitals(&self, city: Option<&str>) -> Result<Vec<Hospital>, CatalogError> {
        let rows: Vec<HospitalRow> = sqlx::query_as(
            "SELECT id, name, slug, city, country, rating, accreditation, created_at
             FROM hospitals
             WHERE $1::TEXT IS NULL OR lower(city) = lower($1)
             ORDER BY name, id",
        )
        .bind(city)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Hospital::from).collect())
    }

    async fn get_hospital(&self, id: i64) -> Result<Option<Hospital>, CatalogError> {
        let row: Option<HospitalRow> = sqlx::query_as(
            "SELECT id, name, slug, city, country, rating, accreditation, created_at
             FROM hospitals WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Hospital::from))
    }

    async fn list_doctors(&self, hospital_id: i64) -> Result<Vec<Doctor>, CatalogError> {
        let rows: Vec<DoctorRow> = sqlx::query_as(
            "SELECT id, hospital_id, name, specialty, experience_years
             FROM doctors WHERE hospital_id = $1
             ORDER BY name, id",
        )
        .bind(hospital_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Doctor::from).collect())
    }

    async fn list_treatments(
        &self,
        filter: &TreatmentFilter,
    ) -> Result<Vec<TreatmentRecord>, CatalogError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
        query
            .push(TREATMENT_COLUMNS)
            .push(" FROM treatments t LEFT JOIN hospitals h ON h.id = t.hospital_id WHERE TRUE");

        if let Some(hospital_id) = filter.hospital_id {
            query.push(" AND t.hospital_id = ").push_bind(hospital_id);
        }
        if let Some(category) = &filter.category {
            query
                .push(" AND lower(t.category) = lower(")
                .push_bind(category.clone())
                .push(")");
        }
        if filter.popular == Some(true) {
            query.push(" AND t.is_popular IS TRUE");
        }

        let rows: Vec<TreatmentRow> = query.build_query_as().fetch_all(&self.pool).await?;
        debug!("Fetched {} treatment rows for {:?}", rows.len(), filter);

        Ok(rows.into_iter().map(TreatmentRecord::from).collect())
    }

    async fn get_treatment(&self, id: i64) -> Result<Option<TreatmentRecord>, CatalogError> {
        let sql = format!(
            "SELECT {TREATMENT_COLUMNS}
             FROM treatments t LEFT JOIN hospitals h ON h.id = t.hospital_id
             WHERE t.id = $1"
        );
        let row: Option<TreatmentRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(TreatmentRecord::from))
    }

    async fn list_packages(
        &self,
        featured: Option<bool>,
    ) -> Result<Vec<PackageRecord>, CatalogError> {
        let sql = format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages
             WHERE $1::BOOLEAN IS NULL OR is_featured = $1
             ORDER BY popularity_score DESC, id DESC"
        );
        let rows: Vec<PackageRow> = sqlx::query_as(&sql)
            .bind(featured)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(PackageRecord::from).collect())
    }

    async fn view_package(&self, key: &PackageKey) -> Result<Option<PackageRecord>, CatalogError> {
        let mut tx = self.pool.begin().await?;

        let counters: Option<CounterRow> = match key {
            PackageKey::Id(id) => {
                sqlx::query_as(
                    "UPDATE packages SET view_count = view_count + 1 WHERE id = $1
                     RETURNING id, view_count, inquiry_count, is_featured",
                )
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
            }
            PackageKey::Slug(slug) => {
                sqlx::query_as(
                    "UPDATE packages SET view_count = view_count + 1 WHERE slug = $1
                     RETURNING id, view_count, inquiry_count, is_featured",
                )
                .bind(slug)
                .fetch_optional(&mut *tx)
                .await?
            }
        };

        let Some(counters) = counters else {
            return Ok(None);
        };
        refresh_popularity(&mut *tx, counters).await?;

        let sql = format!("SELECT {PACKAGE_COLUMNS} FROM packages WHERE id = $1");
        let row: Option<PackageRow> = sqlx::query_as(&sql)
            .bind(counters.id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.map(PackageRecord::from))
    }

    async fn create_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry, CatalogError> {
        inquiry.validate()?;

        let mut tx = self.pool.begin().await?;

        let counters: Option<CounterRow> = match inquiry.package_id {
            Some(package_id) => {
                let counters: Option<CounterRow> = sqlx::query_as(
                    "UPDATE packages SET inquiry_count = inquiry_count + 1 WHERE id = $1
                     RETURNING id, view_count, inquiry_count, is_featured",
                )
                .bind(package_id)
                .fetch_optional(&mut *tx)
                .await?;

                if counters.is_none() {
                    warn!("Inquiry references missing package {}", package_id);
                    return Err(CatalogError::not_found("package", package_id));
                }
                counters
            }
            None => None,
        };

        let row: InquiryRow = sqlx::query_as(
            "INSERT INTO inquiries (
                name, email, phone, message, package_id, treatment_id, hospital_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, email, phone, message, package_id, treatment_id,
                hospital_id, created_at",
        )
        .bind(&inquiry.name)
        .bind(&inquiry.email)
        .bind(&inquiry.phone)
        .bind(&inquiry.message)
        .bind(inquiry.package_id)
        .bind(inquiry.treatment_id)
        .bind(inquiry.hospital_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(counters) = counters {
            refresh_popularity(&mut *tx, counters).await?;
        }
        tx.commit().await?;

        let inquiry = Inquiry::from(row);
        info!("Stored inquiry {}", inquiry.id);
        Ok(inquiry)
    }

    async fn create_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<Appointment, CatalogError> {
        appointment.validate(chrono::Utc::now().date_naive())?;

        if self.get_hospital(appointment.hospital_id).await?.is_none() {
            return Err(CatalogError::not_found("hospital", appointment.hospital_id));
        }

        let row: AppointmentRow = sqlx::query_as(
            "INSERT INTO appointments (
                hospital_id, doctor_id, patient_name, email, phone, preferred_date, notes, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, hospital_id, doctor_id, patient_name, email, phone,
                preferred_date, notes, status, created_at",
        )
        .bind(appointment.hospital_id)
        .bind(appointment.doctor_id)
        .bind(&appointment.patient_name)
        .bind(&appointment.email)
        .bind(&appointment.phone)
        .bind(appointment.preferred_date)
        .bind(&appointment.notes)
        .bind(AppointmentStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        let appointment = Appointment::from(row);
        info!(
            "Stored appointment {} at hospital {}",
            appointment.id, appointment.hospital_id
        );
        Ok(appointment)
    }

    async fn override_popularity(
        &self,
        package_id: i64,
        score: PopularityScore,
    ) -> Result<Option<PackageRecord>, CatalogError> {
        let sql = format!(
            "UPDATE packages SET popularity_score = $1 WHERE id = $2 RETURNING {PACKAGE_COLUMNS}"
        );
        let row: Option<PackageRow> = sqlx::query_as(&sql)
            .bind(score.value())
            .bind(package_id)
            .fetch_optional(&self.pool)
            .await?;

        if row.is_some() {
            info!(
                "Popularity score of package {} overridden to {}",
                package_id,
                score.value()
            );
        }
        Ok(row.map(PackageRecord::from))
    }
}
