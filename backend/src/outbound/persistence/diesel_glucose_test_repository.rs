//! PostgreSQL-backed glucose test store.
//!
//! List endpoints share one boxed filter builder so the count and the page
//! query always agree. Patient display fields are fetched with a second
//! query keyed by the page's patient ids rather than a join, because
//! `patient_id = 0` marks an unlinked row and has no counterpart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Integer;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use pagination::PageRequest;
use tracing::warn;

use crate::domain::ports::{GlucoseTestRepository, GlucoseTestRepositoryError};
use crate::domain::{
    BridgingSnapshot, DashboardSummary, GlucoseTest, GlucoseTestDetail, GlucoseTestFilter,
    GlucoseTestId, GlucoseTestUpdate, NewGlucoseTest, PatientId, ValidationState,
};

use super::error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{
    GlucoseMeasurementChangeset, GlucoseTestRow, MonthlyCountRow, NewGlucoseTestRow, PatientRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{glucosa_tests, patients};

const MONTHLY_COUNTS_SQL: &str = "\
SELECT EXTRACT(MONTH FROM date_time)::int AS month, COUNT(*) AS total \
FROM glucosa_tests \
WHERE EXTRACT(YEAR FROM date_time)::int = $1 \
GROUP BY 1 \
ORDER BY 1";

/// Diesel-backed implementation of the `GlucoseTestRepository` port.
#[derive(Clone)]
pub struct DieselGlucoseTestRepository {
    pool: DbPool,
}

impl DieselGlucoseTestRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> GlucoseTestRepositoryError {
    map_basic_pool_error(error, GlucoseTestRepositoryError::connection)
}

fn map_diesel_error(error: &diesel::result::Error) -> GlucoseTestRepositoryError {
    map_basic_diesel_error(
        error,
        GlucoseTestRepositoryError::query,
        GlucoseTestRepositoryError::connection,
    )
}

fn decode(row: GlucoseTestRow) -> Result<GlucoseTest, GlucoseTestRepositoryError> {
    let id = row.id;
    GlucoseTest::try_from(row).map_err(|err| {
        warn!(test_id = id, error = %err, "stored glucose test is malformed");
        GlucoseTestRepositoryError::query(format!("glucose test {id} is malformed: {err}"))
    })
}

fn decode_all(rows: Vec<GlucoseTestRow>) -> Result<Vec<GlucoseTest>, GlucoseTestRepositoryError> {
    rows.into_iter().map(decode).collect()
}

fn to_i64(value: impl TryInto<i64>) -> i64 {
    value.try_into().unwrap_or(i64::MAX)
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

/// Half-open `[first 00:00, last + 1 day 00:00)` bounds covering whole days.
fn day_bounds(first: NaiveDate, last: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = first.and_time(NaiveTime::MIN);
    let end = last
        .checked_add_days(Days::new(1))
        .unwrap_or(last)
        .and_time(NaiveTime::MIN);
    (start, end)
}

/// Escape `LIKE` metacharacters so a search term matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn filtered(filter: &GlucoseTestFilter) -> glucosa_tests::BoxedQuery<'static, Pg> {
    let mut query = glucosa_tests::table.into_boxed();

    if let Some(day) = filter.date {
        let (start, end) = day_bounds(day, day);
        query = query
            .filter(glucosa_tests::date_time.ge(start))
            .filter(glucosa_tests::date_time.lt(end));
    }
    if let Some((first, last)) = filter.range {
        let (start, end) = day_bounds(first, last);
        query = query
            .filter(glucosa_tests::date_time.ge(start))
            .filter(glucosa_tests::date_time.lt(end));
    }
    if let Some(state) = filter.validation {
        query = query.filter(glucosa_tests::is_validation.eq(state.as_flag()));
    }
    if let Some(term) = filter.search.as_deref() {
        let pattern = like_pattern(term);
        let matching = patients::table
            .filter(
                patients::name
                    .ilike(pattern.clone())
                    .or(patients::patient_code.ilike(pattern)),
            )
            .select(patients::id);
        query = query.filter(glucosa_tests::patient_id.eq_any(matching));
    }
    query
}

async fn patient_index(
    conn: &mut AsyncPgConnection,
    tests: &[GlucoseTest],
) -> Result<HashMap<i64, PatientRow>, diesel::result::Error> {
    let mut ids: Vec<i64> = tests
        .iter()
        .filter_map(|test| test.patient_id.map(PatientId::get))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<PatientRow> = patients::table
        .filter(patients::id.eq_any(ids))
        .select(PatientRow::as_select())
        .load(conn)
        .await?;
    Ok(rows.into_iter().map(|row| (row.id, row)).collect())
}

async fn with_patients(
    conn: &mut AsyncPgConnection,
    tests: Vec<GlucoseTest>,
) -> Result<Vec<GlucoseTestDetail>, GlucoseTestRepositoryError> {
    let index = patient_index(conn, &tests)
        .await
        .map_err(|err| map_diesel_error(&err))?;
    Ok(tests
        .into_iter()
        .map(|test| {
            let patient = test.patient_id.and_then(|id| index.get(&id.get()));
            GlucoseTestDetail {
                patient_name: patient.map(|row| row.name.clone()),
                patient_code: patient.and_then(|row| row.patient_code.clone()),
                test,
            }
        })
        .collect())
}

#[async_trait]
impl GlucoseTestRepository for DieselGlucoseTestRepository {
    async fn insert(&self, test: &NewGlucoseTest) -> Result<GlucoseTest, GlucoseTestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: GlucoseTestRow = diesel::insert_into(glucosa_tests::table)
            .values(NewGlucoseTestRow::from(test))
            .returning(GlucoseTestRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        decode(row)
    }

    async fn find(
        &self,
        id: GlucoseTestId,
    ) -> Result<Option<GlucoseTestDetail>, GlucoseTestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<GlucoseTestRow> = glucosa_tests::table
            .find(id.get())
            .select(GlucoseTestRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(&err))?;
        let Some(row) = row else {
            return Ok(None);
        };
        let details = with_patients(&mut conn, vec![decode(row)?]).await?;
        Ok(details.into_iter().next())
    }

    async fn list(
        &self,
        filter: &GlucoseTestFilter,
        page: PageRequest,
    ) -> Result<(Vec<GlucoseTestDetail>, u64), GlucoseTestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = filtered(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        let rows: Vec<GlucoseTestRow> = filtered(filter)
            .order((glucosa_tests::date_time.desc(), glucosa_tests::id.desc()))
            .limit(i64::from(page.limit()))
            .offset(to_i64(page.offset()))
            .select(GlucoseTestRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        let details = with_patients(&mut conn, decode_all(rows)?).await?;
        Ok((details, to_u64(total)))
    }

    async fn list_by_patient(
        &self,
        patient: PatientId,
        page: Option<PageRequest>,
    ) -> Result<(Vec<GlucoseTest>, u64), GlucoseTestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = glucosa_tests::table
            .filter(glucosa_tests::patient_id.eq(patient.get()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;

        let mut query = glucosa_tests::table
            .filter(glucosa_tests::patient_id.eq(patient.get()))
            .order((glucosa_tests::date_time.desc(), glucosa_tests::id.desc()))
            .select(GlucoseTestRow::as_select())
            .into_boxed();
        if let Some(page) = page {
            query = query
                .limit(i64::from(page.limit()))
                .offset(to_i64(page.offset()));
        }
        let rows: Vec<GlucoseTestRow> = query
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        Ok((decode_all(rows)?, to_u64(total)))
    }

    async fn update(
        &self,
        id: GlucoseTestId,
        update: &GlucoseTestUpdate,
    ) -> Result<Option<GlucoseTest>, GlucoseTestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = GlucoseMeasurementChangeset {
            date_time: update.date_time,
            glucos_value: update.value.get(),
            unit: update.unit.as_str(),
            updated_at: Utc::now(),
        };
        let row: Option<GlucoseTestRow> = diesel::update(glucosa_tests::table.find(id.get()))
            .set(&changes)
            .returning(GlucoseTestRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(&err))?;
        row.map(decode).transpose()
    }

    async fn delete(&self, id: GlucoseTestId) -> Result<bool, GlucoseTestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::delete(glucosa_tests::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        Ok(affected > 0)
    }

    async fn mark_validated(
        &self,
        id: GlucoseTestId,
        validator: &str,
    ) -> Result<bool, GlucoseTestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // Conditional on the current flag so concurrent validators race on a
        // single row update and exactly one of them wins.
        let affected = diesel::update(
            glucosa_tests::table
                .find(id.get())
                .filter(glucosa_tests::is_validation.eq(ValidationState::Unvalidated.as_flag())),
        )
        .set((
            glucosa_tests::is_validation.eq(ValidationState::Validated.as_flag()),
            glucosa_tests::user_validation.eq(validator),
            glucosa_tests::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)
        .await
        .map_err(|err| map_diesel_error(&err))?;
        Ok(affected == 1)
    }

    async fn mark_reported(&self, id: GlucoseTestId) -> Result<bool, GlucoseTestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::update(glucosa_tests::table.find(id.get()))
            .set((
                glucosa_tests::is_status.eq(1_i16),
                glucosa_tests::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        Ok(affected > 0)
    }

    async fn validated_snapshots(
        &self,
    ) -> Result<Vec<BridgingSnapshot>, GlucoseTestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<GlucoseTestRow> = glucosa_tests::table
            .filter(glucosa_tests::is_validation.eq(ValidationState::Validated.as_flag()))
            .order(glucosa_tests::id.asc())
            .select(GlucoseTestRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        Ok(decode_all(rows)?
            .iter()
            .map(GlucoseTest::to_bridging)
            .collect())
    }

    async fn summary(&self) -> Result<DashboardSummary, GlucoseTestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let validated: i64 = glucosa_tests::table
            .filter(glucosa_tests::is_validation.eq(ValidationState::Validated.as_flag()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        let unvalidated: i64 = glucosa_tests::table
            .filter(glucosa_tests::is_validation.eq(ValidationState::Unvalidated.as_flag()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        Ok(DashboardSummary::new(to_u64(validated), to_u64(unvalidated)))
    }

    async fn monthly_counts(&self, year: i32) -> Result<Vec<(u32, u64)>, GlucoseTestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<MonthlyCountRow> = diesel::sql_query(MONTHLY_COUNTS_SQL)
            .bind::<Integer, _>(year)
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        Ok(rows
            .into_iter()
            .filter_map(|row| Some((u32::try_from(row.month).ok()?, to_u64(row.total))))
            .collect())
    }

    async fn latest_unreported_batch(
        &self,
    ) -> Result<Vec<GlucoseTestDetail>, GlucoseTestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let latest: Option<DateTime<Utc>> = glucosa_tests::table
            .filter(glucosa_tests::is_validation.eq(ValidationState::Unvalidated.as_flag()))
            .filter(glucosa_tests::is_status.eq(0_i16))
            .select(diesel::dsl::max(glucosa_tests::created_at))
            .first(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        let Some(latest) = latest else {
            return Ok(Vec::new());
        };

        let day = latest.date_naive();
        let (start, end) = day_bounds(day, day);
        let rows: Vec<GlucoseTestRow> = glucosa_tests::table
            .filter(glucosa_tests::created_at.ge(start.and_utc()))
            .filter(glucosa_tests::created_at.lt(end.and_utc()))
            .order((glucosa_tests::created_at.desc(), glucosa_tests::id.desc()))
            .select(GlucoseTestRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        with_patients(&mut conn, decode_all(rows)?).await
    }
}
