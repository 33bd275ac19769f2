//! Database service for commercial-service.

use crate::models::{
    CommercialRecord, CreateCommercialRecord, ListCommercialRecordsFilter, UpdateCommercialRecord,
};
use crate::services::metrics::{COMMERCIAL_RECORDS_TOTAL, DB_QUERY_DURATION, ERRORS_TOTAL};
use crate::services::pricing::{price, PricingInputs};
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "commercial-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Commercial Record Operations
    // -------------------------------------------------------------------------

    /// Create a commercial record, pricing it from the raw inputs. The raw
    /// fields, every derived amount, and both timestamps land in a single
    /// insert.
    #[instrument(skip(self, input), fields(booking_id = ?input.booking_id))]
    pub async fn create_commercial_record(
        &self,
        input: &CreateCommercialRecord,
    ) -> Result<CommercialRecord, AppError> {
        input.validate()?;

        let inputs = PricingInputs::from_create(input);
        check_inputs(&inputs)?;
        let pricing = price(&inputs);

        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_commercial_record"])
            .start_timer();

        let commercial_id = Uuid::new_v4();
        let record = sqlx::query_as::<_, CommercialRecord>(
            r#"
            INSERT INTO commercial_records (
                commercial_id, booking_id, buying_currency, buying_amount, buying_vat_included,
                buying_vat_percent, commissionable, commission_kind, commission_value,
                selling_currency, selling_price, selling_vat_included, selling_vat_percent,
                incentive, incentive_kind, incentive_value, exchange_rate, auto_exchange,
                net_buying, gross_buying, net_selling, gross_selling, profit,
                profit_margin_percent, markup_percent, created_utc, updated_utc
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                $18, $19, $20, $21, $22, $23, $24, $25, $26, $27)
            RETURNING commercial_id, booking_id, buying_currency, buying_amount,
                buying_vat_included, buying_vat_percent, commissionable, commission_kind,
                commission_value, selling_currency, selling_price, selling_vat_included,
                selling_vat_percent, incentive, incentive_kind, incentive_value, exchange_rate,
                auto_exchange, net_buying, gross_buying, net_selling, gross_selling, profit,
                profit_margin_percent, markup_percent, created_utc, updated_utc
            "#,
        )
        .bind(commercial_id)
        .bind(input.booking_id)
        .bind(&input.buying_currency)
        .bind(input.buying_amount)
        .bind(input.buying_vat_included)
        .bind(input.buying_vat_percent)
        .bind(input.commissionable)
        .bind(input.commission_kind.as_str())
        .bind(input.commission_value)
        .bind(&input.selling_currency)
        .bind(input.selling_price)
        .bind(input.selling_vat_included)
        .bind(input.selling_vat_percent)
        .bind(input.incentive)
        .bind(input.incentive_kind.as_str())
        .bind(input.incentive_value)
        .bind(input.exchange_rate)
        .bind(input.auto_exchange)
        .bind(pricing.net_buying)
        .bind(pricing.gross_buying)
        .bind(pricing.net_selling)
        .bind(pricing.gross_selling)
        .bind(pricing.profit)
        .bind(pricing.profit_margin_percent)
        .bind(pricing.markup_percent)
        .bind(pricing.computed_utc)
        .bind(pricing.computed_utc)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            ERRORS_TOTAL.with_label_values(&["database"]).inc();
            AppError::DatabaseError(anyhow::anyhow!("Failed to create commercial record: {}", e))
        })?;

        timer.observe_duration();

        COMMERCIAL_RECORDS_TOTAL.with_label_values(&["created"]).inc();

        info!(
            commercial_id = %record.commercial_id,
            profit = %record.profit,
            "Commercial record created"
        );

        Ok(record)
    }

    /// Get a commercial record by ID.
    #[instrument(skip(self), fields(commercial_id = %commercial_id))]
    pub async fn get_commercial_record(
        &self,
        commercial_id: Uuid,
    ) -> Result<Option<CommercialRecord>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_commercial_record"])
            .start_timer();

        let record = sqlx::query_as::<_, CommercialRecord>(
            r#"
            SELECT commercial_id, booking_id, buying_currency, buying_amount,
                buying_vat_included, buying_vat_percent, commissionable, commission_kind,
                commission_value, selling_currency, selling_price, selling_vat_included,
                selling_vat_percent, incentive, incentive_kind, incentive_value, exchange_rate,
                auto_exchange, net_buying, gross_buying, net_selling, gross_selling, profit,
                profit_margin_percent, markup_percent, created_utc, updated_utc
            FROM commercial_records
            WHERE commercial_id = $1
            "#,
        )
        .bind(commercial_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get commercial record: {}", e))
        })?;

        timer.observe_duration();

        Ok(record)
    }

    /// Get the newest commercial record linked to a booking. The booking
    /// link is not unique; the most recently created record wins.
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn get_commercial_record_by_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<CommercialRecord>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_commercial_record_by_booking"])
            .start_timer();

        let record = sqlx::query_as::<_, CommercialRecord>(
            r#"
            SELECT commercial_id, booking_id, buying_currency, buying_amount,
                buying_vat_included, buying_vat_percent, commissionable, commission_kind,
                commission_value, selling_currency, selling_price, selling_vat_included,
                selling_vat_percent, incentive, incentive_kind, incentive_value, exchange_rate,
                auto_exchange, net_buying, gross_buying, net_selling, gross_selling, profit,
                profit_margin_percent, markup_percent, created_utc, updated_utc
            FROM commercial_records
            WHERE booking_id = $1
            ORDER BY created_utc DESC
            LIMIT 1
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!(
                "Failed to get commercial record by booking: {}",
                e
            ))
        })?;

        timer.observe_duration();

        Ok(record)
    }

    /// List commercial records with optional filters and cursor pagination.
    #[instrument(skip(self, filter))]
    pub async fn list_commercial_records(
        &self,
        filter: &ListCommercialRecordsFilter,
    ) -> Result<Vec<CommercialRecord>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_commercial_records"])
            .start_timer();

        let limit = filter.page_size.clamp(1, 100) as i64;

        let records = if let Some(cursor) = filter.page_token {
            sqlx::query_as::<_, CommercialRecord>(
                r#"
                SELECT commercial_id, booking_id, buying_currency, buying_amount,
                    buying_vat_included, buying_vat_percent, commissionable, commission_kind,
                    commission_value, selling_currency, selling_price, selling_vat_included,
                    selling_vat_percent, incentive, incentive_kind, incentive_value,
                    exchange_rate, auto_exchange, net_buying, gross_buying, net_selling,
                    gross_selling, profit, profit_margin_percent, markup_percent, created_utc,
                    updated_utc
                FROM commercial_records
                WHERE ($1::uuid IS NULL OR booking_id = $1)
                  AND ($2::text IS NULL OR buying_currency = $2)
                  AND ($3::date IS NULL OR created_utc::date >= $3)
                  AND ($4::date IS NULL OR created_utc::date <= $4)
                  AND commercial_id > $5
                ORDER BY commercial_id
                LIMIT $6
                "#,
            )
            .bind(filter.booking_id)
            .bind(filter.buying_currency.as_deref())
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, CommercialRecord>(
                r#"
                SELECT commercial_id, booking_id, buying_currency, buying_amount,
                    buying_vat_included, buying_vat_percent, commissionable, commission_kind,
                    commission_value, selling_currency, selling_price, selling_vat_included,
                    selling_vat_percent, incentive, incentive_kind, incentive_value,
                    exchange_rate, auto_exchange, net_buying, gross_buying, net_selling,
                    gross_selling, profit, profit_margin_percent, markup_percent, created_utc,
                    updated_utc
                FROM commercial_records
                WHERE ($1::uuid IS NULL OR booking_id = $1)
                  AND ($2::text IS NULL OR buying_currency = $2)
                  AND ($3::date IS NULL OR created_utc::date >= $3)
                  AND ($4::date IS NULL OR created_utc::date <= $4)
                ORDER BY commercial_id
                LIMIT $5
                "#,
            )
            .bind(filter.booking_id)
            .bind(filter.buying_currency.as_deref())
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list commercial records: {}", e))
        })?;

        timer.observe_duration();

        Ok(records)
    }

    /// Update a commercial record: overlay the provided inputs onto the
    /// stored record, reprice, and write every raw and derived field in a
    /// single statement. `created_utc` never changes.
    #[instrument(skip(self, input), fields(commercial_id = %commercial_id))]
    pub async fn update_commercial_record(
        &self,
        commercial_id: Uuid,
        input: &UpdateCommercialRecord,
    ) -> Result<CommercialRecord, AppError> {
        input.validate()?;

        let mut record = self
            .get_commercial_record(commercial_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Commercial record not found")))?;

        input.apply(&mut record);
        let inputs = PricingInputs::from_record(&record);
        check_inputs(&inputs)?;
        let pricing = price(&inputs);

        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_commercial_record"])
            .start_timer();

        let record = sqlx::query_as::<_, CommercialRecord>(
            r#"
            UPDATE commercial_records
            SET booking_id = $2,
                buying_currency = $3,
                buying_amount = $4,
                buying_vat_included = $5,
                buying_vat_percent = $6,
                commissionable = $7,
                commission_kind = $8,
                commission_value = $9,
                selling_currency = $10,
                selling_price = $11,
                selling_vat_included = $12,
                selling_vat_percent = $13,
                incentive = $14,
                incentive_kind = $15,
                incentive_value = $16,
                exchange_rate = $17,
                auto_exchange = $18,
                net_buying = $19,
                gross_buying = $20,
                net_selling = $21,
                gross_selling = $22,
                profit = $23,
                profit_margin_percent = $24,
                markup_percent = $25,
                updated_utc = $26
            WHERE commercial_id = $1
            RETURNING commercial_id, booking_id, buying_currency, buying_amount,
                buying_vat_included, buying_vat_percent, commissionable, commission_kind,
                commission_value, selling_currency, selling_price, selling_vat_included,
                selling_vat_percent, incentive, incentive_kind, incentive_value, exchange_rate,
                auto_exchange, net_buying, gross_buying, net_selling, gross_selling, profit,
                profit_margin_percent, markup_percent, created_utc, updated_utc
            "#,
        )
        .bind(commercial_id)
        .bind(record.booking_id)
        .bind(&record.buying_currency)
        .bind(record.buying_amount)
        .bind(record.buying_vat_included)
        .bind(record.buying_vat_percent)
        .bind(record.commissionable)
        .bind(&record.commission_kind)
        .bind(record.commission_value)
        .bind(&record.selling_currency)
        .bind(record.selling_price)
        .bind(record.selling_vat_included)
        .bind(record.selling_vat_percent)
        .bind(record.incentive)
        .bind(&record.incentive_kind)
        .bind(record.incentive_value)
        .bind(record.exchange_rate)
        .bind(record.auto_exchange)
        .bind(pricing.net_buying)
        .bind(pricing.gross_buying)
        .bind(pricing.net_selling)
        .bind(pricing.gross_selling)
        .bind(pricing.profit)
        .bind(pricing.profit_margin_percent)
        .bind(pricing.markup_percent)
        .bind(pricing.computed_utc)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            ERRORS_TOTAL.with_label_values(&["database"]).inc();
            AppError::DatabaseError(anyhow::anyhow!("Failed to update commercial record: {}", e))
        })?;

        timer.observe_duration();

        COMMERCIAL_RECORDS_TOTAL.with_label_values(&["updated"]).inc();

        info!(
            commercial_id = %record.commercial_id,
            profit = %record.profit,
            "Commercial record repriced and updated"
        );

        Ok(record)
    }

    /// Delete a commercial record.
    #[instrument(skip(self), fields(commercial_id = %commercial_id))]
    pub async fn delete_commercial_record(&self, commercial_id: Uuid) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_commercial_record"])
            .start_timer();

        let result = sqlx::query("DELETE FROM commercial_records WHERE commercial_id = $1")
            .bind(commercial_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                ERRORS_TOTAL.with_label_values(&["database"]).inc();
                AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to delete commercial record: {}",
                    e
                ))
            })?;

        timer.observe_duration();

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Commercial record not found"
            )));
        }

        COMMERCIAL_RECORDS_TOTAL.with_label_values(&["deleted"]).inc();

        info!(commercial_id = %commercial_id, "Commercial record deleted");

        Ok(())
    }
}

/// Domain checks on the merged raw inputs, applied before every pricing
/// pass. The calculator itself is total; malformed money stops here.
fn check_inputs(inputs: &PricingInputs) -> Result<(), AppError> {
    if inputs.buying_amount < Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Buying amount cannot be negative"
        )));
    }
    if inputs.selling_price < Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Selling price cannot be negative"
        )));
    }
    if inputs.buying_vat_percent < Decimal::ZERO || inputs.buying_vat_percent > Decimal::ONE_HUNDRED
    {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Buying VAT percent must be between 0 and 100"
        )));
    }
    if inputs.selling_vat_percent < Decimal::ZERO
        || inputs.selling_vat_percent > Decimal::ONE_HUNDRED
    {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Selling VAT percent must be between 0 and 100"
        )));
    }
    Ok(())
}
