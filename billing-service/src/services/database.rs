//! PostgreSQL `BillingStore` implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::{
    Invoice, InvoiceStatus, MeterSnapshot, Payment, Room, RoomService, TenantContact,
};

use super::metrics;
use super::store::{BillingStore, ConfirmPayment};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "billing-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
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
            .context("Failed to connect to PostgreSQL")?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Migration failed")?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl BillingStore for PgStore {
    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Health check failed")?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_room(&self, room_id: Uuid) -> Result<Option<Room>> {
        let _timer = metrics::db_timer("get_room");
        let room = sqlx::query_as::<_, Room>(
            r#"
            SELECT room_id, name, rent_price, electric_meter_now, electric_meter_after,
                   water_meter_now, water_meter_after, electric_fee, water_fee,
                   status, qr_image_url, created_utc
            FROM rooms
            WHERE room_id = $1
            "#,
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch room")?;
        Ok(room)
    }

    #[instrument(skip(self))]
    async fn list_room_services(&self, room_id: Uuid) -> Result<Vec<RoomService>> {
        let _timer = metrics::db_timer("list_room_services");
        let services = sqlx::query_as::<_, RoomService>(
            r#"
            SELECT service_id, room_id, name, price, quantity, price_type, unit
            FROM room_services
            WHERE room_id = $1
            ORDER BY name
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list room services")?;
        Ok(services)
    }

    #[instrument(skip(self))]
    async fn active_tenant_contacts(&self, room_id: Uuid) -> Result<Vec<TenantContact>> {
        let _timer = metrics::db_timer("active_tenant_contacts");
        let contacts = sqlx::query_as::<_, TenantContact>(
            r#"
            SELECT tenant_id, full_name, email
            FROM tenants
            WHERE room_id = $1 AND active
            ORDER BY created_utc
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list active tenants")?;
        Ok(contacts)
    }

    #[instrument(skip(self, invoice, expected), fields(invoice_id = %invoice.invoice_id))]
    async fn record_invoice(&self, invoice: &Invoice, expected: &MeterSnapshot) -> Result<bool> {
        let _timer = metrics::db_timer("record_invoice");
        let mut tx = self.pool.begin().await.context("Failed to open transaction")?;

        let swapped = sqlx::query(
            r#"
            UPDATE rooms
            SET electric_meter_now = $2, water_meter_now = $3,
                electric_meter_after = NULL, water_meter_after = NULL
            WHERE room_id = $1
              AND electric_meter_now = $4
              AND water_meter_now = $5
              AND electric_meter_after IS NOT DISTINCT FROM $6
              AND water_meter_after IS NOT DISTINCT FROM $7
            "#,
        )
        .bind(invoice.room_id)
        .bind(invoice.electric_current)
        .bind(invoice.water_current)
        .bind(expected.electric_now)
        .bind(expected.water_now)
        .bind(expected.electric_after)
        .bind(expected.water_after)
        .execute(&mut *tx)
        .await
        .context("Failed to advance room meters")?;

        if swapped.rows_affected() == 0 {
            tx.rollback().await.ok();
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO invoices (
                invoice_id, room_id, month, year, room_price,
                electric_previous, electric_current, electric_cost,
                water_previous, water_current, water_cost,
                service_cost, total_amount, status, created_utc, updated_utc
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(invoice.invoice_id)
        .bind(invoice.room_id)
        .bind(invoice.month)
        .bind(invoice.year)
        .bind(invoice.room_price)
        .bind(invoice.electric_previous)
        .bind(invoice.electric_current)
        .bind(invoice.electric_cost)
        .bind(invoice.water_previous)
        .bind(invoice.water_current)
        .bind(invoice.water_cost)
        .bind(invoice.service_cost)
        .bind(invoice.total_amount)
        .bind(&invoice.status)
        .bind(invoice.created_utc)
        .bind(invoice.updated_utc)
        .execute(&mut *tx)
        .await
        .context("Failed to insert invoice")?;

        tx.commit().await.context("Failed to commit invoice")?;
        Ok(true)
    }

    #[instrument(skip(self, expected))]
    async fn advance_meters(
        &self,
        room_id: Uuid,
        expected: &MeterSnapshot,
        new_electric: f64,
        new_water: f64,
    ) -> Result<bool> {
        let _timer = metrics::db_timer("advance_meters");
        let result = sqlx::query(
            r#"
            UPDATE rooms
            SET electric_meter_now = $2, water_meter_now = $3,
                electric_meter_after = NULL, water_meter_after = NULL
            WHERE room_id = $1
              AND electric_meter_now = $4
              AND water_meter_now = $5
              AND electric_meter_after IS NOT DISTINCT FROM $6
              AND water_meter_after IS NOT DISTINCT FROM $7
            "#,
        )
        .bind(room_id)
        .bind(new_electric)
        .bind(new_water)
        .bind(expected.electric_now)
        .bind(expected.water_now)
        .bind(expected.electric_after)
        .bind(expected.water_after)
        .execute(&self.pool)
        .await
        .context("Failed to advance room meters")?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>> {
        let _timer = metrics::db_timer("get_invoice");
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT invoice_id, room_id, month, year, room_price,
                   electric_previous, electric_current, electric_cost,
                   water_previous, water_current, water_cost,
                   service_cost, total_amount, status, created_utc, updated_utc
            FROM invoices
            WHERE invoice_id = $1
            "#,
        )
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch invoice")?;
        Ok(invoice)
    }

    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.invoice_id))]
    async fn update_invoice(&self, invoice: &Invoice) -> Result<()> {
        let _timer = metrics::db_timer("update_invoice");
        sqlx::query(
            r#"
            UPDATE invoices
            SET month = $2, year = $3, room_price = $4,
                electric_current = $5, electric_cost = $6,
                water_current = $7, water_cost = $8,
                service_cost = $9, total_amount = $10,
                status = $11, updated_utc = $12
            WHERE invoice_id = $1
            "#,
        )
        .bind(invoice.invoice_id)
        .bind(invoice.month)
        .bind(invoice.year)
        .bind(invoice.room_price)
        .bind(invoice.electric_current)
        .bind(invoice.electric_cost)
        .bind(invoice.water_current)
        .bind(invoice.water_cost)
        .bind(invoice.service_cost)
        .bind(invoice.total_amount)
        .bind(&invoice.status)
        .bind(invoice.updated_utc)
        .execute(&self.pool)
        .await
        .context("Failed to update invoice")?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_invoice_status(&self, invoice_id: Uuid, status: InvoiceStatus) -> Result<()> {
        let _timer = metrics::db_timer("update_invoice_status");
        sqlx::query(
            r#"
            UPDATE invoices
            SET status = $2, updated_utc = now()
            WHERE invoice_id = $1
            "#,
        )
        .bind(invoice_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to update invoice status")?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_room_invoices(&self, room_id: Uuid) -> Result<Vec<Invoice>> {
        let _timer = metrics::db_timer("list_room_invoices");
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT invoice_id, room_id, month, year, room_price,
                   electric_previous, electric_current, electric_cost,
                   water_previous, water_current, water_cost,
                   service_cost, total_amount, status, created_utc, updated_utc
            FROM invoices
            WHERE room_id = $1
            ORDER BY created_utc DESC
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list room invoices")?;
        Ok(invoices)
    }

    #[instrument(skip(self, payment), fields(payment_id = %payment.payment_id))]
    async fn insert_payment(&self, payment: &Payment) -> Result<()> {
        let _timer = metrics::db_timer("insert_payment");
        sqlx::query(
            r#"
            INSERT INTO payments (
                payment_id, invoice_id, method, proof_image_url,
                confirmed, created_utc, confirmed_utc
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(payment.payment_id)
        .bind(payment.invoice_id)
        .bind(&payment.method)
        .bind(&payment.proof_image_url)
        .bind(payment.confirmed)
        .bind(payment.created_utc)
        .bind(payment.confirmed_utc)
        .execute(&self.pool)
        .await
        .context("Failed to insert payment")?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>> {
        let _timer = metrics::db_timer("get_payment");
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT payment_id, invoice_id, method, proof_image_url,
                   confirmed, created_utc, confirmed_utc
            FROM payments
            WHERE payment_id = $1
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch payment")?;
        Ok(payment)
    }

    #[instrument(skip(self))]
    async fn list_invoice_payments(&self, invoice_id: Uuid) -> Result<Vec<Payment>> {
        let _timer = metrics::db_timer("list_invoice_payments");
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT payment_id, invoice_id, method, proof_image_url,
                   confirmed, created_utc, confirmed_utc
            FROM payments
            WHERE invoice_id = $1
            ORDER BY created_utc
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list invoice payments")?;
        Ok(payments)
    }

    #[instrument(skip(self))]
    async fn list_unconfirmed_payments(&self) -> Result<Vec<Payment>> {
        let _timer = metrics::db_timer("list_unconfirmed_payments");
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT payment_id, invoice_id, method, proof_image_url,
                   confirmed, created_utc, confirmed_utc
            FROM payments
            WHERE NOT confirmed
            ORDER BY created_utc
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list unconfirmed payments")?;
        Ok(payments)
    }

    #[instrument(skip(self))]
    async fn confirm_payment(&self, payment_id: Uuid) -> Result<ConfirmPayment> {
        let _timer = metrics::db_timer("confirm_payment");
        let newly = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET confirmed = TRUE, confirmed_utc = now()
            WHERE payment_id = $1 AND NOT confirmed
            RETURNING payment_id, invoice_id, method, proof_image_url,
                      confirmed, created_utc, confirmed_utc
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to confirm payment")?;

        if let Some(payment) = newly {
            return Ok(ConfirmPayment::NewlyConfirmed(payment));
        }

        match self.get_payment(payment_id).await? {
            Some(payment) => Ok(ConfirmPayment::AlreadyConfirmed(payment)),
            None => Ok(ConfirmPayment::NotFound),
        }
    }
}
