//! Postgres persistence for cycle records. Inserts are idempotent on
//! the claim reference: re-submitting an already recorded cycle writes
//! nothing and succeeds.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::ports::{CycleRecord, CycleStore};

pub struct PgCycleStore {
    pool: PgPool,
}

impl PgCycleStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .idle_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .context("failed to connect to postgres")?;
        Ok(Self { pool })
    }

    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS claims (
                claim_reference       TEXT PRIMARY KEY,
                fees_claimed_lamports BIGINT NOT NULL,
                fees_claimed_sol      NUMERIC NOT NULL,
                fixed_wallet          TEXT NOT NULL,
                fixed_reference       TEXT,
                raffle_reference      TEXT,
                mint_address          TEXT NOT NULL,
                snapshot_hash         TEXT NOT NULL,
                seed                  TEXT NOT NULL,
                interval_seconds      BIGINT NOT NULL,
                dry_run               BOOLEAN NOT NULL,
                notes                 TEXT,
                created_at            TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to create claims table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS winners (
                claim_reference TEXT NOT NULL REFERENCES claims(claim_reference),
                rank            INT NOT NULL,
                wallet          TEXT NOT NULL,
                weight          DOUBLE PRECISION NOT NULL,
                balance_raw     TEXT NOT NULL,
                balance_ui      NUMERIC NOT NULL,
                prize_bps       INT NOT NULL,
                prize_lamports  BIGINT NOT NULL,
                prize_sol       NUMERIC NOT NULL,
                PRIMARY KEY (claim_reference, rank)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to create winners table")?;

        Ok(())
    }
}

#[async_trait]
impl CycleStore for PgCycleStore {
    async fn record_cycle(&self, record: &CycleRecord) -> anyhow::Result<()> {
        let fees_claimed_lamports = i64::try_from(record.fees_claimed_lamports)
            .context("claimed lamports exceed BIGINT range")?;

        let mut tx = self.pool.begin().await.context("failed to open tx")?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO claims (
                claim_reference, fees_claimed_lamports, fees_claimed_sol,
                fixed_wallet, fixed_reference, raffle_reference,
                mint_address, snapshot_hash, seed,
                interval_seconds, dry_run, notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (claim_reference) DO NOTHING
            "#,
        )
        .bind(&record.claim_reference)
        .bind(fees_claimed_lamports)
        .bind(record.fees_claimed_sol)
        .bind(&record.fixed_wallet)
        .bind(&record.fixed_reference)
        .bind(&record.raffle_reference)
        .bind(&record.mint_address)
        .bind(&record.snapshot_hash)
        .bind(&record.seed)
        .bind(i64::try_from(record.interval_seconds).unwrap_or(i64::MAX))
        .bind(record.dry_run)
        .bind(&record.notes)
        .execute(&mut *tx)
        .await
        .context("failed to insert claim row")?;

        // Duplicate submission of the same cycle: leave the original
        // winner rows untouched.
        if inserted.rows_affected() > 0 {
            for winner in &record.winners {
                let prize_lamports = i64::try_from(winner.prize_lamports)
                    .context("prize lamports exceed BIGINT range")?;
                sqlx::query(
                    r#"
                    INSERT INTO winners (
                        claim_reference, rank, wallet, weight,
                        balance_raw, balance_ui, prize_bps,
                        prize_lamports, prize_sol
                    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    "#,
                )
                .bind(&record.claim_reference)
                .bind(winner.rank as i32)
                .bind(&winner.wallet)
                .bind(winner.weight)
                .bind(winner.balance_raw.to_string())
                .bind(winner.balance_ui)
                .bind(i32::from(winner.prize_bps))
                .bind(prize_lamports)
                .bind(winner.prize_sol)
                .execute(&mut *tx)
                .await
                .context("failed to insert winner row")?;
            }
        }

        tx.commit().await.context("failed to commit cycle record")?;
        Ok(())
    }
}
