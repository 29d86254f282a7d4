//! Repository for the `credits` table.

use sqlx::PgPool;

use crate::models::CreditBalance;

const COLUMNS: &str =
    "shop_name, extra_credit, monthly_credit, subscription_type, subscription_expired";

/// Per-shop credit balance operations.
pub struct CreditRepo;

impl CreditRepo {
    /// Fetch a shop's balance row.
    pub async fn find_by_shop(
        pool: &PgPool,
        shop: &str,
    ) -> Result<Option<CreditBalance>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM credits WHERE shop_name = $1");
        sqlx::query_as::<_, CreditBalance>(&query)
            .bind(shop)
            .fetch_optional(pool)
            .await
    }

    /// Consume one credit: the monthly allowance first (while the
    /// subscription is unexpired), then the extra pool.
    ///
    /// Returns `false` when neither pool had a credit left. Each branch is a
    /// single guarded UPDATE, so concurrent consumers cannot overdraw.
    pub async fn consume_one(pool: &PgPool, shop: &str) -> Result<bool, sqlx::Error> {
        let monthly = sqlx::query(
            "UPDATE credits
                SET monthly_credit = monthly_credit - 1
              WHERE shop_name = $1
                AND monthly_credit > 0
                AND (subscription_expired IS NULL OR subscription_expired > now())",
        )
        .bind(shop)
        .execute(pool)
        .await?;
        if monthly.rows_affected() > 0 {
            return Ok(true);
        }

        let extra = sqlx::query(
            "UPDATE credits
                SET extra_credit = extra_credit - 1
              WHERE shop_name = $1 AND extra_credit > 0",
        )
        .bind(shop)
        .execute(pool)
        .await?;
        Ok(extra.rows_affected() > 0)
    }

    /// Insert or reset a shop's balance. Used by subscription updates.
    pub async fn upsert(pool: &PgPool, balance: &CreditBalance) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO credits
                (shop_name, extra_credit, monthly_credit, subscription_type, subscription_expired)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (shop_name) DO UPDATE SET
                extra_credit = EXCLUDED.extra_credit,
                monthly_credit = EXCLUDED.monthly_credit,
                subscription_type = EXCLUDED.subscription_type,
                subscription_expired = EXCLUDED.subscription_expired",
        )
        .bind(&balance.shop_name)
        .bind(balance.extra_credit)
        .bind(balance.monthly_credit)
        .bind(balance.subscription_type)
        .bind(balance.subscription_expired)
        .execute(pool)
        .await?;
        Ok(())
    }
}
