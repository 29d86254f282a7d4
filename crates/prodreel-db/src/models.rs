//! Row types and DTOs for the `videos` and `credits` tables.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use prodreel_models::{VideoStatus, VideoSummary};

/// A row from the `videos` table: one generated product video.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VideoAsset {
    /// Generation task id, assigned by the generation API
    pub id: String,
    pub shop: String,
    pub product_id: String,
    pub product_title: String,
    /// Remote file GID, populated only after a successful attach
    pub remote_file_id: Option<String>,
    pub image1: String,
    pub image2: Option<String>,
    pub image3: Option<String>,
    pub image4: Option<String>,
    pub prompt: String,
    pub video_url: Option<String>,
    /// Base64-encoded JPEG still frame
    pub thumbnail: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: VideoStatus,
    pub duration: f64,
    pub created_at: DateTime<Utc>,
}

impl VideoAsset {
    /// API-facing summary of this row.
    pub fn summary(&self) -> VideoSummary {
        VideoSummary {
            id: self.id.clone(),
            product_id: self.product_id.clone(),
            product_title: self.product_title.clone(),
            video_url: self.video_url.clone(),
            status: self.status,
            duration: self.duration,
            thumbnail: self.thumbnail.clone(),
            created_at: self.created_at,
        }
    }
}

/// DTO for inserting a freshly accepted generation task.
#[derive(Debug, Clone)]
pub struct NewVideoAsset {
    pub id: String,
    pub shop: String,
    pub product_id: String,
    pub product_title: String,
    pub images: Vec<String>,
    pub prompt: String,
}

/// A row from the `credits` table: per-shop usage balance.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CreditBalance {
    pub shop_name: String,
    pub extra_credit: i32,
    pub monthly_credit: i32,
    pub subscription_type: Option<i32>,
    pub subscription_expired: Option<DateTime<Utc>>,
}

impl CreditBalance {
    /// Whether the monthly allowance still counts toward the balance.
    pub fn monthly_active(&self, now: DateTime<Utc>) -> bool {
        match self.subscription_expired {
            Some(expired) => expired > now,
            None => true,
        }
    }

    /// Credits usable right now.
    pub fn remaining(&self, now: DateTime<Utc>) -> i64 {
        let monthly = if self.monthly_active(now) {
            self.monthly_credit.max(0) as i64
        } else {
            0
        };
        monthly + self.extra_credit.max(0) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn balance(extra: i32, monthly: i32, expired: Option<DateTime<Utc>>) -> CreditBalance {
        CreditBalance {
            shop_name: "test.myshopify.com".to_string(),
            extra_credit: extra,
            monthly_credit: monthly,
            subscription_type: None,
            subscription_expired: expired,
        }
    }

    #[test]
    fn test_remaining_sums_both_pools() {
        let now = Utc::now();
        assert_eq!(balance(2, 3, None).remaining(now), 5);
    }

    #[test]
    fn test_expired_subscription_drops_monthly() {
        let now = Utc::now();
        let expired = Some(now - Duration::days(1));
        assert_eq!(balance(2, 3, expired).remaining(now), 2);
    }

    #[test]
    fn test_unexpired_subscription_keeps_monthly() {
        let now = Utc::now();
        let expires = Some(now + Duration::days(10));
        assert_eq!(balance(0, 3, expires).remaining(now), 3);
    }

    #[test]
    fn test_negative_counters_clamp_to_zero() {
        let now = Utc::now();
        assert_eq!(balance(-1, -2, None).remaining(now), 0);
    }
}
