use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    /// Whole-number percentage, 1..=100.
    pub percent_off: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Active and not past its expiry at `now`.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.map_or(true, |exp| exp > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(is_active: bool, expires_at: Option<DateTime<Utc>>) -> Model {
        Model {
            id: Uuid::new_v4(),
            code: "WELCOME10".to_string(),
            percent_off: 10,
            expires_at,
            is_active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn redeemable_respects_activation_and_expiry() {
        let now = Utc::now();
        assert!(coupon(true, None).is_redeemable(now));
        assert!(coupon(true, Some(now + Duration::days(1))).is_redeemable(now));
        assert!(!coupon(true, Some(now - Duration::days(1))).is_redeemable(now));
        assert!(!coupon(false, None).is_redeemable(now));
    }
}
