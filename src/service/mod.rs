//! Shop actions - authorization, tenant scoping and orchestration.
//!
//! Each public method on [`ShopService`] is one action a staff member can take. The
//! caller's [`StaffContext`] is checked first; the shop id it carries is then passed
//! explicitly to every repository call. Calculators in [`crate::core`] do the
//! arithmetic; this layer only loads, stores and invalidates.

mod garments;
mod orders;

pub use garments::{ActiveGarment, ServiceRemoval};
pub use orders::OrderBalance;

use crate::{
    cache::TtlCache,
    core::dates::{parse_timezone, today_in},
    entities::{garment, shop},
    errors::{Error, Result},
    repository::ShopRepository,
};
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// The authenticated caller of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffContext {
    /// Shop the caller is acting on
    pub shop_id: i64,
    /// Staff identifier (Discord user id)
    pub user_id: String,
}

impl StaffContext {
    /// Builds a context for `user_id` acting on `shop_id`.
    #[must_use]
    pub fn new(shop_id: i64, user_id: impl Into<String>) -> Self {
        Self {
            shop_id,
            user_id: user_id.into(),
        }
    }
}

/// Cache key and tag for a shop's active garment list.
fn garments_tag(shop_id: i64) -> String {
    format!("garments:{shop_id}")
}

/// Actions for a single shop.
pub struct ShopService {
    repo: Arc<dyn ShopRepository>,
    cache: TtlCache<Vec<garment::Model>>,
    shop_id: i64,
    tz: Tz,
    tax_rate_bps: i32,
    staff: HashSet<String>,
}

impl ShopService {
    /// Builds the service for `shop`. Only user ids in `staff` may act on it.
    pub fn new(
        repo: Arc<dyn ShopRepository>,
        cache: TtlCache<Vec<garment::Model>>,
        shop: &shop::Model,
        staff: HashSet<String>,
    ) -> Result<Self> {
        let tz = parse_timezone(&shop.timezone)?;
        if staff.is_empty() {
            warn!(
                "No staff configured for shop '{}'; every action will be refused",
                shop.name
            );
        }
        Ok(Self {
            repo,
            cache,
            shop_id: shop.id,
            tz,
            tax_rate_bps: shop.tax_rate_bps,
            staff,
        })
    }

    /// Shop this service acts on.
    #[must_use]
    pub const fn shop_id(&self) -> i64 {
        self.shop_id
    }

    /// Shop timezone.
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.tz
    }

    /// Current calendar day in the shop timezone.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        today_in(self.tz)
    }

    /// Whether `user_id` is on the staff allow-list.
    #[must_use]
    pub fn is_staff(&self, user_id: &str) -> bool {
        self.staff.contains(user_id)
    }

    /// Returns the shop id to scope queries by, or `Forbidden`.
    fn authorize(&self, ctx: &StaffContext) -> Result<i64> {
        if ctx.shop_id != self.shop_id || !self.is_staff(&ctx.user_id) {
            warn!(
                "Refused action by {} on shop {}",
                ctx.user_id, ctx.shop_id
            );
            return Err(Error::Forbidden {
                user_id: ctx.user_id.clone(),
                shop_id: ctx.shop_id,
            });
        }
        Ok(ctx.shop_id)
    }

    async fn invalidate_garments(&self, shop_id: i64) {
        self.cache.invalidate_tag(&garments_tag(shop_id)).await;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_unknown_staff_is_forbidden() -> Result<()> {
        let fx = setup_with_order().await?;
        let (service, _) = test_service(&fx)?;

        let stranger = StaffContext::new(fx.shop.id, "9999");
        let err = service.active_garments(&stranger).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden { shop_id, .. } if shop_id == fx.shop.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_staff_cannot_act_on_another_shop() -> Result<()> {
        let fx = setup_with_order().await?;
        let (service, ctx) = test_service(&fx)?;

        let elsewhere = StaffContext::new(fx.shop.id + 1, ctx.user_id.clone());
        assert!(matches!(
            service.order_balance(&elsewhere, fx.order.id).await,
            Err(Error::Forbidden { .. })
        ));
        assert!(service.order_balance(&ctx, fx.order.id).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_shop_timezone_is_rejected() -> Result<()> {
        let fx = setup_with_order().await?;
        let mut shop = fx.shop.clone();
        shop.timezone = "Mars/Olympus".to_string();
        let repo: Arc<dyn ShopRepository> = Arc::new(fx.repo.clone());
        let result = ShopService::new(
            repo,
            TtlCache::new(std::time::Duration::from_secs(60)),
            &shop,
            HashSet::new(),
        );
        assert!(matches!(result, Err(Error::InvalidTimezone { .. })));
        Ok(())
    }
}
