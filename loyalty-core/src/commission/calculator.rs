//! Commission Calculator
//!
//! Implements the commission pipeline for one referred order:
//! 1. Resolve the coach tier from the current referral count
//! 2. Compute every bonus term independently
//! 3. Sum the terms into the breakdown total
//!
//! tier_bonus uses the resolved tier, base/loyalty use the purchase
//! count, and nothing else is cross-wired. Rounding is applied per term
//! before summing so every field stays independently reproducible.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::season;
use crate::error::LoyaltyResult;
use crate::types::commission::{CoachTier, CommissionBreakdown};
use crate::types::config::{CommissionConfig, PurchaseBucket, TierConfig};
use crate::types::order::OrderSnapshot;
use crate::types::{CoachId, CustomerId};

/// Inputs for one commission calculation.
///
/// Referral counts and season ordinals are external read-only lookups
/// supplied by the caller; the calculator itself holds no state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommissionInput {
    /// The completed referred order
    pub order: OrderSnapshot,
    /// Referring coach
    pub coach_id: CoachId,
    /// Referred customer
    pub customer_id: CustomerId,
    /// How many purchases this customer has made with this referrer,
    /// counting this one (1-based)
    pub purchase_count: u32,
    /// The coach's current personal referral count
    pub coach_referral_count: u32,
    /// Which season with this referrer the customer is in (1-based
    /// opaque ordinal supplied by the season-history collaborator)
    pub seasons_with_referrer: u32,
}

/// Commission calculator over immutable config snapshots
#[derive(Clone, Debug)]
pub struct CommissionCalculator {
    config: CommissionConfig,
    tiers: TierConfig,
}

impl CommissionCalculator {
    /// Create a calculator from configuration snapshots
    pub fn new(config: CommissionConfig, tiers: TierConfig) -> Self {
        Self { config, tiers }
    }

    /// Calculator with the default schedules
    pub fn default_config() -> Self {
        Self::new(CommissionConfig::default(), TierConfig::default())
    }

    fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp(self.config.precision)
    }

    /// Resolve the coach tier from the current referral count.
    /// Always computed fresh; the tier is never stored on the coach.
    pub fn resolve_tier(&self, coach_referral_count: u32) -> CoachTier {
        self.tiers.tier_for_referral_count(coach_referral_count)
    }

    /// Base commission: `(total - tax) * rate(purchase_count)`, with the
    /// rate strictly decreasing over the 1st/2nd/3rd+ buckets
    pub fn base_commission(
        &self,
        order: &OrderSnapshot,
        purchase_count: u32,
    ) -> LoyaltyResult<Decimal> {
        order.validate_amounts()?;
        let bucket = PurchaseBucket::from_count(purchase_count);
        let rate = self.config.base_rates.rate_for(bucket);
        Ok(self.round(order.net_total() * rate))
    }

    /// Loyalty bonus: mirrors the base buckets with an inverted curve,
    /// rewarding retention as the base rate declines
    pub fn loyalty_bonus(
        &self,
        order: &OrderSnapshot,
        purchase_count: u32,
    ) -> LoyaltyResult<Decimal> {
        order.validate_amounts()?;
        let bucket = PurchaseBucket::from_count(purchase_count);
        let rate = self.config.loyalty_rates.rate_for(bucket);
        Ok(self.round(order.net_total() * rate))
    }

    /// Tier bonus: `base_amount * tier_percentage(tier)`
    pub fn tier_bonus(&self, tier: CoachTier, base_amount: Decimal) -> Decimal {
        self.round(base_amount * self.tiers.bonus_percentage(tier))
    }

    /// Retention bonus: 0 for the customer's first season with this
    /// referrer, a fixed bonus for the 2nd, a larger one for 3rd+
    pub fn retention_bonus(&self, seasons_with_referrer: u32) -> Decimal {
        match seasons_with_referrer {
            0 | 1 => Decimal::ZERO,
            2 => self.round(self.config.retention_second_season),
            _ => self.round(self.config.retention_later_seasons),
        }
    }

    /// Network bonus: a fixed amount per referral beyond the configured
    /// minimum count, zero at or below it
    pub fn network_bonus(&self, coach_referral_count: u32) -> Decimal {
        if coach_referral_count <= self.config.network_min_referrals {
            return Decimal::ZERO;
        }
        let beyond = Decimal::from(coach_referral_count - self.config.network_min_referrals);
        self.round(beyond * self.config.network_bonus_per_referral)
    }

    /// Seasonal bonus: percentage of base by named calendar window
    pub fn seasonal_bonus(&self, base_amount: Decimal, order_date: NaiveDate) -> Decimal {
        let pct = season::seasonal_percentage(order_date, &self.config.seasonal_windows);
        self.round(base_amount * pct)
    }

    /// Weekend bonus: flat percentage of base on Saturday/Sunday, else 0
    pub fn weekend_bonus(&self, base_amount: Decimal, order_date: NaiveDate) -> Decimal {
        if !season::is_weekend(order_date) {
            return Decimal::ZERO;
        }
        self.round(base_amount * self.config.weekend_percentage)
    }

    /// Full pipeline: resolve tier, compute every term independently,
    /// sum. `total_amount` is the exact sum of the seven fields.
    pub fn calculate_total(&self, input: &CommissionInput) -> LoyaltyResult<CommissionBreakdown> {
        let order_date = input.order.placed_at.date_naive();
        let net = input.order.net_total();
        let tier = self.resolve_tier(input.coach_referral_count);

        let base_commission = self.base_commission(&input.order, input.purchase_count)?;
        let loyalty_bonus = self.loyalty_bonus(&input.order, input.purchase_count)?;
        let retention_bonus = self.retention_bonus(input.seasons_with_referrer);
        let network_bonus = self.network_bonus(input.coach_referral_count);
        let tier_bonus = self.tier_bonus(tier, net);
        let seasonal_bonus = self.seasonal_bonus(net, order_date);
        let weekend_bonus = self.weekend_bonus(net, order_date);

        let mut breakdown = CommissionBreakdown {
            base_commission,
            loyalty_bonus,
            retention_bonus,
            network_bonus,
            tier_bonus,
            seasonal_bonus,
            weekend_bonus,
            total_amount: Decimal::ZERO,
        };
        breakdown.total_amount = breakdown.sum_terms();
        Ok(breakdown)
    }
}

impl Default for CommissionCalculator {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderId, OrderStatus};
    use chrono::{TimeZone, Utc};

    fn create_test_order(total: i64, tax: i64, placed_at: chrono::DateTime<Utc>) -> OrderSnapshot {
        OrderSnapshot {
            order_id: OrderId::new("order:1"),
            customer_id: CustomerId::new("customer:1"),
            total: Decimal::from(total),
            tax_total: Decimal::from(tax),
            currency: "CHF".to_string(),
            status: OrderStatus::Completed,
            placed_at,
        }
    }

    fn create_test_input(purchase_count: u32) -> CommissionInput {
        // 2025-06-10 is a Tuesday outside every season window
        let placed_at = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
        CommissionInput {
            order: create_test_order(1077, 77, placed_at),
            coach_id: CoachId::new("coach:1"),
            customer_id: CustomerId::new("customer:1"),
            purchase_count,
            coach_referral_count: 0,
            seasons_with_referrer: 1,
        }
    }

    #[test]
    fn test_base_commission_decreases_with_purchase_count() {
        let calc = CommissionCalculator::default_config();
        let order = create_test_order(1077, 77, Utc::now());

        let first = calc.base_commission(&order, 1).unwrap();
        let second = calc.base_commission(&order, 2).unwrap();
        let third = calc.base_commission(&order, 3).unwrap();
        let tenth = calc.base_commission(&order, 10).unwrap();

        // Net 1000 at 10% / 7% / 5%
        assert_eq!(first, Decimal::from(100));
        assert_eq!(second, Decimal::from(70));
        assert_eq!(third, Decimal::from(50));
        assert!(first > second && second > third);
        assert_eq!(third, tenth);
    }

    #[test]
    fn test_loyalty_bonus_increases_with_purchase_count() {
        let calc = CommissionCalculator::default_config();
        let order = create_test_order(1077, 77, Utc::now());

        let first = calc.loyalty_bonus(&order, 1).unwrap();
        let second = calc.loyalty_bonus(&order, 2).unwrap();
        let third = calc.loyalty_bonus(&order, 3).unwrap();

        assert_eq!(first, Decimal::from(10));
        assert_eq!(second, Decimal::from(20));
        assert_eq!(third, Decimal::from(30));
        assert!(first < second && second < third);
    }

    #[test]
    fn test_both_curves_apply_to_taxed_out_amount() {
        let calc = CommissionCalculator::default_config();
        // Tax must not participate in either percentage
        let order = create_test_order(1100, 100, Utc::now());
        assert_eq!(calc.base_commission(&order, 1).unwrap(), Decimal::from(100));
        assert_eq!(calc.loyalty_bonus(&order, 1).unwrap(), Decimal::from(10));
    }

    #[test]
    fn test_tier_bonus_uses_resolved_tier() {
        let calc = CommissionCalculator::default_config();
        assert_eq!(calc.resolve_tier(0), CoachTier::Bronze);
        assert_eq!(calc.resolve_tier(30), CoachTier::Platinum);

        let base = Decimal::from(1000);
        assert_eq!(calc.tier_bonus(CoachTier::Bronze, base), Decimal::ZERO);
        assert_eq!(calc.tier_bonus(CoachTier::Silver, base), Decimal::from(20));
        assert_eq!(calc.tier_bonus(CoachTier::Platinum, base), Decimal::from(80));
    }

    #[test]
    fn test_retention_bonus_by_season_ordinal() {
        let calc = CommissionCalculator::default_config();
        assert_eq!(calc.retention_bonus(1), Decimal::ZERO);
        assert_eq!(calc.retention_bonus(2), Decimal::new(1000, 2));
        assert_eq!(calc.retention_bonus(3), Decimal::new(2500, 2));
        assert_eq!(calc.retention_bonus(7), Decimal::new(2500, 2));
    }

    #[test]
    fn test_network_bonus_only_beyond_minimum() {
        let calc = CommissionCalculator::default_config();
        assert_eq!(calc.network_bonus(0), Decimal::ZERO);
        assert_eq!(calc.network_bonus(10), Decimal::ZERO);
        assert_eq!(calc.network_bonus(11), Decimal::new(500, 2));
        assert_eq!(calc.network_bonus(14), Decimal::from(20));
    }

    #[test]
    fn test_weekend_bonus_gated_by_day() {
        let calc = CommissionCalculator::default_config();
        let base = Decimal::from(1000);
        // Saturday
        let saturday = NaiveDate::from_ymd_opt(2025, 8, 2).unwrap();
        assert_eq!(calc.weekend_bonus(base, saturday), Decimal::from(15));
        // Tuesday
        let tuesday = NaiveDate::from_ymd_opt(2025, 8, 5).unwrap();
        assert_eq!(calc.weekend_bonus(base, tuesday), Decimal::ZERO);
    }

    #[test]
    fn test_total_is_exact_sum_of_terms() {
        let calc = CommissionCalculator::default_config();
        let mut input = create_test_input(2);
        input.coach_referral_count = 14;
        input.seasons_with_referrer = 3;

        let breakdown = calc.calculate_total(&input).unwrap();
        assert!(breakdown.verify_total());
        assert_eq!(breakdown.total_amount, breakdown.sum_terms());

        // Net 1000, second purchase: base 70, loyalty 20, retention 25,
        // network (14-10)*5 = 20, Silver tier at 14 referrals 2% = 20
        assert_eq!(breakdown.base_commission, Decimal::from(70));
        assert_eq!(breakdown.loyalty_bonus, Decimal::from(20));
        assert_eq!(breakdown.retention_bonus, Decimal::new(2500, 2));
        assert_eq!(breakdown.network_bonus, Decimal::from(20));
        assert_eq!(breakdown.tier_bonus, Decimal::from(20));
        assert_eq!(breakdown.seasonal_bonus, Decimal::ZERO);
        assert_eq!(breakdown.weekend_bonus, Decimal::ZERO);
    }

    #[test]
    fn test_total_commission_monotonicity_over_buckets() {
        let calc = CommissionCalculator::default_config();
        let b1 = calc.calculate_total(&create_test_input(1)).unwrap();
        let b2 = calc.calculate_total(&create_test_input(2)).unwrap();
        let b3 = calc.calculate_total(&create_test_input(3)).unwrap();

        assert!(b1.base_commission > b2.base_commission);
        assert!(b2.base_commission > b3.base_commission);
        assert!(b1.loyalty_bonus < b2.loyalty_bonus);
        assert!(b2.loyalty_bonus < b3.loyalty_bonus);
    }

    #[test]
    fn test_seasonal_and_weekend_stack_independently() {
        let calc = CommissionCalculator::default_config();
        // 2025-12-20 is a Saturday inside the holiday window
        let placed_at = Utc.with_ymd_and_hms(2025, 12, 20, 10, 0, 0).unwrap();
        let mut input = create_test_input(1);
        input.order = create_test_order(1077, 77, placed_at);

        let breakdown = calc.calculate_total(&input).unwrap();
        // Net 1000: holiday 5% = 50, weekend 1.5% = 15, summed not compounded
        assert_eq!(breakdown.seasonal_bonus, Decimal::from(50));
        assert_eq!(breakdown.weekend_bonus, Decimal::from(15));
        assert!(breakdown.verify_total());
    }
}
