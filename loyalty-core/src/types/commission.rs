//! Commission Value Types
//!
//! A [`CommissionBreakdown`] keeps every bonus term individually
//! inspectable for audit; `total_amount` is always the arithmetic sum of
//! the seven terms and never computed any other way.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Referral-count-derived coach bracket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoachTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl CoachTier {
    /// Tiers in ascending order
    pub const ASCENDING: [Self; 4] = [Self::Bronze, Self::Silver, Self::Gold, Self::Platinum];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
        }
    }
}

impl std::fmt::Display for CoachTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Per-term commission result for one referred order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionBreakdown {
    /// Three-bucket base commission on the taxed-out order amount
    pub base_commission: Decimal,
    /// Retention-rewarding bonus, inverted bucket curve
    pub loyalty_bonus: Decimal,
    /// Fixed bonus for the customer's 2nd/3rd+ season with this referrer
    pub retention_bonus: Decimal,
    /// Per-referral bonus beyond the configured minimum
    pub network_bonus: Decimal,
    /// Percentage of base by the coach's resolved tier
    pub tier_bonus: Decimal,
    /// Calendar-window percentage bonus
    pub seasonal_bonus: Decimal,
    /// Flat weekend percentage bonus
    pub weekend_bonus: Decimal,
    /// Arithmetic sum of the seven terms above
    pub total_amount: Decimal,
}

impl CommissionBreakdown {
    /// Recompute the sum of the seven terms
    pub fn sum_terms(&self) -> Decimal {
        self.base_commission
            + self.loyalty_bonus
            + self.retention_bonus
            + self.network_bonus
            + self.tier_bonus
            + self.seasonal_bonus
            + self.weekend_bonus
    }

    /// Verify `total_amount == sum of terms` and every term non-negative
    pub fn verify_total(&self) -> bool {
        let non_negative = [
            self.base_commission,
            self.loyalty_bonus,
            self.retention_bonus,
            self.network_bonus,
            self.tier_bonus,
            self.seasonal_bonus,
            self.weekend_bonus,
        ]
        .iter()
        .all(|t| *t >= Decimal::ZERO);

        non_negative && self.total_amount == self.sum_terms()
    }

    /// Zero breakdown (no commission owed)
    pub fn zero() -> Self {
        Self {
            base_commission: Decimal::ZERO,
            loyalty_bonus: Decimal::ZERO,
            retention_bonus: Decimal::ZERO,
            network_bonus: Decimal::ZERO,
            tier_bonus: Decimal::ZERO,
            seasonal_bonus: Decimal::ZERO,
            weekend_bonus: Decimal::ZERO,
            total_amount: Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering_is_ascending() {
        assert!(CoachTier::Bronze < CoachTier::Silver);
        assert!(CoachTier::Silver < CoachTier::Gold);
        assert!(CoachTier::Gold < CoachTier::Platinum);
    }

    #[test]
    fn test_verify_total_detects_drift() {
        let mut breakdown = CommissionBreakdown::zero();
        breakdown.base_commission = Decimal::new(1000, 2);
        breakdown.tier_bonus = Decimal::new(50, 2);
        breakdown.total_amount = breakdown.sum_terms();
        assert!(breakdown.verify_total());

        breakdown.total_amount += Decimal::new(1, 2);
        assert!(!breakdown.verify_total());
    }

    #[test]
    fn test_verify_total_rejects_negative_terms() {
        let mut breakdown = CommissionBreakdown::zero();
        breakdown.weekend_bonus = Decimal::new(-1, 2);
        breakdown.total_amount = breakdown.sum_terms();
        assert!(!breakdown.verify_total());
    }
}
