//! Rate, Tier and Commission Configuration Snapshots
//!
//! Configuration is owned by the admin-settings collaborator. The engines
//! receive these structs as explicit, immutable snapshots per call and
//! never read ambient state, so the same inputs always produce the same
//! outputs.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::commission::CoachTier;
use crate::error::{LoyaltyError, LoyaltyResult};

/// Role names with configured rates
pub mod roles {
    pub const PARTNER: &str = "partner";
    pub const SOCIAL_INFLUENCER: &str = "social_influencer";
    pub const CONTENT_CREATOR: &str = "content_creator";
    pub const COACH: &str = "coach";
    pub const CUSTOMER: &str = "customer";
}

/// Role -> points-rate snapshot with a fixed resolution priority.
///
/// A rate is "currency units per 1 point": rate 10 means 10 currency
/// units earn 1 point, so a smaller rate is more generous.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateConfig {
    /// Role -> currency units per point
    pub rates: HashMap<String, i64>,
    /// Resolution order, most generous role first
    pub priority: Vec<String>,
    /// Fallback role when none of the customer's roles carries a rate
    pub default_role: String,
}

impl Default for RateConfig {
    fn default() -> Self {
        let mut rates = HashMap::new();
        rates.insert(roles::PARTNER.to_string(), 5);
        rates.insert(roles::SOCIAL_INFLUENCER.to_string(), 6);
        rates.insert(roles::CONTENT_CREATOR.to_string(), 8);
        rates.insert(roles::COACH.to_string(), 8);
        rates.insert(roles::CUSTOMER.to_string(), 10);

        Self {
            rates,
            priority: vec![
                roles::PARTNER.to_string(),
                roles::SOCIAL_INFLUENCER.to_string(),
                roles::CONTENT_CREATOR.to_string(),
                roles::COACH.to_string(),
                roles::CUSTOMER.to_string(),
            ],
            default_role: roles::CUSTOMER.to_string(),
        }
    }
}

impl RateConfig {
    /// Rate for a single role, validated positive
    pub fn rate_for_role(&self, role: &str) -> LoyaltyResult<i64> {
        let rate = self
            .rates
            .get(role)
            .copied()
            .ok_or_else(|| LoyaltyError::NoRateForRoles {
                roles: vec![role.to_string()],
            })?;
        if rate <= 0 {
            return Err(LoyaltyError::InvalidRate { rate });
        }
        Ok(rate)
    }

    /// Resolve the rate for a role set.
    ///
    /// Walks the priority order and picks the first role the customer
    /// holds; falls back to the default role for empty/unknown sets. The
    /// resolved role is returned with the rate so callers can record it
    /// and reuse it for any later recomputation of the same order.
    pub fn resolve_rate(&self, customer_roles: &[String]) -> LoyaltyResult<(String, i64)> {
        for role in &self.priority {
            if customer_roles.iter().any(|r| r == role) && self.rates.contains_key(role) {
                return Ok((role.clone(), self.rate_for_role(role)?));
            }
        }
        let rate = self.rate_for_role(&self.default_role)?;
        Ok((self.default_role.clone(), rate))
    }
}

/// Tier thresholds and bonus percentages
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Minimum referral count per tier
    pub thresholds: HashMap<CoachTier, u32>,
    /// Bonus percentage per tier, Bronze 0 ascending to Platinum
    pub percentages: HashMap<CoachTier, Decimal>,
}

impl Default for TierConfig {
    fn default() -> Self {
        let mut thresholds = HashMap::new();
        thresholds.insert(CoachTier::Bronze, 0);
        thresholds.insert(CoachTier::Silver, 5);
        thresholds.insert(CoachTier::Gold, 15);
        thresholds.insert(CoachTier::Platinum, 30);

        let mut percentages = HashMap::new();
        percentages.insert(CoachTier::Bronze, Decimal::ZERO);
        percentages.insert(CoachTier::Silver, Decimal::new(2, 2));
        percentages.insert(CoachTier::Gold, Decimal::new(5, 2));
        percentages.insert(CoachTier::Platinum, Decimal::new(8, 2));

        Self {
            thresholds,
            percentages,
        }
    }
}

impl TierConfig {
    /// Resolve the tier for a referral count; highest tier whose
    /// threshold is met. Tier is always computed fresh, never stored.
    pub fn tier_for_referral_count(&self, referral_count: u32) -> CoachTier {
        let mut resolved = CoachTier::Bronze;
        for tier in CoachTier::ASCENDING {
            match self.thresholds.get(&tier) {
                Some(min) if referral_count >= *min => resolved = tier,
                _ => {}
            }
        }
        resolved
    }

    /// Bonus percentage for a tier; missing entries read as 0%
    pub fn bonus_percentage(&self, tier: CoachTier) -> Decimal {
        self.percentages.get(&tier).copied().unwrap_or(Decimal::ZERO)
    }

    /// Validate that thresholds and percentages ascend with the tiers
    pub fn validate(&self) -> LoyaltyResult<()> {
        let mut last_threshold: Option<u32> = None;
        let mut last_pct: Option<Decimal> = None;
        for tier in CoachTier::ASCENDING {
            let threshold =
                self.thresholds
                    .get(&tier)
                    .copied()
                    .ok_or_else(|| LoyaltyError::InvalidTierConfig {
                        reason: format!("missing threshold for {tier}"),
                    })?;
            let pct = self.bonus_percentage(tier);
            if last_threshold.is_some_and(|prev| threshold <= prev) {
                return Err(LoyaltyError::InvalidTierConfig {
                    reason: format!("threshold for {tier} does not ascend"),
                });
            }
            if last_pct.is_some_and(|prev| pct < prev) {
                return Err(LoyaltyError::InvalidTierConfig {
                    reason: format!("percentage for {tier} descends"),
                });
            }
            last_threshold = Some(threshold);
            last_pct = Some(pct);
        }
        Ok(())
    }
}

/// Named calendar window carrying a seasonal bonus percentage.
///
/// Windows are month/day based and may wrap the year end (a holiday
/// window running into early January).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonWindow {
    pub name: String,
    pub start_month: u32,
    pub start_day: u32,
    pub end_month: u32,
    pub end_day: u32,
    /// Bonus percentage inside the window
    pub percentage: Decimal,
}

impl SeasonWindow {
    pub fn new(
        name: impl Into<String>,
        start: (u32, u32),
        end: (u32, u32),
        percentage: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            start_month: start.0,
            start_day: start.1,
            end_month: end.0,
            end_day: end.1,
            percentage,
        }
    }

    /// Whether the date falls inside the window, inclusive on both ends
    pub fn contains(&self, date: NaiveDate) -> bool {
        let point = (date.month(), date.day());
        let start = (self.start_month, self.start_day);
        let end = (self.end_month, self.end_day);
        if start <= end {
            point >= start && point <= end
        } else {
            // Wraps the year end
            point >= start || point <= end
        }
    }
}

/// Purchase-count bucket for the three-rate schedules
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseBucket {
    First,
    Second,
    ThirdPlus,
}

impl PurchaseBucket {
    /// Bucket for a 1-based purchase count; counts past 3 all land in
    /// `ThirdPlus` (there is no 4th distinct rate).
    pub fn from_count(purchase_count: u32) -> Self {
        match purchase_count {
            0 | 1 => Self::First,
            2 => Self::Second,
            _ => Self::ThirdPlus,
        }
    }
}

/// One three-bucket rate schedule
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSchedule {
    pub first: Decimal,
    pub second: Decimal,
    pub third_plus: Decimal,
}

impl BucketSchedule {
    pub fn rate_for(&self, bucket: PurchaseBucket) -> Decimal {
        match bucket {
            PurchaseBucket::First => self.first,
            PurchaseBucket::Second => self.second,
            PurchaseBucket::ThirdPlus => self.third_plus,
        }
    }
}

/// Commission calculation configuration snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionConfig {
    /// Base commission rates, strictly decreasing 1st -> 3rd+
    pub base_rates: BucketSchedule,
    /// Loyalty bonus rates, strictly increasing 1st -> 3rd+
    pub loyalty_rates: BucketSchedule,
    /// Fixed retention bonus for a customer's 2nd season with the referrer
    pub retention_second_season: Decimal,
    /// Fixed retention bonus for 3rd-and-later seasons
    pub retention_later_seasons: Decimal,
    /// Network bonus per referral beyond the minimum
    pub network_bonus_per_referral: Decimal,
    /// Referral count a coach must exceed before network bonus accrues
    pub network_min_referrals: u32,
    /// Named seasonal windows; dates outside every window are "regular" = 0%
    pub seasonal_windows: Vec<SeasonWindow>,
    /// Flat weekend percentage (Saturday/Sunday only)
    pub weekend_percentage: Decimal,
    /// Currency rounding precision for each term
    pub precision: u32,
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            base_rates: BucketSchedule {
                first: Decimal::new(10, 2),
                second: Decimal::new(7, 2),
                third_plus: Decimal::new(5, 2),
            },
            loyalty_rates: BucketSchedule {
                first: Decimal::new(1, 2),
                second: Decimal::new(2, 2),
                third_plus: Decimal::new(3, 2),
            },
            retention_second_season: Decimal::new(1000, 2),
            retention_later_seasons: Decimal::new(2500, 2),
            network_bonus_per_referral: Decimal::new(500, 2),
            network_min_referrals: 10,
            seasonal_windows: vec![
                SeasonWindow::new("back_to_school", (8, 15), (9, 15), Decimal::new(3, 2)),
                SeasonWindow::new("holiday", (11, 15), (1, 5), Decimal::new(5, 2)),
                SeasonWindow::new("spring", (3, 1), (4, 15), Decimal::new(2, 2)),
            ],
            weekend_percentage: Decimal::new(15, 3),
            precision: 2,
        }
    }
}
