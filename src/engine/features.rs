//! Feature vector construction.
//!
//! Raw game context is validated and normalized into the fixed feature order
//! `[home, opponent_strength, rest_days, season_clutch_fg_pct, minutes_per_game]`.
//! The rule-based weights and any trained model depend on this exact order.

use super::error::PredictError;
use super::types::{Feature, GameContext, FEATURE_COUNT};

/// Regulation game length in minutes; minutes per game are expressed as a
/// share of it.
pub const REGULATION_MINUTES: f64 = 48.0;

/// Immutable, ordered feature values for one prediction.
///
/// Stored representation:
/// - `home`: 0.0 or 1.0
/// - `opponent_strength`: [0, 1]
/// - `rest_days`: days as a float, ≥ 0
/// - `season_clutch_fg_pct`: fraction in [0, 1]
/// - `minutes_per_game`: share of [`REGULATION_MINUTES`], ≥ 0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        FEATURE_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn is_home(&self) -> bool {
        self.get(Feature::Home) > 0.5
    }

    pub fn rest_days(&self) -> f64 {
        self.get(Feature::RestDays)
    }

    /// Season clutch FG% back on the 0–100 scale.
    pub fn clutch_fg_pct(&self) -> f64 {
        self.get(Feature::SeasonClutchFgPct) * 100.0
    }

    /// Minutes per game back in minutes.
    pub fn minutes(&self) -> f64 {
        self.get(Feature::MinutesPerGame) * REGULATION_MINUTES
    }
}

/// Build the feature vector for a game context.
///
/// Out-of-range opponent strength and clutch FG% are clamped. Negative rest
/// days, negative minutes, and non-finite numbers are rejected.
pub fn build(context: &GameContext) -> Result<FeatureVector, PredictError> {
    if context.rest_days < 0 {
        return Err(PredictError::InvalidInput {
            field: "rest_days",
            value: context.rest_days as f64,
        });
    }
    let minutes = finite("minutes_per_game", context.minutes_per_game)?;
    if minutes < 0.0 {
        return Err(PredictError::InvalidInput {
            field: "minutes_per_game",
            value: minutes,
        });
    }
    let opponent = finite("opponent_strength", context.opponent_strength)?;
    let fg_pct = finite("season_clutch_fg_pct", context.season_clutch_fg_pct)?;

    let mut values = [0.0; FEATURE_COUNT];
    values[Feature::Home.index()] = if context.is_home { 1.0 } else { 0.0 };
    values[Feature::OpponentStrength.index()] = opponent.clamp(0.0, 1.0);
    values[Feature::RestDays.index()] = context.rest_days as f64;
    values[Feature::SeasonClutchFgPct.index()] = fg_pct.clamp(0.0, 100.0) / 100.0;
    values[Feature::MinutesPerGame.index()] = minutes / REGULATION_MINUTES;
    Ok(FeatureVector(values))
}

fn finite(field: &'static str, value: f64) -> Result<f64, PredictError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PredictError::InvalidInput { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn context() -> GameContext {
        GameContext {
            is_home: true,
            opponent_strength: 0.65,
            rest_days: 2,
            season_clutch_fg_pct: 48.5,
            minutes_per_game: 36.0,
        }
    }

    #[test]
    fn builds_in_fixed_order() {
        let v = build(&context()).unwrap();
        assert_eq!(v.len(), 5);
        assert_relative_eq!(v.as_slice()[0], 1.0);
        assert_relative_eq!(v.as_slice()[1], 0.65);
        assert_relative_eq!(v.as_slice()[2], 2.0);
        assert_relative_eq!(v.as_slice()[3], 0.485, epsilon = 1e-12);
        assert_relative_eq!(v.as_slice()[4], 0.75, epsilon = 1e-12);
        assert_relative_eq!(v.minutes(), 36.0, epsilon = 1e-12);
        assert_relative_eq!(v.clutch_fg_pct(), 48.5, epsilon = 1e-12);
    }

    #[test]
    fn away_game_is_zero() {
        let mut ctx = context();
        ctx.is_home = false;
        let v = build(&ctx).unwrap();
        assert_relative_eq!(v.get(Feature::Home), 0.0);
        assert!(!v.is_home());
    }

    #[test]
    fn clamps_out_of_range_values() {
        let mut ctx = context();
        ctx.opponent_strength = 1.2;
        ctx.season_clutch_fg_pct = 104.0;
        let v = build(&ctx).unwrap();
        assert_relative_eq!(v.get(Feature::OpponentStrength), 1.0);
        assert_relative_eq!(v.get(Feature::SeasonClutchFgPct), 1.0);

        ctx.opponent_strength = -0.3;
        ctx.season_clutch_fg_pct = -5.0;
        let v = build(&ctx).unwrap();
        assert_relative_eq!(v.get(Feature::OpponentStrength), 0.0);
        assert_relative_eq!(v.get(Feature::SeasonClutchFgPct), 0.0);
    }

    #[test]
    fn rejects_negative_rest_days() {
        let mut ctx = context();
        ctx.rest_days = -1;
        assert_eq!(
            build(&ctx),
            Err(PredictError::InvalidInput {
                field: "rest_days",
                value: -1.0
            })
        );
    }

    #[test]
    fn rejects_negative_minutes() {
        let mut ctx = context();
        ctx.minutes_per_game = -0.5;
        assert!(matches!(
            build(&ctx),
            Err(PredictError::InvalidInput {
                field: "minutes_per_game",
                ..
            })
        ));
    }

    #[test]
    fn rejects_nan() {
        let mut ctx = context();
        ctx.opponent_strength = f64::NAN;
        assert!(matches!(
            build(&ctx),
            Err(PredictError::InvalidInput {
                field: "opponent_strength",
                ..
            })
        ));
    }

    #[test]
    fn zero_rest_and_minutes_are_valid() {
        let mut ctx = context();
        ctx.rest_days = 0;
        ctx.minutes_per_game = 0.0;
        assert!(build(&ctx).is_ok());
    }
}
