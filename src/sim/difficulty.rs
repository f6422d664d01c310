//! Difficulty levels and their static round profiles
//!
//! Profiles are validated once, when the table is built, so round
//! generation never has to deal with a broken configuration.

use serde::{Deserialize, Serialize};

use super::pattern::ShapeType;
use crate::error::{EngineError, Result};

/// Difficulty tier chosen by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Low,
    Medium,
    High,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Low, Difficulty::Medium, Difficulty::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Low => "low",
            Difficulty::Medium => "medium",
            Difficulty::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" | "easy" => Some(Difficulty::Low),
            "medium" | "med" => Some(Difficulty::Medium),
            "high" | "hard" => Some(Difficulty::High),
            _ => None,
        }
    }

    /// Points per second left on the clock
    pub fn multiplier(&self) -> u32 {
        match self {
            Difficulty::Low => 1,
            Difficulty::Medium => 2,
            Difficulty::High => 3,
        }
    }

    /// How far decoys drift from the correct piece (1.0 = most distinct)
    pub fn variation_level(&self) -> f32 {
        match self {
            Difficulty::Low => 1.0,
            Difficulty::Medium => 0.7,
            Difficulty::High => 0.5,
        }
    }

    fn index(self) -> usize {
        match self {
            Difficulty::Low => 0,
            Difficulty::Medium => 1,
            Difficulty::High => 2,
        }
    }
}

/// Round parameters for one difficulty tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Shape families the pattern factory may pick from
    pub allowed_shapes: Vec<ShapeType>,
    /// Countdown length in seconds
    pub time_limit_secs: u32,
    /// Pattern layers on the board
    pub num_shapes: usize,
    /// Answer options, correct one included
    pub num_options: usize,
}

impl DifficultyProfile {
    fn validate(&self, difficulty: Difficulty) -> Result<()> {
        if self.allowed_shapes.is_empty() {
            return Err(EngineError::EmptyShapeSet(difficulty));
        }
        if self.time_limit_secs == 0 {
            return Err(EngineError::InvalidProfile {
                difficulty,
                reason: "time limit must be positive",
            });
        }
        if self.num_shapes == 0 {
            return Err(EngineError::InvalidProfile {
                difficulty,
                reason: "board needs at least one shape",
            });
        }
        if self.num_options < 2 {
            return Err(EngineError::InvalidProfile {
                difficulty,
                reason: "round needs at least one decoy option",
            });
        }
        Ok(())
    }
}

/// The three profiles, indexed by [`Difficulty`]
#[derive(Debug, Clone)]
pub struct DifficultyTable {
    profiles: [DifficultyProfile; 3],
}

impl Default for DifficultyTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl DifficultyTable {
    /// Build a table, rejecting empty shape sets and non-monotonic tiers
    pub fn new(
        low: DifficultyProfile,
        medium: DifficultyProfile,
        high: DifficultyProfile,
    ) -> Result<Self> {
        let profiles = [low, medium, high];
        for (difficulty, profile) in Difficulty::ALL.iter().zip(&profiles) {
            profile.validate(*difficulty)?;
        }

        for pair in profiles.windows(2) {
            let (easier, harder) = (&pair[0], &pair[1]);
            if harder.time_limit_secs >= easier.time_limit_secs {
                return Err(EngineError::NotMonotonic("time limit must shrink as difficulty rises"));
            }
            if harder.num_options <= easier.num_options {
                return Err(EngineError::NotMonotonic("option count must grow as difficulty rises"));
            }
            if harder.num_shapes < easier.num_shapes {
                return Err(EngineError::NotMonotonic(
                    "shape count must not shrink as difficulty rises",
                ));
            }
        }

        Ok(Self { profiles })
    }

    /// The built-in tiers
    pub fn standard() -> Self {
        Self {
            profiles: standard_profiles(),
        }
    }

    pub fn profile(&self, difficulty: Difficulty) -> &DifficultyProfile {
        &self.profiles[difficulty.index()]
    }
}

fn standard_profiles() -> [DifficultyProfile; 3] {
    use ShapeType::*;

    let low = vec![Dots, Stripes, Checkerboard, Ellipse];
    let mut medium = low.clone();
    medium.extend([Zigzag, Waves, Crosshatch, Polygon]);

    [
        DifficultyProfile {
            allowed_shapes: low,
            time_limit_secs: 30,
            num_shapes: 10,
            num_options: 4,
        },
        DifficultyProfile {
            allowed_shapes: medium,
            time_limit_secs: 25,
            num_shapes: 15,
            num_options: 6,
        },
        DifficultyProfile {
            allowed_shapes: ShapeType::ALL.to_vec(),
            time_limit_secs: 20,
            num_shapes: 20,
            num_options: 8,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_validates() {
        let [low, medium, high] = standard_profiles();
        assert!(DifficultyTable::new(low, medium, high).is_ok());
    }

    #[test]
    fn test_monotonic_tiers() {
        let table = DifficultyTable::standard();
        let low = table.profile(Difficulty::Low);
        let medium = table.profile(Difficulty::Medium);
        let high = table.profile(Difficulty::High);

        assert!(low.time_limit_secs > medium.time_limit_secs);
        assert!(medium.time_limit_secs > high.time_limit_secs);
        assert!(low.num_options < medium.num_options);
        assert!(medium.num_options < high.num_options);
        assert!(low.num_shapes < medium.num_shapes && medium.num_shapes < high.num_shapes);
    }

    #[test]
    fn test_empty_shape_set_fails_at_build() {
        let [mut low, medium, high] = standard_profiles();
        low.allowed_shapes.clear();
        let err = DifficultyTable::new(low, medium, high).unwrap_err();
        assert!(matches!(err, EngineError::EmptyShapeSet(Difficulty::Low)));
    }

    #[test]
    fn test_non_monotonic_time_rejected() {
        let [low, mut medium, high] = standard_profiles();
        medium.time_limit_secs = 40;
        assert!(matches!(
            DifficultyTable::new(low, medium, high),
            Err(EngineError::NotMonotonic(_))
        ));
    }

    #[test]
    fn test_single_option_rejected() {
        let [low, medium, mut high] = standard_profiles();
        high.num_options = 1;
        assert!(matches!(
            DifficultyTable::new(low, medium, high),
            Err(EngineError::InvalidProfile { difficulty: Difficulty::High, .. })
        ));
    }

    #[test]
    fn test_multiplier_and_variation() {
        assert_eq!(Difficulty::Low.multiplier(), 1);
        assert_eq!(Difficulty::High.multiplier(), 3);
        assert!(Difficulty::Low.variation_level() > Difficulty::High.variation_level());
        assert_eq!(Difficulty::from_str("Hard"), Some(Difficulty::High));
        assert_eq!(Difficulty::from_str("nope"), None);
    }
}
