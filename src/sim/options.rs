//! Answer option generation
//!
//! One option reproduces the missing piece exactly. Every other option is a
//! near-duplicate: the same layer stack run through a similarity transform
//! whose strength is the difficulty's variation level, viewed through a
//! slightly shifted window.
//!
//! No dedup pass is run over the decoys. Two decoys (or a decoy and the
//! correct piece) rendering identically would need every float draw to land
//! on zero, which is accepted as probabilistically impossible.

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::board::PieceRect;
use super::difficulty::{Difficulty, DifficultyProfile};
use super::pattern::{Pattern, PatternId};
use crate::consts::PIECE_SIZE;
use crate::normalize_degrees;

/// Maximum decoy window shift, as a fraction of the piece size per axis
pub const MAX_OFFSET_FRACTION: f32 = 0.3;

/// A selectable answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Top-left of the window this option shows
    pub origin: Vec2,
    /// Layer stack seen through the window
    pub patterns: Vec<Pattern>,
    pub is_correct: bool,
}

pub struct OptionGenerator;

impl OptionGenerator {
    /// Build `num_options` shuffled options for the given target
    pub fn generate<R: Rng + ?Sized>(
        target: &[Pattern],
        missing: &PieceRect,
        difficulty: Difficulty,
        profile: &DifficultyProfile,
        rng: &mut R,
    ) -> Vec<AnswerOption> {
        let variation = difficulty.variation_level();
        let mut options = Vec::with_capacity(profile.num_options);

        options.push(AnswerOption {
            origin: missing.origin,
            patterns: target.to_vec(),
            is_correct: true,
        });

        for _ in 1..profile.num_options {
            let patterns = target
                .iter()
                .map(|p| similar_pattern(p, variation, rng))
                .collect();
            options.push(AnswerOption {
                origin: missing.origin + decoy_offset(rng),
                patterns,
                is_correct: false,
            });
        }

        options.shuffle(rng);
        options
    }
}

/// Index of the correct option, if any
pub fn correct_index(options: &[AnswerOption]) -> Option<usize> {
    options.iter().position(|o| o.is_correct)
}

/// Perturb a pattern into a look-alike with a fresh id
pub fn similar_pattern<R: Rng + ?Sized>(pattern: &Pattern, variation: f32, rng: &mut R) -> Pattern {
    let size = pattern.size * (0.9 + rng.random::<f32>() * 0.2 * variation);
    let turn = (rng.random::<f32>() - 0.5) * 45.0 * variation;
    let rotation = normalize_degrees(pattern.rotation + turn);
    let foreground = pattern.foreground.jitter(rng, variation * 10.0);
    let opacity = (pattern.opacity * rng.random_range(0.5..=1.0)).clamp(0.0, 1.0);

    Pattern {
        id: PatternId(rng.random()),
        shape: pattern.shape,
        params: pattern.params.clone(),
        background: pattern.background,
        foreground,
        size,
        rotation,
        opacity,
    }
}

/// Window shift for a decoy; never exactly zero
fn decoy_offset<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    let max = PIECE_SIZE * MAX_OFFSET_FRACTION;
    loop {
        let offset = Vec2::new(rng.random_range(-max..=max), rng.random_range(-max..=max));
        if offset != Vec2::ZERO {
            return offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{BoardGenerator, DifficultyTable};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn round(seed: u64, difficulty: Difficulty) -> (crate::sim::Board, Vec<AnswerOption>) {
        let table = DifficultyTable::standard();
        let profile = table.profile(difficulty);
        let mut rng = Pcg32::seed_from_u64(seed);
        let board = BoardGenerator::generate(profile, &mut rng);
        let options = OptionGenerator::generate(
            board.target_patterns(),
            &board.missing,
            difficulty,
            profile,
            &mut rng,
        );
        (board, options)
    }

    #[test]
    fn test_correct_option_matches_board() {
        let (board, options) = round(42, Difficulty::Medium);
        assert_eq!(options.len(), 6);

        let idx = correct_index(&options).unwrap();
        let correct = &options[idx];
        assert_eq!(correct.origin, board.missing.origin);
        assert_eq!(correct.patterns, board.tiles);
    }

    #[test]
    fn test_decoys_keep_shape_but_change_id() {
        let (board, options) = round(7, Difficulty::High);
        for decoy in options.iter().filter(|o| !o.is_correct) {
            assert_eq!(decoy.patterns.len(), board.tiles.len());
            assert_ne!(decoy.origin, board.missing.origin);
            for (d, t) in decoy.patterns.iter().zip(&board.tiles) {
                assert_eq!(d.shape, t.shape);
                assert_eq!(d.params, t.params);
                assert_eq!(d.background, t.background);
                assert_ne!(d.id, t.id);
            }
        }
    }

    #[test]
    fn test_shuffle_moves_correct_index() {
        // Over many rounds the correct answer must not sit at a fixed slot
        let mut seen = [false; 4];
        for seed in 0..64 {
            let (_, options) = round(seed, Difficulty::Low);
            seen[correct_index(&options).unwrap()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_similarity_transform_bounds() {
        let table = DifficultyTable::standard();
        let mut rng = Pcg32::seed_from_u64(5);
        let base = crate::sim::PatternFactory::generate(table.profile(Difficulty::Low), &mut rng);

        for _ in 0..500 {
            let v = 0.5;
            let p = similar_pattern(&base, v, &mut rng);
            assert!(p.size >= base.size * 0.9 - 1e-4);
            assert!(p.size <= base.size * (0.9 + 0.2 * v) + 1e-4);
            assert!(p.opacity >= base.opacity * 0.5 - 1e-4 && p.opacity <= base.opacity + 1e-4);
            assert!((0.0..360.0).contains(&p.rotation));

            let turn = (p.rotation - base.rotation).rem_euclid(360.0);
            let turn = turn.min(360.0 - turn);
            assert!(turn <= 45.0 * v / 2.0 + 1e-3);

            let drift = |a: u8, b: u8| (a as i32 - b as i32).abs();
            assert!(drift(p.foreground.r, base.foreground.r) <= 5);
            assert!(drift(p.foreground.g, base.foreground.g) <= 5);
            assert!(drift(p.foreground.b, base.foreground.b) <= 5);
        }
    }

    proptest! {
        #[test]
        fn prop_exactly_one_correct(seed in any::<u64>(), level in 0usize..3) {
            let difficulty = Difficulty::ALL[level];
            let (board, options) = round(seed, difficulty);
            let table = DifficultyTable::standard();

            prop_assert_eq!(options.len(), table.profile(difficulty).num_options);
            prop_assert_eq!(options.iter().filter(|o| o.is_correct).count(), 1);

            let max = PIECE_SIZE * MAX_OFFSET_FRACTION + 1e-3;
            for o in &options {
                let shift = o.origin - board.missing.origin;
                prop_assert!(shift.x.abs() <= max && shift.y.abs() <= max);
            }
        }
    }
}
