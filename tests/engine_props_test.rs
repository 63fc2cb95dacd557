//! Property tests for the speed curve lookup and session determinism.

use proptest::prelude::*;

use shiro_tgm::core::{FrameTimings, Game, ModeConfig, SpeedCurve, SpeedStep};
use shiro_tgm::types::{GameAction, InputEvent};

fn timings(gravity: u32) -> FrameTimings {
    FrameTimings::new(gravity, 25, 25, 14, 30, 40)
}

fn arb_curve() -> impl Strategy<Value = SpeedCurve> {
    prop::collection::btree_set(0u32..2000, 1..12).prop_map(|levels| {
        SpeedCurve::new(
            levels
                .into_iter()
                .map(|level| SpeedStep {
                    level,
                    timings: timings(level + 1),
                })
                .collect(),
        )
    })
}

fn arb_inputs() -> impl Strategy<Value = Vec<(u16, usize, bool)>> {
    prop::collection::vec((0u16..600, 0usize..GameAction::ALL.len() - 2, any::<bool>()), 0..80)
}

proptest! {
    #[test]
    fn lookup_returns_the_floor_step(curve in arb_curve(), level in 0u32..2500) {
        let floor = curve.steps().iter().filter(|s| s.level <= level).max_by_key(|s| s.level);
        prop_assert_eq!(curve.timings_for_level(level), floor.map(|s| s.timings));
        prop_assert!(curve.validate().is_ok());
    }

    #[test]
    fn same_seed_and_inputs_replay_identically(seed in any::<u32>(), inputs in arb_inputs()) {
        let play = || {
            let mut game = Game::new(ModeConfig::master(), seed).unwrap();
            for frame in 0u16..600 {
                for &(at, action, press) in &inputs {
                    if at == frame {
                        // Pause and restart are left out of the action range.
                        let action = GameAction::ALL[action];
                        let event = if press { InputEvent::Press(action) } else { InputEvent::Release(action) };
                        game.input(&[event]);
                    }
                }
                game.frame();
            }
            game.snapshot()
        };
        prop_assert_eq!(play(), play());
    }
}

#[test]
fn master_curve_covers_every_level() {
    let curve = SpeedCurve::master();
    assert!(curve.validate().is_ok());
    for level in 0..=999 {
        assert!(curve.timings_for_level(level).is_some(), "no timings at {level}");
    }
    assert!(curve.timings_for_level(999).unwrap().is_20g());
}
