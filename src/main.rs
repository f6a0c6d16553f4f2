//! Headless demo runner
//!
//! Drives a seeded session with a scripted input pattern for one minute of
//! sim time, logging progress once a second and printing the final snapshot
//! as JSON. Useful for eyeballing generation, scoring, and determinism
//! without a renderer attached.

use quiz_kart::persistence::{MemoryStore, Profile};
use quiz_kart::quiz::{QuestionPool, QuizQuestion};
use quiz_kart::sim::{Controls, GameState, TickInput, tick};
use quiz_kart::tuning::Tuning;

fn sample_pool() -> QuestionPool {
    let questions = vec![
        QuizQuestion {
            id: 1,
            prompt: "2 + 2 = ?".to_string(),
            options: ["3".to_string(), "4".to_string(), "5".to_string()],
            correct_index: 1,
        },
        QuizQuestion {
            id: 2,
            prompt: "Capital of France?".to_string(),
            options: [
                "Paris".to_string(),
                "Lyon".to_string(),
                "Marseille".to_string(),
            ],
            correct_index: 0,
        },
        QuizQuestion {
            id: 3,
            prompt: "7 x 8 = ?".to_string(),
            options: ["54".to_string(), "63".to_string(), "56".to_string()],
            correct_index: 2,
        },
    ];
    QuestionPool::new(questions)
}

fn main() {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42u64);

    let tuning = Tuning::default();
    if let Err(err) = tuning.validate() {
        log::error!("bad tuning: {err}");
        std::process::exit(1);
    }

    log::info!("starting demo session, seed {seed}");
    let mut state = GameState::new(seed, sample_pool(), tuning);
    tick(
        &mut state,
        &TickInput {
            start: true,
            ..Default::default()
        },
    );

    // One minute at 60 Hz; steer and drift in a fixed pattern so the run
    // exercises turns, walls, and pickups deterministically
    for i in 0u32..60 * 60 {
        let input = TickInput {
            controls: Controls {
                forward: true,
                left: i % 240 < 40,
                right: i % 240 >= 120 && i % 240 < 150,
                drift: i % 360 < 60,
                ..Default::default()
            },
            ..Default::default()
        };
        tick(&mut state, &input);

        if i % 60 == 59 {
            log::info!(
                "t={:>2}s chunk={} progress={:.2} speed={:.3} score={} boost={} penalty={}",
                (i + 1) / 60,
                state.player_chunk,
                state.progress_in_chunk,
                state.vehicle.speed,
                state.total_score(),
                state.boost_timer,
                state.penalty_timer,
            );
        }
    }

    let mut store = MemoryStore::new();
    let mut profile = Profile::load(&store);
    if profile.record_score(state.best_score) {
        profile.save(&mut store);
        log::info!("new best score {}", profile.best_score);
    }

    match serde_json::to_string_pretty(&state.snapshot()) {
        Ok(json) => println!("{json}"),
        Err(err) => log::error!("snapshot serialization failed: {err}"),
    }
}
