//! Missing Piece headless demo
//!
//! Runs one session against an in-memory profile store with a player that
//! guesses at random, then prints the final snapshot.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;
use tokio::sync::watch;

use missing_piece::effects::LogEffects;
use missing_piece::rewards::{MemoryProfileStore, Profile, UserId};
use missing_piece::runtime;
use missing_piece::sim::{GameSession, RoundStatus, SessionView};
use missing_piece::{Records, Settings};

const ROUNDS: u32 = 10;
const RECORDS_PATH: &str = "missing-piece-records.json";

#[tokio::main(flavor = "current_thread")]
async fn main() -> missing_piece::Result<()> {
    env_logger::init();

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load(path),
        None => Settings::default(),
    };
    log::info!("Missing Piece starting ({} difficulty)", settings.difficulty.as_str());

    let user = UserId::new("demo-player");
    let store = Arc::new(MemoryProfileStore::new().with_profile(
        user.clone(),
        Profile {
            points: 0,
            experience: 0,
        },
    ));
    let session = GameSession::new(&settings, Some(user.clone()))
        .with_effects(Box::new(LogEffects::new(settings.sound)));
    log::info!("Session seed {}", session.seed());

    let handle = runtime::spawn(session, store.clone());
    let mut rx = handle.view();
    let mut records = Records::load(RECORDS_PATH);
    let mut rng = rand::rng();

    handle.start_or_continue();
    for n in 1..=ROUNDS {
        let Some(view) = wait_until(&mut rx, |v| {
            v.round_number == n && v.round_status == Some(RoundStatus::Playing)
        })
        .await
        else {
            break;
        };

        // Think for a moment, then guess
        tokio::time::sleep(Duration::from_millis(rng.random_range(300..1500))).await;
        handle.select(rng.random_range(0..view.options.len()));

        let Some(view) = wait_until(&mut rx, |v| {
            v.round_number == n && v.round_status == Some(RoundStatus::Resolved)
        })
        .await
        else {
            break;
        };
        if records.observe(&view.totals) {
            log::info!("New record: score {}, streak {}", records.high_score, records.best_streak);
        }
    }

    handle.stop();
    wait_until(&mut rx, |v| v.pending_rewards == 0).await;
    let last = handle.dispose().await;

    println!("{}", serde_json::to_string_pretty(&last)?);
    if let Some(profile) = store.profile(&user) {
        println!("Profile: {} points, {} XP", profile.points, profile.experience);
    }

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    if let Some(rank) = records.finish_session(&last.totals, last.difficulty, timestamp) {
        println!("Leaderboard rank #{}", rank);
    }
    records.save(RECORDS_PATH)?;
    Ok(())
}

async fn wait_until(
    rx: &mut watch::Receiver<SessionView>,
    f: impl FnMut(&SessionView) -> bool,
) -> Option<SessionView> {
    match rx.wait_for(f).await {
        Ok(view) => Some(view.clone()),
        Err(_) => {
            log::warn!("Session driver stopped early");
            None
        }
    }
}
