#![allow(dead_code)]

use auctioneer::config::AuctionSettings;
use auctioneer::db::init_db;
use auctioneer::domain::{Manager, ManagerId, NewManager, NewPlayer, Player, Slot};
use auctioneer::engine::RoundPlan;
use auctioneer::{AuctionService, RecordingEmitter, Repository};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use tempfile::TempDir;

pub struct Harness {
    pub service: AuctionService,
    pub repo: Arc<Repository>,
    pub emitter: Arc<RecordingEmitter>,
    _temp: TempDir,
}

pub async fn setup() -> Harness {
    setup_with(AuctionSettings::default()).await
}

pub async fn setup_with(settings: AuctionSettings) -> Harness {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));
    let emitter = Arc::new(RecordingEmitter::new());
    let service = AuctionService::new(repo.clone(), settings, emitter.clone());

    Harness {
        service,
        repo,
        emitter,
        _temp: temp_dir,
    }
}

/// 2026-05-`day` at `hour`:00 UTC.
pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, day, hour, 0, 0).unwrap()
}

/// Inside round 1's nomination window.
pub fn nominating() -> DateTime<Utc> {
    at(1, 12)
}

/// After every round 1 slot has closed.
pub fn after_close() -> DateTime<Utc> {
    at(4, 0)
}

pub async fn manager(h: &Harness, username: &str, rank: Option<i64>, admin: bool) -> Manager {
    let new = NewManager {
        username: username.to_string(),
        team_name: format!("{} Team", username),
        short_team_name: username.to_uppercase(),
        tiebreaker_rank: rank,
        is_league_manager: admin,
        ..NewManager::default()
    };
    h.service
        .register_manager(&new, at(1, 0))
        .await
        .expect("register manager")
}

pub async fn player(
    h: &Harness,
    admin: ManagerId,
    name: &str,
    match_right_holder: Option<ManagerId>,
    hometown_discount: bool,
) -> Player {
    let new = NewPlayer {
        external_id: format!("ext-{}", name.to_lowercase()),
        name: name.to_string(),
        team: "BOS".to_string(),
        position: "SP".to_string(),
        hometown_discount,
        match_right_holder,
    };
    h.service.add_player(admin, &new).await.expect("add player")
}

/// Round with nominations open May 1-2 and slots closing hourly from May 3 12:00.
pub fn plan(round: i64, num_slots: i64) -> RoundPlan {
    let offset = Duration::days(7 * (round - 1));
    RoundPlan {
        round,
        first_close_at: at(3, 12) + offset,
        num_slots,
        spacing_minutes: 60,
        nomination_opens_at: at(1, 0) + offset,
        nomination_closes_at: at(2, 0) + offset,
    }
}

pub async fn round(h: &Harness, admin: ManagerId, round: i64, num_slots: i64) -> Vec<Slot> {
    h.service
        .create_round(admin, &plan(round, num_slots), at(1, 0))
        .await
        .expect("create round")
}

/// Three managers ranked A=3, B=1, C=2; A runs the league.
pub struct League {
    pub a: Manager,
    pub b: Manager,
    pub c: Manager,
    pub slots: Vec<Slot>,
}

pub async fn league(h: &Harness) -> League {
    let a = manager(h, "alice", Some(3), true).await;
    let b = manager(h, "bob", Some(1), false).await;
    let c = manager(h, "carol", Some(2), false).await;
    let slots = round(h, a.id, 1, 4).await;
    League { a, b, c, slots }
}

pub async fn ranks(h: &Harness) -> Vec<(ManagerId, i64)> {
    h.repo.tiebreaker_order().await.unwrap().ranked()
}
