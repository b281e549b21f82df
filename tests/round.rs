//! Full rounds driven through the public API

use balloon_rush::consts::FRAME_DT;
use balloon_rush::sim::expression::evaluate;
use balloon_rush::sim::{
    EntityKind, EntityTag, EventLog, GameEvent, NullHooks, Round, RoundSnapshot, TickInput,
};
use balloon_rush::{Difficulty, HighScoreTable, Settings};

fn settings(difficulty: Difficulty, seed: u64) -> Settings {
    Settings {
        seed: Some(seed),
        ..Settings::for_difficulty(difficulty)
    }
}

fn play_out(round: &mut Round, table: &mut HighScoreTable, hooks: &mut EventLog) -> u32 {
    let input = TickInput::idle();
    let mut frames = 0;
    while round.tick(&input, table, hooks, FRAME_DT) {
        frames += 1;
        assert!(frames < 60 * 120, "round did not finish");
    }
    frames
}

#[test]
fn rounds_fill_the_high_score_table() {
    let mut table = HighScoreTable::new();
    let mut log = EventLog::new();
    let mut round = Round::new(&settings(Difficulty::Easy, 11));

    for n in 0..7 {
        if n > 0 {
            round.restart();
        }
        play_out(&mut round, &mut table, &mut log);
    }

    assert_eq!(log.game_overs(), 7);
    let entries = table.entries(Difficulty::Easy);
    assert_eq!(entries.len(), 5);
    assert!(entries.windows(2).all(|w| w[0] >= w[1]));
    assert!(table.entries(Difficulty::Hard).is_empty());

    // Every game over reported whether it set a new best
    let firsts = log
        .events
        .iter()
        .filter(|e| matches!(e, GameEvent::GameOver { new_high_score: true, .. }))
        .count();
    assert!(firsts >= 1);
}

#[test]
fn hard_rounds_show_expressions_and_enemies() {
    let mut round = Round::new(&settings(Difficulty::Hard, 5));
    assert_eq!(round.entities().count_active(EntityTag::Enemy), 2);

    let mut table = HighScoreTable::new();
    for _ in 0..300 {
        round.tick(&TickInput::idle(), &mut table, &mut NullHooks, FRAME_DT);
        for entity in round.entities().iter() {
            if let EntityKind::Collectible(c) = &entity.kind {
                assert!(c.uses_math);
                assert_eq!(evaluate(&c.display_text), Some(c.value), "{}", c.display_text);
            }
        }
    }
}

#[test]
fn snapshot_survives_json_and_continues() {
    let settings = settings(Difficulty::Hard, 99);
    let mut table = HighScoreTable::new();
    let mut round = Round::new(&settings);
    for _ in 0..500 {
        round.tick(&TickInput::idle(), &mut table, &mut NullHooks, FRAME_DT);
    }

    let json = round.pause().to_json().unwrap();
    let restored = RoundSnapshot::from_json(&json).unwrap();
    // Configured difficulty is overridden by the snapshot
    let mut resumed = Round::resume(&Settings::for_difficulty(Difficulty::Easy), restored);
    assert_eq!(resumed.game().difficulty(), Difficulty::Hard);
    assert_eq!(resumed.capture().to_json().unwrap(), json);

    let mut log = EventLog::new();
    play_out(&mut resumed, &mut table, &mut log);
    assert_eq!(log.game_overs(), 1);
    assert_eq!(table.best(Difficulty::Hard), Some(resumed.game().score()));
}

#[test]
fn settings_file_drives_the_round() {
    let json = r#"{ "difficulty": "Hard", "seed": 3, "round_duration": 5.0, "enemy_count": 0 }"#;
    let settings = Settings::from_json(json).unwrap();
    let mut round = Round::new(&settings);
    assert_eq!(round.entities().count_active(EntityTag::Enemy), 0);

    let mut table = HighScoreTable::new();
    let frames = play_out(&mut round, &mut table, &mut EventLog::new());
    // 5s at 60Hz, give or take extend/reduce time power-ups
    assert!(frames > 60 && frames < 60 * 60, "frames = {frames}");
}
