//! Integration tests: one full generation against a temp-dir node store.
//!
//! Walks the reference scenario end to end: a creator finalizes a
//! definition, two foragers are seated and resolve their positions, the
//! generation closes, and the summary produces the successor seed.

use forage_chain::allocate::{AllocateError, SlotRequest, allocate_slot_json, assigned_position_json};
use forage_chain::config::ExperimentConfig;
use forage_chain::node::NodeState;
use forage_chain::store::{read_node_from_path, write_node_to_path};
use forage_chain::summarize::summarize_generation_json;
use forage_chain::trial::Trial;
use forage_kernel::assignment::AssignmentError;
use forage_kernel::role::TrialRole;
use forage_kernel::world::CoinField;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_node_path(prefix: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    let root = std::env::temp_dir().join(format!("forage-flow-{prefix}-{unique}"));
    fs::create_dir_all(&root).expect("temp dir should be created");
    root.join("node.json")
}

/// Seed a node the way the chain engine would: first-generation seed from
/// config, creator trial finalized with the definition-of-record.
fn write_first_generation(path: &PathBuf, config: &ExperimentConfig) {
    let mut node = NodeState::new(1, config.initial_seed());

    let mut creator = Trial::new(10, 100, TrialRole::Creator);
    creator.finalize(json!({
        "overhead": 0.8,
        "wages": 0.5,
        "prerogative": 0.5,
        // Stored in the legacy textual encoding on purpose.
        "positions": "['A','B']",
    }));
    node.upsert_trial(creator);

    write_node_to_path(path, &node).expect("fixture node should write");
}

#[test]
fn a_generation_seats_foragers_and_propagates_the_seed() {
    let config = ExperimentConfig::default();
    let path = temp_node_path("full");
    write_first_generation(&path, &config);

    // Two foragers arrive, in order; a reload repeats the first request.
    let first = allocate_slot_json(&path, &SlotRequest::new(101, config.num_foragers))
        .expect("first forager should seat");
    let second = allocate_slot_json(&path, &SlotRequest::new(102, config.num_foragers))
        .expect("second forager should seat");
    let reload = allocate_slot_json(&path, &SlotRequest::new(101, config.num_foragers))
        .expect("reload should reuse the recorded slot");

    assert_eq!((first.slot, second.slot, reload.slot), (0, 1, 0));
    assert!(!reload.newly_assigned);

    // A third forager cannot be seated in a full generation.
    let err = allocate_slot_json(&path, &SlotRequest::new(103, config.num_foragers))
        .expect_err("full pool must refuse");
    assert!(matches!(
        err,
        AllocateError::Assignment(AssignmentError::PoolExhausted { pool_size: 2, .. })
    ));

    // Positions resolve through the legacy textual encoding.
    assert_eq!(
        assigned_position_json(&path, &SlotRequest::new(101, config.num_foragers))
            .expect("position should resolve"),
        "A"
    );
    assert_eq!(
        assigned_position_json(&path, &SlotRequest::new(102, config.num_foragers))
            .expect("position should resolve"),
        "B"
    );

    // Close out the raters and summarize the generation.
    let mut node = read_node_from_path(&path).expect("node should reload");
    for (trial_id, participant_id) in [(11u64, 101u64), (12, 102)] {
        let mut rater = Trial::new(trial_id, participant_id, TrialRole::Rater);
        rater.finalize(json!(1));
        node.upsert_trial(rater);
    }
    write_node_to_path(&path, &node).expect("node should persist");

    let next = summarize_generation_json(&path, &config.slider_dimensions())
        .expect("summary should succeed");

    assert_eq!(
        serde_json::to_value(&next).expect("seed must serialize"),
        json!({
            "overhead": 0.8,
            "positions": ["A", "B"],
            "prerogative": 0.5,
            "wages": 0.5,
        })
    );

    // The stored node still carries the old seed: generations are
    // superseded, not mutated.
    let stored = read_node_from_path(&path).expect("node should reload");
    assert_eq!(stored.seed.get("overhead"), Some(&json!(0.5)));
}

#[test]
fn the_successor_seed_starts_the_next_generation_cleanly() {
    let config = ExperimentConfig::default();
    let path = temp_node_path("succession");
    write_first_generation(&path, &config);

    for participant_id in [101u64, 102] {
        allocate_slot_json(&path, &SlotRequest::new(participant_id, config.num_foragers))
            .expect("forager should seat");
    }

    // Pick up the persisted assignments, then close out the raters.
    let mut node = read_node_from_path(&path).expect("node should reload");
    for (trial_id, participant_id) in [(11u64, 101u64), (12, 102)] {
        let mut rater = Trial::new(trial_id, participant_id, TrialRole::Rater);
        rater.finalize(json!(1));
        node.upsert_trial(rater);
    }
    write_node_to_path(&path, &node).expect("node should persist");

    let next_seed = summarize_generation_json(&path, &config.slider_dimensions())
        .expect("summary should succeed");

    // The chain engine births the successor node with the new seed; its
    // assignment table starts empty even though the seed carries forward.
    let successor_path = temp_node_path("successor");
    let successor = NodeState::new(2, next_seed);
    write_node_to_path(&successor_path, &successor).expect("successor should write");

    let fresh = read_node_from_path(&successor_path).expect("successor should reload");
    assert!(fresh
        .assignments()
        .expect("fresh table should read")
        .is_empty());
    assert_eq!(fresh.seed.get("overhead"), Some(&json!(0.8)));

    let seated = allocate_slot_json(&successor_path, &SlotRequest::new(201, config.num_foragers))
        .expect("new generation should seat a new cohort");
    assert_eq!(seated.slot, 0);
}

#[test]
fn a_seeded_config_reproduces_the_resource_field() {
    let config = ExperimentConfig {
        field_seed: Some(42),
        ..ExperimentConfig::default()
    };
    let seed = config.field_seed.expect("seed is set");

    let first = CoinField::generate(&config.field, &mut StdRng::seed_from_u64(seed));
    let second = CoinField::generate(&config.field, &mut StdRng::seed_from_u64(seed));

    assert_eq!(first, second);
    assert_eq!(first.coins.len(), config.field.num_coins);

    // The coordinator's investment bounds what a forager gets to see.
    let visible = first.visible_coins(0.5, &mut StdRng::seed_from_u64(7));
    assert!(visible.len() <= first.coins.len());
}
