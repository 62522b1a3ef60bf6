//! Property tests for the program line store.

use proptest::prelude::*;
use std::collections::BTreeMap;
use tinybasic::mach::{Arena, Config};

fn body_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z0-9 =+]{0,20}").expect("valid regex")
}

fn edits_strategy() -> impl Strategy<Value = Vec<(u16, String)>> {
    prop::collection::vec((1u16..=400, body_strategy()), 0..80)
}

fn listing(arena: &Arena) -> Vec<(u16, Vec<u8>)> {
    arena
        .lines()
        .map(|line| (line.number, line.body.to_vec()))
        .collect()
}

proptest! {
    #[test]
    fn lines_stay_sorted(edits in edits_strategy(), align in any::<bool>()) {
        let mut arena = Arena::new(&Config { arena_size: 8192, align }).unwrap();
        let mut model = BTreeMap::new();
        for (number, body) in &edits {
            arena.insert_or_replace(*number, body.as_bytes()).unwrap();
            if body.is_empty() {
                model.remove(number);
            } else {
                model.insert(*number, body.as_bytes().to_vec());
            }
        }
        let numbers: Vec<u16> = arena.lines().map(|line| line.number).collect();
        prop_assert!(numbers.windows(2).all(|w| w[0] < w[1]));
        let expected: Vec<(u16, Vec<u8>)> = model.into_iter().collect();
        prop_assert_eq!(listing(&arena), expected);
    }

    #[test]
    fn deleted_lines_stay_deleted(edits in edits_strategy(), victim in 1u16..=400) {
        let mut arena = Arena::new(&Config { arena_size: 8192, align: false }).unwrap();
        for (number, body) in &edits {
            arena.insert_or_replace(*number, body.as_bytes()).unwrap();
        }
        arena.delete_line(victim).unwrap();
        prop_assert!(arena.lines().all(|line| line.number != victim));
        prop_assert!(arena.line(victim).is_none());
    }

    #[test]
    fn failed_insert_changes_nothing(edits in edits_strategy()) {
        let mut arena = Arena::new(&Config { arena_size: 512, align: false }).unwrap();
        for (number, body) in &edits {
            let before = listing(&arena);
            if arena.insert_or_replace(*number, body.as_bytes()).is_err() {
                prop_assert_eq!(listing(&arena), before);
            }
        }
    }
}
