//! Property tests for shuffling, deck expansion and zone movement.

use proptest::prelude::*;

use deck_playtest::cards::{CardInstance, CardRecord, CardRegistry};
use deck_playtest::core::{GameRng, GameRules};
use deck_playtest::deck::Deck;
use deck_playtest::game::{expand_deck, shuffle, GameSession};
use deck_playtest::zones::{Zone, ZoneManager};

fn zone_strategy() -> impl Strategy<Value = Zone> {
    prop::sample::select(Zone::ALL.to_vec())
}

proptest! {
    /// Shuffling returns the same multiset in some order.
    #[test]
    fn shuffle_is_permutation(items in prop::collection::vec(0u32..50, 0..80), seed in any::<u64>()) {
        let mut rng = GameRng::new(seed);
        let mut shuffled = shuffle(&items, &mut rng);

        prop_assert_eq!(shuffled.len(), items.len());
        let mut expected = items.clone();
        expected.sort_unstable();
        shuffled.sort_unstable();
        prop_assert_eq!(shuffled, expected);
    }

    /// The same seed always gives the same order.
    #[test]
    fn shuffle_is_seeded(len in 0usize..60, seed in any::<u64>()) {
        let items: Vec<usize> = (0..len).collect();
        let a = shuffle(&items, &mut GameRng::new(seed));
        let b = shuffle(&items, &mut GameRng::new(seed));
        prop_assert_eq!(a, b);
    }

    /// Expansion yields one uniquely named instance per copy.
    #[test]
    fn expansion_counts_copies(quantities in prop::collection::vec(1u32..10, 1..8)) {
        let records: Vec<CardRecord> = (0..quantities.len())
            .map(|i| CardRecord::new(format!("card-{i}"), "C", "Creature"))
            .collect();
        let lookup = CardRegistry::from_records(records);
        let deck = Deck::from_counts(
            "d",
            "D",
            quantities.iter().enumerate().map(|(i, q)| (format!("card-{i}"), *q)),
        );

        let instances = expand_deck(&deck.cards, &lookup);

        prop_assert_eq!(instances.len() as u32, quantities.iter().sum::<u32>());
        let mut ids: Vec<_> = instances.iter().map(|c| c.instance_id.clone()).collect();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), instances.len());
    }

    /// However cards are moved, each sits in exactly one zone.
    #[test]
    fn moves_keep_zones_exclusive(
        moves in prop::collection::vec((0usize..20, zone_strategy(), zone_strategy()), 0..100),
    ) {
        let mut zones = ZoneManager::new();
        let instances: Vec<CardInstance> = (0..20u32)
            .map(|i| CardInstance::new(format!("card-{}", i % 5).into(), i / 5))
            .collect();
        let ids: Vec<_> = instances.iter().map(|c| c.instance_id.clone()).collect();
        for card in instances {
            zones.add(card, Zone::Library, None);
        }

        for (card, from, to) in moves {
            let id = &ids[card];
            let was_in = zones.zone_of(id);
            let moved = zones.move_card(id, from, to, None);

            prop_assert_eq!(moved, was_in == Some(from));
            prop_assert!(zones.is_consistent());
            prop_assert_eq!(zones.total_cards(), 20);
        }
    }

    /// Session-level moves and draws never lose or duplicate a card.
    #[test]
    fn session_moves_conserve_cards(
        seed in any::<u64>(),
        moves in prop::collection::vec((0usize..40, zone_strategy()), 0..60),
    ) {
        let lookup = CardRegistry::from_records([
            CardRecord::new("legend", "Legend", "Legendary Creature — Elf"),
            CardRecord::new("forest", "Forest", "Basic Land — Forest"),
        ]);
        let deck = Deck::from_counts("d", "D", [("legend", 1), ("forest", 39)]);
        let mut session = GameSession::setup(&deck.cards, &lookup, GameRules::default(), GameRng::new(seed));

        for (pick, to) in moves {
            session.draw_card();
            let all: Vec<_> = Zone::ALL
                .iter()
                .flat_map(|&zone| session.zones().ids(zone))
                .collect();
            let id = &all[pick % all.len()];
            if let Some(from) = session.find_zone_of(id) {
                session.move_card(id, from, to);
            }
            prop_assert!(session.zones().is_consistent());
            prop_assert_eq!(session.zones().total_cards(), 40);
        }
    }
}
