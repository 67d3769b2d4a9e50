//! Property tests over generated ledgers.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use specimen_ledger_core::{LotBaseline, LotInstance};
use specimen_ledger_replay::codes::format_code;
use specimen_ledger_replay::{BaselineRegistry, ReplayEngine, ReplayInput, ReplayOutput};
use specimen_ledger_testing::properties::{Scenario, arb_scenario, arb_transfer_scenario};
use specimen_ledger_testing::test_clock;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

fn run(scenario: Scenario) -> ReplayOutput {
    let registry = BaselineRegistry::from_baselines(scenario.baselines).unwrap();
    ReplayEngine::default()
        .run(
            ReplayInput::new(registry, scenario.transfers, scenario.disposals),
            Arc::new(test_clock()),
        )
        .unwrap()
}

fn lots_of<'a>(output: &'a ReplayOutput, baseline: &LotBaseline) -> Vec<&'a LotInstance> {
    output.lots.iter().filter(|lot| lot.key == baseline.key).collect()
}

proptest! {
    #[test]
    fn transfers_conserve_quantity_up_to_placeholders(scenario in arb_transfer_scenario()) {
        let baselines = scenario.baselines.clone();
        let output = run(scenario);

        for baseline in &baselines {
            let lots = lots_of(&output, baseline);
            // Every lot after the first was either split off (quantity moved) or
            // conjured (quantity added, first change has no parent).
            let conjured: u64 = lots
                .iter()
                .skip(1)
                .filter_map(|lot| output.changes_for(lot.id).next())
                .filter(|change| change.parent_lot_id.is_none())
                .map(|change| change.quantity.unsigned_abs())
                .sum();
            prop_assert_eq!(
                output.group_quantity(&baseline.key),
                u64::from(baseline.quantity) + conjured
            );
        }
    }

    #[test]
    fn splits_reference_older_lots_of_the_same_group(scenario in arb_scenario()) {
        let output = run(scenario);
        let by_id: HashMap<_, _> = output.lots.iter().map(|lot| (lot.id, lot)).collect();

        for change in output.changes.iter().filter(|c| c.is_split()) {
            let child = by_id[&change.lot_id];
            let parent = by_id[&change.parent_lot_id.unwrap()];
            prop_assert_eq!(&child.key, &parent.key);
            prop_assert!(parent.id < child.id);
            prop_assert!(change.quantity > 0);
        }
    }

    #[test]
    fn codes_are_unique_and_consecutive(scenario in arb_scenario()) {
        let baselines = scenario.baselines.clone();
        let output = run(scenario);

        for baseline in &baselines {
            let codes: Vec<_> = lots_of(&output, baseline)
                .iter()
                .map(|lot| lot.code.clone())
                .collect();
            let seed = u64::from(baseline.key.sub_lot) * 1000;
            let expected: Vec<_> = (0..codes.len() as u64).map(|i| format_code(seed + i)).collect();
            prop_assert_eq!(&codes, &expected);

            let unique: HashSet<_> = codes.iter().collect();
            prop_assert_eq!(unique.len(), codes.len());
        }
    }

    #[test]
    fn output_ignores_cross_date_input_order(scenario in arb_scenario()) {
        let mut shuffled = scenario.clone();
        // Stable, so same-kind same-day events keep their relative order
        shuffled.transfers.sort_by_key(|event| Reverse(event.date));
        shuffled.disposals.sort_by_key(|event| Reverse(event.date));

        prop_assert_eq!(run(scenario), run(shuffled));
    }

    #[test]
    fn every_group_ends_with_at_least_one_lot(scenario in arb_scenario()) {
        let touched: HashSet<_> = scenario
            .transfers
            .iter()
            .map(|event| event.key.clone())
            .chain(scenario.disposals.iter().map(|event| event.key.clone()))
            .collect();
        let baselines = scenario.baselines.clone();
        let output = run(scenario);

        for baseline in &baselines {
            let lots = lots_of(&output, baseline);
            prop_assert!(!lots.is_empty());
            if !touched.contains(&baseline.key) {
                prop_assert_eq!(lots.len(), 1);
                prop_assert_eq!(lots[0].quantity, baseline.quantity);
                prop_assert_eq!(lots[0].location_id, baseline.location_id);
            }
        }
    }

    #[test]
    fn disposals_are_fully_accounted_for(scenario in arb_scenario()) {
        let requested: u64 = scenario.disposals.iter().map(|d| u64::from(d.quantity)).sum();
        let output = run(scenario);

        let drained: u64 = output
            .changes
            .iter()
            .filter(|c| c.to_location_id.is_none())
            .map(|c| c.quantity.unsigned_abs())
            .sum();
        let unresolved: u64 = output
            .report
            .shortfalls
            .iter()
            .map(|s| u64::from(s.unresolved))
            .sum();
        prop_assert_eq!(drained + unresolved, requested);
    }
}
