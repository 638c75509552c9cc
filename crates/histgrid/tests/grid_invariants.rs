//! Property tests for grid assembly over arbitrary sample sets

use histgrid::core::test_utils::{RecordingSleeper, ScriptedSource};
use histgrid::core::{floor_to_second, is_missing};
use histgrid::{Column, GridAssembler, RetryPolicy, RetryingFetcher, Sample, TimeWindow};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn samples_strategy() -> impl Strategy<Value = Vec<(i64, Option<f64>)>> {
    prop::collection::vec(
        (
            -4_000i64..16_000,
            prop::option::of(-1_000.0f64..1_000.0),
        ),
        0..40,
    )
}

proptest! {
    #[test]
    fn prop_grid_holds_last_value_per_second(
        start in -5_000i64..5_000,
        length in 0i64..10_000,
        raw in samples_strategy(),
    ) {
        let window = TimeWindow::new(start, start + length).unwrap();
        let samples: Vec<Sample> = raw.iter().map(|(t, v)| Sample::new(*t, *v)).collect();
        let source = ScriptedSource::new().respond("T", Ok(samples.clone()));
        let fetcher = RetryingFetcher::new(source, RetryPolicy::bounded(1))
            .with_sleeper(RecordingSleeper::default());

        let grid = GridAssembler::new(&fetcher)
            .build_window_grid(&window, &[Column::new("A", "T")])
            .unwrap();

        let first = floor_to_second(window.start_ms);
        let last = floor_to_second(window.end_ms);
        prop_assert_eq!(grid.len() as i64, last - first + 1);
        prop_assert_eq!(grid.first_second(), Some(first));
        prop_assert_eq!(grid.last_second(), Some(last));

        let mut expected: BTreeMap<i64, f64> = BTreeMap::new();
        for s in &samples {
            let second = floor_to_second(s.timestamp_ms);
            if (first..=last).contains(&second) {
                expected.insert(second, s.value.unwrap_or(f64::NAN));
            }
        }

        for (second, row) in grid.rows() {
            let cell = row[0];
            match expected.get(&second) {
                Some(v) if !v.is_nan() => prop_assert_eq!(cell, *v),
                _ => prop_assert!(is_missing(cell)),
            }
        }
    }

    #[test]
    fn prop_global_seeding_never_clobbers(
        split in 1i64..9,
        raw in samples_strategy(),
    ) {
        let whole = TimeWindow::new(0, 10_000).unwrap();
        let left = TimeWindow::new(0, split * 1_000).unwrap();
        let right = TimeWindow::new(split * 1_000, 10_000).unwrap();
        let samples: Vec<Sample> = raw.iter().map(|(t, v)| Sample::new(*t, *v)).collect();

        let source = ScriptedSource::new().with_series("T", samples);
        let fetcher = RetryingFetcher::new(source, RetryPolicy::bounded(1))
            .with_sleeper(RecordingSleeper::default());
        let assembler = GridAssembler::new(&fetcher);
        let columns = [Column::new("A", "T")];

        let single = assembler.build_window_grid(&whole, &columns).unwrap();
        let mut stitched = histgrid::Grid::new(columns.to_vec());
        assembler.assemble_into(&mut stitched, &left).unwrap();
        assembler.assemble_into(&mut stitched, &right).unwrap();

        prop_assert_eq!(single.len(), stitched.len());
        for ((s1, r1), (s2, r2)) in single.rows().zip(stitched.rows()) {
            prop_assert_eq!(s1, s2);
            prop_assert!(r1[0] == r2[0] || (is_missing(r1[0]) && is_missing(r2[0])));
        }
    }
}
