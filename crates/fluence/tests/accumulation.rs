//! Integration tests for reading and accumulating measurement files

use std::collections::BTreeMap;

use ptools_fluence::{
    compute_fluence, EnergyBand, EnergyBandTable, Error, FluenceAccumulator, FluxFileReader,
    TelescopeRead, TelescopeTotals,
};
use rstest::{fixture, rstest};

#[fixture]
fn table() -> EnergyBandTable {
    EnergyBandTable::from_bounds([
        ("T1", vec![(1.0, 1.9), (1.9, 2.3)]),
        ("T2", vec![(6.5, 12.0)]),
        ("T3", vec![(40.0, 80.0)]),
    ])
    .unwrap()
}

/// Read and absorb every file in order, failing on anything unexpected
fn accumulate(table: &EnergyBandTable, paths: &[&str]) -> BTreeMap<String, TelescopeTotals> {
    let reader = FluxFileReader::new(table);
    let mut accumulator = FluenceAccumulator::new();
    for path in paths {
        let fluxes = reader.read(path).unwrap();
        for sample in fluxes.samples() {
            accumulator.absorb_sample(sample).unwrap();
        }
    }
    accumulator.into_totals()
}

fn values(totals: &BTreeMap<String, TelescopeTotals>) -> BTreeMap<String, Vec<Vec<f64>>> {
    totals
        .iter()
        .map(|(t, v)| (t.clone(), v.values.clone()))
        .collect()
}

#[rstest]
fn two_files_accumulate(table: EnergyBandTable) {
    let totals = accumulate(&table, &["./data/day_a.json", "./data/day_b.json"]);
    assert_eq!(totals["T1"].values, vec![vec![6.0, 8.0], vec![10.0, 12.0]]);
    assert_eq!(totals["T1"].files, 2);
    assert_eq!(totals["T2"].time_steps, 3);
}

#[rstest]
#[case(&["./data/day_b.json", "./data/day_a.json", "./data/missing_t2.json"])]
#[case(&["./data/missing_t2.json", "./data/day_b.json", "./data/day_a.json"])]
#[case(&["./data/day_a.json", "./data/missing_t2.json", "./data/day_b.json"])]
fn accumulation_is_commutative(table: EnergyBandTable, #[case] paths: &[&str]) {
    let reference = accumulate(
        &table,
        &["./data/day_a.json", "./data/day_b.json", "./data/missing_t2.json"],
    );
    let test = accumulate(&table, paths);
    assert_eq!(values(&reference), values(&test));
}

#[rstest]
fn accumulation_is_additive(table: EnergyBandTable) {
    let separate = accumulate(&table, &["./data/day_a.json", "./data/day_b.json"]);
    let combined = accumulate(&table, &["./data/day_ab.json"]);
    assert_eq!(values(&separate), values(&combined));
}

#[rstest]
fn missing_telescope_is_skipped(table: EnergyBandTable) {
    let reader = FluxFileReader::new(&table);
    let fluxes = reader.read("./data/missing_t2.json").unwrap();

    assert_eq!(fluxes.telescopes.len(), 3);
    assert_eq!(fluxes.telescopes[1], TelescopeRead::Absent("T2".to_string()));

    let found: Vec<&str> = fluxes.samples().map(|s| s.telescope.as_str()).collect();
    assert_eq!(found, vec!["T1", "T3"]);
}

#[rstest]
fn zero_size_arrays_do_not_fix_the_shape(table: EnergyBandTable) {
    let reader = FluxFileReader::new(&table);
    let fluxes = reader.read("./data/zero_size.json").unwrap();

    assert_eq!(fluxes.telescopes[0], TelescopeRead::Absent("T1".to_string()));
    assert_eq!(fluxes.telescopes[1], TelescopeRead::Absent("T2".to_string()));

    // a later, well formed file is still absorbed
    let totals = accumulate(&table, &["./data/zero_size.json", "./data/day_a.json"]);
    let expected = accumulate(&table, &["./data/day_a.json"]);
    assert_eq!(values(&totals)["T1"], values(&expected)["T1"]);
    assert_eq!(totals["T3"].files, 2);
}

#[rstest]
fn fill_values_count_as_zero(table: EnergyBandTable) {
    let reader = FluxFileReader::new(&table);
    let fluxes = reader.read("./data/fill_values.json").unwrap();

    let sample = fluxes.samples().next().unwrap();
    assert_eq!(sample.telescope, "T1");
    assert_eq!(sample.values, vec![vec![1.0, 1.0], vec![3.0, 3.0]]);
    assert_eq!(sample.time_steps, 2);
}

#[rstest]
#[case("./data/truncated.json")]
#[case("./data/ragged.json")]
#[case("./data/does_not_exist.json")]
fn unreadable_files_name_the_file(table: EnergyBandTable, #[case] path: &str) {
    let reader = FluxFileReader::new(&table);
    match reader.read(path) {
        Err(Error::UnreadableFile { path: p, reason }) => {
            assert_eq!(p, std::path::Path::new(path));
            assert!(!reason.is_empty());
        }
        other => panic!("expected an unreadable file, found {other:?}"),
    }
}

#[rstest]
fn inconsistent_shape_is_fatal(table: EnergyBandTable) {
    let reader = FluxFileReader::new(&table);
    let mut accumulator = FluenceAccumulator::new();

    for sample in reader.read("./data/day_a.json").unwrap().samples() {
        accumulator.absorb_sample(sample).unwrap();
    }

    let fluxes = reader.read("./data/wrong_shape.json").unwrap();
    let sample = fluxes.samples().next().unwrap();
    assert!(matches!(
        accumulator.absorb_sample(sample),
        Err(Error::ShapeMismatch {
            expected: (2, 2),
            found: (2, 3),
            ..
        })
    ));
}

#[rstest]
fn band_fluence_from_files(table: EnergyBandTable) {
    let totals = accumulate(&table, &["./data/day_a.json", "./data/day_b.json"]);
    let fluence = compute_fluence(&totals, &table, 1.0).unwrap();

    let expected = [
        ((1.0, 1.9), 16.0 * 0.9),
        ((1.9, 2.3), 20.0 * 0.4),
        ((6.5, 12.0), 9.0 * 5.5),
        ((40.0, 80.0), 5.0 * 40.0),
    ];

    assert_eq!(fluence.len(), expected.len());
    for ((low, high), value) in expected {
        let band = EnergyBand::new(low, high).unwrap();
        let found = fluence.get(&band).unwrap();
        assert!((found - value).abs() < 1e-9, "{band}: {found} != {value}");
    }
}
