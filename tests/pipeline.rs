use std::fs;
use std::path::Path;

use lt_analysis::{
    ingest, process_dataset, Channel, DatasetSource, IngestOptions, LoadError,
    ResistivityCalculator, Settings,
};
use proptest::prelude::*;
use tempfile::TempDir;

/// Build a record document with every raw channel sharing `(meas, levels)`.
fn record_xml(meas: usize, levels: usize, grids: &[(Channel, Vec<f64>)]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<LT>\n  <ID>test</ID>\n");
    for (channel, values) in grids {
        let body = values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        xml.push_str(&format!(
            "  <{tag} size=\"{meas} {levels}\">{body}</{tag}>\n",
            tag = channel.name()
        ));
    }
    xml.push_str("  <HePressure_mbar>1000</HePressure_mbar>\n</LT>\n");
    xml
}

fn write_dataset(dir: &Path, name: &str, xml: &str) -> DatasetSource {
    let source = DatasetSource::locate(dir, name, "xml");
    fs::write(&source.path, xml).unwrap();
    source
}

fn two_by_two(level: [f64; 4]) -> String {
    record_xml(
        2,
        2,
        &[
            (Channel::LevelMm, level.to_vec()),
            (Channel::VoltageV, vec![1.0, 1.0, 2.0, 2.0]),
            (Channel::KeithleyTimeStamp, vec![100.0, 101.0, 102.0, 103.0]),
            (Channel::CurrentA, vec![0.1, 0.1, 0.1, 0.1]),
            (Channel::ResistanceOhm, vec![10.0, 10.0, 20.0, 20.0]),
        ],
    )
}

#[test]
fn level_one_below_threshold_is_finite() {
    let dir = TempDir::new().unwrap();
    let source = write_dataset(dir.path(), "LT01", &two_by_two([0.0, 0.0, 399.0, 399.0]));
    let calc = ResistivityCalculator::new(400.0).unwrap();

    let (set, report) = process_dataset(&source, &IngestOptions::default(), &calc).unwrap();
    let rho = set.resistivity().unwrap();
    assert_eq!(rho[[0, 0]], 0.025);
    assert_eq!(rho[[0, 1]], 0.025);
    assert_eq!(rho[[1, 0]], 20.0);
    assert_eq!(rho[[1, 1]], 20.0);
    assert_eq!(report.undefined, 0);
}

#[test]
fn level_at_threshold_is_undefined() {
    let dir = TempDir::new().unwrap();
    let source = write_dataset(dir.path(), "LT30", &two_by_two([0.0, 0.0, 400.0, 400.0]));
    let calc = ResistivityCalculator::new(400.0).unwrap();

    let (set, report) = process_dataset(&source, &IngestOptions::default(), &calc).unwrap();
    let rho = set.resistivity().unwrap();
    assert_eq!(rho[[0, 0]], 0.025);
    assert_eq!(rho[[0, 1]], 0.025);
    assert!(rho[[1, 0]].is_nan());
    assert!(rho[[1, 1]].is_nan());
    assert!(rho.iter().all(|v| !v.is_infinite()));
    assert_eq!(report.undefined, 2);
    assert_eq!(report.total, 4);
}

#[test]
fn loaded_set_carries_metadata_and_rebased_time() {
    let dir = TempDir::new().unwrap();
    let source = write_dataset(dir.path(), "LT02", &two_by_two([0.0, 1.0, 2.0, 3.0]));

    let set = ingest(&source, &IngestOptions::default()).unwrap();
    assert_eq!(set.name(), "LT02");
    assert_eq!(set.source(), source.path.as_path());
    assert_eq!(set.level_count(), 2);
    assert_eq!(set.meas_count(), 2);

    let time = set.channel(Channel::KeithleyTimeStamp).unwrap();
    assert_eq!(time[[0, 0]], 0.0);
    assert_eq!(time.iter().copied().collect::<Vec<_>>(), vec![0.0, 1.0, 2.0, 3.0]);
    assert_eq!(set.time_span(), Some(3.0));
}

#[test]
fn single_integer_size_descriptor_is_rejected() {
    let dir = TempDir::new().unwrap();
    let xml = two_by_two([0.0; 4]).replacen("size=\"2 2\"", "size=\"5\"", 1);
    let source = write_dataset(dir.path(), "LT03", &xml);

    let err = ingest(&source, &IngestOptions::default()).unwrap_err();
    assert!(matches!(err, LoadError::InputFormat { .. }), "{err}");
}

#[test]
fn missing_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let source = DatasetSource::locate(dir.path(), "nope", "xml");
    let err = ingest(&source, &IngestOptions::default()).unwrap_err();
    assert!(matches!(err, LoadError::InputFormat { .. }));
}

#[test]
fn settings_drive_a_decimated_run() {
    let dir = TempDir::new().unwrap();
    let meas = 8;
    let levels = 3;
    let n = meas * levels;
    let ramp: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let xml = record_xml(
        meas,
        levels,
        &Channel::RAW.map(|c| (c, ramp.clone())),
    );
    write_dataset(dir.path(), "LT04", &xml);

    let settings = Settings::from_json(&format!(
        r#"{{ "data_dir": {:?}, "data_files": ["LT04"], "decimation_passes": 2 }}"#,
        dir.path().to_str().unwrap()
    ))
    .unwrap();
    settings.validate().unwrap();

    let source = &settings.sources()[0];
    let calc = settings.calculator().unwrap();
    let (set, _) = process_dataset(source, &settings.ingest_options(), &calc).unwrap();

    assert_eq!(set.shape(), (3, 2));
    // Row 0 after two passes keeps columns 3 and 7.
    let level = set.channel(Channel::LevelMm).unwrap();
    assert_eq!(level[[0, 0]], 3.0);
    assert_eq!(level[[0, 1]], 7.0);
    assert_eq!(level[[2, 1]], 23.0);
    let time = set.channel(Channel::KeithleyTimeStamp).unwrap();
    assert_eq!(time[[0, 0]], 0.0);
    assert_eq!(time[[2, 1]], 20.0);
}

#[test]
fn reloading_yields_identical_sets() {
    let dir = TempDir::new().unwrap();
    let source = write_dataset(dir.path(), "LT05", &two_by_two([0.1, 0.2, 0.3, 0.4]));
    let a = ingest(&source, &IngestOptions::default()).unwrap();
    let b = ingest(&source, &IngestOptions::default()).unwrap();
    assert_eq!(a, b);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_channel_has_the_declared_shape(
        (meas, levels, values) in (1usize..9, 1usize..9).prop_flat_map(|(m, l)| {
            (Just(m), Just(l), prop::collection::vec(0.0f64..500.0, m * l))
        }),
    ) {
        let dir = TempDir::new().unwrap();
        let xml = record_xml(meas, levels, &Channel::RAW.map(|c| (c, values.clone())));
        let source = write_dataset(dir.path(), "LTP", &xml);
        let calc = ResistivityCalculator::new(400.0).unwrap();

        let (set, report) = process_dataset(&source, &IngestOptions::default(), &calc).unwrap();
        prop_assert_eq!(set.shape(), (levels, meas));
        prop_assert_eq!(set.channels().count(), Channel::RAW.len() + 1);
        for (_, grid) in set.channels() {
            prop_assert_eq!(grid.dim(), (levels, meas));
        }
        prop_assert_eq!(set.channel(Channel::KeithleyTimeStamp).unwrap()[[0, 0]], 0.0);
        let expected_undefined = values.iter().filter(|&&v| v >= 400.0).count();
        prop_assert_eq!(report.undefined, expected_undefined);
    }
}
