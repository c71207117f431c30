use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use sr1_excess::config::AnalysisConfig;
use sr1_excess::data::synthetic;
use sr1_excess::pipeline::{self, Summary, Variant};

fn config_in(dir: &Path) -> AnalysisConfig {
    AnalysisConfig {
        data_path: dir.join("fig_4.dat"),
        background_path: dir.join("b0.txt"),
        output_path: dir.join("out").join("fig_4.pdf"),
        ..AnalysisConfig::default()
    }
}

fn write_synthetic(dir: &Path, seed: u64) {
    let (spectrum, background) = synthetic::generate(seed);
    synthetic::write_spectrum(&dir.join("fig_4.dat"), &spectrum).unwrap();
    synthetic::write_background(&dir.join("b0.txt"), &background).unwrap();
}

#[test]
fn significance_variant_writes_figure_and_statistic() {
    let dir = tempfile::tempdir().unwrap();
    write_synthetic(dir.path(), 42);
    let cfg = config_in(dir.path());

    let summary = pipeline::run(&cfg, Variant::WithSignificance).unwrap();

    let sig = summary.significance.expect("significance computed");
    assert!(sig.z.is_finite());
    assert!(sig.expected > 0.0);
    assert_eq!(sig.samples_in_window, 6);
    assert_eq!(summary.spectrum_rows, 29);
    assert_eq!(summary.background_points, 31);

    let meta = fs::metadata(&cfg.output_path).unwrap();
    assert!(meta.len() > 0);
}

#[test]
fn figure_only_variant_skips_statistic() {
    let dir = tempfile::tempdir().unwrap();
    write_synthetic(dir.path(), 1);
    let cfg = config_in(dir.path());

    let summary = pipeline::run(&cfg, Variant::FigureOnly).unwrap();

    assert!(summary.significance.is_none());
    assert!(fs::metadata(&cfg.output_path).unwrap().len() > 0);
}

#[test]
fn figure_only_tolerates_short_background() {
    // Interpolation is never attempted without the significance step.
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("fig_4.dat"), "2 10 12 8 0.5\n5 20 22 18 -0.3\n").unwrap();
    fs::write(dir.path().join("b0.txt"), "0 5\n10 5\n").unwrap();
    let cfg = config_in(dir.path());

    assert!(pipeline::run(&cfg, Variant::FigureOnly).is_ok());
    assert!(pipeline::run(&cfg, Variant::WithSignificance).is_err());
}

#[test]
fn worked_example_from_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("fig_4.dat"), "2 10 12 8 0.5\n5 20 22 18 -0.3\n").unwrap();
    fs::write(dir.path().join("b0.txt"), "0 5\n2 5\n4 5\n6 5\n8 5\n").unwrap();
    let cfg = config_in(dir.path());

    let sig = pipeline::run(&cfg, Variant::WithSignificance)
        .unwrap()
        .significance
        .unwrap();

    assert_relative_eq!(sig.observed, 19.5, epsilon = 1e-12);
    assert_relative_eq!(sig.expected, 19.5, epsilon = 1e-9);
    assert!(sig.z.abs() < 1e-9);
}

#[test]
fn identical_inputs_give_identical_results() {
    let dir = tempfile::tempdir().unwrap();
    write_synthetic(dir.path(), 9);
    let cfg = config_in(dir.path());

    let a = pipeline::run(&cfg, Variant::WithSignificance).unwrap();
    let b = pipeline::run(&cfg, Variant::WithSignificance).unwrap();
    assert_eq!(a, b);
}

#[test]
fn background_not_covering_window_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("fig_4.dat"), "2 10 12 8 0.5\n").unwrap();
    fs::write(dir.path().join("b0.txt"), "2 5\n3 5\n4 5\n5 5\n").unwrap();
    let cfg = config_in(dir.path());

    let err = pipeline::run(&cfg, Variant::WithSignificance).unwrap_err();
    assert!(format!("{err:#}").contains("outside the interpolation range"));
    assert!(!cfg.output_path.exists());
}

#[test]
fn malformed_row_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("fig_4.dat"), "2 10 12 8\n").unwrap();
    fs::write(dir.path().join("b0.txt"), "0 5\n2 5\n4 5\n6 5\n8 5\n").unwrap();
    let cfg = config_in(dir.path());

    let err = pipeline::run(&cfg, Variant::FigureOnly).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("fig_4.dat"));
    assert!(msg.contains("expected 5 columns"));
}

#[test]
fn summary_json_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    write_synthetic(dir.path(), 5);
    let cfg = config_in(dir.path());
    let summary = pipeline::run(&cfg, Variant::WithSignificance).unwrap();

    let path = dir.path().join("reports").join("summary.json");
    pipeline::write_summary(&path, &summary).unwrap();

    let back: Summary = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(back.variant, Variant::WithSignificance);
    assert_eq!(back.config, cfg);
    assert_eq!(back.spectrum_rows, summary.spectrum_rows);
}

#[test]
fn default_figure_is_pdf() {
    let dir = tempfile::tempdir().unwrap();
    write_synthetic(dir.path(), 42);
    let cfg = config_in(dir.path());
    pipeline::run(&cfg, Variant::FigureOnly).unwrap();

    let bytes = fs::read(&cfg.output_path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn summary_dir_blocked_by_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_synthetic(dir.path(), 5);
    let cfg = config_in(dir.path());
    let summary = pipeline::run(&cfg, Variant::FigureOnly).unwrap();

    let blocker = dir.path().join("reports");
    fs::write(&blocker, "not a directory").unwrap();
    let err = pipeline::write_summary(&blocker.join("summary.json"), &summary).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("creating"), "{msg}");
    assert!(msg.contains("reports"), "{msg}");
}
