use std::{fs, path::PathBuf};

use tempfile::tempdir;

use strata_cli::{Args, OutputFormat, run};

/// Collects all .toml files from a directory
fn collect_toml_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("toml")
            })
            .collect()
    } else {
        Vec::new()
    };

    files.sort();
    files
}

/// Demos live at the workspace root, not in the crate
fn demos_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

fn args_for(input: &PathBuf, output: PathBuf, format: OutputFormat) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: output.to_string_lossy().to_string(),
        config: None,
        format,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let demos = collect_toml_files(demos_path());

    assert!(!demos.is_empty(), "No demos found in demos/");

    let mut failed = Vec::new();

    for demo in &demos {
        let output_path = temp_dir
            .path()
            .join(format!("{}.svg", demo.file_stem().unwrap().to_string_lossy()));

        match run(&args_for(demo, output_path.clone(), OutputFormat::Svg)) {
            Ok(()) => {
                let svg = fs::read_to_string(&output_path).unwrap();
                assert!(svg.contains("</svg>"), "{} wrote incomplete SVG", demo.display());
            }
            Err(e) => failed.push((demo.clone(), e)),
        }
    }

    if !failed.is_empty() {
        eprintln!("\nDemos that failed:");
        for (path, err) in &failed {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} demo(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_smoke_test_rows_output() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let demo = demos_path().join("languages.toml");
    let output_path = temp_dir.path().join("rows.toml");

    run(&args_for(&demo, output_path.clone(), OutputFormat::Rows)).unwrap();

    let content = fs::read_to_string(&output_path).unwrap();
    let table: toml::Table = toml::from_str(&content).unwrap();
    let rows = table["rows"].as_table().unwrap();

    assert_eq!(rows.len(), 9);
    // Every id of a `become` chain shares the chain's row
    assert_eq!(rows["old-french"], rows["french"]);
    assert_eq!(rows["old-french"], rows["middle-french"]);
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let error_demos = collect_toml_files(demos_path().join("errors"));

    assert!(!error_demos.is_empty(), "No error demos found in demos/errors/");

    let mut unexpectedly_succeeded = Vec::new();

    for demo in &error_demos {
        let output_path = temp_dir.path().join(format!(
            "error_{}.svg",
            demo.file_stem().unwrap().to_string_lossy()
        ));

        if run(&args_for(demo, output_path, OutputFormat::Svg)).is_ok() {
            unexpectedly_succeeded.push(demo.clone());
        }
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError demos that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error demo(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }
}
