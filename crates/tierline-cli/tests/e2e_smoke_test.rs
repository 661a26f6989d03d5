use std::{fs, path::PathBuf};

use tempfile::tempdir;

use tierline_cli::{Args, CliError, Command, execute, run};

/// Demo inputs live at the workspace root, not in the crate
fn demos_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

/// Collects all .json files from a directory
fn collect_json_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json")
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

fn args(command: Command) -> Args {
    Args {
        command,
        config: None,
        log_level: "off".to_string(),
    }
}

fn path_string(path: &std::path::Path) -> String {
    path.to_string_lossy().to_string()
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let demos = collect_json_files(demos_path());
    assert!(!demos.is_empty(), "No demos found in demos/");

    let mut failed = Vec::new();

    for demo in &demos {
        let output_path = temp_dir
            .path()
            .join(format!("{}.layout.json", demo.file_stem().unwrap().to_string_lossy()));

        let layout = args(Command::Layout {
            input: path_string(demo),
            output: Some(path_string(&output_path)),
        });
        if let Err(e) = run(&layout) {
            failed.push((demo.clone(), e));
            continue;
        }

        // The saved layout must pass its own collision check.
        let check = args(Command::Check {
            input: path_string(demo),
            positions: Some(path_string(&output_path)),
            clearance: None,
        });
        if let Err(e) = execute(&check) {
            failed.push((demo.clone(), e));
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
fn e2e_smoke_test_error_demos() {
    let error_demos = collect_json_files(demos_path().join("errors"));
    assert!(!error_demos.is_empty(), "No error demos found in demos/errors/");

    let mut unexpectedly_succeeded = Vec::new();

    for demo in &error_demos {
        let hash = args(Command::Hash {
            input: path_string(demo),
        });
        match execute(&hash) {
            Err(CliError::Json { .. }) => {}
            other => unexpectedly_succeeded.push((demo.clone(), other.map_err(|e| e.to_string()))),
        }
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError demos that did not fail with a JSON error:");
        for (path, result) in &unexpectedly_succeeded {
            eprintln!("  - {}: {:?}", path.display(), result);
        }
        panic!(
            "{} error demo(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }
}

#[test]
fn e2e_layout_output_is_stable() {
    let demo = path_string(&demos_path().join("substation_ring.json"));
    let layout = args(Command::Layout {
        input: demo,
        output: None,
    });

    let first = execute(&layout).unwrap();
    let second = execute(&layout).unwrap();
    assert_eq!(first, second);

    let json: serde_json::Value = serde_json::from_str(&first).unwrap();
    assert_eq!(json["collisionReport"]["hasCollisions"], false);
    assert_eq!(json["tiers"]["grid"], 0);
    assert_eq!(json["positions"].as_object().unwrap().len(), 13);
}

#[test]
fn e2e_hash_ignores_positions() {
    let temp_dir = tempdir().unwrap();
    let original = demos_path().join("radial_feeder.json");

    let mut symbols: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&original).unwrap()).unwrap();
    for symbol in symbols.as_array_mut().unwrap() {
        symbol["position"] = serde_json::json!({ "x": 777, "y": -40 });
    }
    let moved = temp_dir.path().join("moved.json");
    fs::write(&moved, symbols.to_string()).unwrap();

    let hash_of = |path: &std::path::Path| {
        execute(&args(Command::Hash {
            input: path_string(path),
        }))
        .unwrap()
    };

    let hash = hash_of(&original);
    assert_eq!(hash.len(), 64);
    assert_eq!(hash, hash_of(&moved));
}

#[test]
fn e2e_check_reports_stacked_symbols() {
    let temp_dir = tempdir().unwrap();
    let input = temp_dir.path().join("stacked.json");
    fs::write(
        &input,
        r#"[
            { "id": "load-1", "elementId": "e1", "elementType": "Load", "position": { "x": 100, "y": 100 } },
            { "id": "load-2", "elementId": "e2", "elementType": "Load", "position": { "x": 100, "y": 100 } }
        ]"#,
    )
    .unwrap();

    let check = args(Command::Check {
        input: path_string(&input),
        positions: None,
        clearance: Some(20),
    });
    match execute(&check) {
        Err(CliError::Collisions { count, clearance }) => {
            assert_eq!(count, 1);
            assert_eq!(clearance, 20);
        }
        other => panic!("expected a collision error, got {other:?}"),
    }

    let positions = temp_dir.path().join("positions.json");
    fs::write(
        &positions,
        r#"{ "load-1": { "x": 100, "y": 100 }, "load-2": { "x": 180, "y": 100 } }"#,
    )
    .unwrap();
    let check = args(Command::Check {
        input: path_string(&input),
        positions: Some(path_string(&positions)),
        clearance: Some(20),
    });
    let report: serde_json::Value = serde_json::from_str(&execute(&check).unwrap()).unwrap();
    assert_eq!(report["hasCollisions"], false);
}

#[test]
fn e2e_explicit_config_is_applied() {
    let temp_dir = tempdir().unwrap();
    let config = temp_dir.path().join("config.toml");
    fs::write(&config, "[geometry]\ngrid_size = 25\n").unwrap();

    let layout = Args {
        command: Command::Layout {
            input: path_string(&demos_path().join("radial_feeder.json")),
            output: None,
        },
        config: Some(path_string(&config)),
        log_level: "off".to_string(),
    };
    let json: serde_json::Value = serde_json::from_str(&execute(&layout).unwrap()).unwrap();

    for point in json["positions"].as_object().unwrap().values() {
        assert_eq!(point["x"].as_i64().unwrap() % 25, 0);
        assert_eq!(point["y"].as_i64().unwrap() % 25, 0);
    }
}
