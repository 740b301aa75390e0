use clap::Parser;
use dockertimes::cache::CacheStore;
use dockertimes::cli::Cli;
use dockertimes::config::ConfigError;
use dockertimes::driver::RunError;
use dockertimes::error::ExitCode;
use dockertimes::reconcile::ReconcileError;
use dockertimes::run_app;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Parse CLI args with an empty project config so the working directory's
/// `dockertimes.toml` (if any) does not leak into the test.
fn cli(config_dir: &Path, args: &[&str]) -> Cli {
    let config = config_dir.join("empty.toml");
    fs::write(&config, "").unwrap();
    let config = config.to_string_lossy().into_owned();

    let mut argv = vec!["dockertimes", "-q", "--config", config.as_str()];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

#[test]
fn test_run_app_creates_cache_under_cwd() {
    let dir = tempdir().unwrap();
    let subtest = dir.path().join("subtest");
    fs::create_dir_all(subtest.join("dist")).unwrap();
    fs::write(subtest.join("dist/testfile.txt"), "hello").unwrap();

    let cache = subtest.join(".dockertimes");
    let cwd = subtest.to_string_lossy().into_owned();
    let cache_arg = cache.to_string_lossy().into_owned();

    let code = run_app(cli(
        dir.path(),
        &["--cache", &cache_arg, "--cwd", &cwd, "dist/**"],
    ))
    .unwrap();
    assert_eq!(code, ExitCode::Success);

    let store = CacheStore::load_or_default(&cache);
    let key = subtest.join("dist/testfile.txt");
    assert!(store.get(&key.to_string_lossy()).is_some());
    assert!(store.get(&subtest.join("dist").to_string_lossy()).is_some());
}

#[test]
fn test_run_app_missing_literal_path_fails() {
    let dir = tempdir().unwrap();
    let cwd = dir.path().to_string_lossy().into_owned();
    let cache = dir.path().join("cache.json");
    let cache_arg = cache.to_string_lossy().into_owned();

    let err = run_app(cli(
        dir.path(),
        &["--cache", &cache_arg, "--cwd", &cwd, "not-there.txt"],
    ))
    .unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    let run_err = err.downcast_ref::<RunError>().unwrap();
    assert!(matches!(
        run_err,
        RunError::Reconcile {
            source: ReconcileError::Stat { .. },
            ..
        }
    ));
    assert!(!cache.exists());
}

#[test]
fn test_run_app_without_files_is_config_error() {
    let dir = tempdir().unwrap();
    let err = run_app(cli(dir.path(), &[])).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::NoFiles)
    ));
    assert_eq!(ExitCode::for_error(&err), ExitCode::ConfigError);
}

#[test]
fn test_run_app_named_target_from_config_file() {
    let dir = tempdir().unwrap();
    let build = dir.path().join("build");
    fs::create_dir_all(build.join("dist")).unwrap();
    fs::write(build.join("dist/app.js"), "1").unwrap();

    let cache = dir.path().join("times.json");
    let config = dir.path().join("dockertimes.toml");
    fs::write(
        &config,
        format!(
            "files = [\"unused/**\"]\n\n[targets.build]\nfiles = [\"dist/*.js\"]\ncwd = {:?}\ncache = {:?}\n",
            build.to_string_lossy(),
            cache.to_string_lossy()
        ),
    )
    .unwrap();

    let config_arg = config.to_string_lossy().into_owned();
    let cli = Cli::try_parse_from([
        "dockertimes",
        "-q",
        "--config",
        &config_arg,
        "--target",
        "build",
    ])
    .unwrap();
    assert_eq!(run_app(cli).unwrap(), ExitCode::Success);

    let store = CacheStore::load_or_default(&cache);
    assert_eq!(store.len(), 1);
    assert!(store
        .get(&build.join("dist/app.js").to_string_lossy())
        .is_some());
}

#[test]
fn test_run_app_unknown_target() {
    let dir = tempdir().unwrap();
    let err = run_app(cli(dir.path(), &["--target", "nope", "dist/**"])).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::UnknownTarget { .. })
    ));
}

#[test]
fn test_run_app_missing_config_file() {
    let cli = Cli::try_parse_from([
        "dockertimes",
        "-q",
        "--config",
        "/definitely/not/here/dockertimes.toml",
        "dist/**",
    ])
    .unwrap();

    let err = run_app(cli).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::ConfigError);
}

#[test]
fn test_run_app_print_config_does_not_run() {
    let dir = tempdir().unwrap();
    let cache = dir.path().join("cache.json");
    let cache_arg = cache.to_string_lossy().into_owned();

    let code = run_app(cli(
        dir.path(),
        &["--print-config", "--cache", &cache_arg, "missing/**"],
    ))
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(!cache.exists());
}
