use clap::Parser;
use dockertimes::cli::Cli;
use dockertimes::config::{Config, ConfigError, ENV_PREFIX};
use dockertimes::driver::DEFAULT_JOBS;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config = Config::from_figment(&figment).unwrap();
    assert!(config.files.is_empty());
    assert_eq!(config.jobs, DEFAULT_JOBS);
}

#[test]
fn test_config_load_from_env() {
    // Only keys that cannot change the outcome of concurrently running tests
    std::env::set_var("DOCKERTIMES_JOBS", "3");
    std::env::set_var("DOCKERTIMES_TARGETS__CI__CWD", "build/ci");

    let figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));
    let config = Config::from_figment(&figment).unwrap();

    assert_eq!(config.jobs, 3);
    let ci = config.target(Some("ci")).unwrap();
    assert_eq!(ci.cwd, Some(PathBuf::from("build/ci")));
    assert!(ci.files.is_empty());

    std::env::remove_var("DOCKERTIMES_JOBS");
    std::env::remove_var("DOCKERTIMES_TARGETS__CI__CWD");
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("dockertimes.toml");
    fs::write(
        &config_path,
        r#"
files = ["dist/**"]
cache = ".cache/times.json"
jobs = 8

[targets.subtest]
cache = "tmp/subtest/.dockertimes"
cwd = "tmp/subtest"
files = ["dist/**", "static/*.css"]
"#,
    )
    .unwrap();

    let config = Config::load(Some(&config_path)).unwrap();
    assert_eq!(config.files, vec!["dist/**"]);
    assert_eq!(config.cache, Some(PathBuf::from(".cache/times.json")));

    let subtest = config.target(Some("subtest")).unwrap();
    assert_eq!(subtest.files.len(), 2);
    assert_eq!(subtest.cwd, Some(PathBuf::from("tmp/subtest")));
}

#[test]
fn test_config_cli_jobs_override() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("dockertimes.toml");
    fs::write(&config_path, "files = [\"dist/**\"]\njobs = 8\n").unwrap();

    let cli = Cli::try_parse_from(["dockertimes", "--jobs", "2"]).unwrap();
    let mut config = Config::load(Some(&config_path)).unwrap();
    config.apply_cli(&cli);

    let options = config.run_options(&cli).unwrap();
    assert_eq!(options.jobs, 2);
    assert_eq!(options.files, vec!["dist/**"]);
}

#[test]
fn test_config_invalid_toml_is_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("dockertimes.toml");
    fs::write(&config_path, "files = \"not a list\"").unwrap();

    let result = Config::load(Some(&config_path));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_config_missing_explicit_file() {
    let temp_dir = tempdir().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    let result = Config::load(Some(&missing));
    assert!(matches!(result, Err(ConfigError::NotFound(path)) if path == missing));
}

#[test]
fn test_config_unknown_target_suggests_closest() {
    let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(
        "[targets.release]\nfiles = [\"out/**\"]\n[targets.subtest]\nfiles = [\"dist/**\"]\n",
    ));
    let config = Config::from_figment(&figment).unwrap();

    let err = config.target(Some("relase")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unknown target 'relase', did you mean 'release'?"
    );

    let err = config.target(Some("zzzzzzzzzz")).unwrap_err();
    assert_eq!(err.to_string(), "Unknown target 'zzzzzzzzzz'");
}

#[test]
fn test_config_print_round_trips() {
    let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(
        "files = [\"dist/**\"]\n[targets.subtest]\ncwd = \"tmp/subtest\"\nfiles = [\"dist/**\"]\n",
    ));
    let config = Config::from_figment(&figment).unwrap();

    let rendered = config.to_toml().unwrap();
    assert!(rendered.contains("[targets.subtest]"));

    let reparsed = Config::from_figment(&Figment::from(Toml::string(&rendered))).unwrap();
    assert_eq!(reparsed, config);
}
