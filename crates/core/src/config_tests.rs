// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;

fn parse_config(text: &str) -> Config {
    let sexp = Sexp::parse(text).unwrap();
    Config::from_sexp(&sexp, Path::new("/proj")).unwrap()
}

// ── Basic keys ───────────────────────────────────────────────────────────────

#[test]
fn reads_basic_keys() {
    let config = parse_config(
        r#"(:name "demo"
           :package "com.example"
           :source-roots ("src/main/scala")
           :compile-jars ("lib/a.jar" "lib/b.jar")
           :target "target/classes")"#,
    );
    assert_eq!(config.name, "demo");
    assert_eq!(config.package, "com.example");
    assert_eq!(config.source_roots, vec![PathBuf::from("src/main/scala")]);
    assert_eq!(
        config.compile_jars,
        vec![PathBuf::from("lib/a.jar"), PathBuf::from("lib/b.jar")]
    );
    assert_eq!(config.target, Some(PathBuf::from("target/classes")));
    assert_eq!(config.root_dir, PathBuf::from("/proj"));
}

#[test]
fn synonyms_resolve() {
    let config = parse_config(r#"(:project-name "demo" :project-package "p" :sources ("s"))"#);
    assert_eq!(config.name, "demo");
    assert_eq!(config.package, "p");
    assert_eq!(config.source_roots, vec![PathBuf::from("s")]);
}

#[test]
fn primary_key_wins_over_synonym() {
    let config = parse_config(r#"(:name "primary" :project-name "synonym")"#);
    assert_eq!(config.name, "primary");
}

#[test]
fn toggles_default_on_and_invert_disables() {
    let config = parse_config("(:name \"x\")");
    assert!(config.index_on_startup);
    assert!(config.source_load_on_startup);
    assert!(config.include_stdlib_jars);

    let config = parse_config(
        "(:disable-index-on-startup t :disable-source-load-on-startup t :disable-scala-jars-on-classpath t)",
    );
    assert!(!config.index_on_startup);
    assert!(!config.source_load_on_startup);
    assert!(!config.include_stdlib_jars);
}

#[test]
fn explicit_root_dir_overrides_default() {
    let config = parse_config(r#"(:root-dir "/elsewhere")"#);
    assert_eq!(config.root_dir, PathBuf::from("/elsewhere"));
}

#[test]
fn formatting_prefs_are_kept_opaque() {
    let config = parse_config(r#"(:formatting-prefs (:indent-spaces 2 :align-params t))"#);
    assert_eq!(
        config.formatting_prefs,
        vec![
            ("indent-spaces".to_string(), Sexp::Int(2)),
            ("align-params".to_string(), Sexp::True),
        ]
    );
}

#[test]
fn rejects_non_plist() {
    let sexp = Sexp::parse("42").unwrap();
    assert!(matches!(
        Config::from_sexp(&sexp, Path::new("/proj")),
        Err(ConfigError::NotAPlist)
    ));
}

// ── Classpath assembly ───────────────────────────────────────────────────────

#[test]
fn index_classpath_concatenates_and_dedupes() {
    let config = parse_config(
        r#"(:compile-deps ("a") :compile-jars ("b") :runtime-deps ("a" "c") :test-deps ("d"))"#,
    );
    assert_eq!(
        config.index_classpath(),
        vec![
            PathBuf::from("a"),
            PathBuf::from("b"),
            PathBuf::from("c"),
            PathBuf::from("d"),
        ]
    );
}

// ── Subproject merging ───────────────────────────────────────────────────────

const MULTI_MODULE: &str = r#"
(:name "parent"
 :package "com.parent"
 :source-roots ("main/src")
 :active-subproject "web"
 :subprojects ((:module-name "web"
                :source-roots ("web/src")
                :version "2.0"
                :depends-on-modules ("db"))
               (:module-name "db"
                :source-roots ("db/src")
                :compile-jars ("db/lib.jar"))))
"#;

#[test]
fn active_subproject_concatenates_lists() {
    let config = parse_config(MULTI_MODULE);
    assert_eq!(
        config.source_roots,
        vec![
            PathBuf::from("main/src"),
            PathBuf::from("web/src"),
            PathBuf::from("db/src"),
        ]
    );
}

#[test]
fn active_subproject_overrides_scalars() {
    let config = parse_config(MULTI_MODULE);
    assert_eq!(config.version, Some("2.0".to_string()));
    assert_eq!(config.module_name, Some("web".to_string()));
    // Scalar untouched by the subproject falls back to the parent.
    assert_eq!(config.name, "parent");
}

#[test]
fn dependent_modules_merge_transitively() {
    let config = parse_config(MULTI_MODULE);
    assert_eq!(config.compile_jars, vec![PathBuf::from("db/lib.jar")]);
}

#[test]
fn unknown_active_subproject_errors() {
    let sexp = Sexp::parse(r#"(:active-subproject "nope" :subprojects ())"#).unwrap();
    assert!(matches!(
        Config::from_sexp(&sexp, Path::new("/proj")),
        Err(ConfigError::UnknownSubproject(name)) if name == "nope"
    ));
}

#[test]
fn no_active_subproject_ignores_subprojects() {
    let config = parse_config(
        r#"(:name "solo" :subprojects ((:module-name "m" :source-roots ("m/src"))))"#,
    );
    assert_eq!(config.name, "solo");
    assert!(config.source_roots.is_empty());
}

// ── Loading from disk ────────────────────────────────────────────────────────

#[test]
fn load_reads_file_and_defaults_root_to_parent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.javelin");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "; project config").unwrap();
    writeln!(file, "(:name \"ondisk\")").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.name, "ondisk");
    assert_eq!(config.root_dir, dir.path());
}

#[test]
fn load_missing_file_is_io_error() {
    assert!(matches!(
        Config::load(Path::new("/nonexistent/project.javelin")),
        Err(ConfigError::Io(_))
    ));
}
