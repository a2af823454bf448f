//! Catalog and flag materialization properties.
//!
//! These tests check the guarantees the command line layer relies on:
//! unique names, stable order, exact length and no leaking of internal
//! variables, both for the built-in catalog and for generated ones.

use std::collections::HashSet;

use chartmuseum_config::{
    build_flag_set, Catalog, ConfigVariable, DefinitionError, ExternalBinding, FlagKind, Value,
    VariableType,
};
use proptest::prelude::*;

fn assert_unique_names(catalog: &Catalog) {
    let flags = build_flag_set(catalog).unwrap();

    let mut names = HashSet::new();
    let mut envs = HashSet::new();
    let mut shorts = HashSet::new();
    for flag in &flags {
        assert!(names.insert(flag.name.clone()), "duplicate flag --{}", flag.name);
        assert!(envs.insert(flag.env_var.clone()), "duplicate env {}", flag.env_var);
        if let Some(short) = flag.short {
            assert!(shorts.insert(short), "duplicate short -{short}");
        }
    }
}

#[test]
fn standard_defaults_are_well_typed() {
    let catalog = Catalog::standard().unwrap();
    for var in catalog.all() {
        assert_eq!(var.default_value().var_type(), var.var_type(), "{}", var.key());
    }
}

#[test]
fn standard_names_are_unique() {
    assert_unique_names(&Catalog::standard().unwrap());
}

#[test]
fn standard_flag_set_shape() {
    let catalog = Catalog::standard().unwrap();
    let flags = build_flag_set(&catalog).unwrap();

    assert_eq!(flags.len(), 1 + catalog.bound().count());
    assert_eq!(flags.config_flag().name, "config");

    let port = flags.get("port").unwrap();
    assert_eq!(port.env_var, "PORT");
    assert_eq!(port.kind, FlagKind::Int);
    assert_eq!(port.default, Some(Value::Int(8080)));

    let rootdir = flags.get("storage-local-rootdir").unwrap();
    assert_eq!(rootdir.key.as_deref(), Some("storage.local.rootdir"));
    assert_eq!(rootdir.kind, FlagKind::String);
}

#[test]
fn standard_flag_set_is_deterministic() {
    let first = build_flag_set(&Catalog::standard().unwrap()).unwrap();
    let second = build_flag_set(&Catalog::standard().unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn lookup_scenarios() {
    let catalog = Catalog::standard().unwrap();

    let bucket = catalog.lookup("storage.amazon.bucket").unwrap();
    assert_eq!(bucket.var_type(), VariableType::String);
    assert_eq!(bucket.default_value(), &Value::from(""));
    assert_eq!(bucket.binding().unwrap().env_var(), "STORAGE_AMAZON_BUCKET");

    assert!(catalog.lookup("nonexistent.key").is_none());
}

#[test]
fn redefining_port_fails_with_duplicate_key() {
    let mut catalog = Catalog::standard().unwrap();
    let err = catalog
        .define(
            ConfigVariable::int("port", 9090)
                .with_binding(ExternalBinding::new("--other-port", "OTHER_PORT", "")),
        )
        .unwrap_err();
    assert_eq!(
        err,
        DefinitionError::DuplicateKey {
            key: "port".to_string()
        }
    );
    assert!(err.to_string().contains("port"));
}

#[derive(Debug, Clone)]
struct Def {
    key: String,
    default: Value,
    binding: Option<(String, String)>,
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-z]{0,6}".prop_map(Value::String),
        any::<i64>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
    ]
}

// Small alphabets so collisions actually happen
fn def_strategy() -> impl Strategy<Value = Def> {
    (
        "[a-d]{1,2}(\\.[a-d]{1,2})?",
        value_strategy(),
        proptest::option::of(("[a-d]{1,2}", "[A-D]{1,2}")),
    )
        .prop_map(|(key, default, binding)| Def {
            key,
            default,
            binding,
        })
}

fn define_all(defs: &[Def]) -> (Catalog, Vec<Def>) {
    let mut catalog = Catalog::new();
    let mut accepted = Vec::new();
    for def in defs {
        let mut var = ConfigVariable::new(def.key.clone(), def.default.clone());
        if let Some((flag, env)) = &def.binding {
            var = var.with_binding(ExternalBinding::new(flag.clone(), env.clone(), "generated"));
        }
        if catalog.define(var).is_ok() {
            accepted.push(def.clone());
        }
    }
    (catalog, accepted)
}

proptest! {
    #[test]
    fn generated_catalogs_materialize_consistently(
        defs in proptest::collection::vec(def_strategy(), 0..24),
    ) {
        let (catalog, accepted) = define_all(&defs);
        prop_assert_eq!(catalog.len(), accepted.len());

        let flags = build_flag_set(&catalog).unwrap();
        let bound: Vec<_> = accepted.iter().filter(|d| d.binding.is_some()).collect();
        prop_assert_eq!(flags.len(), 1 + bound.len());

        // Catalog order is preserved after the config option
        let flag_keys: Vec<_> = flags.variables().filter_map(|f| f.key.clone()).collect();
        let bound_keys: Vec<_> = bound.iter().map(|d| d.key.clone()).collect();
        prop_assert_eq!(flag_keys, bound_keys);

        // Internal-only variables never leak
        for def in accepted.iter().filter(|d| d.binding.is_none()) {
            prop_assert!(flags.iter().all(|f| f.key.as_deref() != Some(def.key.as_str())));
        }

        prop_assert_eq!(&flags, &build_flag_set(&catalog).unwrap());
        assert_unique_names(&catalog);
        flags.command("generated").version("0.0.0").debug_assert();
    }

    #[test]
    fn mismatched_type_tags_rejected(default in value_strategy()) {
        for ty in [VariableType::String, VariableType::Int, VariableType::Bool] {
            let mut catalog = Catalog::new();
            let result = catalog.define_typed("generated", ty, default.clone(), None);
            prop_assert_eq!(result.is_ok(), ty == default.var_type());
        }
    }
}
