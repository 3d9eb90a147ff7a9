//! Idempotence and conflict properties of mutations

use proptest::prelude::*;
use scribe_engine::{EngineError, Mutation};
use scribe_model::name::is_builtin_type;
use scribe_model::{parse_source, print_source, SourceUnit};
use scribe_test_utils::{MODEL_WITH_IMPORTS, PLAIN_CLASS};

fn segment() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,6}".prop_filter("type keyword", |s| !is_builtin_type(s))
}

fn fqn() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 2..4)
        .prop_map(|parts| parts.join("\\"))
        .prop_filter("collides with the fixture class", |name| {
            !name.rsplit('\\').next().is_some_and(|short| short.eq_ignore_ascii_case("Post"))
        })
}

fn unit(source: &str) -> SourceUnit {
    parse_source(source).expect("fixture parses")
}

proptest! {
    #[test]
    fn import_twice_equals_once(name in fqn()) {
        let mut once = unit(PLAIN_CLASS);
        let mutation = Mutation::import(&name);
        mutation.apply(&mut once).expect("first import");
        let after_once = print_source(&once);

        prop_assert_eq!(mutation.apply(&mut once).expect("second import"), 0);
        prop_assert_eq!(print_source(&once), after_once);
    }

    #[test]
    fn capability_twice_equals_once(name in fqn()) {
        let mut target = unit(PLAIN_CLASS);
        let mutation = Mutation::capability(&name);
        mutation.apply(&mut target).expect("first use");
        let after_once = print_source(&target);

        mutation.apply(&mut target).expect("second use");
        prop_assert_eq!(print_source(&target), after_once);
    }

    #[test]
    fn conflicting_import_never_edits(prefix in segment()) {
        let mut target = unit(MODEL_WITH_IMPORTS);
        let before = target.clone();
        let name = format!("{prefix}\\Bar");
        let result = Mutation::import(&name).apply(&mut target);

        if prefix == "Baz" {
            prop_assert!(result.is_ok());
        } else {
            let is_ambiguous = matches!(result, Err(EngineError::AmbiguousImport { .. }));
            prop_assert!(is_ambiguous);
        }
        prop_assert_eq!(target, before);
    }
}

#[test]
fn base_type_then_other_base() {
    let mut target = unit(PLAIN_CLASS);
    Mutation::base_type("Vendor\\A").apply(&mut target).expect("first");
    let after = print_source(&target);

    assert_eq!(Mutation::base_type("Vendor\\A").apply(&mut target).expect("same"), 0);
    assert!(matches!(
        Mutation::base_type("Vendor\\B").apply(&mut target),
        Err(EngineError::MultipleInheritance { .. })
    ));
    assert_eq!(print_source(&target), after);
}

#[test]
fn mutated_output_is_a_fixed_point() {
    let mut target = unit(MODEL_WITH_IMPORTS);
    for mutation in [
        Mutation::capability("Illuminate\\Database\\Eloquent\\SoftDeletes"),
        Mutation::implement("\\JsonSerializable"),
        Mutation::StrictTypes(true),
        Mutation::Doc("@property int $id".into()),
    ] {
        mutation.apply(&mut target).expect("apply");
    }

    let first = print_source(&target);
    let second = print_source(&parse_source(&first).expect("reparse"));
    assert_eq!(first, second);
}
