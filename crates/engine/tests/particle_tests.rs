mod common;

use common::{BeforeSoftHalts, Fails, Halts, SoftHalts, WithKeywordArgs, WithNoArgs, WithOptionalArgs, mock_registry};
use laminar_engine::{Context, FlowError, ParticleType, WorkUnit};
use serde_json::json;

#[test]
fn keyword_particle_receives_only_declared_keys() {
    let unit = ParticleType::<WithKeywordArgs>::with_default("WithKeywordArgs");

    let ctx = unit.invoke_signaling(Context::build([("x", 1), ("y", 2), ("z", 3)])).expect("x and y are present");

    assert_eq!(ctx.get("received"), Some(&json!(["x", "y"])));
    assert_eq!(ctx.get("z"), Some(&json!(3)));
}

#[test]
fn keyword_particle_reports_missing_keys() {
    let unit = ParticleType::<WithKeywordArgs>::with_default("WithKeywordArgs");

    let err = unit.invoke_signaling(Context::build([("x", 1)])).expect_err("y is missing");

    match err {
        FlowError::MissingContext(missing) => {
            assert_eq!(missing.owner, "WithKeywordArgs");
            assert_eq!(missing.keys, vec!["y"]);
        }
        other => panic!("expected missing context, got {other:?}"),
    }
}

#[test]
fn optional_keys_are_passed_only_when_present() {
    let unit = ParticleType::<WithOptionalArgs>::with_default("WithOptionalArgs");

    let all = unit.invoke(Context::build([("x", 1), ("y", 5)])).expect("all present");
    assert_eq!(all.get("received"), Some(&json!(["x", "y"])));
    assert_eq!(all.get("y_used"), Some(&json!(5)));

    let only_required = unit.invoke(Context::build([("x", 1)])).expect("x present");
    assert_eq!(only_required.get("received"), Some(&json!(["x"])));
    assert_eq!(only_required.get("y_used"), Some(&json!(2)));

    assert!(unit.invoke(Context::new()).is_err());
}

#[test]
fn particle_without_arguments_leaves_context_alone() {
    let unit = ParticleType::<WithNoArgs>::with_default("WithNoArgs");
    let input = Context::build([("flatulent", "cow")]);

    let ctx = unit.invoke_signaling(input.clone()).expect("nothing can fail");

    assert_eq!(ctx, input);
}

#[test]
fn halting_particle_is_swallowed_by_invoke_and_raised_by_invoke_signaling() {
    let unit = ParticleType::<Halts>::with_default("Halts");

    let ctx = unit.invoke(Context::new()).expect("invoke swallows the halt");
    assert!(ctx.is_halted());
    assert!(ctx.is_success());

    let err = unit.invoke_signaling(Context::new()).expect_err("halt is signalled");
    let signal = err.as_stop_signal().expect("stop signal");
    assert!(!signal.is_failed());
    assert_eq!(signal.context().get_str("message"), Some("halted"));
}

#[test]
fn failing_particle_carries_its_context_out() {
    let unit = ParticleType::<Fails>::with_default("Fails");

    let err = unit.invoke_signaling(Context::build([("order", 42)])).expect_err("failure is signalled");
    let FlowError::Stopped(signal) = err else {
        panic!("expected a stop signal");
    };
    assert!(signal.is_failed());

    let ctx = signal.into_context();
    assert_eq!(ctx.get("order"), Some(&json!(42)));
    assert_eq!(ctx.get_str("message"), Some("failed"));
}

#[test]
fn soft_halt_in_the_work_function_skips_after_hooks() {
    let unit = ParticleType::<SoftHalts>::with_default("SoftHalts");

    let ctx = unit.invoke_signaling(Context::new()).expect("soft halt is not a signal");

    assert!(ctx.is_halted());
    assert_eq!(ctx.get("work_finished"), Some(&json!(true)));
    assert!(!ctx.contains_key("after_cb_not_skipped"));
}

#[test]
fn soft_halt_in_a_before_hook_skips_the_work_function() {
    let unit = ParticleType::<BeforeSoftHalts>::with_default("BeforeSoftHalts");

    let ctx = unit.invoke(Context::new()).expect("soft halt is not a signal");

    assert_eq!(ctx.get_str("message"), Some("soft halted"));
    assert!(!ctx.contains_key("particle_not_skipped"));
    assert!(!ctx.contains_key("after_cb_not_skipped"));
}

#[test]
fn declared_hooks_are_introspectable() {
    let unit = ParticleType::<BeforeSoftHalts>::with_default("BeforeSoftHalts");

    assert_eq!(unit.hooks().before_hooks().len(), 1);
    assert_eq!(unit.hooks().after_hooks().len(), 1);
    assert_eq!(unit.hooks().before_hooks()[0].name(), "<inline>");
}

#[test]
fn registry_units_report_required_keys() {
    let registry = mock_registry();

    let unit = registry.resolve("mock_particle::with_optional_args").expect("registered");

    assert_eq!(unit.type_name(), "MockParticle::WithOptionalArgs");
    assert_eq!(unit.required_keys(), vec!["x"]);
}
