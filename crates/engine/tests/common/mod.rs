#![allow(dead_code)]

use laminar_engine::{Args, Context, Hook, Hooks, Outcome, Param, Particle, ParticleRegistry, Signature};
use serde_json::json;

/// Flow instance with the two guards the scenarios branch on.
pub struct ScenarioFlow;

impl ScenarioFlow {
    pub fn true_condition(&self, _ctx: &Context) -> bool {
        true
    }

    pub fn false_condition(&self, _ctx: &Context) -> bool {
        false
    }
}

fn record_args(ctx: &mut Context, args: &Args) {
    let received: Vec<&str> = args.iter().map(|(key, _)| key).collect();
    ctx.insert("received", json!(received));
}

#[derive(Default)]
pub struct WithNoArgs;

impl Particle for WithNoArgs {}

#[derive(Default)]
pub struct WithKeywordArgs;

impl Particle for WithKeywordArgs {
    fn signature() -> Signature {
        Signature::params([Param::required("x"), Param::required("y")])
    }

    fn call(&self, ctx: &mut Context, args: Args) -> anyhow::Result<Outcome> {
        record_args(ctx, &args);
        Ok(Outcome::Continue)
    }
}

#[derive(Default)]
pub struct WithOptionalArgs;

impl Particle for WithOptionalArgs {
    fn signature() -> Signature {
        Signature::params([Param::required("x"), Param::optional("y")])
    }

    fn call(&self, ctx: &mut Context, args: Args) -> anyhow::Result<Outcome> {
        record_args(ctx, &args);
        let y: i64 = args.get_as("y").unwrap_or(2);
        ctx.insert("y_used", y);
        Ok(Outcome::Continue)
    }
}

#[derive(Default)]
pub struct BeforeSoftHalts;

impl Particle for BeforeSoftHalts {
    fn hooks() -> Hooks<Self> {
        Hooks::new()
            .before(Hook::inline(|ctx| {
                ctx.halt([("message", "soft halted")]);
                Ok(Outcome::Continue)
            }))
            .after(Hook::inline(|ctx| {
                ctx.insert("after_cb_not_skipped", true);
                Ok(Outcome::Continue)
            }))
    }

    fn call(&self, ctx: &mut Context, _args: Args) -> anyhow::Result<Outcome> {
        ctx.insert("particle_not_skipped", true);
        Ok(Outcome::Continue)
    }
}

#[derive(Default)]
pub struct SoftHalts;

impl Particle for SoftHalts {
    fn hooks() -> Hooks<Self> {
        Hooks::new().after(Hook::inline(|ctx| {
            ctx.insert("after_cb_not_skipped", true);
            Ok(Outcome::Continue)
        }))
    }

    fn call(&self, ctx: &mut Context, _args: Args) -> anyhow::Result<Outcome> {
        ctx.halt([("message", "soft halted")]);
        ctx.insert("work_finished", true);
        Ok(Outcome::Continue)
    }
}

#[derive(Default)]
pub struct Halts;

impl Particle for Halts {
    fn call(&self, ctx: &mut Context, _args: Args) -> anyhow::Result<Outcome> {
        Ok(ctx.halt_signaling([("message", "halted")]))
    }
}

#[derive(Default)]
pub struct Fails;

impl Particle for Fails {
    fn call(&self, ctx: &mut Context, _args: Args) -> anyhow::Result<Outcome> {
        Ok(ctx.fail([("message", "failed")]))
    }
}

/// Fails the context but reports `Continue`.
#[derive(Default)]
pub struct FailsQuietly;

impl Particle for FailsQuietly {
    fn call(&self, ctx: &mut Context, _args: Args) -> anyhow::Result<Outcome> {
        let _ = ctx.fail([("message", "failed")]);
        Ok(Outcome::Continue)
    }
}

#[derive(Default)]
pub struct ShouldSkip;

impl Particle for ShouldSkip {
    fn call(&self, ctx: &mut Context, _args: Args) -> anyhow::Result<Outcome> {
        ctx.insert("no_skip", true);
        Ok(Outcome::Continue)
    }
}

#[derive(Default)]
pub struct BranchTarget;

impl Particle for BranchTarget {
    fn call(&self, ctx: &mut Context, _args: Args) -> anyhow::Result<Outcome> {
        ctx.insert("target", true);
        Ok(Outcome::Continue)
    }
}

#[derive(Default)]
pub struct Explodes;

impl Particle for Explodes {
    fn call(&self, _ctx: &mut Context, _args: Args) -> anyhow::Result<Outcome> {
        anyhow::bail!("particle exploded")
    }
}

/// Registry holding every mock under the `MockParticle::` namespace.
pub fn mock_registry() -> ParticleRegistry {
    let mut registry = ParticleRegistry::new();
    registry
        .register_as::<WithNoArgs>("MockParticle::WithNoArgs")
        .and_then(|r| r.register_as::<WithKeywordArgs>("MockParticle::WithKeywordArgs"))
        .and_then(|r| r.register_as::<WithOptionalArgs>("MockParticle::WithOptionalArgs"))
        .and_then(|r| r.register_as::<BeforeSoftHalts>("MockParticle::BeforeSoftHalts"))
        .and_then(|r| r.register_as::<SoftHalts>("MockParticle::SoftHalts"))
        .and_then(|r| r.register_as::<Halts>("MockParticle::Halts"))
        .and_then(|r| r.register_as::<Fails>("MockParticle::Fails"))
        .and_then(|r| r.register_as::<FailsQuietly>("MockParticle::FailsQuietly"))
        .and_then(|r| r.register_as::<ShouldSkip>("MockParticle::ShouldSkip"))
        .and_then(|r| r.register_as::<BranchTarget>("MockParticle::BranchTarget"))
        .and_then(|r| r.register_as::<Explodes>("MockParticle::Explodes"))
        .expect("mock particles register once");
    registry
}
