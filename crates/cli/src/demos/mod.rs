//! Demonstration flows shipped with the `laminar` binary.
//!
//! # Flows
//!
//! - `payment`: authorizes and captures a card payment. Fails when the amount
//!   exceeds [`particles::CARD_LIMIT`] or the currency is not USD.
//! - `fulfilment`: validates an order, reserves stock, takes payment through
//!   the nested `payment` flow, then either ships the order or, for digital
//!   orders, delivers a download link, and finally sends a receipt.
//!   Backordered stock parks the order with a soft halt.

pub mod particles;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use indexmap::IndexMap;
use laminar_engine::{
    BranchOptions, Context, Flow, Guard, Hook, HookResult, Outcome, ParticleRegistry, Specification, StepOptions,
    WorkUnit,
};

use particles::{AuthorizeCard, CaptureFunds, DeliverDownload, ReserveStock, SendReceipt, ShipOrder, ValidateOrder};

/// A catalog entry: the runnable flow plus a printable outline.
pub struct DemoFlow {
    name: &'static str,
    summary: &'static str,
    unit: Arc<dyn WorkUnit>,
    outline: Vec<String>,
}

impl DemoFlow {
    fn new<F: Send + Sync + 'static>(name: &'static str, summary: &'static str, flow: Flow<F>) -> Self {
        let outline = flow.specification().map(outline).unwrap_or_default();
        Self { name, summary, unit: Arc::new(flow), outline }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn summary(&self) -> &'static str {
        self.summary
    }

    pub fn unit(&self) -> &Arc<dyn WorkUnit> {
        &self.unit
    }

    pub fn required_keys(&self) -> Vec<String> {
        self.unit.required_keys()
    }

    /// One line per step followed by its branches.
    pub fn outline(&self) -> &[String] {
        &self.outline
    }
}

/// Every demonstration flow, keyed by name.
pub struct Catalog {
    flows: IndexMap<&'static str, DemoFlow>,
}

impl Catalog {
    pub fn new() -> Result<Self> {
        let mut registry = ParticleRegistry::new();
        registry
            .register::<ValidateOrder>()?
            .register::<ReserveStock>()?
            .register::<AuthorizeCard>()?
            .register::<CaptureFunds>()?
            .register::<ShipOrder>()?
            .register::<DeliverDownload>()?
            .register::<SendReceipt>()?;

        let payment = Arc::new(payment_flow(&registry).context("Failed to declare the payment flow")?);
        registry.register_unit("payment", payment.clone())?;
        let fulfilment = fulfilment_flow(&registry).context("Failed to declare the fulfilment flow")?;

        let mut flows = IndexMap::new();
        for demo in [
            DemoFlow::new("fulfilment", "Validate, reserve, pay for and deliver an order", fulfilment),
            DemoFlow {
                name: "payment",
                summary: "Authorize and capture a card payment",
                outline: payment.specification().map(outline).unwrap_or_default(),
                unit: payment,
            },
        ] {
            flows.insert(demo.name, demo);
        }
        Ok(Self { flows })
    }

    pub fn get(&self, name: &str) -> Option<&DemoFlow> {
        self.flows.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DemoFlow> {
        self.flows.values()
    }
}

fn payment_flow(registry: &ParticleRegistry) -> Result<Flow<()>> {
    let spec = Specification::builder(registry)
        .context_must_have(["amount"])
        .step("authorize_card")
        .step("capture_funds")
        .build()?;
    Ok(Flow::new("Payment", (), spec))
}

/// Flow instance for `fulfilment`; its methods back the named guard and hook.
pub struct Fulfilment;

impl Fulfilment {
    fn is_digital(&self, ctx: &Context) -> bool {
        ctx.is_truthy("digital")
    }

    fn count_step(&self, ctx: &mut Context) -> HookResult {
        let count: u64 = ctx.get_as("steps_run").unwrap_or(0);
        ctx.insert("steps_run", count + 1);
        Ok(Outcome::Continue)
    }
}

fn fulfilment_flow(registry: &ParticleRegistry) -> Result<Flow<Fulfilment>> {
    let spec = Specification::builder(registry)
        .context_must_have(["order_id", "amount"])
        .before_each(Hook::named("count_step", Fulfilment::count_step))
        .step("validate_order")
        .step("reserve_stock")
        .step_with("take_payment", StepOptions::particle("payment"), |step| {
            step.endflow(BranchOptions::unless(Guard::inline(|ctx: &Context| ctx.is_truthy("paid"))))
                .goto("deliver_download", BranchOptions::when(Guard::named("is_digital", Fulfilment::is_digital)));
        })
        .step_with("ship_order", StepOptions::new(), |step| {
            step.goto("send_receipt", BranchOptions::always());
        })
        .step("deliver_download")
        .step("send_receipt")
        .build()?;
    Ok(Flow::new("Fulfilment", Fulfilment, spec))
}

fn outline<F>(spec: &Specification<F>) -> Vec<String> {
    let mut lines = Vec::new();
    if !spec.required_keys().is_empty() {
        lines.push(format!("requires: {}", spec.required_keys().join(", ")));
    }
    for step in spec.steps() {
        let hooks = step.before_callbacks().len() + step.after_callbacks().len();
        if hooks > 0 {
            lines.push(format!("{} [{}] ({hooks} hooks)", step.name(), step.particle_name()));
        } else {
            lines.push(format!("{} [{}]", step.name(), step.particle_name()));
        }
        for branch in step.branches() {
            lines.push(format!("  {branch}"));
        }
    }
    lines
}
