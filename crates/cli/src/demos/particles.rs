//! Particles used by the demonstration flows.

use laminar_engine::{Args, Context, Hook, HookResult, Hooks, Outcome, Param, Particle, Signature};
use serde_json::Value;

/// Orders above this amount are declined by [`AuthorizeCard`].
pub const CARD_LIMIT: f64 = 5_000.0;

fn display(value: &Value) -> String {
    value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string())
}

/// Fails orders that have no items.
#[derive(Default)]
pub struct ValidateOrder;

impl Particle for ValidateOrder {
    fn signature() -> Signature {
        Signature::params([Param::required("order_id"), Param::optional("items")])
    }

    fn call(&self, ctx: &mut Context, args: Args) -> anyhow::Result<Outcome> {
        let items: Vec<Value> = args.get_as("items").unwrap_or_default();
        if items.is_empty() {
            return Ok(ctx.fail([("error", "order has no items")]));
        }
        ctx.insert("item_count", items.len());
        Ok(Outcome::Continue)
    }
}

/// Reserves stock, parking the order with a soft halt when it is backordered.
#[derive(Default)]
pub struct ReserveStock;

impl Particle for ReserveStock {
    fn signature() -> Signature {
        Signature::rest()
    }

    fn call(&self, ctx: &mut Context, args: Args) -> anyhow::Result<Outcome> {
        let backordered = args.get("backorder").is_some_and(|value| value.as_bool() == Some(true));
        ctx.insert("reserved", !backordered);
        if backordered {
            ctx.halt([("message", "items are on backorder; order parked")]);
        }
        Ok(Outcome::Continue)
    }
}

/// Authorizes the card payment.
#[derive(Default)]
pub struct AuthorizeCard;

impl AuthorizeCard {
    fn check_currency(&self, ctx: &mut Context) -> HookResult {
        match ctx.get_str("currency") {
            None | Some("USD") => Ok(Outcome::Continue),
            Some(other) => {
                let message = format!("unsupported currency {other}");
                Ok(ctx.fail([("error", message)]))
            }
        }
    }
}

impl Particle for AuthorizeCard {
    fn signature() -> Signature {
        Signature::params([Param::required("amount"), Param::optional("order_id")])
    }

    fn hooks() -> Hooks<Self> {
        Hooks::new().before(Hook::named("check_currency", AuthorizeCard::check_currency))
    }

    fn call(&self, ctx: &mut Context, args: Args) -> anyhow::Result<Outcome> {
        let amount: f64 = args.get_as("amount")?;
        if amount > CARD_LIMIT {
            return Ok(ctx.fail([("error", "amount exceeds card limit")]));
        }
        let reference = args.get("order_id").map(display).unwrap_or_else(|| "anonymous".into());
        ctx.insert("authorization", format!("AUTH-{reference}"));
        Ok(Outcome::Continue)
    }
}

/// Captures an authorized payment.
#[derive(Default)]
pub struct CaptureFunds;

impl Particle for CaptureFunds {
    fn signature() -> Signature {
        Signature::params([Param::required("authorization")])
    }

    fn hooks() -> Hooks<Self> {
        Hooks::new().after(Hook::inline(|ctx| {
            ctx.insert("receipt_ready", true);
            Ok(Outcome::Continue)
        }))
    }

    fn call(&self, ctx: &mut Context, _args: Args) -> anyhow::Result<Outcome> {
        ctx.insert("paid", true);
        Ok(Outcome::Continue)
    }
}

#[derive(Default)]
pub struct ShipOrder;

impl Particle for ShipOrder {
    fn signature() -> Signature {
        Signature::params([Param::optional("express")])
    }

    fn call(&self, ctx: &mut Context, args: Args) -> anyhow::Result<Outcome> {
        let express = args.get("express").and_then(Value::as_bool).unwrap_or(false);
        ctx.insert("shipment", if express { "express" } else { "ground" });
        Ok(Outcome::Continue)
    }
}

#[derive(Default)]
pub struct DeliverDownload;

impl Particle for DeliverDownload {
    fn signature() -> Signature {
        Signature::params([Param::required("order_id")])
    }

    fn call(&self, ctx: &mut Context, args: Args) -> anyhow::Result<Outcome> {
        let order_id = args.get("order_id").map(display).unwrap_or_default();
        ctx.insert("download_url", format!("https://downloads.example.com/orders/{order_id}"));
        Ok(Outcome::Continue)
    }
}

#[derive(Default)]
pub struct SendReceipt;

impl Particle for SendReceipt {
    fn signature() -> Signature {
        Signature::params([Param::optional("email")])
    }

    fn call(&self, ctx: &mut Context, args: Args) -> anyhow::Result<Outcome> {
        let recipient = args.get("email").map(display).unwrap_or_else(|| "customer on file".into());
        ctx.insert("receipt_sent_to", recipient);
        Ok(Outcome::Continue)
    }
}
