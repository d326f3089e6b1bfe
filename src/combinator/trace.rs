//! Diagnostic pass-through steps
//!
//! Both combinators return their input context unchanged; they exist only
//! to emit `debug`-level records through the `log` facade, under the
//! `weft::trace` target. No other combinator logs on its own.

use crate::parse::{Combinator, Context};

const TARGET: &str = "weft::trace";

/// Logs `describe(&ctx)` and passes the context through
pub fn trace<F>(describe: F) -> Combinator
where
    F: Fn(&Context<'_>) -> String + Send + Sync + 'static,
{
    Combinator::new(move |ctx| {
        if log::log_enabled!(target: TARGET, log::Level::Debug) {
            log::debug!(target: TARGET, "{}", describe(&ctx));
        }
        Ok(ctx)
    })
}

/// Logs the current value of field `name`, along with the offset
pub fn trace_field(name: impl Into<String>) -> Combinator {
    let name = name.into();
    Combinator::new(move |ctx| {
        match ctx.values().get(&name) {
            Some(value) => log::debug!(target: TARGET, "{name}: {value} [{}]", ctx.offset()),
            None => log::debug!(target: TARGET, "{name}: <unset> [{}]", ctx.offset()),
        }
        Ok(ctx)
    })
}
