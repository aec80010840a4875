use super::emit;
use crate::Context;
use crate::resource::Provider;
use anyhow::Result;
use declarative::OperationContext;
use std::io;

pub async fn run(ctx: &Context, provider: &Provider, op: &OperationContext, name: &str) -> Result<()> {
    let outcome = provider.organization(op, name).await;
    emit(ctx, &mut io::stdout(), outcome)
}
