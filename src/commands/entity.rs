//! Lifecycle commands for the six entity kinds

use super::{emit, read_document};
use crate::Context;
use crate::cli::{DocumentArgs, UpdateArgs};
use crate::resource::{self, Provider, ResourceKind};
use anyhow::{Result, bail};
use declarative::OperationContext;
use std::io;
use std::path::Path;

pub async fn create(ctx: &Context, provider: &Provider, op: &OperationContext, args: DocumentArgs) -> Result<()> {
    let config = read_document(&args.file)?;
    log::info!("Creating {}", args.kind);
    let outcome = provider.create(args.kind, op, config).await;
    emit(ctx, &mut io::stdout(), outcome)
}

pub async fn read(ctx: &Context, provider: &Provider, op: &OperationContext, args: DocumentArgs) -> Result<()> {
    let state = read_document(&args.file)?;
    let outcome = provider.read(args.kind, op, state).await;
    emit(ctx, &mut io::stdout(), outcome)
}

pub async fn update(ctx: &Context, provider: &Provider, op: &OperationContext, args: UpdateArgs) -> Result<()> {
    let stdin = Path::new("-");
    if args.state == stdin && args.config == stdin {
        bail!("--state and --config cannot both be read from stdin");
    }
    let state = read_document(&args.state)?;
    let config = read_document(&args.config)?;
    log::info!("Updating {}", args.kind);
    let outcome = provider.update(args.kind, op, state, config).await;
    emit(ctx, &mut io::stdout(), outcome)
}

pub async fn delete(ctx: &Context, provider: &Provider, op: &OperationContext, args: DocumentArgs) -> Result<()> {
    let state = read_document(&args.file)?;
    log::info!("Deleting {}", args.kind);
    let outcome = provider.delete(args.kind, op, state).await;
    emit(ctx, &mut io::stdout(), outcome)
}

pub async fn import(
    ctx: &Context,
    provider: &Provider,
    op: &OperationContext,
    kind: ResourceKind,
    key: &str,
) -> Result<()> {
    let outcome = provider.import(kind, op, key).await;
    emit(ctx, &mut io::stdout(), outcome)
}

pub async fn lookup(ctx: &Context, provider: &Provider, op: &OperationContext, args: DocumentArgs) -> Result<()> {
    let filter = read_document(&args.file)?;
    let outcome = provider.lookup(args.kind, op, filter).await;
    emit(ctx, &mut io::stdout(), outcome)
}

/// Offline: no provider configuration or connection needed
pub fn validate(ctx: &Context, args: DocumentArgs) -> Result<()> {
    let config = read_document(&args.file)?;
    let outcome = resource::validate(args.kind, config);
    emit(ctx, &mut io::stdout(), outcome)
}
