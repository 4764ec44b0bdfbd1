use std::io::{self, Write as _};

use clap::{Args, Subcommand};
use hearth::cart::{CartState, NewCartItem, ProductId};
use hearth_app::{
    checkout,
    config::AppConfig,
    context::AppContext,
    summary::write_summary,
};
use rusty_money::iso::Currency;

use super::CliError;
use crate::shutdown;

#[derive(Debug, Subcommand)]
pub(crate) enum CartCommand {
    /// Show the cart
    Show,

    /// Add one unit of a product
    Add(AddArgs),

    /// Remove a product's line
    Remove(RemoveArgs),

    /// Set a product's quantity; zero or less removes it
    Quantity(QuantityArgs),

    /// Empty the cart
    Clear,

    /// Print the WhatsApp order link and empty the cart
    Checkout,

    /// Show the cart and follow changes until interrupted
    Watch,
}

#[derive(Debug, Args)]
pub(crate) struct AddArgs {
    /// Product identifier
    id: String,

    /// Display name
    #[arg(long)]
    name: String,

    /// Unit price in minor units
    #[arg(long)]
    price: u64,

    /// Product image
    #[arg(long)]
    image_url: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct RemoveArgs {
    /// Product identifier
    id: String,
}

#[derive(Debug, Args)]
pub(crate) struct QuantityArgs {
    /// Product identifier
    id: String,

    /// New quantity
    #[arg(allow_negative_numbers = true)]
    quantity: i64,
}

pub(crate) async fn run(command: CartCommand, config: &AppConfig) -> Result<(), CliError> {
    let currency = config.checkout.currency()?;
    let (context, worker) = AppContext::from_config(config)?;

    let persistence = tokio::spawn(worker.run());

    context.reconciler.load().await;

    let result = execute(command, &context, config, currency).await;

    // The worker drains queued writes once every handle to the cart is gone.
    drop(context);
    persistence.await?;

    result
}

async fn execute(
    command: CartCommand,
    context: &AppContext,
    config: &AppConfig,
    currency: &'static Currency,
) -> Result<(), CliError> {
    let reconciler = &context.reconciler;

    let cart = match command {
        CartCommand::Show => reconciler.cart(),
        CartCommand::Add(args) => {
            let mut item = NewCartItem::new(args.id, args.name, args.price);

            if let Some(image_url) = args.image_url {
                item = item.with_image_url(image_url);
            }

            Some(reconciler.add_item(item)?)
        }
        CartCommand::Remove(args) => Some(reconciler.remove_item(ProductId::new(args.id))?),
        CartCommand::Quantity(args) => {
            Some(reconciler.update_quantity(ProductId::new(args.id), args.quantity)?)
        }
        CartCommand::Clear => Some(reconciler.clear()?),
        CartCommand::Checkout => {
            let handoff = config.checkout.handoff()?;
            let link = checkout::checkout(reconciler, &handoff)?;

            writeln!(io::stdout().lock(), "{link}")?;

            return Ok(());
        }
        CartCommand::Watch => return watch(context, currency).await,
    };

    if let Some(cart) = cart {
        show(&cart, currency)?;
    }

    Ok(())
}

fn show(cart: &CartState, currency: &'static Currency) -> Result<(), CliError> {
    write_summary(io::stdout().lock(), cart, currency)?;

    Ok(())
}

async fn watch(context: &AppContext, currency: &'static Currency) -> Result<(), CliError> {
    let _subscription = context.subscribe();
    let mut updates = context.reconciler.watch();

    let stop = shutdown::wait();
    tokio::pin!(stop);

    loop {
        let current = updates.borrow_and_update().clone();

        if let Some(cart) = current {
            show(&cart, currency)?;
        }

        tokio::select! {
            result = &mut stop => {
                result?;
                return Ok(());
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
        }
    }
}
