//! Catalog inspection commands.

use shopdesk_agent::{AgentConfig, AppContext, ShopError};
use shopdesk_core::CustomerId;

use super::{CommandError, render_customers, render_orders, render_products};

fn context() -> Result<AppContext, CommandError> {
    let config = AgentConfig::from_env()?;
    Ok(AppContext::from_config(&config)?)
}

/// Search the catalog and print the matches.
#[allow(clippy::print_stdout)]
pub fn search(query: Option<&str>, category: Option<&str>) -> Result<(), CommandError> {
    let context = context()?;
    print!("{}", render_products(&context.catalog().search(query, category)));
    Ok(())
}

/// Print a customer's order history, defaulting to the active customer.
#[allow(clippy::print_stdout)]
pub fn orders(customer: Option<CustomerId>) -> Result<(), CommandError> {
    let context = context()?;
    let customer_id = customer.unwrap_or_else(|| context.shop().active_customer());
    let customer = context
        .catalog()
        .customer(customer_id)
        .ok_or(ShopError::UnknownCustomer(customer_id))?;

    println!("Orders for {} (#{}):", customer.name, customer.id);
    print!("{}", render_orders(&customer.orders));
    Ok(())
}

#[allow(clippy::print_stdout)]
pub fn customers() -> Result<(), CommandError> {
    let context = context()?;
    let active = context.shop().active_customer();
    print!("{}", render_customers(&context.catalog().customers(), Some(active)));
    Ok(())
}
