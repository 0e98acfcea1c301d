//! Dashboard figures on the command line.

use fashion_store_admin::routes::dashboard::DashboardStats;
use tracing::info;

/// Fetch and print the overview figures.
///
/// Individual fetch failures are logged and counted as zero, as on the
/// dashboard.
///
/// # Errors
///
/// Returns an error if the connection settings are invalid.
pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let data = super::connect()?;

    let (totals, orders, products, customers) = tokio::join!(
        data.order_totals(),
        data.count_orders(),
        data.count_products(),
        data.count_customers(),
    );
    let stats = DashboardStats::collect(totals, orders, products, customers);

    info!("Fashion Store Statistics");
    info!("========================");
    info!("Revenu Total: {}", stats.revenue);
    info!("Commandes:    {}", stats.orders);
    info!("Produits:     {}", stats.products);
    info!("Clients:      {}", stats.customers);

    Ok(())
}
