use tracing::warn;

use crate::commands::{load_config, open_session, CommandResult};

pub fn run(currency: Option<&str>) -> CommandResult {
    let config = match load_config("catalog") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let session = match open_session("catalog", &config, currency) {
        Ok(session) => session,
        Err(result) => return result,
    };

    let catalog = session.catalog();
    let pricing = session.pricing();
    let display_currency = pricing.display_currency(session.currency());

    let mut lines = vec![format!("catalog {} (currency: {})", catalog.version(), display_currency.code)];
    if !pricing.is_supported(session.currency()) {
        warn!(
            event_name = "pricing.currency_unsupported",
            requested = %session.currency(),
            display = %display_currency.code,
            "requested currency is not offered"
        );
        lines.push(format!(
            "note: {} is not offered; showing {}",
            session.currency(),
            display_currency.code
        ));
    }
    for category in catalog.categories_in_order() {
        lines.push(format!("- {}: {} ({})", category.id, category.title, category.subtitle));
        for bundle in catalog.bundles_for(&category.id) {
            let price = pricing.resolve(bundle, session.currency());
            let noun = if bundle.unit_count == 1 { "lesson" } else { "lessons" };
            lines.push(format!(
                "  - {}: {} ({} {noun}) {} | {}",
                bundle.id,
                bundle.title,
                bundle.unit_count,
                price.display_total,
                price.display_per_unit
            ));
        }
    }

    CommandResult::success("catalog", lines.join("\n"))
}
