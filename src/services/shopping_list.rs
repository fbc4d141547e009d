use crate::models::recipe::ShoppingListItem;

pub const FILENAME: &str = "shopping_list.txt";

const HEADER: &str = "Shopping list:\n\n";

/// Renders aggregated items as `name (unit) — total`, one per line.
#[must_use]
pub fn render(items: &[ShoppingListItem]) -> String {
    let lines: String = items
        .iter()
        .map(|item| {
            format!(
                "{} ({}) — {}\n",
                item.name, item.measurement_unit, item.total_amount
            )
        })
        .collect();

    format!("{HEADER}{lines}")
}
