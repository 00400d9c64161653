pub mod harvest;

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use marketline_core::SharedProgress;

use crate::config::Config;

/// Styled two-column table used by every command's report
pub(crate) fn styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)));
    table
}

pub fn show_config(config: &Config, progress: &SharedProgress) {
    let mut table = styled_table(&["Setting", "Value"]);

    table.add_row(vec![
        "Output directory",
        &config.output.dir.display().to_string(),
    ]);
    table.add_row(vec![
        "Concurrency",
        &format!(
            "{} requests, {} sellers",
            config.http.max_concurrency, config.http.seller_concurrency
        ),
    ]);
    table.add_row(vec!["Max retries", &config.http.max_retries.to_string()]);
    table.add_row(vec![
        "Backoff",
        &format!(
            "{}ms (max: {}ms)",
            config.http.backoff_ms, config.http.max_backoff_ms
        ),
    ]);
    table.add_row(vec![
        "Timeouts",
        &format!(
            "connect {}s, request {}s",
            config.http.connect_timeout_secs, config.http.request_timeout_secs
        ),
    ]);
    table.add_row(vec![
        "User agents",
        &if config.identity.user_agents.is_empty() {
            "built-in".to_string()
        } else {
            config.identity.user_agents.len().to_string()
        },
    ]);
    table.add_row(vec!["Tiki API URL", &config.tiki.api_base]);
    table.add_row(vec!["Shopee URL", &config.shopee.base_url]);
    table.add_row(vec!["Lazada URL", &config.lazada.www_base]);
    table.add_row(vec![
        "Lazada page delay",
        &format!("{}ms", config.lazada.page_delay_ms),
    ]);
    table.add_row(vec![
        "Sellers",
        &format!(
            "{} (tiki {}, shopee {}, lazada {})",
            config.sellers.total(),
            config.sellers.tiki.len(),
            config.sellers.shopee.len(),
            config.sellers.lazada.len()
        ),
    ]);

    progress.println(format!("\n{table}"));
}
