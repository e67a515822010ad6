//! Server-side HTML for the dashboard.
//!
//! Display rules: spend and revenue to 2 places, CPC/CPM to 4, ROAS and AOV
//! to 2. A ratio without a denominator is `N/A`; a figure whose source failed
//! is `unavailable`, never `0`.

use roas_report_core::models::ad_metrics::AdChannel;
use roas_report_core::models::report::{DataSource, Report};

use crate::form::FormView;

pub const NOT_AVAILABLE: &str = "N/A";
pub const UNAVAILABLE: &str = "unavailable";

const STYLE: &str = "body{font-family:sans-serif;margin:2rem;max-width:72rem}\
table{border-collapse:collapse;margin:1rem 0}\
td,th{border:1px solid #ccc;padding:.3rem .6rem;text-align:right}\
th:first-child,td:first-child{text-align:left}\
.warning{background:#fff3cd;border:1px solid #e0b000;padding:.6rem;margin:.5rem 0}\
.error{background:#f8d7da;border:1px solid #c00;padding:.6rem;margin:.5rem 0}\
fieldset{margin:.6rem 0}label{display:block;margin:.2rem 0}";

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn money(value: f64) -> String {
    format!("{value:.2}")
}

/// `N/A` for an undefined ratio.
pub fn ratio(value: Option<f64>, places: usize) -> String {
    match value {
        Some(v) => format!("{v:.places$}"),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// `value` when its source delivered, `unavailable` otherwise.
fn when(available: bool, value: impl FnOnce() -> String) -> String {
    if available {
        value()
    } else {
        UNAVAILABLE.to_string()
    }
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        escape(title)
    )
}

fn text_input(label: &str, name: &str, value: &str) -> String {
    format!(
        "<label>{label} <input type=\"text\" name=\"{name}\" value=\"{}\"></label>\n",
        escape(value)
    )
}

fn date_input(label: &str, name: &str, value: &str) -> String {
    format!(
        "<label>{label} <input type=\"date\" name=\"{name}\" value=\"{}\"></label>\n",
        escape(value)
    )
}

fn secret_input(label: &str, name: &str, configured: bool) -> String {
    let placeholder = if configured {
        "configured default"
    } else {
        ""
    };
    format!(
        "<label>{label} <input type=\"password\" name=\"{name}\" placeholder=\"{placeholder}\" autocomplete=\"off\"></label>\n"
    )
}

fn form(view: &FormView) -> String {
    let mut html = String::from("<form method=\"post\" action=\"/report\">\n");
    html.push_str(&text_input("Client", "client", &view.client));

    html.push_str("<fieldset><legend>Meta Ads</legend>\n");
    html.push_str(&secret_input("Access token", "ads_token", view.meta_token_configured));
    html.push_str(&text_input("Ad account id", "ad_account_id", &view.ad_account_id));
    html.push_str("</fieldset>\n");

    html.push_str("<fieldset><legend>Google Ads (optional)</legend>\n");
    html.push_str(&secret_input(
        "Developer token",
        "google_developer_token",
        view.google_tokens_configured,
    ));
    html.push_str(&secret_input(
        "Access token",
        "google_access_token",
        view.google_tokens_configured,
    ));
    html.push_str(&text_input("Customer id", "google_customer_id", &view.google_customer_id));
    html.push_str(&text_input(
        "Login customer id",
        "google_login_customer_id",
        &view.google_login_customer_id,
    ));
    html.push_str("</fieldset>\n");

    html.push_str("<fieldset><legend>Shopify</legend>\n");
    html.push_str(&text_input("Store domain", "shop_domain", &view.shop_domain));
    html.push_str(&secret_input("Access token", "shop_token", view.shop_token_configured));
    html.push_str("</fieldset>\n");

    html.push_str("<fieldset><legend>Date range</legend>\n");
    html.push_str(&date_input("Start", "date_start", &view.date_start));
    html.push_str(&date_input("End", "date_end", &view.date_end));
    html.push_str("</fieldset>\n");

    html.push_str("<button type=\"submit\">Fetch report</button>\n</form>\n");
    html
}

/// The form alone, optionally with an error above it.
pub fn form_page(view: &FormView, error: Option<&str>) -> String {
    let mut body = String::from("<h1>ROAS Report</h1>\n");
    if let Some(message) = error {
        body.push_str(&format!("<div class=\"error\">{}</div>\n", escape(message)));
    }
    body.push_str(&form(view));
    page("ROAS Report", &body)
}

/// The rendered report followed by the form for the next request.
pub fn report_page(report: &Report, view: &FormView) -> String {
    let mut body = format!("<h1>ROAS Report: {}</h1>\n", escape(&report.range.to_string()));
    body.push_str(&warnings(report));
    body.push_str(&summary_table(report));
    body.push_str(&channel_table(report));
    body.push_str(&daily_table(report));
    body.push_str("<h2>New report</h2>\n");
    body.push_str(&form(view));
    page("ROAS Report", &body)
}

fn warnings(report: &Report) -> String {
    let mut html = String::new();
    for warning in &report.warnings {
        html.push_str(&format!(
            "<div class=\"warning\"><strong>{}</strong> unavailable ({}): {}</div>\n",
            escape(&warning.label()),
            escape(&warning.kind.to_string()),
            escape(&warning.message)
        ));
    }
    html
}

/// Suffix for ad figures when some requested channels are missing.
fn partial_marker(report: &Report) -> &'static str {
    if report.is_source_partial(DataSource::Ads) {
        " (partial)"
    } else {
        ""
    }
}

fn summary_table(report: &Report) -> String {
    let s = &report.summary;
    let ads = report.is_source_available(DataSource::Ads);
    let sales = report.is_source_available(DataSource::Sales);
    let partial = partial_marker(report);

    let rows = [
        ("Impressions", when(ads, || format!("{}{partial}", s.total_impressions))),
        ("Clicks", when(ads, || format!("{}{partial}", s.total_clicks))),
        ("Spend", when(ads, || format!("{}{partial}", money(s.total_spend)))),
        ("CPC", when(ads, || format!("{}{partial}", ratio(s.cpc, 4)))),
        ("CPM", when(ads, || format!("{}{partial}", ratio(s.cpm, 4)))),
        ("Revenue", when(sales, || money(s.total_revenue))),
        ("Orders", when(sales, || s.total_orders.to_string())),
        ("AOV", when(sales, || ratio(s.average_order_value, 2))),
        ("ROAS", when(ads && sales, || format!("{}{partial}", ratio(s.roas, 2)))),
    ];

    let mut html = String::from("<h2>Summary</h2>\n<table>\n<tr><th>Metric</th><th>Value</th></tr>\n");
    for (label, value) in rows {
        html.push_str(&format!("<tr><td>{label}</td><td>{}</td></tr>\n", escape(&value)));
    }
    html.push_str("</table>\n");
    html
}

fn channel_failed(report: &Report, channel: AdChannel) -> bool {
    report
        .warnings_for(DataSource::Ads)
        .any(|w| w.channel == Some(channel))
}

fn channel_table(report: &Report) -> String {
    if report.requested_channels.is_empty() {
        return String::new();
    }
    let sales = report.is_source_available(DataSource::Sales);
    let mut html = String::from(
        "<h2>By channel</h2>\n<table>\n<tr><th>Channel</th><th>Impressions</th><th>Clicks</th>\
         <th>Spend</th><th>CPC</th><th>CPM</th><th>ROAS</th></tr>\n",
    );
    for channel in &report.requested_channels {
        let cells: [String; 6] = if channel_failed(report, *channel) {
            std::array::from_fn(|_| UNAVAILABLE.to_string())
        } else {
            match report.channels.iter().find(|c| c.channel == *channel) {
                Some(c) => [
                    c.impressions.to_string(),
                    c.clicks.to_string(),
                    money(c.spend),
                    ratio(c.cpc, 4),
                    ratio(c.cpm, 4),
                    when(sales, || ratio(c.roas, 2)),
                ],
                None => [
                    "0".to_string(),
                    "0".to_string(),
                    money(0.0),
                    NOT_AVAILABLE.to_string(),
                    NOT_AVAILABLE.to_string(),
                    when(sales, || NOT_AVAILABLE.to_string()),
                ],
            }
        };
        html.push_str(&format!("<tr><td>{channel}</td>"));
        for cell in cells {
            html.push_str(&format!("<td>{}</td>", escape(&cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
    html
}

fn daily_table(report: &Report) -> String {
    let ads = report.is_source_available(DataSource::Ads);
    let sales = report.is_source_available(DataSource::Sales);
    let partial = partial_marker(report);
    let mut html = String::from(
        "<h2>Daily</h2>\n<table>\n<tr><th>Date</th><th>Spend</th><th>Revenue</th>\
         <th>Orders</th><th>ROAS</th></tr>\n",
    );
    for day in &report.daily {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            day.date,
            when(ads, || format!("{}{partial}", money(day.spend))),
            when(sales, || money(day.revenue)),
            when(sales, || day.orders.to_string()),
            when(ads && sales, || format!("{}{partial}", ratio(day.roas, 2))),
        ));
    }
    html.push_str("</table>\n");
    html
}
