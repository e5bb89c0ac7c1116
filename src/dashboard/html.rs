//! HTML rendering of a [`Page`]
//!
//! Plain server-rendered markup: forms post back to the router, which
//! redirects to the page again. The only script is the auto-submit on the
//! pickers.

use super::{
    BrowserView, ExplorerView, FileView, HistogramView, NoticeLevel, Page, Status, Table, ViewModel,
};
use crate::frame::ColumnSummary;

pub const TITLE: &str = "Azimuth Data Analysis Dashboard";

pub const MISSING_CREDENTIALS: &str = "Please enter your AWS credentials in the sidebar to continue";
pub const CONNECTED: &str = "AWS connection successful!";

const STYLE: &str = r#"
    body { font-family: Arial, sans-serif; margin: 0; color: #1d1d1f; display: flex; min-height: 100vh; }
    aside { width: 260px; background: #f0f2f6; padding: 1.5rem; box-sizing: border-box; }
    main { flex: 1; padding: 2rem; overflow-x: auto; }
    label { display: block; margin-top: 0.75rem; font-weight: 600; }
    input, select { width: 100%; padding: 0.4rem; box-sizing: border-box; }
    button { margin-top: 1rem; padding: 0.5rem 1rem; }
    nav a { margin-right: 1.5rem; }
    section { border-top: 1px solid #ddd; padding-top: 1rem; margin-top: 1.5rem; }
    table { border-collapse: collapse; margin: 0.5rem 0 1rem; font-size: 0.9rem; }
    th, td { border: 1px solid #ddd; padding: 0.25rem 0.5rem; text-align: left; }
    th { background: #fafafa; }
    .scroll { max-height: 420px; overflow: auto; }
    .notice { padding: 0.75rem 1rem; border-radius: 6px; margin: 0.5rem 0; }
    .info { background: #e8f0fe; }
    .success { background: #e6f4ea; }
    .warning { background: #fef7e0; }
    .error { background: #fce8e6; }
    .metrics { display: flex; gap: 2rem; margin: 0.5rem 0 1rem; }
    .metric span { display: block; font-size: 0.8rem; color: #555; }
    .metric strong { font-size: 1.6rem; }
    .axis { display: flex; justify-content: space-between; width: 720px; font-size: 0.8rem; color: #555; }
    footer { margin-top: 2rem; color: #777; font-size: 0.8rem; border-top: 1px solid #ddd; padding-top: 0.5rem; }
"#;

/// Escape text for element content and quoted attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub fn render_page(page: &Page) -> String {
    let mut html = String::new();
    html.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("  <meta charset=\"utf-8\" />\n");
    html.push_str("  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n");
    html.push_str(&format!("  <title>{}</title>\n", TITLE));
    html.push_str(&format!("  <style>{}</style>\n", STYLE));
    html.push_str("</head>\n<body>\n");

    html.push_str(&sidebar(page));

    html.push_str("<main>\n");
    html.push_str(&format!("<h1>{}</h1>\n", TITLE));
    html.push_str("<p>Interactive data exploration and visualization</p>\n");

    match page.status {
        Status::MissingCredentials => html.push_str(&notice("warning", MISSING_CREDENTIALS)),
        Status::Unavailable => {}
        Status::Connected => {
            html.push_str(&notice("success", CONNECTED));
            html.push_str("<nav>");
            for view in &page.views {
                html.push_str(&format!(
                    "<a href=\"#{}\">{}</a>",
                    view.id.slug(),
                    escape(&view.title)
                ));
            }
            html.push_str("</nav>\n");
            for view in &page.views {
                html.push_str(&view_section(view));
            }
        }
    }

    html.push_str(&format!(
        "<footer>Dashboard updated: {}</footer>\n",
        page.updated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn sidebar(page: &Page) -> String {
    let mut html = String::from("<aside>\n<h2>Configuration</h2>\n<h3>AWS Credentials</h3>\n");
    html.push_str("<form method=\"post\" action=\"/credentials\">\n");
    html.push_str(&format!(
        "<label for=\"access_key\">AWS Access Key</label>\n\
         <input type=\"password\" id=\"access_key\" name=\"access_key\" autocomplete=\"off\" value=\"{}\" />\n",
        escape(&page.credentials.access_key)
    ));
    html.push_str(&format!(
        "<label for=\"secret_key\">AWS Secret Key</label>\n\
         <input type=\"password\" id=\"secret_key\" name=\"secret_key\" autocomplete=\"off\" value=\"{}\" />\n",
        escape(&page.credentials.secret_key)
    ));
    html.push_str("<label for=\"region\">AWS Region</label>\n<select id=\"region\" name=\"region\">\n");
    for region in &page.regions {
        html.push_str(&option(region, region, *region == page.credentials.region));
    }
    html.push_str("</select>\n<button type=\"submit\">Connect</button>\n</form>\n");
    html.push_str(&notice("info", &format!("Bucket: {}", page.bucket)));
    html.push_str("</aside>\n");
    html
}

fn view_section(view: &ViewModel) -> String {
    let slug = view.id.slug();
    let mut html = format!("<section id=\"{}\">\n<h2>{}</h2>\n", slug, escape(&view.title));

    if !view.files.is_empty() {
        let label = match view.id.browser_index() {
            Some(_) => "Select file",
            None => "Select any file to explore",
        };
        html.push_str(&format!(
            "<form method=\"post\" action=\"/views/{}/select\">\n<label for=\"{}-key\">{}</label>\n\
             <select id=\"{}-key\" name=\"key\" onchange=\"this.form.submit()\">\n",
            slug, slug, label, slug
        ));
        for file in &view.files {
            html.push_str(&option(file, file, view.selected.as_deref() == Some(file.as_str())));
        }
        html.push_str("</select>\n<noscript><button type=\"submit\">Show</button></noscript>\n</form>\n");
    }

    for n in &view.notices {
        let class = match n.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        html.push_str(&notice(class, &n.text));
    }

    match &view.content {
        Some(FileView::Browser(b)) => html.push_str(&browser(slug, b)),
        Some(FileView::Explorer(e)) => html.push_str(&explorer(slug, e)),
        None => {}
    }

    html.push_str("</section>\n");
    html
}

fn browser(slug: &str, view: &BrowserView) -> String {
    let mut html = notice(
        "info",
        &format!("Shape: {} rows × {} columns", view.rows, view.columns),
    );
    html.push_str(&metrics(&[
        ("Rows", view.rows.to_string()),
        ("Columns", view.columns.to_string()),
    ]));
    html.push_str(&table(&view.table));
    html.push_str("<h3>Statistics</h3>\n");
    html.push_str(&table(&view.statistics));
    html.push_str(&download(slug, &view.download_name));
    html
}

fn explorer(slug: &str, view: &ExplorerView) -> String {
    let mut html = metrics(&[
        ("Total Rows", view.rows.to_string()),
        ("Total Columns", view.columns.to_string()),
        ("Memory Usage", view.memory_usage.clone()),
    ]);

    html.push_str("<h3>Data Preview</h3>\n");
    html.push_str(&table(&view.preview));

    html.push_str("<h3>Column Information</h3>\n");
    html.push_str(&table(&column_info(&view.column_info)));

    html.push_str("<h3>Visualization</h3>\n");
    if !view.numeric_columns.is_empty() {
        let selected = view.histogram.as_ref().map(|h| h.histogram.column.as_str());
        html.push_str(&format!(
            "<form method=\"post\" action=\"/views/{}/column\">\n\
             <label for=\"{}-column\">Select column for visualization</label>\n\
             <select id=\"{}-column\" name=\"column\" onchange=\"this.form.submit()\">\n",
            slug, slug, slug
        ));
        for column in &view.numeric_columns {
            html.push_str(&option(column, column, selected == Some(column.as_str())));
        }
        html.push_str("</select>\n<noscript><button type=\"submit\">Plot</button></noscript>\n</form>\n");
    }
    if let Some(histogram) = &view.histogram {
        html.push_str(&histogram_figure(histogram));
    }

    html.push_str("<h3>Export Data</h3>\n");
    html.push_str(&download(slug, &view.download_name));
    html
}

fn histogram_figure(view: &HistogramView) -> String {
    let (lo, hi) = view.histogram.range();
    format!(
        "<figure>\n<figcaption>Distribution of {}</figcaption>\n{}\n\
         <div class=\"axis\"><span>{}</span><span>count max {}</span><span>{}</span></div>\n</figure>\n",
        escape(&view.histogram.column),
        view.svg,
        format_axis(lo),
        view.histogram.max_count(),
        format_axis(hi)
    )
}

fn format_axis(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn column_info(columns: &[ColumnSummary]) -> Table {
    Table {
        header: ["Column", "Type", "Non-Null Count", "Null Count"]
            .iter()
            .map(|h| h.to_string())
            .collect(),
        rows: columns
            .iter()
            .map(|c| {
                vec![
                    c.name.clone(),
                    c.dtype.clone(),
                    c.non_null.to_string(),
                    c.nulls.to_string(),
                ]
            })
            .collect(),
    }
}

fn table(table: &Table) -> String {
    let mut html = String::from("<div class=\"scroll\"><table>\n<thead><tr>");
    for name in &table.header {
        html.push_str(&format!("<th>{}</th>", escape(name)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in &table.rows {
        html.push_str("<tr>");
        for value in row {
            html.push_str(&format!("<td>{}</td>", escape(value)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table></div>\n");
    html
}

fn metrics(items: &[(&str, String)]) -> String {
    let mut html = String::from("<div class=\"metrics\">");
    for (label, value) in items {
        html.push_str(&format!(
            "<div class=\"metric\"><span>{}</span><strong>{}</strong></div>",
            label,
            escape(value)
        ));
    }
    html.push_str("</div>\n");
    html
}

fn download(slug: &str, file_name: &str) -> String {
    format!(
        "<p><a href=\"/views/{}/export\" download=\"{}\">Download as CSV</a></p>\n",
        slug,
        escape(file_name)
    )
}

fn notice(class: &str, text: &str) -> String {
    format!("<div class=\"notice {}\">{}</div>\n", class, escape(text))
}

fn option(value: &str, label: &str, selected: bool) -> String {
    format!(
        "<option value=\"{}\"{}>{}</option>\n",
        escape(value),
        if selected { " selected" } else { "" },
        escape(label)
    )
}
