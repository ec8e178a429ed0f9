use std::fmt::Write as _;

use crate::app::model::ChartSnapshot;
use crate::formats::MovieRecord;
use crate::query::{Direction, QueryOptions, SortField};

pub struct PanelView<'a> {
    pub snapshot: &'a ChartSnapshot,
    pub options: QueryOptions,
    pub movies: &'a [MovieRecord],
    pub error: Option<&'a str>,
}

pub fn render(view: &PanelView<'_>) -> String {
    let mut html = String::with_capacity(16 * 1024);
    html.push_str(
        r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <title>topchart</title>
    <style>
      body { font-family: sans-serif; margin: 2rem; }
      table { border-collapse: collapse; }
      td, th { border: 1px solid #ccc; padding: 0.25rem 0.5rem; text-align: left; }
      .error { color: #a00; }
    </style>
  </head>
  <body>
    <h1>Top chart control panel</h1>
"#,
    );

    render_form(&mut html, view.options);

    let _ = writeln!(
        html,
        r#"    <p>Source: <code>{}</code>, loaded {} ({} records). <a href="/download.json?{q}">Download JSON</a> | <a href="/api/movies?{q}">API</a></p>"#,
        escape_html(&view.snapshot.source),
        view.snapshot.loaded_at.to_rfc3339(),
        view.snapshot.records.len(),
        q = query_string(view.options),
    );

    for message in [view.error, view.snapshot.error.as_deref()].into_iter().flatten() {
        let _ = writeln!(html, r#"    <p class="error">{}</p>"#, escape_html(message));
    }

    render_table(&mut html, view.movies);
    html.push_str("  </body>\n</html>\n");
    html
}

fn render_form(html: &mut String, options: QueryOptions) {
    html.push_str("    <form method=\"post\" action=\"/preview\">\n");
    let _ = writeln!(
        html,
        r#"      <label>Limit <input type="number" name="limit" min="1" max="250" value="{}"></label>"#,
        options.limit
    );

    html.push_str("      <label>Sort <select name=\"sort\">\n");
    for field in SortField::ALL {
        let selected = if field == options.sort_field { " selected" } else { "" };
        let _ = writeln!(
            html,
            r#"        <option value="{}"{selected}>{}</option>"#,
            field.as_str(),
            field.label()
        );
    }
    html.push_str("      </select></label>\n");

    html.push_str("      <label>Direction <select name=\"direction\">\n");
    for direction in [Direction::Asc, Direction::Desc] {
        let selected = if direction == options.direction { " selected" } else { "" };
        let _ = writeln!(
            html,
            r#"        <option value="{d}"{selected}>{d}</option>"#,
            d = direction.as_str()
        );
    }
    html.push_str("      </select></label>\n");
    html.push_str("      <button type=\"submit\">Preview</button>\n    </form>\n");
    html.push_str(
        "    <form method=\"post\" action=\"/refresh\"><button type=\"submit\">Refresh chart</button></form>\n",
    );
}

fn render_table(html: &mut String, movies: &[MovieRecord]) {
    html.push_str(
        "    <table>\n      <tr><th>#</th><th>Title</th><th>Rating</th><th>Votes</th><th>Genre</th><th>Duration</th><th>Rated</th></tr>\n",
    );
    for movie in movies {
        let _ = writeln!(
            html,
            r#"      <tr><td>{}</td><td><a href="{}">{}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
            movie.rank,
            escape_html(&movie.url),
            escape_html(&movie.name),
            movie
                .rating_value
                .map(|v| format!("{v:.1}"))
                .unwrap_or_default(),
            movie
                .rating_count
                .map(|v| v.to_string())
                .unwrap_or_default(),
            escape_html(&movie.genre.join(", ")),
            escape_html(movie.duration.as_deref().unwrap_or_default()),
            escape_html(movie.content_rating.as_deref().unwrap_or_default()),
        );
    }
    html.push_str("    </table>\n");
}

fn query_string(options: QueryOptions) -> String {
    format!(
        "limit={}&amp;sort={}&amp;direction={}",
        options.limit, options.sort_field, options.direction
    )
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
