use crate::constants::PAGE_TITLE;
use crate::dashboard::figures::{ChartsPanel, ContextPanel, SummaryTable};
use crate::dashboard::session::Panel;
use crate::errors::AppResult;
use crate::models::{Metric, Tab};
use crate::utils::escape_html;
use serde::Serialize;

const PLOTLY_SRC: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const STYLE: &str = r#"
html, body { background-color: #141627; color: white; margin: 0; padding: 0; font-family: Arial, sans-serif; }
h1 { text-align: center; }
nav.tabs { display: flex; }
nav.tabs a { flex: 1; padding: 12px; text-align: center; color: white; text-decoration: none; background-color: #2c2e4a; }
nav.tabs a.selected { background-color: #4c4f75; }
#contenido-tab { padding: 20px; }
.map-layout { display: flex; align-items: center; }
.metric-picker { width: 20%; display: flex; flex-direction: column; justify-content: center; padding: 20px; }
.metric-picker label { display: block; font-size: 16px; margin-bottom: 10px; }
.metric-picker input { margin-right: 10px; width: 20px; height: 20px; accent-color: limegreen; }
.map-area { width: 75%; }
.context { width: 60%; padding: 30px; }
.context p { text-align: justify; font-size: 16px; }
table.summary { width: 100%; border-collapse: collapse; }
table.summary th, table.summary td { border: 1px solid white; padding: 4px 8px; }
"#;

const SCRIPT: &str = r#"
const DARK = { paper_bgcolor: '#141627', plot_bgcolor: '#141627', font: { color: 'white' } };

function drawMap(fig) {
  const trace = {
    type: 'choropleth',
    geojson: fig.geojson,
    featureidkey: fig.feature_id_key,
    locations: fig.locations,
    z: fig.values,
    text: fig.locations,
    hoverinfo: 'text+z',
    colorscale: fig.color_scale,
    colorbar: { title: fig.label },
  };
  const layout = Object.assign({
    margin: { r: 0, t: 0, l: 0, b: 0 },
    geo: { fitbounds: 'locations', visible: false, projection: { type: fig.projection } },
  }, DARK);
  Plotly.react('mapa', [trace], layout);
}

function drawBar(id, chart) {
  const trace = { type: 'bar', x: chart.x, y: chart.y, marker: { color: chart.color } };
  const layout = Object.assign({ title: chart.title, yaxis: { title: chart.y_label } }, DARK);
  Plotly.react(id, [trace], layout);
}

function drawFigures(root) {
  root.querySelectorAll('script[data-figure]').forEach((node) => {
    const fig = JSON.parse(node.textContent);
    if (node.dataset.figure === 'map') {
      drawMap(fig);
    } else {
      drawBar(node.dataset.target, fig);
    }
  });
  root.querySelectorAll('input[name="variable"]').forEach((input) => {
    input.addEventListener('change', async () => {
      const response = await fetch('/metric', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ metric: input.value }),
      });
      if (response.ok) {
        drawMap(await response.json());
      }
    });
  });
}

document.querySelectorAll('nav.tabs a').forEach((link) => {
  link.addEventListener('click', async (event) => {
    event.preventDefault();
    const response = await fetch('/tab/' + link.dataset.tab);
    if (!response.ok) {
      return;
    }
    const content = document.getElementById('contenido-tab');
    content.innerHTML = await response.text();
    document.querySelectorAll('nav.tabs a').forEach((a) => a.classList.toggle('selected', a === link));
    history.replaceState(null, '', '/?tab=' + link.dataset.tab);
    drawFigures(content);
  });
});

drawFigures(document);
"#;

/// Renders the whole page with `panel` as the content of the active tab.
pub fn render_page(active_tab: Tab, selected_metric: Metric, panel: &Panel) -> AppResult<String> {
    let mut html = String::with_capacity(16 * 1024);
    let title = escape_html(PAGE_TITLE);

    html.push_str(&format!(
        "<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n\
         <script src=\"{PLOTLY_SRC}\"></script>\n</head>\n<body>\n<h1>{title}</h1>\n<nav class=\"tabs\">\n"
    ));
    for tab in Tab::ALL {
        let selected = if tab == active_tab { " class=\"selected\"" } else { "" };
        html.push_str(&format!(
            "<a href=\"/?tab={slug}\" data-tab=\"{slug}\"{selected}>{label}</a>\n",
            slug = tab.slug(),
            label = escape_html(tab.label()),
        ));
    }
    html.push_str("</nav>\n<div id=\"contenido-tab\">\n");
    html.push_str(&render_panel(panel, selected_metric)?);
    html.push_str(&format!("</div>\n<script>{SCRIPT}</script>\n</body>\n</html>\n"));

    Ok(html)
}

/// Renders the HTML fragment for one panel.
///
/// Figures are embedded as JSON and drawn by the page script.
pub fn render_panel(panel: &Panel, selected_metric: Metric) -> AppResult<String> {
    match panel {
        Panel::Context(context) => Ok(render_context(context)),
        Panel::Map(map) => render_map(&**map, selected_metric),
        Panel::Charts(charts) => render_charts(charts),
        Panel::Table(table) => Ok(render_table(table)),
    }
}

fn render_context(context: &ContextPanel) -> String {
    let mut html = String::new();
    html.push_str(&format!(
        "<div class=\"context\">\n<h3>{}</h3>\n",
        escape_html(context.title)
    ));
    for paragraph in context.paragraphs {
        html.push_str(&format!("<p>{}</p>\n", escape_html(paragraph)));
    }
    if let Some(year) = context.latest_year {
        html.push_str(&format!(
            "<p>Último año con ventas registradas: {year}. Departamentos con datos: {}.</p>\n",
            context.departments
        ));
    }
    html.push_str("</div>\n");
    html
}

fn render_map<T: Serialize>(figure: &T, selected_metric: Metric) -> AppResult<String> {
    let mut html = String::from(
        "<div class=\"map-layout\">\n<div class=\"metric-picker\">\n\
         <label style=\"font-size: 18px\">Selecciona una variable:</label>\n",
    );
    for metric in Metric::ALL {
        let checked = if metric == selected_metric { " checked" } else { "" };
        html.push_str(&format!(
            "<label><input type=\"radio\" name=\"variable\" value=\"{code}\"{checked}>{label}</label>\n",
            code = metric.code(),
            label = escape_html(metric.label()),
        ));
    }
    html.push_str("</div>\n<div class=\"map-area\"><div id=\"mapa\"></div></div>\n</div>\n");
    html.push_str(&embed_figure("map", "mapa", figure)?);
    Ok(html)
}

fn render_charts(charts: &ChartsPanel) -> AppResult<String> {
    let mut html = String::from("<div id=\"grafico-volumen\"></div>\n<div id=\"grafico-vehiculos\"></div>\n");
    html.push_str(&embed_figure("bar", "grafico-volumen", &charts.volume)?);
    html.push_str(&embed_figure("bar", "grafico-vehiculos", &charts.vehicles)?);
    Ok(html)
}

fn render_table(table: &SummaryTable) -> String {
    let mut html = String::new();
    html.push_str(&format!(
        "<h4>{}</h4>\n<table class=\"summary\">\n<thead><tr>",
        escape_html(&table.title)
    ));
    for column in table.columns {
        html.push_str(&format!("<th>{}</th>", escape_html(column)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row.cells() {
            html.push_str(&format!("<td>{}</td>", escape_html(&cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

/// Serializes a figure into a JSON script block the page script picks up.
fn embed_figure<T: Serialize>(kind: &str, target: &str, figure: &T) -> AppResult<String> {
    // "</" would close the script element early
    let json = serde_json::to_string(figure)?.replace("</", "<\\/");
    Ok(format!(
        "<script type=\"application/json\" data-figure=\"{kind}\" data-target=\"{target}\">{json}</script>\n"
    ))
}
