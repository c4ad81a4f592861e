use std::path::Path;

use anyhow::Context;
use haplomap_analysis::report::MapData;

use crate::util::Output;

const TEMPLATE: &str = include_str!("../assets/map.html");
const DATA_PLACEHOLDER: &str = "{{MAP_DATA}}";

/// Renders the map page with `data` embedded as JSON.
///
/// `<` is escaped inside the JSON so that no string value can close the
/// surrounding script element.
pub(crate) fn render_html(data: &MapData) -> anyhow::Result<String> {
    let json = serde_json::to_string(data).context("Failed to serialize map data")?;
    Ok(TEMPLATE.replace(DATA_PLACEHOLDER, &json.replace('<', "\\u003c")))
}

pub(crate) fn write_html(data: &MapData, path: &Path) -> anyhow::Result<()> {
    let html = render_html(data)?;
    let mut output = Output::open(path.to_owned())?;
    output.write_text(&html)
}
