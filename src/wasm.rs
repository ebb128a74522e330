use wasm_bindgen::prelude::*;

use crate::exporter::GpxExporter;
use crate::options::ExportOptions;
use crate::sample::epoch_to_utc;
use crate::waypoint::Waypoint;

/// Render stored waypoint records (the JSON store layout) as a GPX string.
#[wasm_bindgen(js_name = waypointsToGpx)]
pub fn waypoints_to_gpx(waypoints: JsValue, options: JsValue) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let waypoints: Vec<Waypoint> =
        serde_wasm_bindgen::from_value(waypoints).map_err(|e| JsValue::from_str(&e.to_string()))?;
    GpxExporter::new(opts)
        .render(&waypoints, now())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// File name an export made right now would get.
#[wasm_bindgen(js_name = gpxFileName)]
pub fn gpx_file_name(options: JsValue) -> Result<String, JsValue> {
    let opts = parse_options(options)?;
    Ok(GpxExporter::new(opts).file_name(now()))
}

fn now() -> chrono::DateTime<chrono::Utc> {
    epoch_to_utc(js_sys::Date::now() / 1000.0)
}

fn parse_options(options: JsValue) -> Result<ExportOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(ExportOptions::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
