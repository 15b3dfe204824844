use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn export_pdf(json: &str) -> Result<Vec<u8>, JsValue> {
    crate::export_json(json).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub fn export_pdf_base64(json: &str) -> Result<String, JsValue> {
    crate::export_json_base64(json).map_err(|e| JsValue::from_str(&e.to_string()))
}
