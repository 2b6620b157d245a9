// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

#![warn(missing_docs)]
#![crate_name = "js_hooks"]

//! # Js Hooks
//!
//! [`js_hooks`][`crate`] is a collection of utilities for a WASM application in a JavaScript environment.
//! Logging macros fall back to stdout/stderr when not running in WASM so code using them
//! can be unit tested natively.

use js_sys::Reflect;
use std::fmt;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlCanvasElement, UrlSearchParams, Window};

/// Gets the window.
pub fn window() -> Window {
    web_sys::window().expect("no window")
}

/// Gets the document.
pub fn document() -> Document {
    window().document().expect("no document")
}

/// Gets the canvas matching a CSS `selector` (e.g. `"#canvas"`) for use with WebGL.
pub fn canvas(selector: &str) -> Result<HtmlCanvasElement, String> {
    document()
        .query_selector(selector)
        .map_err(|e| error_message(&e).unwrap_or_else(|| format!("invalid selector {selector}")))?
        .ok_or_else(|| format!("no canvas matches {selector}"))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| format!("{selector} is not a canvas"))
}

/// Gets a parameter from the query string of the page's URL, e.g. `draw` in `?draw=plain`.
pub fn query_param(name: &str) -> Option<String> {
    let search = window().location().search().ok()?;
    UrlSearchParams::new_with_str(&search).ok()?.get(name)
}

/// Extracts an error message from a JavaScript error.
pub fn error_message(error: &JsValue) -> Option<String> {
    Reflect::get(error, &JsValue::from_str("message"))
        .as_ref()
        .ok()
        .and_then(JsValue::as_string)
}

/// Log an error to JavaScript's console. Use this instead of [`eprintln!`].
#[macro_export]
macro_rules! console_error {
    ($($t:tt)*) => {
        $crate::error_args(&format_args!($($t)*))
    };
}

/// Log to JavaScript's console. Use this instead of [`println!`].
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => {
        $crate::log_args(&format_args!($($t)*))
    };
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn error(s: &str);

    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

#[doc(hidden)]
pub fn error_args(args: &fmt::Arguments) {
    #[cfg(target_arch = "wasm32")]
    error(&args.to_string());
    #[cfg(not(target_arch = "wasm32"))]
    eprintln!("{args}");
}

#[doc(hidden)]
pub fn log_args(args: &fmt::Arguments) {
    #[cfg(target_arch = "wasm32")]
    log(&args.to_string());
    #[cfg(not(target_arch = "wasm32"))]
    println!("{args}");
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_log_natively() {
        // Must not call into JavaScript when running natively.
        console_log!("{} + {} = {}", 1, 2, 1 + 2);
        console_error!("error: {}", "shader failed");
    }
}
