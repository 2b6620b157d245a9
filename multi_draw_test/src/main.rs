// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use js_hooks::{console_error, console_log, query_param};
use multi_draw::{ContextAttributes, DrawnFrame, Renderer, Scene, SceneConfig, SceneError};

/// Draws the triangle once into `#canvas`. The draw form and swap mode default to the enabled
/// cargo features and can be overridden with `?draw=multi_draw_elements&swap=explicit`.
fn run() -> Result<DrawnFrame, SceneError> {
    let config = SceneConfig::default().with_overrides(
        query_param("draw").as_deref(),
        query_param("swap").as_deref(),
    )?;
    console_log!(
        "drawing with {} ({} swap)",
        config.draw_form,
        if config.explicit_swap { "explicit" } else { "implicit" }
    );

    let renderer = Renderer::new(
        "#canvas",
        ContextAttributes {
            antialias: false,
            explicit_swap: config.explicit_swap,
        },
    )?;

    let scene = Scene::new(&renderer)?;
    scene.draw(&renderer, &config)
}

fn main() {
    // Required to get stack traces in WASM.
    #[cfg(target_family = "wasm")]
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));

    // A failure leaves the canvas blank; the error was already logged where diagnosable.
    match run() {
        Ok(frame) => console_log!("Done! {:?}", frame),
        Err(e) => console_error!("{}", e),
    }
}
