// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

#![warn(missing_docs)]
#![crate_name = "multi_draw"]

//! # Multi Draw
//!
//! [`multi_draw`][`crate`] draws a single triangle with
//! [WebGL](https://rustwasm.github.io/wasm-bindgen/api/web_sys/struct.WebGlRenderingContext.html)/
//! [WebGL2](https://rustwasm.github.io/wasm-bindgen/api/web_sys/struct.WebGl2RenderingContext.html),
//! using either a plain draw call or one of the batched draw calls of
//! [`WEBGL_multi_draw`](https://registry.khronos.org/webgl/extensions/WEBGL_multi_draw/).
//!
//! Every call takes an explicit [`GlContext`], which is either a [`Renderer`] attached to a
//! canvas or, for tests, a `RecordingContext`.

// Gl primitives should not escape this crate.
#[macro_use]
mod gl;

mod attribs;
mod buffer;
mod config;
mod context;
mod draw;
mod index;
mod renderer;
mod scene;
mod shader;
mod vertex;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Required to be public so Vertex can be implemented.
#[doc(hidden)]
pub use attribs::*;

// Re-export to provide a simpler api.
pub use buffer::*;
pub use config::*;
pub use context::*;
pub use draw::*;
pub use index::*;
pub use renderer::*;
pub use scene::*;
pub use shader::*;
pub use vertex::*;
