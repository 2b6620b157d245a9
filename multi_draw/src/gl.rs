// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

pub(crate) use gl::*;

/// This module provides utilities to write code that is compatible with WebGL and WebGL2.
/// It acomplishes this by aliasing either WebGlRenderingContext or WebGl2RenderingContext to Gl
/// and aliasing the WebGL extension AngleInstancedArrays to Aia. The extension is replaced with
/// WebGl2RenderingContext if it's enabled.

/// `WEBGL_multi_draw` is exposed with the same api in WebGL/WebGL2.
pub(crate) type Mdw = web_sys::WebglMultiDraw;

#[cfg(not(feature = "webgl2"))]
#[macro_use]
#[allow(clippy::module_inception)]
mod gl {
    use wasm_bindgen::JsCast;
    use web_sys::{AngleInstancedArrays, WebGlRenderingContext};

    pub(crate) type Gl = WebGlRenderingContext;
    pub(crate) type Aia = AngleInstancedArrays;

    /// Name of context for get_context call.
    pub(crate) const GL_NAME: &str = "webgl";

    // Use a macro so concat!() works.
    macro_rules! gl_title {
        () => {
            "WebGL"
        };
    }

    pub(crate) trait GlCompat {
        /// Instanced multi-draw calls require `ANGLE_instanced_arrays` in WebGL.
        fn get_extension_aia(&self) -> Option<Aia>;
    }

    impl GlCompat for Gl {
        fn get_extension_aia(&self) -> Option<Aia> {
            self.get_extension("ANGLE_instanced_arrays")
                .ok()
                .flatten()
                .map(|e| e.unchecked_into::<Aia>())
        }
    }
}

#[cfg(feature = "webgl2")]
#[macro_use]
#[allow(clippy::module_inception)]
mod gl {
    use web_sys::WebGl2RenderingContext;

    pub(crate) type Gl = WebGl2RenderingContext;
    pub(crate) type Aia = Gl;

    pub(crate) const GL_NAME: &str = "webgl2";
    macro_rules! gl_title {
        () => {
            "WebGL2"
        };
    }

    pub(crate) trait GlCompat {
        fn get_extension_aia(&self) -> Option<Aia>;
    }

    impl GlCompat for Gl {
        fn get_extension_aia(&self) -> Option<Aia> {
            Some(self.clone())
        }
    }
}
