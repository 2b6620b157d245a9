// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::context::{GlContext, MultiDrawCompat, MULTI_DRAW_EXTENSION};
use crate::gl::*;
use js_hooks::{console_log, error_message};
use js_sys::{Array, Object};
use linear_map::LinearMap;
use std::cell::RefCell;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{WebGlBuffer, WebGlProgram, WebGlShader};

/// Failure to obtain a context from the canvas.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The canvas couldn't be found.
    #[error("{0}")]
    Canvas(String),
    /// The browser refused to create a context.
    #[error("{0}")]
    Create(String),
    /// The browser doesn't support the context type.
    #[error("{0} unsupported")]
    Unsupported(&'static str),
}

/// Attributes requested when creating a [`Renderer`].
#[derive(Copy, Clone, Debug, Default)]
pub struct ContextAttributes {
    /// Multisample the default framebuffer.
    pub antialias: bool,
    /// Present frames only when [`GlContext::commit_frame`] is called. The drawing buffer is
    /// preserved so it isn't replaced before then.
    pub explicit_swap: bool,
}

/// A
/// [WebGL](https://rustwasm.github.io/wasm-bindgen/api/web_sys/struct.WebGlRenderingContext.html)/
/// [WebGL2](https://rustwasm.github.io/wasm-bindgen/api/web_sys/struct.WebGl2RenderingContext.html)
/// context attached to a canvas.
pub struct Renderer {
    /// WebGL context.
    pub(crate) gl: Gl,
    /// Extensions by name, None if unavailable. Few are ever requested.
    extensions: RefCell<LinearMap<&'static str, Option<Object>>>,
    explicit_swap: bool,
}

impl Renderer {
    /// Creates a new WebGL/WebGL2 context, attaching it to the canvas matching `selector`.
    pub fn new(selector: &str, attributes: ContextAttributes) -> Result<Self, ContextError> {
        let canvas = js_hooks::canvas(selector).map_err(ContextError::Canvas)?;
        let ContextAttributes {
            antialias,
            explicit_swap,
        } = attributes;
        let options = js_sys::JSON::parse(&format!(
            r##"{{
            "alpha": false,
            "antialias": {antialias},
            "powerPreference": "default",
            "premultipliedAlpha": true,
            "preserveDrawingBuffer": {explicit_swap}
        }}"##
        ))
        .map_err(|e| ContextError::Create(error_message(&e).unwrap_or_default()))?;

        // See: https://developer.mozilla.org/en-US/docs/Web/API/HTMLCanvasElement/getContext
        let gl = canvas
            .get_context_with_context_options(GL_NAME, &options)
            .map_err(|e| {
                ContextError::Create(
                    error_message(&e)
                        .unwrap_or_else(|| concat!("Error initializing ", gl_title!()).into()),
                )
            })?
            .ok_or(ContextError::Unsupported(gl_title!()))?
            .dyn_into::<Gl>()
            .map_err(|_| ContextError::Unsupported(gl_title!()))?;

        Ok(Self {
            gl,
            extensions: Default::default(),
            explicit_swap,
        })
    }

    /// Gets the (cached) extension object of a named extension.
    fn extension(&self, name: &'static str) -> Option<Object> {
        self.extensions
            .borrow_mut()
            .entry(name)
            .or_insert_with(|| {
                let extension = self.gl.get_extension(name).ok().flatten();
                if extension.is_none() {
                    console_log!("{} unavailable", name);
                }
                extension
            })
            .clone()
    }
}

impl GlContext for Renderer {
    type Shader = WebGlShader;
    type Program = WebGlProgram;
    type Buffer = WebGlBuffer;
    type MultiDraw = MultiDraw;

    fn enable_multi_draw(&self) -> Option<MultiDraw> {
        let extension = self
            .extension(MULTI_DRAW_EXTENSION)?
            .unchecked_into::<Mdw>();

        // Instanced variants are only valid with instancing enabled.
        let instanced = cfg!(feature = "webgl2") || self.gl.get_extension_aia().is_some();
        if !instanced {
            console_log!("instanced multi-draw unavailable");
        }

        Some(MultiDraw {
            extension,
            instanced,
        })
    }

    fn create_shader(&self, type_: u32) -> Option<WebGlShader> {
        self.gl.create_shader(type_)
    }

    fn shader_source(&self, shader: &WebGlShader, source: &str) {
        self.gl.shader_source(shader, source);
    }

    fn compile_shader(&self, shader: &WebGlShader) {
        self.gl.compile_shader(shader);
    }

    fn compile_status(&self, shader: &WebGlShader) -> bool {
        self.gl
            .get_shader_parameter(shader, Gl::COMPILE_STATUS)
            .as_bool()
            .unwrap_or(false)
    }

    fn shader_info_log(&self, shader: &WebGlShader) -> Option<String> {
        self.gl.get_shader_info_log(shader)
    }

    fn delete_shader(&self, shader: &WebGlShader) {
        self.gl.delete_shader(Some(shader));
    }

    fn create_program(&self) -> Option<WebGlProgram> {
        self.gl.create_program()
    }

    fn attach_shader(&self, program: &WebGlProgram, shader: &WebGlShader) {
        self.gl.attach_shader(program, shader);
    }

    fn bind_attrib_location(&self, program: &WebGlProgram, index: u32, name: &str) {
        self.gl.bind_attrib_location(program, index, name);
    }

    fn link_program(&self, program: &WebGlProgram) {
        self.gl.link_program(program);
    }

    fn link_status(&self, program: &WebGlProgram) -> bool {
        self.gl
            .get_program_parameter(program, Gl::LINK_STATUS)
            .as_bool()
            .unwrap_or(false)
    }

    fn program_info_log(&self, program: &WebGlProgram) -> Option<String> {
        self.gl.get_program_info_log(program)
    }

    fn attrib_location(&self, program: &WebGlProgram, name: &str) -> i32 {
        self.gl.get_attrib_location(program, name)
    }

    fn use_program(&self, program: Option<&WebGlProgram>) {
        self.gl.use_program(program);
    }

    fn create_buffer(&self) -> Option<WebGlBuffer> {
        self.gl.create_buffer()
    }

    fn bind_buffer(&self, target: u32, buffer: Option<&WebGlBuffer>) {
        self.gl.bind_buffer(target, buffer);
    }

    fn buffer_data(&self, target: u32, data: &[u8], usage: u32) {
        self.gl.buffer_data_with_u8_array(target, data, usage);
    }

    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        type_: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        self.gl
            .vertex_attrib_pointer_with_i32(index, size, type_, normalized, stride, offset);
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.gl.enable_vertex_attrib_array(index);
    }

    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.gl.clear_color(red, green, blue, alpha);
    }

    fn clear(&self, mask: u32) {
        self.gl.clear(mask);
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        self.gl.draw_arrays(mode, first, count);
    }

    fn commit_frame(&self) -> bool {
        // With a preserved drawing buffer the browser composites whatever was flushed last.
        if self.explicit_swap {
            self.gl.flush();
        }
        self.explicit_swap
    }
}

/// Converts a slice to a JavaScript `sequence<GLint>`.
fn int32_list(values: &[i32]) -> Array {
    values.iter().copied().map(JsValue::from).collect()
}

/// `WEBGL_multi_draw` of a [`Renderer`].
pub struct MultiDraw {
    extension: Mdw,
    instanced: bool,
}

impl MultiDrawCompat for MultiDraw {
    fn instanced(&self) -> bool {
        self.instanced
    }

    fn multi_draw_arrays(&self, mode: u32, firsts: &[i32], counts: &[i32]) {
        self.extension.multi_draw_arrays_webgl_with_i32_sequence_and_i32_sequence(
            mode,
            &int32_list(firsts),
            0,
            &int32_list(counts),
            0,
            counts.len() as i32,
        );
    }

    fn multi_draw_arrays_instanced(
        &self,
        mode: u32,
        firsts: &[i32],
        counts: &[i32],
        instance_counts: &[i32],
    ) {
        self.extension.multi_draw_arrays_instanced_webgl_with_i32_sequence_and_i32_sequence_and_i32_sequence(
            mode,
            &int32_list(firsts),
            0,
            &int32_list(counts),
            0,
            &int32_list(instance_counts),
            0,
            counts.len() as i32,
        );
    }

    fn multi_draw_elements(&self, mode: u32, counts: &[i32], type_: u32, offsets: &[i32]) {
        self.extension.multi_draw_elements_webgl_with_i32_sequence_and_i32_sequence(
            mode,
            &int32_list(counts),
            0,
            type_,
            &int32_list(offsets),
            0,
            counts.len() as i32,
        );
    }

    fn multi_draw_elements_instanced(
        &self,
        mode: u32,
        counts: &[i32],
        type_: u32,
        offsets: &[i32],
        instance_counts: &[i32],
    ) {
        self.extension.multi_draw_elements_instanced_webgl_with_i32_sequence_and_i32_sequence_and_i32_sequence(
            mode,
            &int32_list(counts),
            0,
            type_,
            &int32_list(offsets),
            0,
            &int32_list(instance_counts),
            0,
            counts.len() as i32,
        );
    }
}
