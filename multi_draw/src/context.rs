// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

/// Name of the extension that provides batched multi-primitive draw calls.
pub const MULTI_DRAW_EXTENSION: &str = "WEBGL_multi_draw";

/// The subset of a WebGL context used to build a program and draw a scene. Every operation
/// receives the context explicitly instead of relying on a global current context.
///
/// Enum parameters (`type_`, `target`, `mode`, ...) take the same values as WebGL.
pub trait GlContext {
    /// Compiled (or failed) shader object.
    type Shader;
    /// Program object.
    type Program;
    /// Buffer object.
    type Buffer;
    /// Enabled `WEBGL_multi_draw` extension.
    type MultiDraw: MultiDrawCompat;

    /// Enables [`MULTI_DRAW_EXTENSION`], returning None if it's unavailable. Instancing may
    /// still be unavailable (see [`MultiDrawCompat::instanced`]).
    fn enable_multi_draw(&self) -> Option<Self::MultiDraw>;

    /// Returns None if the context is lost.
    fn create_shader(&self, type_: u32) -> Option<Self::Shader>;
    /// Replaces the source of `shader`.
    fn shader_source(&self, shader: &Self::Shader, source: &str);
    /// Compiles `shader`, which may fail silently (see [`GlContext::compile_status`]).
    fn compile_shader(&self, shader: &Self::Shader);
    /// Returns true if the last compilation of `shader` succeeded.
    fn compile_status(&self, shader: &Self::Shader) -> bool;
    /// Diagnostics of the last compilation of `shader`.
    fn shader_info_log(&self, shader: &Self::Shader) -> Option<String>;
    /// Flags `shader` for deletion.
    fn delete_shader(&self, shader: &Self::Shader);

    /// Returns None if the context is lost.
    fn create_program(&self) -> Option<Self::Program>;
    /// Attaches `shader` to `program`.
    fn attach_shader(&self, program: &Self::Program, shader: &Self::Shader);
    /// Takes effect on the next [`GlContext::link_program`].
    fn bind_attrib_location(&self, program: &Self::Program, index: u32, name: &str);
    /// Links `program`, which may fail silently (see [`GlContext::link_status`]).
    fn link_program(&self, program: &Self::Program);
    /// Returns true if the last link of `program` succeeded.
    fn link_status(&self, program: &Self::Program) -> bool;
    /// Diagnostics of the last link of `program`.
    fn program_info_log(&self, program: &Self::Program) -> Option<String>;
    /// Returns -1 if `name` isn't an active attribute of `program`.
    fn attrib_location(&self, program: &Self::Program, name: &str) -> i32;
    /// Makes `program` (or nothing) current for subsequent draw calls.
    fn use_program(&self, program: Option<&Self::Program>);

    /// Returns None if the context is lost.
    fn create_buffer(&self) -> Option<Self::Buffer>;
    /// Binds `buffer` (or nothing) to `target`.
    fn bind_buffer(&self, target: u32, buffer: Option<&Self::Buffer>);
    /// Uploads `data` to the buffer bound to `target`.
    fn buffer_data(&self, target: u32, data: &[u8], usage: u32);

    /// Describes attribute `index` as read from the currently bound array buffer.
    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        type_: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    /// Enables attribute `index` for subsequent draw calls.
    fn enable_vertex_attrib_array(&self, index: u32);

    /// Sets the color used by [`GlContext::clear`].
    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32);
    /// Clears the buffers in `mask`.
    fn clear(&self, mask: u32);
    /// Draws `count` vertices starting at `first`.
    fn draw_arrays(&self, mode: u32, first: i32, count: i32);

    /// Signals that the frame is complete when presentation is manual. Returns false if the
    /// context presents frames on its own, in which case nothing happens.
    fn commit_frame(&self) -> bool;
}

/// Entry points of `WEBGL_multi_draw`. The length of the slices is the draw count, so all
/// slices passed to one call must have the same length.
pub trait MultiDrawCompat {
    /// Returns true if the instanced entry points may be called. WebGL1 needs
    /// `ANGLE_instanced_arrays` for them.
    fn instanced(&self) -> bool;
    /// One [`GlContext::draw_arrays`] per element of `firsts`/`counts`.
    fn multi_draw_arrays(&self, mode: u32, firsts: &[i32], counts: &[i32]);
    /// Like [`MultiDrawCompat::multi_draw_arrays`], with instance counts.
    fn multi_draw_arrays_instanced(
        &self,
        mode: u32,
        firsts: &[i32],
        counts: &[i32],
        instance_counts: &[i32],
    );
    /// One indexed draw per element of `counts`/`offsets` (offsets in bytes).
    fn multi_draw_elements(&self, mode: u32, counts: &[i32], type_: u32, offsets: &[i32]);
    /// Like [`MultiDrawCompat::multi_draw_elements`], with instance counts.
    fn multi_draw_elements_instanced(
        &self,
        mode: u32,
        counts: &[i32],
        type_: u32,
        offsets: &[i32],
        instance_counts: &[i32],
    );
}
