// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::context::GlContext;
use crate::gl::*;
use js_hooks::console_error;
use std::fmt;
use thiserror::Error;

/// A shader pipeline phase.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Runs once per vertex.
    Vertex,
    /// Runs once per fragment.
    Fragment,
}

impl Stage {
    pub(crate) const fn gl_enum(self) -> u32 {
        match self {
            Self::Vertex => Gl::VERTEX_SHADER,
            Self::Fragment => Gl::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// Why a [`LinkedProgram`] couldn't be built.
#[derive(Debug, Error)]
pub enum ShaderError {
    /// The context couldn't allocate a shader or program object (usually a lost context).
    #[error("could not create {0}")]
    Create(&'static str),
    /// A stage failed to compile. `log` is never empty.
    #[error("{stage} shader failed to compile: {log}")]
    Compile {
        /// The stage that failed.
        stage: Stage,
        /// Diagnostics reported by the compiler.
        log: String,
    },
    /// Compiled stages failed to link. `log` is never empty.
    #[error("program failed to link: {log}")]
    Link {
        /// Diagnostics of the program and both stages.
        log: String,
    },
}

/// A successfully compiled shader stage.
pub struct CompiledShader<C: GlContext> {
    stage: Stage,
    shader: C::Shader,
}

impl<C: GlContext> CompiledShader<C> {
    /// The stage this shader was compiled for.
    pub fn stage(&self) -> Stage {
        self.stage
    }
}

/// Trims trailing nulls some drivers leave in info logs.
fn trim_log(log: Option<String>) -> String {
    log.unwrap_or_default()
        .trim_end_matches('\x00')
        .trim_end()
        .to_owned()
}

/// Compiles the source of one `stage`. On failure the full compiler log is reported to the
/// console and returned, and the shader object is deleted.
pub fn compile_shader<C: GlContext>(
    ctx: &C,
    stage: Stage,
    source: &str,
) -> Result<CompiledShader<C>, ShaderError> {
    let shader = ctx
        .create_shader(stage.gl_enum())
        .ok_or(ShaderError::Create("shader"))?;
    ctx.shader_source(&shader, source);
    ctx.compile_shader(&shader);

    if ctx.compile_status(&shader) {
        return Ok(CompiledShader { stage, shader });
    }

    let mut log = trim_log(ctx.shader_info_log(&shader));
    if log.is_empty() {
        log = String::from("no diagnostics");
    }
    console_error!("{} shader: {}", stage, log);
    ctx.delete_shader(&shader);
    Err(ShaderError::Compile { stage, log })
}

/// A program linked from a vertex and a fragment [`CompiledShader`].
pub struct LinkedProgram<C: GlContext> {
    program: C::Program,
    vertex: CompiledShader<C>,
    fragment: CompiledShader<C>,
}

/// Links the two shaders to form a program. Every `(name, location)` in `attributes` is bound
/// before linking, since bindings only take effect when a program is linked.
pub fn link_program<C: GlContext>(
    ctx: &C,
    vertex: CompiledShader<C>,
    fragment: CompiledShader<C>,
    attributes: &[(&str, u32)],
) -> Result<LinkedProgram<C>, ShaderError> {
    debug_assert_eq!(vertex.stage, Stage::Vertex);
    debug_assert_eq!(fragment.stage, Stage::Fragment);

    let program = ctx
        .create_program()
        .ok_or(ShaderError::Create("program"))?;

    ctx.attach_shader(&program, &vertex.shader);
    ctx.attach_shader(&program, &fragment.shader);

    for &(name, location) in attributes {
        ctx.bind_attrib_location(&program, location, name);
    }

    ctx.link_program(&program);

    let linked = LinkedProgram {
        program,
        vertex,
        fragment,
    };
    linked.check_link_status(ctx)?;
    Ok(linked)
}

impl<C: GlContext> LinkedProgram<C> {
    fn check_link_status(&self, ctx: &C) -> Result<(), ShaderError> {
        if ctx.link_status(&self.program) {
            return Ok(());
        }

        fn fmt_err(e: String, prefix: &str) -> String {
            if e.is_empty() {
                e
            } else {
                format!("{prefix}{e}")
            }
        }

        let mut log = trim_log(ctx.program_info_log(&self.program));
        log += &fmt_err(trim_log(ctx.shader_info_log(&self.vertex.shader)), "\nvs: ");
        log += &fmt_err(trim_log(ctx.shader_info_log(&self.fragment.shader)), "\nfs: ");
        let log = match log.trim_start() {
            "" => String::from("no diagnostics"),
            trimmed => trimmed.to_owned(),
        };
        console_error!("link: {}", log);
        Err(ShaderError::Link { log })
    }

    /// The slot a named attribute was linked to, or None if it isn't active.
    pub fn attrib_location(&self, ctx: &C, name: &str) -> Option<u32> {
        u32::try_from(ctx.attrib_location(&self.program, name)).ok()
    }

    /// Makes the program current for subsequent draw calls.
    #[must_use]
    pub fn bind<'a>(&'a self, ctx: &'a C) -> ProgramBinding<'a, C> {
        ctx.use_program(Some(&self.program));
        ProgramBinding { ctx }
    }
}

/// A bound [`LinkedProgram`] that you can draw with.
pub struct ProgramBinding<'a, C: GlContext> {
    ctx: &'a C,
}

impl<'a, C: GlContext> Drop for ProgramBinding<'a, C> {
    fn drop(&mut self) {
        // Unbind (not required in release mode).
        #[cfg(debug_assertions)]
        self.ctx.use_program(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Command, RecordingContext};

    const VERTEX: &str = "attribute vec4 apos; attribute vec4 acolor; varying vec4 color; \
        void main() { color = acolor; gl_Position = apos; }";
    const FRAGMENT: &str = "precision lowp float; varying vec4 color; \
        void main() { gl_FragColor = color; }";

    fn build(ctx: &RecordingContext) -> LinkedProgram<RecordingContext> {
        let vs = compile_shader(ctx, Stage::Vertex, VERTEX).unwrap();
        let fs = compile_shader(ctx, Stage::Fragment, FRAGMENT).unwrap();
        link_program(ctx, vs, fs, &[("apos", 0), ("acolor", 1)]).unwrap()
    }

    #[test]
    fn test_attribute_locations() {
        let ctx = RecordingContext::new();
        let program = build(&ctx);
        assert_eq!(program.attrib_location(&ctx, "apos"), Some(0));
        assert_eq!(program.attrib_location(&ctx, "acolor"), Some(1));
        assert_eq!(program.attrib_location(&ctx, "missing"), None);

        let binding = program.bind(&ctx);
        assert!(ctx.errors().is_empty());
        drop(binding);
    }

    #[test]
    fn test_swapped_attribute_locations() {
        let ctx = RecordingContext::new();
        let vs = compile_shader(&ctx, Stage::Vertex, VERTEX).unwrap();
        let fs = compile_shader(&ctx, Stage::Fragment, FRAGMENT).unwrap();
        let program = link_program(&ctx, vs, fs, &[("apos", 1), ("acolor", 0)]).unwrap();
        assert_eq!(program.attrib_location(&ctx, "apos"), Some(1));
        assert_eq!(program.attrib_location(&ctx, "acolor"), Some(0));
    }

    #[test]
    fn test_binds_before_link() {
        let ctx = RecordingContext::new();
        build(&ctx);

        let commands = ctx.commands();
        let link = commands
            .iter()
            .position(|c| matches!(c, Command::LinkProgram { .. }))
            .unwrap();
        let binds: Vec<_> = commands
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, Command::BindAttribLocation { .. }))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(binds.len(), 2);
        assert!(binds.iter().all(|&i| i < link));
    }

    #[test]
    fn test_syntax_error() {
        let ctx = RecordingContext::new();
        let broken = "precision lowp float; varying vec4 color; void main() { gl_FragColor = color;";

        match compile_shader(&ctx, Stage::Fragment, broken) {
            Err(ShaderError::Compile { stage, log }) => {
                assert_eq!(stage, Stage::Fragment);
                assert!(!log.is_empty());
            }
            _ => panic!("expected compile error"),
        }

        // Failed shader is deleted.
        assert!(ctx
            .commands()
            .iter()
            .any(|c| matches!(c, Command::DeleteShader { .. })));
    }

    #[test]
    fn test_link_error() {
        let ctx = RecordingContext::new();
        // Compiles, but the fragment stage reads a varying the vertex stage never writes.
        let fragment = "precision lowp float; varying vec4 other; void main() { gl_FragColor = other; }";
        let vs = compile_shader(&ctx, Stage::Vertex, VERTEX).unwrap();
        let fs = compile_shader(&ctx, Stage::Fragment, fragment).unwrap();

        match link_program(&ctx, vs, fs, &[("apos", 0), ("acolor", 1)]) {
            Err(ShaderError::Link { log }) => assert!(log.contains("other"), "{log}"),
            _ => panic!("expected link error"),
        }
    }

    #[test]
    fn test_empty_compile_log() {
        let ctx = RecordingContext::new();
        ctx.fail_compilation_silently(Stage::Vertex);

        match compile_shader(&ctx, Stage::Vertex, VERTEX) {
            Err(ShaderError::Compile { log, .. }) => assert_eq!(log, "no diagnostics"),
            _ => panic!("expected compile error"),
        }
    }

    #[test]
    fn test_empty_link_log() {
        let ctx = RecordingContext::new();
        let vs = compile_shader(&ctx, Stage::Vertex, VERTEX).unwrap();
        let fs = compile_shader(&ctx, Stage::Fragment, FRAGMENT).unwrap();
        ctx.fail_linking_silently();

        match link_program(&ctx, vs, fs, &[("apos", 0), ("acolor", 1)]) {
            Err(ShaderError::Link { log }) => assert_eq!(log, "no diagnostics"),
            _ => panic!("expected link error"),
        }
    }
}
