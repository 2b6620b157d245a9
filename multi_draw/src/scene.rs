// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::attribs::Attribs;
use crate::buffer::{IndexBuffer, VertexBuffer};
use crate::config::{ConfigError, SceneConfig};
use crate::context::GlContext;
use crate::draw::{dispatch, DrawError, DrawForm, MultiDrawBatch};
use crate::renderer::ContextError;
use crate::shader::{compile_shader, link_program, LinkedProgram, ShaderError, Stage};
use crate::vertex::Vertex;
use bytemuck::{Pod, Zeroable};
use glam::*;
use js_hooks::console_log;
use thiserror::Error;

/// Passes position and color through.
pub const VERTEX_SHADER: &str = "attribute vec4 apos;\
    attribute vec4 acolor;\
    varying vec4 color;\
    void main() {\
    color = acolor;\
    gl_Position = apos;\
    }";

/// Outputs the interpolated color.
pub const FRAGMENT_SHADER: &str = "precision lowp float;\
    varying vec4 color;\
    void main() {\
    gl_FragColor = color;\
    }";

/// Attribute names of [`VERTEX_SHADER`] and their slots, in [`ColoredVertex`] field order.
pub const ATTRIBUTES: [(&str, u32); 2] = [("apos", 0), ("acolor", 1)];

/// Background of the frame.
pub const CLEAR_COLOR: Vec4 = const_vec4!([0.3, 0.3, 0.3, 1.0]);

/// A vertex with interleaved position and color, 20 bytes.
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ColoredVertex {
    /// Normalized device coordinates.
    pub position: Vec2,
    /// Linear RGB.
    pub color: Vec3,
}

impl Vertex for ColoredVertex {
    fn bind_attribs<C: GlContext>(attribs: &mut Attribs<C>) {
        Vec2::bind_attribs(attribs);
        Vec3::bind_attribs(attribs);
    }
}

/// Red, green and blue corners of a triangle.
pub const TRIANGLE: [ColoredVertex; 3] = [
    ColoredVertex {
        position: const_vec2!([-0.6, -0.6]),
        color: const_vec3!([1.0, 0.0, 0.0]),
    },
    ColoredVertex {
        position: const_vec2!([0.6, -0.6]),
        color: const_vec3!([0.0, 1.0, 0.0]),
    },
    ColoredVertex {
        position: const_vec2!([0.0, 0.6]),
        color: const_vec3!([0.0, 0.0, 1.0]),
    },
];

/// Indices of [`TRIANGLE`].
pub const INDICES: [u16; 3] = [0, 1, 2];

/// Anything that can go wrong setting up or drawing a [`Scene`].
#[derive(Debug, Error)]
pub enum SceneError {
    /// See [`ConfigError`].
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// See [`ContextError`].
    #[error(transparent)]
    Context(#[from] ContextError),
    /// See [`DrawError`].
    #[error(transparent)]
    Draw(#[from] DrawError),
    /// See [`ShaderError`].
    #[error(transparent)]
    Shader(#[from] ShaderError),
}

/// A single triangle ready to be drawn once.
pub struct Scene<C: GlContext> {
    program: LinkedProgram<C>,
    vertices: VertexBuffer<C, ColoredVertex>,
    indices: IndexBuffer<C, u16>,
    multi_draw: Option<C::MultiDraw>,
}

/// What [`Scene::draw`] did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DrawnFrame {
    /// The form that was configured.
    pub requested: DrawForm,
    /// The form that was drawn, [`DrawForm::Plain`] if multi-draw is unavailable.
    pub drawn: DrawForm,
    /// Whether the frame was committed manually.
    pub committed: bool,
}

impl<C: GlContext> Scene<C> {
    /// Enables multi-draw, builds the shader program, uploads the triangle and describes its
    /// attributes.
    pub fn new(ctx: &C) -> Result<Self, SceneError> {
        Self::with_geometry(ctx, &TRIANGLE, &INDICES)
    }

    /// Like [`Scene::new`], but with other triangles. Plain and arrays forms draw every vertex
    /// in order, elements forms draw every index.
    pub fn with_geometry(
        ctx: &C,
        vertices: &[ColoredVertex],
        indices: &[u16],
    ) -> Result<Self, SceneError> {
        let multi_draw = ctx.enable_multi_draw();

        let vertex = compile_shader(ctx, Stage::Vertex, VERTEX_SHADER)?;
        let fragment = compile_shader(ctx, Stage::Fragment, FRAGMENT_SHADER)?;
        let program = link_program(ctx, vertex, fragment, &ATTRIBUTES)?;

        let vertices = VertexBuffer::new(ctx, vertices).ok_or(DrawError::CreateBuffer)?;
        vertices.bind(ctx).bind_attribs();

        let indices = IndexBuffer::new(ctx, indices).ok_or(DrawError::CreateBuffer)?;

        let [r, g, b, a] = CLEAR_COLOR.to_array();
        ctx.clear_color(r, g, b, a);

        Ok(Self {
            program,
            vertices,
            indices,
            multi_draw,
        })
    }

    /// Returns true if `WEBGL_multi_draw` was enabled.
    pub fn multi_draw_available(&self) -> bool {
        self.multi_draw.is_some()
    }

    /// The program the scene is drawn with.
    pub fn program(&self) -> &LinkedProgram<C> {
        &self.program
    }

    /// Clears and draws the triangle once with the configured form, then commits the frame
    /// if configured to.
    pub fn draw(self, ctx: &C, config: &SceneConfig) -> Result<DrawnFrame, SceneError> {
        let requested = config.draw_form;
        let drawn = {
            let _program = self.program.bind(ctx);
            let _indices = self.indices.bind(ctx);
            let vertex_count = self.vertices.len() as i32;
            let count = if requested.is_indexed() {
                self.indices.len() as i32
            } else {
                vertex_count
            };
            dispatch::<C, u16>(
                ctx,
                self.multi_draw.as_ref(),
                requested,
                &MultiDrawBatch::single(count),
                vertex_count,
            )?
        };

        if drawn != requested {
            console_log!("multi-draw unavailable, drew {} instead of {}", drawn, requested);
        }

        let committed = config.explicit_swap && ctx.commit_frame();
        if config.explicit_swap && !committed {
            console_log!("context presents frames implicitly, nothing committed");
        }

        Ok(DrawnFrame {
            requested,
            drawn,
            committed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::*;
    use crate::testing::{Command, RecordingContext};

    fn render(ctx: &RecordingContext, draw_form: DrawForm) -> DrawnFrame {
        let scene = Scene::new(ctx).unwrap();
        let config = SceneConfig {
            draw_form,
            explicit_swap: false,
        };
        let frame = scene.draw(ctx, &config).unwrap();
        assert!(ctx.errors().is_empty(), "{:?}", ctx.errors());
        frame
    }

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<ColoredVertex>(), 20);

        let ctx = RecordingContext::new();
        Scene::new(&ctx).unwrap();
        let commands = ctx.commands();
        for (index, size, offset) in [(0, 2, 0), (1, 3, 8)] {
            assert!(commands.contains(&Command::VertexAttribPointer {
                index,
                size,
                type_: Gl::FLOAT,
                normalized: false,
                stride: 20,
                offset,
            }));
            assert!(commands.contains(&Command::EnableVertexAttribArray(index)));
        }
    }

    #[test]
    fn test_attributes_resolve() {
        let ctx = RecordingContext::new();
        let scene = Scene::new(&ctx).unwrap();
        for (name, location) in ATTRIBUTES {
            assert_eq!(scene.program().attrib_location(&ctx, name), Some(location));
        }
    }

    #[test]
    fn test_fallback() {
        let ctx = RecordingContext::new();
        let frame = render(&ctx, DrawForm::MultiElements);
        assert_eq!(
            frame,
            DrawnFrame {
                requested: DrawForm::MultiElements,
                drawn: DrawForm::Plain,
                committed: false,
            }
        );
        let draws: Vec<_> = ctx.commands().into_iter().filter(Command::is_draw).collect();
        assert_eq!(
            draws,
            [Command::DrawArrays {
                mode: Gl::TRIANGLES,
                first: 0,
                count: 3
            }]
        );
    }

    #[test]
    fn test_commit_frame() {
        let ctx = RecordingContext::with_multi_draw();
        let scene = Scene::new(&ctx).unwrap();
        assert!(scene.multi_draw_available());
        let config = SceneConfig {
            draw_form: DrawForm::MultiArrays,
            explicit_swap: true,
        };
        let frame = scene.draw(&ctx, &config).unwrap();
        assert!(frame.committed);
        assert_eq!(ctx.commands().last(), Some(&Command::CommitFrame));
    }

    #[test]
    fn test_commit_ignored() {
        let ctx = RecordingContext::new();
        ctx.present_implicitly();
        let scene = Scene::new(&ctx).unwrap();
        let config = SceneConfig {
            draw_form: DrawForm::Plain,
            explicit_swap: true,
        };
        let frame = scene.draw(&ctx, &config).unwrap();
        assert!(!frame.committed);
        assert!(!ctx.commands().contains(&Command::CommitFrame));
    }

    #[test]
    fn test_batch_counts_match_buffer() {
        // Two triangles, only the second of which is indexed.
        let vertices = [TRIANGLE, TRIANGLE].concat();
        let indices = [3, 4, 5];

        for form in DrawForm::ALL.into_iter().filter(|f| f.is_batched()) {
            let ctx = RecordingContext::with_multi_draw();
            let scene = Scene::with_geometry(&ctx, &vertices, &indices).unwrap();
            let config = SceneConfig {
                draw_form: form,
                explicit_swap: false,
            };
            scene.draw(&ctx, &config).unwrap();
            assert!(ctx.errors().is_empty(), "{:?}", ctx.errors());

            let counts = ctx.commands().into_iter().find_map(|c| match c {
                Command::MultiDrawArrays { counts, .. }
                | Command::MultiDrawArraysInstanced { counts, .. }
                | Command::MultiDrawElements { counts, .. }
                | Command::MultiDrawElementsInstanced { counts, .. } => Some(counts),
                _ => None,
            });
            let expected = if form.is_indexed() { 3 } else { 6 };
            assert_eq!(counts, Some(vec![expected]), "{form}");
        }
    }

    #[test]
    fn test_triangle_colors() {
        let ctx = RecordingContext::new();
        render(&ctx, DrawForm::Plain);
        let frame = ctx.framebuffer();

        // Background.
        assert_eq!(frame.sample(vec2(-0.95, 0.95)), CLEAR_COLOR);
        assert_eq!(frame.sample(vec2(0.95, -0.95)), CLEAR_COLOR);

        // Near each corner its color dominates.
        for vertex in TRIANGLE {
            let inside = vertex.position * 0.9;
            let color = frame.sample(inside).truncate();
            let dominant = vertex.color.dot(color);
            assert!(dominant > 0.7, "{:?} at {:?}", color, inside);
            assert!((color.x + color.y + color.z - 1.0).abs() < 0.01, "{color:?}");
        }
    }

    #[test]
    fn test_forms_render_identically() {
        let reference = RecordingContext::new();
        render(&reference, DrawForm::Plain);

        for form in DrawForm::ALL.into_iter().filter(|f| f.is_batched()) {
            let ctx = RecordingContext::with_multi_draw();
            let frame = render(&ctx, form);
            assert_eq!(frame.drawn, form);
            assert!(
                ctx.framebuffer() == reference.framebuffer(),
                "{form} differs from plain"
            );
        }
    }

    #[test]
    fn test_shader_error_is_not_fatal() {
        let ctx = RecordingContext::new();
        ctx.fail_compilation(Stage::Fragment);
        match Scene::new(&ctx) {
            Err(SceneError::Shader(ShaderError::Compile { stage, log })) => {
                assert_eq!(stage, Stage::Fragment);
                assert!(!log.is_empty());
            }
            _ => panic!("expected compile error"),
        }
    }
}
