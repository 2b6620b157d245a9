// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! An in-memory [`GlContext`] for testing code that draws without a browser.

mod raster;

pub use raster::*;

use crate::context::{GlContext, MultiDrawCompat, MULTI_DRAW_EXTENSION};
use crate::gl::*;
use crate::shader::Stage;
use glam::*;
use linear_map::LinearMap;
use std::cell::RefCell;
use std::mem::size_of;
use std::rc::Rc;

/// WebGL guarantees at least this many attribute slots.
const MAX_VERTEX_ATTRIBS: usize = 16;

/// A command submitted to a [`RecordingContext`]. Queries aren't recorded.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum Command {
    EnableExtension {
        name: &'static str,
        available: bool,
    },
    CreateShader {
        shader: u32,
        type_: u32,
    },
    ShaderSource {
        shader: u32,
    },
    CompileShader {
        shader: u32,
    },
    DeleteShader {
        shader: u32,
    },
    CreateProgram {
        program: u32,
    },
    AttachShader {
        program: u32,
        shader: u32,
    },
    BindAttribLocation {
        program: u32,
        index: u32,
        name: String,
    },
    LinkProgram {
        program: u32,
    },
    UseProgram(Option<u32>),
    CreateBuffer(u32),
    BindBuffer {
        target: u32,
        buffer: Option<u32>,
    },
    BufferData {
        target: u32,
        bytes: usize,
        usage: u32,
    },
    VertexAttribPointer {
        index: u32,
        size: i32,
        type_: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    },
    EnableVertexAttribArray(u32),
    ClearColor([f32; 4]),
    Clear(u32),
    DrawArrays {
        mode: u32,
        first: i32,
        count: i32,
    },
    MultiDrawArrays {
        mode: u32,
        firsts: Vec<i32>,
        counts: Vec<i32>,
    },
    MultiDrawArraysInstanced {
        mode: u32,
        firsts: Vec<i32>,
        counts: Vec<i32>,
        instance_counts: Vec<i32>,
    },
    MultiDrawElements {
        mode: u32,
        counts: Vec<i32>,
        type_: u32,
        offsets: Vec<i32>,
    },
    MultiDrawElementsInstanced {
        mode: u32,
        counts: Vec<i32>,
        type_: u32,
        offsets: Vec<i32>,
        instance_counts: Vec<i32>,
    },
    CommitFrame,
}

impl Command {
    /// Returns true if the command draws primitives.
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Self::DrawArrays { .. }
                | Self::MultiDrawArrays { .. }
                | Self::MultiDrawArraysInstanced { .. }
                | Self::MultiDrawElements { .. }
                | Self::MultiDrawElementsInstanced { .. }
        )
    }
}

/// Declarations and pass-through assignments of a shader.
#[derive(Default)]
struct Parsed {
    attributes: Vec<String>,
    varyings: Vec<String>,
    /// `(lhs, rhs)` of every `lhs = rhs;`.
    assignments: Vec<(String, String)>,
}

impl Parsed {
    fn assigned(&self, lhs: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|(l, _)| l == lhs)
            .map(|(_, r)| r.as_str())
    }
}

/// Validates a shader that only declares attributes/varyings and assigns identifiers to
/// each other. Errors mimic the format of ANGLE's logs.
fn parse_shader(source: &str) -> Result<Parsed, String> {
    let mut open = Vec::new();
    for c in source.chars() {
        match c {
            '{' | '(' => open.push(c),
            '}' | ')' => {
                let expected = if c == '}' { '{' } else { '(' };
                if open.pop() != Some(expected) {
                    return Err(format!("ERROR: 0:1: '{c}' : syntax error"));
                }
            }
            _ => {}
        }
    }
    if !open.is_empty() {
        return Err("ERROR: 0:1: '' : syntax error: unexpected end of file".into());
    }
    if !source.contains("void main()") {
        return Err("ERROR: 0:1: 'main' : missing main function".into());
    }

    let mut parsed = Parsed::default();
    for statement in source.split(|c| matches!(c, ';' | '{' | '}')) {
        let statement = statement.trim();
        if let Some((lhs, rhs)) = statement.split_once('=') {
            let (lhs, rhs) = (lhs.trim(), rhs.trim());
            let declared =
                |name: &str| parsed.attributes.iter().chain(&parsed.varyings).any(|n| n == name);
            if !declared(rhs) {
                return Err(format!("ERROR: 0:1: '{rhs}' : undeclared identifier"));
            }
            if !(declared(lhs) || lhs.starts_with("gl_")) {
                return Err(format!("ERROR: 0:1: '{lhs}' : undeclared identifier"));
            }
            parsed.assignments.push((lhs.to_owned(), rhs.to_owned()));
            continue;
        }

        let tokens: Vec<_> = statement.split_ascii_whitespace().collect();
        match tokens.as_slice() {
            ["attribute", _, name] => parsed.attributes.push((*name).to_owned()),
            ["varying", _, name] => parsed.varyings.push((*name).to_owned()),
            _ => {}
        }
    }
    Ok(parsed)
}

struct ShaderObject {
    stage: Stage,
    source: String,
    compiled: bool,
    log: String,
}

/// Result of linking a pass-through program.
struct Linked {
    locations: LinearMap<String, u32>,
    position: u32,
    color: Option<u32>,
}

#[derive(Default)]
struct ProgramObject {
    shaders: Vec<u32>,
    /// Bindings that take effect at the next link.
    bindings: LinearMap<String, u32>,
    linked: Option<Linked>,
    log: String,
}

#[derive(Copy, Clone)]
struct AttribPointer {
    buffer: u32,
    size: i32,
    stride: i32,
    offset: i32,
}

#[derive(Copy, Clone, Default)]
struct AttribState {
    pointer: Option<AttribPointer>,
    enabled: bool,
}

#[derive(Default)]
struct State {
    commands: Vec<Command>,
    errors: Vec<u32>,
    next_name: u32,
    multi_draw: bool,
    instancing: bool,
    failing_stage: Option<Stage>,
    failing_link: bool,
    /// Failures leave an empty info log.
    silent_failures: bool,
    implicit_presentation: bool,
    shaders: LinearMap<u32, ShaderObject>,
    programs: LinearMap<u32, ProgramObject>,
    buffers: LinearMap<u32, Vec<u8>>,
    array_buffer: Option<u32>,
    element_buffer: Option<u32>,
    attribs: [AttribState; MAX_VERTEX_ATTRIBS],
    current_program: Option<u32>,
    clear_color: Vec4,
    framebuffer: Framebuffer,
}

impl State {
    fn name(&mut self) -> u32 {
        self.next_name += 1;
        self.next_name
    }

    fn error(&mut self, error: u32) {
        self.errors.push(error);
    }

    fn compile(&mut self, shader: u32) {
        let (failing_stage, silent) = (self.failing_stage, self.silent_failures);
        let Some(object) = self.shaders.get_mut(&shader) else {
            return self.error(Gl::INVALID_VALUE);
        };

        let result = if failing_stage == Some(object.stage) {
            Err(match silent {
                true => String::new(),
                false => String::from("ERROR: 0:1: compilation disabled for testing"),
            })
        } else {
            parse_shader(&object.source).map(drop)
        };
        object.compiled = result.is_ok();
        object.log = result.err().unwrap_or_default();
    }

    fn link(&mut self, program: u32) {
        let result = if self.failing_link {
            Err(match self.silent_failures {
                true => String::new(),
                false => String::from("ERROR: linking disabled for testing"),
            })
        } else {
            self.try_link(program)
        };
        let Some(object) = self.programs.get_mut(&program) else {
            return self.error(Gl::INVALID_VALUE);
        };
        match result {
            Ok(linked) => {
                object.linked = Some(linked);
                object.log.clear();
            }
            Err(log) => {
                object.linked = None;
                object.log = log;
            }
        }
    }

    fn try_link(&self, program: u32) -> Result<Linked, String> {
        let object = self.programs.get(&program).ok_or("no program")?;
        let stage = |stage: Stage| {
            object
                .shaders
                .iter()
                .filter_map(|s| self.shaders.get(s))
                .find(|s| s.stage == stage && s.compiled)
                .ok_or_else(|| format!("ERROR: no compiled {stage} shader attached"))
                .and_then(|s| parse_shader(&s.source))
        };
        let vertex = stage(Stage::Vertex)?;
        let fragment = stage(Stage::Fragment)?;

        let position = vertex
            .assigned("gl_Position")
            .filter(|rhs| vertex.attributes.iter().any(|a| a == rhs))
            .ok_or("ERROR: gl_Position must be assigned an attribute")?;

        let color = match fragment.assigned("gl_FragColor") {
            Some(varying) => {
                let attribute = vertex.assigned(varying).ok_or_else(|| {
                    format!("ERROR: varying '{varying}' is not written by the vertex shader")
                })?;
                Some(attribute)
            }
            None => None,
        };

        // Bound attributes first, the rest get the lowest free slots in declaration order.
        let mut locations = LinearMap::new();
        for name in &vertex.attributes {
            if let Some(&location) = object.bindings.get(name) {
                locations.insert(name.clone(), location);
            }
        }
        for name in &vertex.attributes {
            if !locations.contains_key(name) {
                let free = (0..MAX_VERTEX_ATTRIBS as u32)
                    .find(|l| !locations.values().any(|v| v == l))
                    .ok_or("ERROR: too many attributes")?;
                locations.insert(name.clone(), free);
            }
        }

        let location = |name: &str| locations.get(name).copied();
        Ok(Linked {
            position: location(position).ok_or("ERROR: gl_Position has no location")?,
            color: color.and_then(location),
            locations,
        })
    }

    fn linked_program(&self) -> Option<&Linked> {
        self.programs.get(&self.current_program?)?.linked.as_ref()
    }

    /// Reads `size` floats of vertex `vertex` through attribute `location`, defaulting
    /// missing components like WebGL.
    fn fetch(&self, location: u32, vertex: u32) -> Option<Vec4> {
        let mut value = [0.0f32, 0.0, 0.0, 1.0];
        let state = self.attribs.get(location as usize)?;
        if !state.enabled {
            return Some(Vec4::from(value));
        }
        let pointer = state.pointer?;
        let bytes = self.buffers.get(&pointer.buffer)?;

        let stride = if pointer.stride == 0 {
            pointer.size as usize * size_of::<f32>()
        } else {
            pointer.stride as usize
        };
        let start = pointer.offset as usize + vertex as usize * stride;
        for (i, component) in value.iter_mut().take(pointer.size as usize).enumerate() {
            let at = start + i * size_of::<f32>();
            *component = bytemuck::pod_read_unaligned(bytes.get(at..at + size_of::<f32>())?);
        }
        Some(Vec4::from(value))
    }

    /// Runs the pass-through pipeline on `vertices`, drawing nothing if any is invalid.
    fn draw(&mut self, mode: u32, vertices: impl IntoIterator<Item = u32>) {
        if mode != Gl::TRIANGLES {
            return self.error(Gl::INVALID_ENUM);
        }
        let Some(linked) = self.linked_program() else {
            return self.error(Gl::INVALID_OPERATION);
        };
        let (position, color) = (linked.position, linked.color);

        let fetched: Option<Vec<_>> = vertices
            .into_iter()
            .map(|v| {
                Some(RasterVertex {
                    position: self.fetch(position, v)?,
                    color: match color {
                        Some(color) => self.fetch(color, v)?,
                        None => Vec4::ONE,
                    },
                })
            })
            .collect();
        let Some(fetched) = fetched else {
            return self.error(Gl::INVALID_OPERATION);
        };

        for triangle in fetched.chunks_exact(3) {
            self.framebuffer
                .fill_triangle([triangle[0], triangle[1], triangle[2]]);
        }
    }

    fn draw_arrays(&mut self, mode: u32, first: i32, count: i32, instances: i32) {
        if first < 0 || count < 0 || instances < 0 {
            return self.error(Gl::INVALID_VALUE);
        }
        for _ in 0..instances {
            self.draw(mode, first as u32..(first + count) as u32);
        }
    }

    fn draw_elements(&mut self, mode: u32, count: i32, type_: u32, offset: i32, instances: i32) {
        if count < 0 || offset < 0 || instances < 0 {
            return self.error(Gl::INVALID_VALUE);
        }
        let size = match type_ {
            Gl::UNSIGNED_BYTE => 1,
            Gl::UNSIGNED_SHORT => 2,
            Gl::UNSIGNED_INT => 4,
            _ => return self.error(Gl::INVALID_ENUM),
        };
        if offset as usize % size != 0 {
            return self.error(Gl::INVALID_OPERATION);
        }

        let bytes = self.element_buffer.and_then(|b| self.buffers.get(&b));
        let indices: Option<Vec<u32>> = (0..count as usize)
            .map(|i| {
                let at = offset as usize + i * size;
                let index = bytes?.get(at..at + size)?;
                Some(match size {
                    1 => index[0] as u32,
                    2 => bytemuck::pod_read_unaligned::<u16>(index) as u32,
                    _ => bytemuck::pod_read_unaligned::<u32>(index),
                })
            })
            .collect();
        let Some(indices) = indices else {
            return self.error(Gl::INVALID_OPERATION);
        };

        for _ in 0..instances {
            self.draw(mode, indices.iter().copied());
        }
    }
}

/// A [`GlContext`] that records commands and renders them in software.
///
/// Shaders are validated lexically and may only declare `attribute`s and `varying`s and assign
/// them to each other, `gl_Position` and `gl_FragColor`.
#[derive(Clone, Default)]
pub struct RecordingContext(Rc<RefCell<State>>);

impl RecordingContext {
    /// A context without `WEBGL_multi_draw`.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context with `WEBGL_multi_draw`.
    pub fn with_multi_draw() -> Self {
        let ctx = Self::with_multi_draw_without_instancing();
        ctx.0.borrow_mut().instancing = true;
        ctx
    }

    /// A context with `WEBGL_multi_draw` but without instancing, like WebGL1 without
    /// `ANGLE_instanced_arrays`.
    pub fn with_multi_draw_without_instancing() -> Self {
        let ctx = Self::new();
        ctx.0.borrow_mut().multi_draw = true;
        ctx
    }

    /// Makes every subsequent compilation of `stage` fail.
    pub fn fail_compilation(&self, stage: Stage) {
        self.0.borrow_mut().failing_stage = Some(stage);
    }

    /// Makes every subsequent compilation of `stage` fail with an empty info log.
    pub fn fail_compilation_silently(&self, stage: Stage) {
        let mut state = self.0.borrow_mut();
        state.failing_stage = Some(stage);
        state.silent_failures = true;
    }

    /// Makes every subsequent link fail with an empty info log.
    pub fn fail_linking_silently(&self) {
        let mut state = self.0.borrow_mut();
        state.failing_link = true;
        state.silent_failures = true;
    }

    /// Presents frames on its own, so [`GlContext::commit_frame`] does nothing.
    pub fn present_implicitly(&self) {
        self.0.borrow_mut().implicit_presentation = true;
    }

    /// Every command so far.
    pub fn commands(&self) -> Vec<Command> {
        self.0.borrow().commands.clone()
    }

    /// Every error (e.g. `INVALID_OPERATION`) generated so far.
    pub fn errors(&self) -> Vec<u32> {
        self.0.borrow().errors.clone()
    }

    /// The color buffer.
    pub fn framebuffer(&self) -> Framebuffer {
        self.0.borrow().framebuffer.clone()
    }

    fn record(&self, command: Command) -> std::cell::RefMut<'_, State> {
        let mut state = self.0.borrow_mut();
        state.commands.push(command);
        state
    }
}

impl GlContext for RecordingContext {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type MultiDraw = RecordingMultiDraw;

    fn enable_multi_draw(&self) -> Option<RecordingMultiDraw> {
        let available = self.0.borrow().multi_draw;
        self.record(Command::EnableExtension {
            name: MULTI_DRAW_EXTENSION,
            available,
        });
        available.then(|| RecordingMultiDraw(Rc::clone(&self.0)))
    }

    fn create_shader(&self, type_: u32) -> Option<u32> {
        let stage = match type_ {
            Gl::VERTEX_SHADER => Stage::Vertex,
            Gl::FRAGMENT_SHADER => Stage::Fragment,
            _ => {
                self.0.borrow_mut().error(Gl::INVALID_ENUM);
                return None;
            }
        };
        let mut state = self.0.borrow_mut();
        let shader = state.name();
        state.shaders.insert(
            shader,
            ShaderObject {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        state.commands.push(Command::CreateShader { shader, type_ });
        Some(shader)
    }

    fn shader_source(&self, shader: &u32, source: &str) {
        let mut state = self.record(Command::ShaderSource { shader: *shader });
        match state.shaders.get_mut(shader) {
            Some(object) => object.source = source.to_owned(),
            None => state.error(Gl::INVALID_VALUE),
        }
    }

    fn compile_shader(&self, shader: &u32) {
        self.record(Command::CompileShader { shader: *shader })
            .compile(*shader);
    }

    fn compile_status(&self, shader: &u32) -> bool {
        self.0
            .borrow()
            .shaders
            .get(shader)
            .map_or(false, |s| s.compiled)
    }

    fn shader_info_log(&self, shader: &u32) -> Option<String> {
        self.0.borrow().shaders.get(shader).map(|s| s.log.clone())
    }

    fn delete_shader(&self, shader: &u32) {
        // Deletion is deferred while attached.
        let mut state = self.record(Command::DeleteShader { shader: *shader });
        let attached = state
            .programs
            .values()
            .any(|p| p.shaders.contains(shader));
        if !attached {
            state.shaders.remove(shader);
        }
    }

    fn create_program(&self) -> Option<u32> {
        let mut state = self.0.borrow_mut();
        let program = state.name();
        state.programs.insert(program, ProgramObject::default());
        state.commands.push(Command::CreateProgram { program });
        Some(program)
    }

    fn attach_shader(&self, program: &u32, shader: &u32) {
        let mut state = self.record(Command::AttachShader {
            program: *program,
            shader: *shader,
        });
        if !state.shaders.contains_key(shader) {
            return state.error(Gl::INVALID_VALUE);
        }
        match state.programs.get_mut(program) {
            Some(object) => object.shaders.push(*shader),
            None => state.error(Gl::INVALID_VALUE),
        }
    }

    fn bind_attrib_location(&self, program: &u32, index: u32, name: &str) {
        let mut state = self.record(Command::BindAttribLocation {
            program: *program,
            index,
            name: name.to_owned(),
        });
        match state.programs.get_mut(program) {
            Some(object) => {
                object.bindings.insert(name.to_owned(), index);
            }
            None => state.error(Gl::INVALID_VALUE),
        }
    }

    fn link_program(&self, program: &u32) {
        self.record(Command::LinkProgram { program: *program })
            .link(*program);
    }

    fn link_status(&self, program: &u32) -> bool {
        self.0
            .borrow()
            .programs
            .get(program)
            .map_or(false, |p| p.linked.is_some())
    }

    fn program_info_log(&self, program: &u32) -> Option<String> {
        self.0.borrow().programs.get(program).map(|p| p.log.clone())
    }

    fn attrib_location(&self, program: &u32, name: &str) -> i32 {
        let mut state = self.0.borrow_mut();
        let location = state
            .programs
            .get(program)
            .and_then(|p| p.linked.as_ref())
            .map(|linked| linked.locations.get(name).map_or(-1, |&l| l as i32));
        location.unwrap_or_else(|| {
            state.error(Gl::INVALID_OPERATION);
            -1
        })
    }

    fn use_program(&self, program: Option<&u32>) {
        let mut state = self.record(Command::UseProgram(program.copied()));
        if let Some(program) = program {
            let linked = state
                .programs
                .get(program)
                .map_or(false, |p| p.linked.is_some());
            if !linked {
                return state.error(Gl::INVALID_OPERATION);
            }
        }
        state.current_program = program.copied();
    }

    fn create_buffer(&self) -> Option<u32> {
        let mut state = self.0.borrow_mut();
        let buffer = state.name();
        state.buffers.insert(buffer, Vec::new());
        state.commands.push(Command::CreateBuffer(buffer));
        Some(buffer)
    }

    fn bind_buffer(&self, target: u32, buffer: Option<&u32>) {
        let mut state = self.record(Command::BindBuffer {
            target,
            buffer: buffer.copied(),
        });
        match target {
            Gl::ARRAY_BUFFER => state.array_buffer = buffer.copied(),
            Gl::ELEMENT_ARRAY_BUFFER => state.element_buffer = buffer.copied(),
            _ => state.error(Gl::INVALID_ENUM),
        }
    }

    fn buffer_data(&self, target: u32, data: &[u8], usage: u32) {
        let mut state = self.record(Command::BufferData {
            target,
            bytes: data.len(),
            usage,
        });
        let bound = match target {
            Gl::ARRAY_BUFFER => state.array_buffer,
            Gl::ELEMENT_ARRAY_BUFFER => state.element_buffer,
            _ => return state.error(Gl::INVALID_ENUM),
        };
        match bound.filter(|b| state.buffers.contains_key(b)) {
            Some(buffer) => {
                state.buffers.insert(buffer, data.to_vec());
            }
            None => state.error(Gl::INVALID_OPERATION),
        }
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
        let mut state = self.record(Command::VertexAttribPointer {
            index,
            size,
            type_,
            normalized,
            stride,
            offset,
        });
        if type_ != Gl::FLOAT {
            return state.error(Gl::INVALID_ENUM);
        }
        if !(1..=4).contains(&size) || stride < 0 || offset < 0 {
            return state.error(Gl::INVALID_VALUE);
        }
        // The pointer captures the array buffer bound now.
        let Some(buffer) = state.array_buffer else {
            return state.error(Gl::INVALID_OPERATION);
        };
        match state.attribs.get_mut(index as usize) {
            Some(attrib) => {
                attrib.pointer = Some(AttribPointer {
                    buffer,
                    size,
                    stride,
                    offset,
                })
            }
            None => state.error(Gl::INVALID_VALUE),
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        let mut state = self.record(Command::EnableVertexAttribArray(index));
        match state.attribs.get_mut(index as usize) {
            Some(attrib) => attrib.enabled = true,
            None => state.error(Gl::INVALID_VALUE),
        }
    }

    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.record(Command::ClearColor([red, green, blue, alpha]))
            .clear_color = vec4(red, green, blue, alpha);
    }

    fn clear(&self, mask: u32) {
        let mut state = self.record(Command::Clear(mask));
        if mask & Gl::COLOR_BUFFER_BIT != 0 {
            let color = state.clear_color;
            state.framebuffer.clear(color);
        }
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        self.record(Command::DrawArrays { mode, first, count })
            .draw_arrays(mode, first, count, 1);
    }

    fn commit_frame(&self) -> bool {
        if self.0.borrow().implicit_presentation {
            return false;
        }
        self.record(Command::CommitFrame);
        true
    }
}

/// `WEBGL_multi_draw` of a [`RecordingContext`].
pub struct RecordingMultiDraw(Rc<RefCell<State>>);

impl RecordingMultiDraw {
    fn record(&self, command: Command) -> std::cell::RefMut<'_, State> {
        let mut state = self.0.borrow_mut();
        state.commands.push(command);
        state
    }
}

/// Returns the draw count if every slice has the same length.
fn draw_count(lengths: &[usize]) -> Option<usize> {
    let (&first, rest) = lengths.split_first()?;
    rest.iter().all(|&l| l == first).then_some(first)
}

impl MultiDrawCompat for RecordingMultiDraw {
    fn instanced(&self) -> bool {
        self.0.borrow().instancing
    }

    fn multi_draw_arrays(&self, mode: u32, firsts: &[i32], counts: &[i32]) {
        let mut state = self.record(Command::MultiDrawArrays {
            mode,
            firsts: firsts.to_vec(),
            counts: counts.to_vec(),
        });
        let Some(n) = draw_count(&[firsts.len(), counts.len()]) else {
            return state.error(Gl::INVALID_VALUE);
        };
        for i in 0..n {
            state.draw_arrays(mode, firsts[i], counts[i], 1);
        }
    }

    fn multi_draw_arrays_instanced(
        &self,
        mode: u32,
        firsts: &[i32],
        counts: &[i32],
        instance_counts: &[i32],
    ) {
        let mut state = self.record(Command::MultiDrawArraysInstanced {
            mode,
            firsts: firsts.to_vec(),
            counts: counts.to_vec(),
            instance_counts: instance_counts.to_vec(),
        });
        if !state.instancing {
            return state.error(Gl::INVALID_OPERATION);
        }
        let Some(n) = draw_count(&[firsts.len(), counts.len(), instance_counts.len()]) else {
            return state.error(Gl::INVALID_VALUE);
        };
        for i in 0..n {
            state.draw_arrays(mode, firsts[i], counts[i], instance_counts[i]);
        }
    }

    fn multi_draw_elements(&self, mode: u32, counts: &[i32], type_: u32, offsets: &[i32]) {
        let mut state = self.record(Command::MultiDrawElements {
            mode,
            counts: counts.to_vec(),
            type_,
            offsets: offsets.to_vec(),
        });
        let Some(n) = draw_count(&[counts.len(), offsets.len()]) else {
            return state.error(Gl::INVALID_VALUE);
        };
        for i in 0..n {
            state.draw_elements(mode, counts[i], type_, offsets[i], 1);
        }
    }

    fn multi_draw_elements_instanced(
        &self,
        mode: u32,
        counts: &[i32],
        type_: u32,
        offsets: &[i32],
        instance_counts: &[i32],
    ) {
        let mut state = self.record(Command::MultiDrawElementsInstanced {
            mode,
            counts: counts.to_vec(),
            type_,
            offsets: offsets.to_vec(),
            instance_counts: instance_counts.to_vec(),
        });
        if !state.instancing {
            return state.error(Gl::INVALID_OPERATION);
        }
        let Some(n) = draw_count(&[counts.len(), offsets.len(), instance_counts.len()]) else {
            return state.error(Gl::INVALID_VALUE);
        };
        for i in 0..n {
            state.draw_elements(mode, counts[i], type_, offsets[i], instance_counts[i]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "attribute vec2 apos; attribute vec3 acolor; varying vec4 color; \
        void main() { color = acolor; gl_Position = apos; }";
    const FRAGMENT: &str = "varying vec4 color; void main() { gl_FragColor = color; }";

    #[test]
    fn test_parse_shader() {
        let parsed = parse_shader(VERTEX).unwrap();
        assert_eq!(parsed.attributes, ["apos", "acolor"]);
        assert_eq!(parsed.varyings, ["color"]);
        assert_eq!(parsed.assigned("gl_Position"), Some("apos"));
        assert_eq!(parsed.assigned("color"), Some("acolor"));

        assert!(parse_shader("void main() {").is_err());
        assert!(parse_shader("void main() }").is_err());
        assert!(parse_shader("void notmain() {}").is_err());
        assert!(parse_shader("void main() { gl_FragColor = nothing; }").is_err());
    }

    fn program(ctx: &RecordingContext, bind_after_link: bool) -> u32 {
        let vs = ctx.create_shader(Gl::VERTEX_SHADER).unwrap();
        ctx.shader_source(&vs, VERTEX);
        ctx.compile_shader(&vs);
        let fs = ctx.create_shader(Gl::FRAGMENT_SHADER).unwrap();
        ctx.shader_source(&fs, FRAGMENT);
        ctx.compile_shader(&fs);

        let program = ctx.create_program().unwrap();
        ctx.attach_shader(&program, &vs);
        ctx.attach_shader(&program, &fs);
        if !bind_after_link {
            ctx.bind_attrib_location(&program, 5, "apos");
        }
        ctx.link_program(&program);
        if bind_after_link {
            ctx.bind_attrib_location(&program, 5, "apos");
        }
        program
    }

    #[test]
    fn test_binding_takes_effect_at_link() {
        let ctx = RecordingContext::new();
        let before = program(&ctx, false);
        assert_eq!(ctx.attrib_location(&before, "apos"), 5);
        assert_eq!(ctx.attrib_location(&before, "acolor"), 0);

        let after = program(&ctx, true);
        assert_eq!(ctx.attrib_location(&after, "apos"), 0);
        assert_eq!(ctx.attrib_location(&after, "acolor"), 1);
        assert!(ctx.errors().is_empty());
    }

    #[test]
    fn test_draw_without_program() {
        let ctx = RecordingContext::new();
        ctx.draw_arrays(Gl::TRIANGLES, 0, 3);
        assert_eq!(ctx.errors(), [Gl::INVALID_OPERATION]);
    }

    #[test]
    fn test_draw_out_of_range() {
        let ctx = RecordingContext::new();
        let program = program(&ctx, false);
        ctx.use_program(Some(&program));

        let buffer = ctx.create_buffer().unwrap();
        ctx.bind_buffer(Gl::ARRAY_BUFFER, Some(&buffer));
        ctx.buffer_data(Gl::ARRAY_BUFFER, &[0; 8], Gl::STATIC_DRAW);
        ctx.vertex_attrib_pointer(5, 2, Gl::FLOAT, false, 0, 0);
        ctx.enable_vertex_attrib_array(5);

        ctx.draw_arrays(Gl::TRIANGLES, 0, 3);
        assert_eq!(ctx.errors(), [Gl::INVALID_OPERATION]);
    }

    #[test]
    fn test_elements_without_buffer() {
        let ctx = RecordingContext::with_multi_draw();
        let program = program(&ctx, false);
        ctx.use_program(Some(&program));
        let ext = ctx.enable_multi_draw().unwrap();
        ext.multi_draw_elements(Gl::TRIANGLES, &[3], Gl::UNSIGNED_SHORT, &[0]);
        assert_eq!(ctx.errors(), [Gl::INVALID_OPERATION]);
    }

    #[test]
    fn test_multi_draw_unavailable() {
        let ctx = RecordingContext::new();
        assert!(ctx.enable_multi_draw().is_none());
        assert_eq!(
            ctx.commands(),
            [Command::EnableExtension {
                name: MULTI_DRAW_EXTENSION,
                available: false
            }]
        );
    }
}
