// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::attribs::Attribs;
use crate::context::GlContext;
use crate::gl::*;
use crate::vertex::Vertex;
use bytemuck::Pod;
use std::marker::PhantomData;

pub(crate) enum GpuBufferType {
    Array,
    Element,
}

impl GpuBufferType {
    pub(crate) const fn to(self) -> bool {
        match self {
            Self::Array => true,
            Self::Element => false,
        }
    }

    const fn fr(v: bool) -> Self {
        match v {
            true => Self::Array,
            false => Self::Element,
        }
    }

    pub(crate) const fn target(self) -> u32 {
        match self {
            Self::Array => Gl::ARRAY_BUFFER,
            Self::Element => Gl::ELEMENT_ARRAY_BUFFER,
        }
    }
}

/// Buffer of vertices.
pub type VertexBuffer<C, V> = StaticBuffer<C, V, { GpuBufferType::Array.to() }>;

/// Buffer of indices into a [`VertexBuffer`].
pub type IndexBuffer<C, I> = StaticBuffer<C, I, { GpuBufferType::Element.to() }>;

/// A buffer whose elements are uploaded once with the static usage hint and never mutated.
pub struct StaticBuffer<C: GlContext, E, const B: bool> {
    elements: C::Buffer,
    length: u32,
    element: PhantomData<E>,
}

impl<C: GlContext, E: Pod, const B: bool> StaticBuffer<C, E, B> {
    /// Creates the buffer and uploads `elements`. Returns None if the context is lost.
    pub fn new(ctx: &C, elements: &[E]) -> Option<Self> {
        let buffer = Self {
            elements: ctx.create_buffer()?,
            length: elements.len().try_into().ok()?,
            element: PhantomData,
        };

        let target = GpuBufferType::fr(B).target();
        ctx.bind_buffer(target, Some(&buffer.elements));
        ctx.buffer_data(target, bytemuck::cast_slice(elements), Gl::STATIC_DRAW);

        // Unbind (not required in release mode).
        #[cfg(debug_assertions)]
        ctx.bind_buffer(target, None);

        Some(buffer)
    }

    /// The amount of elements in the buffer.
    pub fn len(&self) -> u32 {
        self.length
    }

    /// Returns true if the buffer has no elements.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[must_use]
    pub(crate) fn bind<'a>(&'a self, ctx: &'a C) -> StaticBufferBinding<'a, C, E, B> {
        StaticBufferBinding::new(ctx, self)
    }
}

pub(crate) struct StaticBufferBinding<'a, C: GlContext, E, const B: bool> {
    ctx: &'a C,
    element: PhantomData<E>,
}

impl<'a, C: GlContext, E: Pod, const B: bool> StaticBufferBinding<'a, C, E, B> {
    fn new(ctx: &'a C, buffer: &StaticBuffer<C, E, B>) -> Self {
        ctx.bind_buffer(GpuBufferType::fr(B).target(), Some(&buffer.elements));
        Self {
            ctx,
            element: PhantomData,
        }
    }
}

impl<'a, C: GlContext, V: Vertex> StaticBufferBinding<'a, C, V, { GpuBufferType::Array.to() }> {
    /// Describes and enables the attributes of `V`, which keep reading from this buffer
    /// after it's unbound.
    pub(crate) fn bind_attribs(&self) {
        let mut attribs = Attribs::new::<V>(self.ctx);
        V::bind_attribs(&mut attribs);
    }
}

impl<'a, C: GlContext, E, const B: bool> Drop for StaticBufferBinding<'a, C, E, B> {
    fn drop(&mut self) {
        // Unbind (not required in release mode).
        #[cfg(debug_assertions)]
        self.ctx.bind_buffer(GpuBufferType::fr(B).target(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Command, RecordingContext};
    use glam::*;

    #[test]
    fn test_static_upload() {
        let ctx = RecordingContext::new();
        let indices: IndexBuffer<_, u16> = StaticBuffer::new(&ctx, &[0u16, 1, 2]).unwrap();
        assert_eq!(indices.len(), 3);
        assert!(!indices.is_empty());

        assert!(ctx.commands().contains(&Command::BufferData {
            target: Gl::ELEMENT_ARRAY_BUFFER,
            bytes: 6,
            usage: Gl::STATIC_DRAW,
        }));
    }

    #[test]
    fn test_bind_attribs() {
        let ctx = RecordingContext::new();
        let vertices: VertexBuffer<_, Vec3> =
            StaticBuffer::new(&ctx, &[vec3(1.0, 0.0, 0.0), vec3(0.0, 1.0, 0.0), vec3(0.0, 0.0, 1.0)])
                .unwrap();
        vertices.bind(&ctx).bind_attribs();

        let commands = ctx.commands();
        assert!(commands.contains(&Command::VertexAttribPointer {
            index: 0,
            size: 3,
            type_: Gl::FLOAT,
            normalized: false,
            stride: 12,
            offset: 0,
        }));
        assert!(commands.contains(&Command::EnableVertexAttribArray(0)));
    }
}
