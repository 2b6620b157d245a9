// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::context::GlContext;
use crate::gl::*;
use crate::vertex::Vertex;
use std::mem::size_of;

/// For describing [`Vertex`] attributes to shaders. Consecutive calls describe consecutive
/// slots at consecutive byte offsets, with the stride of the whole [`Vertex`].
pub struct Attribs<'a, C: GlContext> {
    ctx: &'a C,
    bytes: u32,
    index: u32,
    size: usize,
}

impl<'a, C: GlContext> Attribs<'a, C> {
    pub(crate) fn new<V: Vertex>(ctx: &'a C) -> Self {
        Self {
            ctx,
            bytes: 0,
            index: 0,
            size: size_of::<V>(),
        }
    }

    fn attrib(&mut self) -> u32 {
        let i = self.index;
        self.index += 1;

        self.ctx.enable_vertex_attrib_array(i);
        i
    }

    fn offset(&mut self, bytes: usize) -> i32 {
        let b = self.bytes;
        self.bytes += bytes as u32;
        b as i32
    }

    /// Describes the next attribute as `count` floats.
    pub fn floats(&mut self, count: usize) {
        let index = self.attrib();
        let offset = self.offset(count * size_of::<f32>());
        self.ctx.vertex_attrib_pointer(
            index,
            count as i32,
            Gl::FLOAT,
            false,
            self.size as i32,
            offset,
        );
    }
}

impl<'a, C: GlContext> Drop for Attribs<'a, C> {
    fn drop(&mut self) {
        // Make sure all attributes were added.
        assert_eq!(self.bytes as usize, self.size, "attributes don't add up");
    }
}
