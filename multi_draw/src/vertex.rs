// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::attribs::Attribs;
use crate::context::GlContext;
use bytemuck::Pod;
use glam::*;

/// Any data consisting of [`prim@f32`]s. Each field binds the next attribute slot, starting
/// at 0, in declaration order.
pub trait Vertex: Pod {
    #[doc(hidden)]
    fn bind_attribs<C: GlContext>(attribs: &mut Attribs<C>);
}

macro_rules! impl_vertex_floats {
    ($a: ty, $floats: literal) => {
        impl Vertex for $a {
            fn bind_attribs<C: GlContext>(attribs: &mut Attribs<C>) {
                attribs.floats($floats);
            }
        }
    };
}

impl_vertex_floats!(f32, 1);
impl_vertex_floats!(Vec2, 2);
impl_vertex_floats!(Vec3, 3);

// These are normally 16 byte aligned (breaking derive Pod) but not with glam's scalar-math feature.
impl_vertex_floats!(Vec4, 4);
