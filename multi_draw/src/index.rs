// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::gl::*;
use bytemuck::Pod;
use std::fmt::Debug;

/// Types that can be used as indices in a [`StaticBuffer`][`crate::buffer::StaticBuffer`]
/// bound as an element array.
pub trait Index: Pod + Debug + Default {
    #[doc(hidden)]
    const GL_ENUM: u32;
}

macro_rules! impl_index {
    ($typ:ty, $gl_enum:expr) => {
        impl Index for $typ {
            const GL_ENUM: u32 = $gl_enum;
        }
    };
}

impl_index!(u8, Gl::UNSIGNED_BYTE);
impl_index!(u16, Gl::UNSIGNED_SHORT);
impl_index!(u32, Gl::UNSIGNED_INT);
