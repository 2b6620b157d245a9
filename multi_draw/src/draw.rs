// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::context::{GlContext, MultiDrawCompat};
use crate::gl::*;
use crate::index::Index;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which draw call renders the scene.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DrawForm {
    /// A single `drawArrays`. Always available.
    #[default]
    Plain,
    /// `multiDrawArraysWEBGL`.
    MultiArrays,
    /// `multiDrawArraysInstancedWEBGL`.
    MultiArraysInstanced,
    /// `multiDrawElementsWEBGL`.
    MultiElements,
    /// `multiDrawElementsInstancedWEBGL`.
    MultiElementsInstanced,
}

impl DrawForm {
    /// Every form, plain first.
    pub const ALL: [Self; 5] = [
        Self::Plain,
        Self::MultiArrays,
        Self::MultiArraysInstanced,
        Self::MultiElements,
        Self::MultiElementsInstanced,
    ];

    /// Returns true if the form requires `WEBGL_multi_draw`.
    pub fn is_batched(self) -> bool {
        self != Self::Plain
    }

    /// Returns true if the form reads an index buffer.
    pub fn is_indexed(self) -> bool {
        matches!(self, Self::MultiElements | Self::MultiElementsInstanced)
    }

    /// Returns true if the form takes instance counts.
    pub fn is_instanced(self) -> bool {
        matches!(self, Self::MultiArraysInstanced | Self::MultiElementsInstanced)
    }

    /// Name used in configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::MultiArrays => "multi_draw_arrays",
            Self::MultiArraysInstanced => "multi_draw_arrays_instanced",
            Self::MultiElements => "multi_draw_elements",
            Self::MultiElementsInstanced => "multi_draw_elements_instanced",
        }
    }
}

impl fmt::Display for DrawForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A [`DrawForm`] name wasn't recognized.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown draw form {0:?}")]
pub struct UnknownDrawForm(pub String);

impl FromStr for DrawForm {
    type Err = UnknownDrawForm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|form| form.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownDrawForm(s.to_owned()))
    }
}

/// Why a draw call wasn't issued.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DrawError {
    /// The parallel arrays of a [`MultiDrawBatch`] disagree in length.
    #[error("{array} has {actual} entries but counts has {expected}")]
    BatchMismatch {
        /// The array that disagrees with `counts`.
        array: &'static str,
        /// Entries in `counts`.
        expected: usize,
        /// Entries in `array`.
        actual: usize,
    },
    /// A batch without entries draws nothing.
    #[error("batch is empty")]
    EmptyBatch,
    /// The context couldn't allocate a buffer (usually a lost context).
    #[error("could not create buffer")]
    CreateBuffer,
}

/// Parallel arrays of a batched draw. Entry `i` of each array describes draw `i`. Only the
/// arrays the [`DrawForm`] uses are validated and submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiDrawBatch {
    /// First vertex of each draw (arrays forms).
    pub firsts: Vec<i32>,
    /// Vertex or index count of each draw.
    pub counts: Vec<i32>,
    /// Instances of each draw (instanced forms).
    pub instance_counts: Vec<i32>,
    /// Byte offset into the index buffer of each draw (elements forms).
    pub offsets: Vec<i32>,
}

impl MultiDrawBatch {
    /// A batch of a single draw of `count` vertices/indices from the start of the buffers.
    pub fn single(count: i32) -> Self {
        Self {
            firsts: vec![0],
            counts: vec![count],
            instance_counts: vec![1],
            offsets: vec![0],
        }
    }

    /// The draw count of the batch when drawn as `form`.
    pub fn draw_count(&self, form: DrawForm) -> Result<usize, DrawError> {
        let expected = self.counts.len();
        if expected == 0 {
            return Err(DrawError::EmptyBatch);
        }

        let check = |array: &'static str, values: &[i32]| {
            if values.len() == expected {
                Ok(())
            } else {
                Err(DrawError::BatchMismatch {
                    array,
                    expected,
                    actual: values.len(),
                })
            }
        };

        if form.is_indexed() {
            check("offsets", &self.offsets)?;
        } else {
            check("firsts", &self.firsts)?;
        }
        if form.is_instanced() {
            check("instance_counts", &self.instance_counts)?;
        }
        Ok(expected)
    }
}

/// Clears the color buffer then issues exactly one draw call of triangles. Falls back to
/// [`DrawForm::Plain`] (drawing `vertex_count` vertices) if `multi_draw` is None, or if `form`
/// is instanced and `multi_draw` can't instance. Returns the form that was actually drawn.
///
/// Indexed forms require an index buffer of `I` to be bound.
pub fn dispatch<C: GlContext, I: Index>(
    ctx: &C,
    multi_draw: Option<&C::MultiDraw>,
    form: DrawForm,
    batch: &MultiDrawBatch,
    vertex_count: i32,
) -> Result<DrawForm, DrawError> {
    let primitive = Gl::TRIANGLES;
    let ext = multi_draw.filter(|ext| !form.is_instanced() || ext.instanced());

    // Validate before any command so a bad batch leaves the frame untouched.
    if ext.is_some() && form.is_batched() {
        batch.draw_count(form)?;
    }
    let MultiDrawBatch {
        firsts,
        counts,
        instance_counts,
        offsets,
    } = batch;

    ctx.clear(Gl::COLOR_BUFFER_BIT);
    match (ext, form) {
        (Some(ext), DrawForm::MultiArrays) => ext.multi_draw_arrays(primitive, firsts, counts),
        (Some(ext), DrawForm::MultiArraysInstanced) => {
            ext.multi_draw_arrays_instanced(primitive, firsts, counts, instance_counts)
        }
        (Some(ext), DrawForm::MultiElements) => {
            ext.multi_draw_elements(primitive, counts, I::GL_ENUM, offsets)
        }
        (Some(ext), DrawForm::MultiElementsInstanced) => {
            ext.multi_draw_elements_instanced(primitive, counts, I::GL_ENUM, offsets, instance_counts)
        }
        (None, _) | (_, DrawForm::Plain) => {
            ctx.draw_arrays(primitive, 0, vertex_count);
            return Ok(DrawForm::Plain);
        }
    }
    Ok(form)
}
