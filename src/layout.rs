//! std140 block layout
//!
//! Computes byte offsets for the members of a `layout (std140) uniform`
//! block in a single left-to-right pass. Each member starts at the next
//! multiple of its base alignment; the gap, if any, becomes an explicit
//! padding field in the generated mirror struct.
//!
//! Only primitive members are supported. Struct members would need the
//! std140 struct rules (alignment rounded up to 16, trailing padding) and
//! are rejected instead of being laid out wrongly.

use log::debug;

use crate::declaration::Uniform;
use crate::error::{GlueError, Result};
use crate::types::{Primitive, TypeName};

/// Computed layout of one uniform block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLayout {
    pub name: String,
    pub members: Vec<Uniform>,
    /// Byte offset of each member from the start of the block
    pub offsets: Vec<u32>,
    /// Padding inserted immediately before each member
    pub pad_before: Vec<u32>,
    /// Offset just past the last member
    pub total_size: u32,
}

/// One member of a [`BlockLayout`] with its placement
#[derive(Debug, Clone, Copy)]
pub struct PlacedMember<'a> {
    pub uniform: &'a Uniform,
    pub primitive: Primitive,
    pub offset: u32,
    pub pad_before: u32,
}

impl BlockLayout {
    /// Members paired with their offsets and padding, in block order
    ///
    /// Fails if a member is not primitive, which [`compute_layout`] never
    /// produces but a hand-built layout might.
    pub fn placed(&self) -> Result<Vec<PlacedMember<'_>>> {
        self.members
            .iter()
            .zip(self.offsets.iter().zip(&self.pad_before))
            .map(|(uniform, (&offset, &pad_before))| {
                let primitive = primitive_member(&self.name, uniform)?;
                Ok(PlacedMember {
                    uniform,
                    primitive,
                    offset,
                    pad_before,
                })
            })
            .collect()
    }

    /// Total bytes spent on padding
    pub fn padding_bytes(&self) -> u32 {
        self.pad_before.iter().sum()
    }
}

/// Padding needed to bring `offset` up to a multiple of `alignment`
fn pad_to(offset: u32, alignment: u32) -> u32 {
    match offset % alignment {
        0 => 0,
        misalignment => alignment - misalignment,
    }
}

fn primitive_member(block: &str, member: &Uniform) -> Result<Primitive> {
    match &member.ty {
        TypeName::Primitive(p) => Ok(*p),
        TypeName::Struct(ty) => Err(GlueError::NonPrimitiveBlockMember {
            block: block.to_string(),
            member: member.name.clone(),
            ty: ty.clone(),
        }),
    }
}

/// Lay out `members` of the block `name` following std140
pub fn compute_layout(name: impl Into<String>, members: Vec<Uniform>) -> Result<BlockLayout> {
    let name = name.into();
    let mut offsets = Vec::with_capacity(members.len());
    let mut pad_before = Vec::with_capacity(members.len());
    let mut current_offset = 0u32;

    for member in &members {
        let primitive = primitive_member(&name, member)?;

        let pad = pad_to(current_offset, primitive.base_alignment());
        current_offset += pad;

        debug!(
            "{}.{}: {} at offset {} (pad {})",
            name, member.name, primitive, current_offset, pad
        );

        pad_before.push(pad);
        offsets.push(current_offset);
        current_offset += primitive.size();
    }

    Ok(BlockLayout {
        name,
        members,
        offsets,
        pad_before,
        total_size: current_offset,
    })
}
