//! Lattice transform algebra
//!
//! Rotations and mirrors of neighbor offsets, plus the placement matrices
//! that go with them. Offset maps are exact integer maps so that rotating a
//! full turn always lands back on the starting cell.
//!
//! Square grids use plain `(x, y)` cell offsets. Hexagonal grids use axial
//! `(q, r)` offsets, which keeps every 60 degree step an integer map.

use glam::{IVec3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Cell layout of a grid, which fixes its rotation group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Lattice {
    /// Four 90 degree rotations
    #[default]
    Square,
    /// Six 60 degree rotations, axial coordinates
    Hexagonal,
}

impl Lattice {
    /// Number of distinct rotations (N in a rotated rule)
    pub fn rotation_count(self) -> u32 {
        match self {
            Lattice::Square => 4,
            Lattice::Hexagonal => 6,
        }
    }

    /// Degrees covered by one rotation step
    pub fn rotation_angle(self) -> u32 {
        360 / self.rotation_count()
    }

    /// Rotate an offset clockwise by `degrees`.
    ///
    /// Angles are taken modulo 360 and truncated to whole lattice steps.
    pub fn rotate_offset(self, offset: IVec3, degrees: i32) -> IVec3 {
        let steps = degrees.rem_euclid(360) as u32 / self.rotation_angle();
        self.rotate_steps(offset, steps)
    }

    /// Rotate an offset clockwise by `steps` lattice steps
    pub fn rotate_steps(self, offset: IVec3, steps: u32) -> IVec3 {
        let steps = steps % self.rotation_count();
        match self {
            Lattice::Square => match steps {
                0 => offset,
                1 => IVec3::new(offset.y, -offset.x, offset.z),
                2 => IVec3::new(-offset.x, -offset.y, offset.z),
                _ => IVec3::new(-offset.y, offset.x, offset.z),
            },
            Lattice::Hexagonal => {
                let (mut q, mut r) = (offset.x, offset.y);
                for _ in 0..steps {
                    (q, r) = (q + r, -q);
                }
                IVec3::new(q, r, offset.z)
            }
        }
    }

    /// Mirror an offset across the vertical axis (`mirror_x`), the
    /// horizontal axis (`mirror_y`), or both
    pub fn mirror_offset(self, offset: IVec3, mirror_x: bool, mirror_y: bool) -> IVec3 {
        let mut out = offset;
        match self {
            Lattice::Square => {
                if mirror_x {
                    out.x = -out.x;
                }
                if mirror_y {
                    out.y = -out.y;
                }
            }
            Lattice::Hexagonal => {
                if mirror_x {
                    out.x = -out.x - out.y;
                }
                if mirror_y {
                    out.x += out.y;
                    out.y = -out.y;
                }
            }
        }
        out
    }

    /// Placement matrix for `steps` clockwise rotation steps
    pub fn rotation_matrix(self, steps: u32) -> Mat4 {
        let steps = steps % self.rotation_count();
        if steps == 0 {
            return Mat4::IDENTITY;
        }
        let degrees = (steps * self.rotation_angle()) as f32;
        Mat4::from_rotation_z(-degrees.to_radians())
    }

    /// Placement matrix for a mirror
    pub fn mirror_matrix(mirror_x: bool, mirror_y: bool) -> Mat4 {
        let sx = if mirror_x { -1.0 } else { 1.0 };
        let sy = if mirror_y { -1.0 } else { 1.0 };
        Mat4::from_scale(Vec3::new(sx, sy, 1.0))
    }
}

/// Cell at `position + offset`, or `None` past the edge of the `i32` range
pub fn checked_offset(position: IVec3, offset: IVec3) -> Option<IVec3> {
    Some(IVec3::new(
        position.x.checked_add(offset.x)?,
        position.y.checked_add(offset.y)?,
        position.z.checked_add(offset.z)?,
    ))
}

/// Cell at `position - offset`, or `None` past the edge of the `i32` range
pub fn checked_origin(position: IVec3, offset: IVec3) -> Option<IVec3> {
    Some(IVec3::new(
        position.x.checked_sub(offset.x)?,
        position.y.checked_sub(offset.y)?,
        position.z.checked_sub(offset.z)?,
    ))
}
