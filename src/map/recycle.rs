use crate::Error;

/// Iteration plan for two inputs.
///
/// A scalar side is read at position 1 on every iteration. Only equal lengths
/// or a length 1 side are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recycling {
    pub n: usize,
    pub x_is_scalar: bool,
    pub y_is_scalar: bool,
}

impl Recycling {
    pub fn resolve(len_x: usize, len_y: usize) -> Result<Self, Error> {
        let (n, x_is_scalar, y_is_scalar) = if len_x == len_y {
            (len_x, false, false)
        } else if len_x == 1 {
            (len_y, true, false)
        } else if len_y == 1 {
            (len_x, false, true)
        } else {
            return Err(Error::LengthMismatch {
                x_len: len_x,
                y_len: len_y,
            });
        };

        Ok(Recycling {
            n,
            x_is_scalar,
            y_is_scalar,
        })
    }

    /// True when one side is pinned.
    pub fn recycles(&self) -> bool {
        self.x_is_scalar || self.y_is_scalar
    }
}
