//! The sparse XOR-equation solver shared by every decoder.
//!
//! The decode state is a sparse matrix of XOR equations over GF(2). The
//! coefficients of each row are the sorted indices of the unknown blocks
//! XORed together to produce the row's value, so the equation
//! `block_0 ^ block_2 ^ block_3 ^ block_9 = [0xD2, 0x38]` is stored as
//! `coeff[i] = [0, 2, 3, 9]`, `v[i].data = [0xD2, 0x38]`.
//!
//! Insertion keeps the matrix triangular: every populated row `i` satisfies
//! `coeff[i][0] == i`. An incoming equation is reduced against existing rows
//! (or swapped with a longer stored row) until it lands in an empty slot or
//! cancels to nothing, after the online strategy of Bioglio, Grangetto, and
//! Gaeta ("On the fly gaussian elimination for LT codes", 2009).

use crate::block::Block;

/// Sparse GF(2) equation matrix with the triangularity invariant.
#[derive(Debug, Clone, Default)]
pub struct SparseMatrix {
    pub(crate) coeff: Vec<Vec<usize>>,
    pub(crate) v: Vec<Block>,
}

impl SparseMatrix {
    /// Creates an empty matrix over `n` unknowns.
    pub fn new(n: usize) -> Self {
        SparseMatrix {
            coeff: vec![Vec::new(); n],
            v: vec![Block::default(); n],
        }
    }

    /// Reduces the candidate equation `(indices, b)` against stored row `s`:
    /// XORs the values and takes the symmetric difference of the sorted
    /// coefficient lists (a sorted-merge walk that drops pairs of equal
    /// entries).
    fn xor_row(&self, s: usize, indices: Vec<usize>, mut b: Block) -> (Vec<usize>, Block) {
        b.xor(&self.v[s]);

        let coeffs = &self.coeff[s];
        let mut merged = Vec::new();
        let mut i = 0;
        let mut j = 0;
        while i < coeffs.len() && j < indices.len() {
            if coeffs[i] == indices[j] {
                i += 1;
                j += 1;
            } else if coeffs[i] < indices[j] {
                merged.push(coeffs[i]);
                i += 1;
            } else {
                merged.push(indices[j]);
                j += 1;
            }
        }
        merged.extend_from_slice(&coeffs[i..]);
        merged.extend_from_slice(&indices[j..]);

        (merged, b)
    }

    /// Adds an XOR equation to the decode matrix, preserving triangularity.
    ///
    /// The loop reduces the incoming equation until it either fits an empty
    /// row or is discarded as redundant: when the incoming equation is at
    /// least as long as the stored row with the same leading index it is
    /// reduced against that row; otherwise the two are swapped and the
    /// displaced row continues through the loop.
    pub fn add_equation(&mut self, mut components: Vec<usize>, mut b: Block) {
        while let Some(&s) = components.first() {
            if self.coeff[s].is_empty() {
                break;
            }
            if components.len() >= self.coeff[s].len() {
                (components, b) = self.xor_row(s, components, b);
            } else {
                std::mem::swap(&mut components, &mut self.coeff[s]);
                std::mem::swap(&mut b, &mut self.v[s]);
            }
        }

        if let Some(&lead) = components.first() {
            self.coeff[lead] = components;
            self.v[lead] = b;
        }
    }

    /// True when every row holds an equation. Note that a populated auxiliary
    /// row counts the same as a populated source row; the caller decides what
    /// the unknowns mean.
    pub fn determined(&self) -> bool {
        self.coeff.iter().all(|row| !row.is_empty())
    }

    /// Back-substitution over the whole matrix. Presumes the matrix is
    /// triangular and determined. Afterwards `coeff[i] == [i]` and `v[i]`
    /// holds the solved value of unknown `i`.
    pub fn reduce(&mut self) {
        for i in (0..self.coeff.len()).rev() {
            let lead = self.coeff[i][0];
            for j in 0..i {
                // An index occurs at most once per row, so stop on a match.
                if self.coeff[j][1..].contains(&lead) {
                    let (head, tail) = self.v.split_at_mut(i);
                    head[j].xor(&tail[0]);
                }
            }
            self.coeff[i].truncate(1);
        }
    }

    /// Pastes the reduced value column into a byte vector: `len_long` bytes
    /// from each of the first `num_long` rows, then `len_short` bytes from
    /// the following `num_short` rows. The parameters are typically those
    /// returned by [`crate::block::partition`].
    pub fn reconstruct(
        &self,
        total: usize,
        len_long: usize,
        len_short: usize,
        num_long: usize,
        num_short: usize,
    ) -> Vec<u8> {
        let mut out = Vec::with_capacity(total);
        for i in 0..num_long {
            out.extend_from_slice(&self.v[i].data[..len_long]);
        }
        for i in num_long..num_long + num_short {
            out.extend_from_slice(&self.v[i].data[..len_short]);
        }
        out
    }
}
