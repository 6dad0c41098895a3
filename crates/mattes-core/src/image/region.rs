//! Rectangular index regions over a dense sample domain.
//!
//! A domain is described by its size `[S0, S1, ...]` with axis 0 varying
//! fastest, so the linear offset of index `[i0, i1, i2]` is
//! `i0 + S0 * (i1 + S1 * i2)`.

/// Axis-aligned block of indices inside a dense domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRegion {
    index: Vec<usize>,
    size: Vec<usize>,
}

impl ImageRegion {
    /// Create a region starting at `index` with extent `size`.
    ///
    /// # Panics
    /// Panics if `index` and `size` have different dimensionality.
    pub fn new(index: Vec<usize>, size: Vec<usize>) -> Self {
        assert_eq!(index.len(), size.len(), "Region index and size must have the same rank");
        Self { index, size }
    }

    /// Region covering a whole domain.
    pub fn from_size(size: &[usize]) -> Self {
        Self {
            index: vec![0; size.len()],
            size: size.to_vec(),
        }
    }

    /// Start index of the region.
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    /// Extent of the region along each axis.
    pub fn size(&self) -> &[usize] {
        &self.size
    }

    /// Number of dimensions.
    pub fn dimension(&self) -> usize {
        self.size.len()
    }

    /// Number of indices inside the region.
    pub fn number_of_pixels(&self) -> usize {
        if self.size.is_empty() {
            0
        } else {
            self.size.iter().product()
        }
    }

    /// Whether `other` lies completely inside this region.
    pub fn contains(&self, other: &ImageRegion) -> bool {
        self.dimension() == other.dimension()
            && (0..self.dimension()).all(|axis| {
                other.index[axis] >= self.index[axis]
                    && other.index[axis] + other.size[axis] <= self.index[axis] + self.size[axis]
            })
    }

    /// Iterate the linear offsets of this region inside `domain`,
    /// fastest axis first.
    ///
    /// # Panics
    /// Panics if the region does not fit inside `domain`.
    pub fn offsets<'a>(&'a self, domain: &'a [usize]) -> RegionOffsets<'a> {
        assert!(
            ImageRegion::from_size(domain).contains(self),
            "Region {:?} does not fit inside domain {:?}",
            self,
            domain
        );
        RegionOffsets {
            region: self,
            domain,
            cursor: self.index.clone(),
            remaining: self.number_of_pixels(),
        }
    }
}

/// Iterator over the linear offsets of an [`ImageRegion`].
#[derive(Debug, Clone)]
pub struct RegionOffsets<'a> {
    region: &'a ImageRegion,
    domain: &'a [usize],
    cursor: Vec<usize>,
    remaining: usize,
}

impl Iterator for RegionOffsets<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }

        let mut offset = 0;
        let mut stride = 1;
        for (axis, &i) in self.cursor.iter().enumerate() {
            offset += i * stride;
            stride *= self.domain[axis];
        }

        self.remaining -= 1;
        for axis in 0..self.cursor.len() {
            self.cursor[axis] += 1;
            if self.cursor[axis] < self.region.index[axis] + self.region.size[axis] {
                break;
            }
            self.cursor[axis] = self.region.index[axis];
        }

        Some(offset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for RegionOffsets<'_> {}
